#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// One Monte Carlo trial has been decided.
    TrialFinished {
        iteration: usize,
        accepted: bool,
        score: f64,
    },

    StatusUpdate { text: String },
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn events_reach_the_callback_in_order() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            let label = match event {
                Progress::PhaseStart { name } => name.to_string(),
                Progress::TrialFinished { iteration, .. } => format!("trial {iteration}"),
                other => format!("{other:?}"),
            };
            seen.lock().unwrap().push(label);
        }));

        reporter.report(Progress::PhaseStart { name: "Sampling" });
        reporter.report(Progress::TrialFinished {
            iteration: 1,
            accepted: true,
            score: -1.0,
        });
        reporter.report(Progress::PhaseFinish);
        drop(reporter);

        assert_eq!(
            seen.into_inner().unwrap(),
            vec!["Sampling", "trial 1", "PhaseFinish"]
        );
    }

    #[test]
    fn silent_reporter_ignores_events() {
        ProgressReporter::new().report(Progress::Message("ignored".into()));
    }
}
