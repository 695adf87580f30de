use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;
use treefold::engine::progress::{Progress, ProgressCallback};
use treefold::engine::state::TrialOutcome;

const SPINNER_TICK_MS: u64 = 80;

pub type TrialSink = Arc<Mutex<dyn Write + Send>>;

#[derive(Default)]
struct TrialTally {
    accepted: usize,
    decided: usize,
}

/// Renders engine progress events on stderr with a single indicatif bar.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
    tally: Arc<Mutex<TrialTally>>,
    trial_lines: Option<TrialSink>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// A handler that tracks state without drawing anything.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::spinner_style())
            .with_message("Initializing...");
        pb.set_draw_target(target);
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
            tally: Arc::new(Mutex::new(TrialTally::default())),
            trial_lines: None,
        }
    }

    /// Writes an `accepted`/`rejected` line to `sink` as each trial finishes.
    pub fn echo_trials_to(mut self, sink: TrialSink) -> Self {
        self.trial_lines = Some(sink);
        self
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb_clone = self.pb.clone();
        let tally_clone = self.tally.clone();
        let lines_clone = self.trial_lines.clone();

        Box::new(move |progress: Progress| {
            let Ok(pb) = pb_clone.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::PhaseStart { name } => {
                    pb.reset();
                    pb.set_length(0);
                    pb.set_style(Self::spinner_style());
                    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                    pb.set_message(name.to_string());
                }
                Progress::PhaseFinish => {
                    pb.disable_steady_tick();
                    pb.finish_with_message("✓ Done");
                }
                Progress::TaskStart { total_steps } => {
                    if let Ok(mut tally) = tally_clone.lock() {
                        *tally = TrialTally::default();
                    }
                    pb.disable_steady_tick();
                    pb.reset();
                    pb.set_length(total_steps);
                    pb.set_position(0);
                    pb.set_style(Self::bar_style());
                }
                Progress::TaskIncrement => pb.inc(1),
                Progress::TaskFinish => {
                    let length = pb.length().unwrap_or(0);
                    if pb.position() < length {
                        pb.set_position(length);
                    }
                    pb.finish();
                }
                Progress::TrialFinished {
                    accepted, score, ..
                } => {
                    if let Some(sink) = &lines_clone {
                        let label = TrialOutcome::label_for(accepted);
                        let written = match sink.lock() {
                            Ok(mut out) => pb.suspend(|| writeln!(out, "{}", label)),
                            Err(_) => Ok(()),
                        };
                        if let Err(e) = written {
                            warn!("Failed to write trial outcome: {}", e);
                        }
                    }
                    if let Ok(mut tally) = tally_clone.lock() {
                        tally.decided += 1;
                        if accepted {
                            tally.accepted += 1;
                        }
                        pb.set_message(format!(
                            "{}/{} accepted, score {:.3}",
                            tally.accepted, tally.decided, score
                        ));
                    }
                }
                Progress::StatusUpdate { text } => pb.set_message(text),
                Progress::Message(msg) => {
                    if pb.is_finished() {
                        pb.set_message(msg);
                    } else {
                        pb.println(format!("  {}", msg));
                    }
                }
            }
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
