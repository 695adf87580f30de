use crate::core::models::ids::SeqPos;
use crate::core::models::pose::Pose;

#[derive(Debug, Clone, PartialEq)]
pub enum TrialOutcome {
    Accepted,
    Rejected,
    /// Repacking or minimization failed; the trial never reached Metropolis.
    Aborted(String),
}

impl TrialOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TrialOutcome::Accepted)
    }

    /// The per-iteration label printed by the command line.
    pub fn label(&self) -> &'static str {
        Self::label_for(self.is_accepted())
    }

    pub fn label_for(accepted: bool) -> &'static str {
        if accepted { "accepted" } else { "rejected" }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IterationRecord {
    pub iteration: usize,
    pub residue: SeqPos,
    pub outcome: TrialOutcome,
    /// Score of the trial pose, absent for aborted trials.
    pub trial_score: Option<f64>,
    /// Score counted towards the running mean: the trial score, or the
    /// reference score when the trial was aborted.
    pub score: f64,
    /// Reference score after the decision.
    pub reference_score: f64,
}

/// Running statistics of one Monte Carlo trajectory.
#[derive(Debug, Clone)]
pub struct MonteCarloState {
    pub best_pose: Pose,
    pub best_score: f64,
    pub current_score: f64,
    pub temperature: f64,
    pub accepted_count: usize,
    pub total_trials: usize,
    pub cumulative_score: f64,
}

impl MonteCarloState {
    pub fn new(pose: &Pose, score: f64, temperature: f64) -> Self {
        Self {
            best_pose: pose.clone(),
            best_score: score,
            current_score: score,
            temperature,
            accepted_count: 0,
            total_trials: 0,
            cumulative_score: 0.0,
        }
    }

    pub fn record_accepted(&mut self, pose: &Pose, score: f64) {
        self.total_trials += 1;
        self.accepted_count += 1;
        self.current_score = score;
        self.cumulative_score += score;
        if score < self.best_score {
            self.best_score = score;
            self.best_pose = pose.clone();
        }
    }

    /// Counts a trial that was scored and then rejected by Metropolis.
    pub fn record_rejected(&mut self, score: f64) {
        self.total_trials += 1;
        self.cumulative_score += score;
    }

    /// Counts a trial that never produced a score, at the reference score.
    pub fn record_aborted(&mut self) {
        self.total_trials += 1;
        self.cumulative_score += self.current_score;
    }

    pub fn acceptance_rate(&self) -> Option<f64> {
        (self.total_trials > 0).then(|| self.accepted_count as f64 / self.total_trials as f64)
    }

    pub fn average_score(&self) -> Option<f64> {
        (self.total_trials > 0).then(|| self.cumulative_score / self.total_trials as f64)
    }
}

#[derive(Debug, Clone)]
pub struct SamplingReport {
    pub initial_score: f64,
    pub final_pose: Pose,
    pub final_score: f64,
    pub best_pose: Pose,
    pub best_score: f64,
    pub accepted_count: usize,
    /// Accepted moves that raised the score.
    pub uphill_accepted: usize,
    pub total_trials: usize,
    pub acceptance_rate: Option<f64>,
    pub average_score: Option<f64>,
    pub records: Vec<IterationRecord>,
}

impl SamplingReport {
    pub fn aborted_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, TrialOutcome::Aborted(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_follow_recorded_trials() {
        let pose = Pose::from_sequence("AAA").unwrap();
        let mut state = MonteCarloState::new(&pose, 10.0, 1.0);
        assert_eq!(state.acceptance_rate(), None);
        assert_eq!(state.average_score(), None);

        state.record_accepted(&pose, 8.0);
        state.record_rejected(12.0);
        state.record_accepted(&pose, 9.0);
        state.record_aborted();

        assert_eq!(state.total_trials, 4);
        assert_eq!(state.accepted_count, 2);
        assert_eq!(state.acceptance_rate(), Some(0.5));
        assert_eq!(state.average_score(), Some((8.0 + 12.0 + 9.0 + 9.0) / 4.0));
        assert_eq!(state.best_score, 8.0);
        assert_eq!(state.current_score, 9.0);
    }

    #[test]
    fn rejected_scores_leave_the_reference_alone() {
        let pose = Pose::from_sequence("AAA").unwrap();
        let mut state = MonteCarloState::new(&pose, 5.0, 0.0);
        state.record_rejected(7.0);
        state.record_rejected(6.0);

        assert_eq!(state.current_score, 5.0);
        assert_eq!(state.best_score, 5.0);
        assert_eq!(state.average_score(), Some(6.5));
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(TrialOutcome::Accepted.label(), "accepted");
        assert_eq!(TrialOutcome::Rejected.label(), "rejected");
        assert_eq!(TrialOutcome::Aborted("repack".into()).label(), "rejected");
        assert_eq!(TrialOutcome::label_for(true), "accepted");
    }
}
