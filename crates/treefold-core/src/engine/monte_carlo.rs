use super::config::SamplingConfig;
use super::error::EngineError;
use super::metropolis::MetropolisCriterion;
use super::perturbation::PerturbationSampler;
use super::progress::{Progress, ProgressReporter};
use super::state::{IterationRecord, MonteCarloState, SamplingReport, TrialOutcome};
use super::tasks::minimize::{Minimizer, MinimizerOptions};
use super::tasks::repack::{PackerTask, Repacker};
use crate::core::forcefield::scoring::ScoreFunction;
use crate::core::kinematics::movemap::MoveMap;
use crate::core::models::ids::SeqPos;
use crate::core::models::pose::Pose;
use rand::Rng;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Idle,
    Proposing,
    Repacking,
    Minimizing,
    Scoring,
    Decided { accepted: bool },
    Terminal,
}

/// Perturb, repack, minimize, score and accept or reject, a fixed number of times.
///
/// The working pose is exclusively owned by the loop. Each trial starts from a
/// snapshot; any trial that is rejected or fails in repacking or minimization
/// restores it, so the pose only ever reflects accepted trials.
pub struct MonteCarloLoop<'a> {
    sfxn: &'a ScoreFunction,
    repacker: &'a dyn Repacker,
    minimizer: &'a dyn Minimizer,
    sampler: PerturbationSampler,
    movemap: MoveMap,
    minimizer_options: MinimizerOptions,
    temperature: f64,
    recover_lowest: bool,
    reporter: Option<&'a ProgressReporter<'a>>,
    phase: LoopPhase,
}

impl<'a> MonteCarloLoop<'a> {
    pub fn new(
        sfxn: &'a ScoreFunction,
        repacker: &'a dyn Repacker,
        minimizer: &'a dyn Minimizer,
        config: &SamplingConfig,
    ) -> Self {
        Self {
            sfxn,
            repacker,
            minimizer,
            sampler: PerturbationSampler::new(config.step_size),
            movemap: MoveMap::all(),
            minimizer_options: config.minimizer.clone(),
            temperature: config.temperature,
            recover_lowest: config.recover_lowest,
            reporter: None,
            phase: LoopPhase::Idle,
        }
    }

    pub fn with_reporter(mut self, reporter: &'a ProgressReporter<'a>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Degrees of freedom handed to the minimizer; backbone and chis by default.
    pub fn with_movemap(mut self, movemap: MoveMap) -> Self {
        self.movemap = movemap;
        self
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    fn report(&self, event: Progress) {
        if let Some(reporter) = self.reporter {
            reporter.report(event);
        }
    }

    /// Runs exactly `iterations` trials starting from `pose`.
    ///
    /// # Errors
    ///
    /// Scoring failures are fatal and abort the run. Repacking and
    /// minimization failures only reject the trial in which they occur.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        pose: Pose,
        iterations: usize,
        rng: &mut R,
    ) -> Result<SamplingReport, EngineError> {
        self.phase = LoopPhase::Idle;
        let mut pose = pose;
        let initial_score = self.sfxn.total(&pose)?;
        let mut metropolis = MetropolisCriterion::new(self.temperature, initial_score);
        let mut state = MonteCarloState::new(&pose, initial_score, self.temperature);
        let mut records = Vec::with_capacity(iterations);

        info!(
            iterations,
            temperature = self.temperature,
            initial_score,
            "Starting Monte Carlo sampling."
        );
        self.report(Progress::TaskStart {
            total_steps: iterations as u64,
        });
        for iteration in 1..=iterations {
            let record = self.trial(iteration, &mut pose, &mut state, &mut metropolis, rng)?;
            self.report(Progress::TrialFinished {
                iteration,
                accepted: record.outcome.is_accepted(),
                score: record.score,
            });
            self.report(Progress::TaskIncrement);
            records.push(record);
        }
        self.report(Progress::TaskFinish);
        self.phase = LoopPhase::Terminal;

        let (final_pose, final_score) = if self.recover_lowest {
            (state.best_pose.clone(), state.best_score)
        } else {
            (pose, state.current_score)
        };
        info!(
            accepted = state.accepted_count,
            total = state.total_trials,
            best_score = state.best_score,
            final_score,
            "Monte Carlo sampling finished."
        );

        Ok(SamplingReport {
            initial_score,
            final_pose,
            final_score,
            acceptance_rate: state.acceptance_rate(),
            average_score: state.average_score(),
            best_pose: state.best_pose,
            best_score: state.best_score,
            accepted_count: state.accepted_count,
            uphill_accepted: metropolis.uphill_accepted(),
            total_trials: state.total_trials,
            records,
        })
    }

    fn trial<R: Rng + ?Sized>(
        &mut self,
        iteration: usize,
        pose: &mut Pose,
        state: &mut MonteCarloState,
        metropolis: &mut MetropolisCriterion,
        rng: &mut R,
    ) -> Result<IterationRecord, EngineError> {
        let snapshot = pose.clone();

        self.phase = LoopPhase::Proposing;
        let perturbation = self.sampler.propose(pose, rng);
        let residue = perturbation.residue;
        perturbation.apply(pose)?;

        self.phase = LoopPhase::Repacking;
        let task = PackerTask::repack_all(pose).restrict_to_repacking();
        if let Err(err) = self.repacker.repack(pose, self.sfxn, &task) {
            return Ok(self.abort(iteration, residue, pose, snapshot, state, format!("repack: {err}")));
        }

        self.phase = LoopPhase::Minimizing;
        let mut minimized = pose.clone();
        match self
            .minimizer
            .minimize(&mut minimized, &self.movemap, self.sfxn, &self.minimizer_options)
        {
            Ok(_) => *pose = minimized,
            Err(err) => {
                return Ok(self.abort(iteration, residue, pose, snapshot, state, format!("minimize: {err}")));
            }
        }

        self.phase = LoopPhase::Scoring;
        let score = self.sfxn.total(pose)?;
        let decision = metropolis.decide(score, rng);
        let accepted = decision.is_accepted();
        self.phase = LoopPhase::Decided { accepted };

        let outcome = if accepted {
            state.record_accepted(pose, score);
            TrialOutcome::Accepted
        } else {
            *pose = snapshot;
            state.record_rejected(score);
            TrialOutcome::Rejected
        };
        debug!(iteration, residue, score, ?decision, "Trial decided.");

        Ok(IterationRecord {
            iteration,
            residue,
            outcome,
            trial_score: Some(score),
            score,
            reference_score: state.current_score,
        })
    }

    fn abort(
        &self,
        iteration: usize,
        residue: SeqPos,
        pose: &mut Pose,
        snapshot: Pose,
        state: &mut MonteCarloState,
        reason: String,
    ) -> IterationRecord {
        warn!(iteration, residue, %reason, "Trial aborted; restoring the previous pose.");
        self.report(Progress::Message(format!(
            "Trial {iteration} at residue {residue} aborted ({reason})"
        )));
        *pose = snapshot;
        state.record_aborted();
        IterationRecord {
            iteration,
            residue,
            outcome: TrialOutcome::Aborted(reason),
            trial_score: None,
            score: state.current_score,
            reference_score: state.current_score,
        }
    }
}
