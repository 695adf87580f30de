use crate::core::forcefield::scoring::ScoreFunction;
use crate::core::models::pose::Pose;
use crate::engine::config::SamplingConfig;
use crate::engine::error::EngineError;
use crate::engine::monte_carlo::MonteCarloLoop;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::SamplingReport;
use crate::engine::tasks::minimize::Minimizer;
use crate::engine::tasks::repack::Repacker;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Runs one Monte Carlo trajectory of `config.iterations` trials.
///
/// The random stream is seeded from `config.seed`, or from system entropy
/// when no seed is given.
#[instrument(skip_all, name = "sampling_workflow")]
pub fn run(
    pose: Pose,
    sfxn: &ScoreFunction,
    repacker: &dyn Repacker,
    minimizer: &dyn Minimizer,
    config: &SamplingConfig,
    reporter: &ProgressReporter,
) -> Result<SamplingReport, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Monte Carlo Sampling",
    });
    let mut rng = seeded_rng(config.seed);
    let report = MonteCarloLoop::new(sfxn, repacker, minimizer, config)
        .with_reporter(reporter)
        .run(pose, config.iterations, &mut rng)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        accepted = report.accepted_count,
        total = report.total_trials,
        best_score = report.best_score,
        "Sampling workflow complete."
    );
    Ok(report)
}

/// Runs `count` independent trajectories from the same starting pose.
///
/// Trajectory `i` is seeded with `base + i`, where `base` is `config.seed` or
/// a random value. With the `parallel` feature the trajectories run on the
/// rayon thread pool; each trajectory itself stays sequential. Reports come
/// back in trajectory order.
#[instrument(skip_all, name = "multi_trajectory_workflow")]
pub fn run_trajectories(
    pose: &Pose,
    sfxn: &ScoreFunction,
    repacker: &dyn Repacker,
    minimizer: &dyn Minimizer,
    config: &SamplingConfig,
    count: usize,
    reporter: &ProgressReporter,
) -> Result<Vec<SamplingReport>, EngineError> {
    let base = config.seed.unwrap_or_else(|| ChaCha8Rng::from_entropy().r#gen());
    info!(count, base_seed = base, "Starting independent trajectories.");
    reporter.report(Progress::PhaseStart {
        name: "Independent Trajectories",
    });
    reporter.report(Progress::TaskStart {
        total_steps: count as u64,
    });

    let trajectory = |index: usize| -> Result<SamplingReport, EngineError> {
        let mut rng = ChaCha8Rng::seed_from_u64(base.wrapping_add(index as u64));
        let report = MonteCarloLoop::new(sfxn, repacker, minimizer, config).run(
            pose.clone(),
            config.iterations,
            &mut rng,
        )?;
        reporter.report(Progress::StatusUpdate {
            text: format!(
                "Trajectory {} finished: {}/{} accepted, final score {:.3}",
                index + 1,
                report.accepted_count,
                report.total_trials,
                report.final_score
            ),
        });
        reporter.report(Progress::TaskIncrement);
        Ok(report)
    };

    #[cfg(feature = "parallel")]
    let reports = (0..count).into_par_iter().map(trajectory).collect::<Result<Vec<_>, _>>()?;
    #[cfg(not(feature = "parallel"))]
    let reports = (0..count).map(trajectory).collect::<Result<Vec<_>, _>>()?;

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::term::ScoreType;
    use crate::engine::config::SamplingConfigBuilder;
    use crate::engine::tasks::minimize::TorsionMinimizer;
    use crate::engine::tasks::repack::GreedyRepacker;
    use std::sync::Mutex;

    fn backbone_sfxn() -> ScoreFunction {
        let mut sfxn = ScoreFunction::empty();
        sfxn.set_weight(ScoreType::Rama, 1.0).unwrap();
        sfxn.set_weight(ScoreType::Omega, 0.5).unwrap();
        sfxn
    }

    fn config(iterations: usize, seed: Option<u64>) -> SamplingConfig {
        let mut config = SamplingConfigBuilder::new()
            .iterations(iterations)
            .temperature(1.0)
            .step_size(10.0)
            .seed(seed)
            .build()
            .unwrap();
        config.minimizer = config.minimizer.clone().max_iterations(2);
        config
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let pose = Pose::from_sequence("AVLGS").unwrap();
        let sfxn = backbone_sfxn();
        let repacker = GreedyRepacker::default().max_passes(1);
        let config = config(6, Some(42));
        let reporter = ProgressReporter::new();

        let a = run(pose.clone(), &sfxn, &repacker, &TorsionMinimizer, &config, &reporter).unwrap();
        let b = run(pose, &sfxn, &repacker, &TorsionMinimizer, &config, &reporter).unwrap();
        assert_eq!(a.records, b.records);
        assert_eq!(a.final_score, b.final_score);
    }

    #[test]
    fn reporter_sees_phases_and_every_trial() {
        let pose = Pose::from_sequence("AAAA").unwrap();
        let sfxn = backbone_sfxn();
        let trials = Mutex::new(0usize);
        let phases = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
            Progress::TrialFinished { .. } => *trials.lock().unwrap() += 1,
            Progress::PhaseStart { name } => phases.lock().unwrap().push(name),
            _ => {}
        }));

        run(pose, &sfxn, &GreedyRepacker::default(), &TorsionMinimizer, &config(4, Some(1)), &reporter)
            .unwrap();
        drop(reporter);
        assert_eq!(trials.into_inner().unwrap(), 4);
        assert_eq!(phases.into_inner().unwrap(), vec!["Monte Carlo Sampling"]);
    }

    #[test]
    fn trajectories_use_consecutive_seeds() {
        let pose = Pose::from_sequence("AVLGS").unwrap();
        let sfxn = backbone_sfxn();
        let repacker = GreedyRepacker::default().max_passes(1);
        let reporter = ProgressReporter::new();

        let reports = run_trajectories(
            &pose,
            &sfxn,
            &repacker,
            &TorsionMinimizer,
            &config(3, Some(100)),
            3,
            &reporter,
        )
        .unwrap();
        assert_eq!(reports.len(), 3);

        let second = run(pose, &sfxn, &repacker, &TorsionMinimizer, &config(3, Some(101)), &reporter)
            .unwrap();
        assert_eq!(reports[1].records, second.records);
    }

    #[test]
    fn each_finished_trajectory_posts_a_status() {
        let pose = Pose::from_sequence("AVLGS").unwrap();
        let sfxn = backbone_sfxn();
        let statuses = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::StatusUpdate { text } = event {
                statuses.lock().unwrap().push(text);
            }
        }));

        run_trajectories(
            &pose,
            &sfxn,
            &GreedyRepacker::default().max_passes(1),
            &TorsionMinimizer,
            &config(2, Some(5)),
            3,
            &reporter,
        )
        .unwrap();
        drop(reporter);

        let mut statuses = statuses.into_inner().unwrap();
        statuses.sort();
        assert_eq!(statuses.len(), 3);
        for (i, text) in statuses.iter().enumerate() {
            assert!(text.starts_with(&format!("Trajectory {} finished: ", i + 1)));
            assert!(text.contains("/2 accepted"));
        }
    }
}
