use crate::cli::SampleArgs;
use crate::config::{AppConfig, build_config};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;
use treefold::{
    core::forcefield::scoring::ScoreFunction,
    core::io::{pdb::PdbFile, traits::StructureFile},
    core::rotamers::library::RotamerLibrary,
    engine::progress::ProgressReporter,
    engine::state::{IterationRecord, SamplingReport},
    engine::tasks::{minimize::TorsionMinimizer, repack::GreedyRepacker},
    workflows,
};

pub fn run(args: SampleArgs, show_progress: bool) -> Result<()> {
    let app = build_config(&args)?;

    info!("Loading input structure from {:?}", &app.input_path);
    let mut pose = PdbFile::read_from_path(&app.input_path).map_err(|e| CliError::FileParsing {
        path: app.input_path.clone(),
        source: e.into(),
    })?;

    let mut sfxn = ScoreFunction::standard();
    app.weights
        .apply_to(&mut sfxn)
        .map_err(|e| CliError::Config(e.to_string()))?;

    let tree = workflows::setup::prepare(
        &mut pose,
        app.ss.as_deref(),
        &app.sampling.fold_tree,
        &mut sfxn,
    )?;
    info!("Using {}", tree);

    let repacker = build_repacker(&app)?;
    let minimizer = TorsionMinimizer;

    let mut progress_handler = if show_progress {
        CliProgressHandler::new()
    } else {
        CliProgressHandler::hidden()
    };
    // A single trajectory prints its outcomes live; parallel ones would interleave.
    let live_trials = app.trajectories == 1;
    if live_trials {
        progress_handler = progress_handler.echo_trials_to(Arc::new(Mutex::new(std::io::stdout())));
    }
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let reports = if live_trials {
        vec![workflows::sample::run(
            pose,
            &sfxn,
            &repacker,
            &minimizer,
            &app.sampling,
            &reporter,
        )?]
    } else {
        workflows::sample::run_trajectories(
            &pose,
            &sfxn,
            &repacker,
            &minimizer,
            &app.sampling,
            app.trajectories,
            &reporter,
        )?
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for (i, report) in reports.iter().enumerate() {
        if reports.len() > 1 {
            writeln!(out, "Trajectory {}", i + 1)?;
        }
        if !live_trials {
            write_trial_lines(&mut out, &report.records)?;
        }
        write_summary(&mut out, report, app.sampling.iterations)?;
    }

    if let Some(output) = &app.output_path {
        for (i, report) in reports.iter().enumerate() {
            let output_path = generate_output_path(output, i + 1, reports.len());
            info!(
                "Writing trajectory {} (score {:.4}) to {:?}",
                i + 1,
                report.final_score,
                &output_path
            );
            PdbFile::write_to_path(&report.final_pose, &output_path).map_err(|e| {
                CliError::FileParsing {
                    path: output_path.clone(),
                    source: e.into(),
                }
            })?;
            writeln!(out, "Final structure written to: {}", output_path.display())?;
        }
    }

    Ok(())
}

fn build_repacker(app: &AppConfig) -> Result<GreedyRepacker> {
    let repack = &app.sampling.repack;
    let library = match &repack.rotamer_library_path {
        Some(path) => {
            info!("Loading rotamer library from {:?}", path);
            RotamerLibrary::load(path).map_err(|e| CliError::FileParsing {
                path: path.clone(),
                source: e.into(),
            })?
        }
        None => RotamerLibrary::standard(),
    };
    Ok(GreedyRepacker::new(library)
        .max_passes(repack.max_passes)
        .include_current(repack.include_current))
}

pub fn write_trial_lines(out: &mut impl Write, records: &[IterationRecord]) -> std::io::Result<()> {
    for record in records {
        writeln!(out, "{}", record.outcome.label())?;
    }
    Ok(())
}

/// Prints the acceptance summary of a finished trajectory.
///
/// The averages are taken over `iterations`, which equals the number of
/// recorded trials for a completed run.
pub fn write_summary(out: &mut impl Write, report: &SamplingReport, iterations: usize) -> std::io::Result<()> {
    writeln!(
        out,
        "{} cycles were accepted out of {}",
        report.accepted_count, iterations
    )?;
    let fraction = report.acceptance_rate.unwrap_or(0.0);
    writeln!(out, "Percent Accepted: {:.4}", fraction)?;
    match report.average_score {
        Some(average) => writeln!(out, "Average Score: {:.4}", average),
        None => writeln!(out, "Average Score: n/a"),
    }
}

fn generate_output_path(base: &Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 {
        return base.to_path_buf();
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("trajectory");
    let file_name = match base.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, index, ext),
        None => format!("{}_{}", stem, index),
    };
    base.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use treefold::core::models::pose::Pose;

    fn write_input(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("input.pdb");
        let pose = Pose::from_sequence("AGSVAK").unwrap();
        PdbFile::write_to_path(&pose, &path).unwrap();
        path
    }

    fn quick_args(input: PathBuf) -> SampleArgs {
        SampleArgs {
            input: Some(input),
            iterations: Some(4),
            temperature: Some(1.0),
            seed: Some(17),
            step_size: Some(5.0),
            trajectories: 1,
            set_values: vec![
                "minimizer.max-iterations=2".to_string(),
                "repack.max-passes=1".to_string(),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn output_paths_are_numbered_only_for_several_trajectories() {
        let base = Path::new("/tmp/out/final.pdb");
        assert_eq!(generate_output_path(base, 1, 1), PathBuf::from("/tmp/out/final.pdb"));
        assert_eq!(generate_output_path(base, 2, 3), PathBuf::from("/tmp/out/final_2.pdb"));
        assert_eq!(
            generate_output_path(Path::new("model"), 1, 2),
            PathBuf::from("model_1")
        );
    }

    #[test]
    fn missing_input_fails_before_reading_anything() {
        let args = SampleArgs {
            trajectories: 1,
            ..Default::default()
        };
        assert!(matches!(run(args, false), Err(CliError::MissingInput)));
    }

    #[test]
    fn unreadable_input_is_a_parsing_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.pdb");
        std::fs::write(&path, "REMARK nothing here\nEND\n").unwrap();
        assert!(matches!(
            run(quick_args(path), false),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn sampling_writes_the_final_structure() {
        let dir = tempdir().unwrap();
        let input = write_input(&dir);
        let output = dir.path().join("final.pdb");

        let mut args = quick_args(input);
        args.ss = Some(" HHHH ".to_string());
        args.output = Some(output.clone());
        run(args, false).unwrap();

        let pose = PdbFile::read_from_path(&output).unwrap();
        assert_eq!(pose.sequence(), "AGSVAK");
    }

    #[test]
    fn several_trajectories_write_numbered_files() {
        let dir = tempdir().unwrap();
        let input = write_input(&dir);
        let output = dir.path().join("traj.pdb");

        let mut args = quick_args(input);
        args.iterations = Some(2);
        args.trajectories = 2;
        args.output = Some(output);
        run(args, false).unwrap();

        assert!(dir.path().join("traj_1.pdb").exists());
        assert!(dir.path().join("traj_2.pdb").exists());
        assert!(!dir.path().join("traj.pdb").exists());
    }

    #[test]
    fn report_lists_every_trial_and_the_summary() {
        let dir = tempdir().unwrap();
        let input = write_input(&dir);
        let app = build_config(&quick_args(input.clone())).unwrap();
        let pose = PdbFile::read_from_path(&input).unwrap();
        let report = workflows::sample::run(
            pose,
            &ScoreFunction::standard(),
            &build_repacker(&app).unwrap(),
            &TorsionMinimizer,
            &app.sampling,
            &ProgressReporter::new(),
        )
        .unwrap();

        let mut buffer = Vec::new();
        write_trial_lines(&mut buffer, &report.records).unwrap();
        write_summary(&mut buffer, &report, app.sampling.iterations).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4 + 3);
        assert!(
            lines[..4]
                .iter()
                .all(|l| *l == "accepted" || *l == "rejected")
        );
        let accepted = lines[..4].iter().filter(|l| **l == "accepted").count();
        assert_eq!(accepted, report.accepted_count);
        assert_eq!(
            lines[4],
            format!("{} cycles were accepted out of 4", accepted)
        );
        assert!(lines[5].starts_with("Percent Accepted: "));
        assert!(lines[6].starts_with("Average Score: "));
    }

    #[test]
    fn trial_lines_are_printed_while_sampling() {
        let dir = tempdir().unwrap();
        let input = write_input(&dir);
        let app = build_config(&quick_args(input.clone())).unwrap();
        let pose = PdbFile::read_from_path(&input).unwrap();

        let sink = Arc::new(Mutex::new(Vec::<u8>::new()));
        let handler = CliProgressHandler::hidden().echo_trials_to(sink.clone());
        let lines_seen = Mutex::new(Vec::new());
        let callback = handler.get_callback();
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            let finished = matches!(event, treefold::engine::progress::Progress::TrialFinished { .. });
            callback(event);
            if finished {
                let printed = String::from_utf8(sink.lock().unwrap().clone()).unwrap();
                lines_seen.lock().unwrap().push(printed.lines().count());
            }
        }));

        let report = workflows::sample::run(
            pose,
            &ScoreFunction::standard(),
            &build_repacker(&app).unwrap(),
            &TorsionMinimizer,
            &app.sampling,
            &reporter,
        )
        .unwrap();
        drop(reporter);

        assert_eq!(lines_seen.into_inner().unwrap(), vec![1, 2, 3, 4]);
        let mut expected = Vec::new();
        write_trial_lines(&mut expected, &report.records).unwrap();
        assert_eq!(*sink.lock().unwrap(), expected);
    }
}
