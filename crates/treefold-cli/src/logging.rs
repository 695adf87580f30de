use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

/// Maps `-v` occurrences to a level; `--quiet` keeps errors only.
pub fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the global subscriber: a compact stderr layer and, when
/// `log_file` is given, a plain-text file layer with thread ids and targets.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|e| CliError::FileParsing {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
            Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_thread_ids(true)
                    .with_target(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(level_for(verbosity, quiet))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Once;
    use tracing::{debug, error, info, trace, warn};

    static INIT: Once = Once::new();

    fn ensure_global_logger_is_set() {
        INIT.call_once(|| {
            setup_logging(3, false, None).expect("Failed to set up global logger for tests");
        });
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0, false), LevelFilter::WARN);
        assert_eq!(level_for(1, false), LevelFilter::INFO);
        assert_eq!(level_for(2, false), LevelFilter::DEBUG);
        assert_eq!(level_for(7, false), LevelFilter::TRACE);
        assert_eq!(level_for(0, true), LevelFilter::ERROR);
    }

    #[test]
    #[serial]
    fn global_logger_accepts_every_level() {
        ensure_global_logger_is_set();

        error!("error line");
        warn!(residue = 3, "warn line");
        info!("info line");
        debug!("debug line");
        trace!("trace line");
    }

    #[test]
    #[serial]
    fn second_installation_is_an_error() {
        ensure_global_logger_is_set();
        assert!(matches!(
            setup_logging(0, false, None),
            Err(CliError::Other(_))
        ));
    }

    #[test]
    #[serial]
    fn file_layer_writes_plain_records() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("trial.log");

        let file = File::create(&log_path).unwrap();
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_thread_ids(true),
        );
        tracing::subscriber::with_default(subscriber, || {
            debug!(iteration = 4, "Trial decided.");
        });

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("Trial decided."));
        assert!(content.contains("iteration=4"));
        assert!(content.contains("DEBUG"));
        assert!(content.contains("ThreadId"));
        assert!(!content.contains('\u{1b}'));
    }

    #[test]
    #[serial]
    fn unwritable_log_path_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = setup_logging(0, false, Some(dir.path()));
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
