mod defaults;
mod file;

pub use defaults::DefaultsConfig;
pub use file::FileConfig;

use crate::cli::SampleArgs;
use crate::error::{CliError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;
use treefold::core::forcefield::params::ScoreWeights;
use treefold::core::kinematics::builder::TrailingCoverage;
use treefold::engine::config::{
    FoldTreeConfig, RepackConfig, SamplingConfig, SamplingConfigBuilder,
};
use treefold::engine::tasks::minimize::MinimizerOptions;

/// Everything the `sample` command needs after merging all sources.
#[derive(Debug)]
pub struct AppConfig {
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub ss: Option<String>,
    pub trajectories: usize,
    pub sampling: SamplingConfig,
    pub weights: ScoreWeights,
}

/// Merges built-in defaults, the configuration file, `-S` overrides and
/// command-line flags, in increasing order of precedence.
pub fn build_config(args: &SampleArgs) -> Result<AppConfig> {
    let input_path = args.input.clone().ok_or(CliError::MissingInput)?;
    if args.trajectories == 0 {
        return Err(CliError::Argument(
            "--trajectories must be at least 1".to_string(),
        ));
    }

    let defaults = DefaultsConfig::default();
    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let mut file_config = apply_set_values(file_config, &args.set_values)?;
    debug!("Configuration after overrides: {:?}", file_config);

    let sampling_file = file_config.sampling.take().unwrap_or_default();
    let tree_file = file_config.fold_tree.take().unwrap_or_default();
    let min_file = file_config.minimizer.take().unwrap_or_default();
    let repack_file = file_config.repack.take().unwrap_or_default();

    let extend_trailing = if args.no_extend {
        false
    } else {
        tree_file.extend_trailing.unwrap_or(defaults.extend_trailing)
    };
    let fold_tree = FoldTreeConfig {
        coverage: if extend_trailing {
            TrailingCoverage::Extend
        } else {
            TrailingCoverage::Reject
        },
        chainbreak_weight: tree_file
            .chainbreak_weight
            .unwrap_or(defaults.chainbreak_weight),
    };

    let rotamer_library_path = match repack_file.rotamer_library {
        Some(path) if !path.exists() => {
            return Err(CliError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Rotamer library does not exist: {}", path.display()),
            )));
        }
        other => other,
    };
    let repack = RepackConfig {
        max_passes: repack_file.max_passes.unwrap_or(defaults.repack_max_passes),
        include_current: repack_file
            .include_current
            .unwrap_or(defaults.repack_include_current),
        rotamer_library_path,
    };

    let algorithm = args
        .minimizer
        .clone()
        .or(min_file.algorithm)
        .unwrap_or(defaults.minimizer_algorithm);
    let tolerance = args
        .tolerance
        .or(min_file.tolerance)
        .unwrap_or(defaults.minimizer_tolerance);
    let minimizer = MinimizerOptions::new(&algorithm, tolerance)
        .map_err(|e| CliError::Config(e.to_string()))?
        .max_iterations(
            min_file
                .max_iterations
                .unwrap_or(defaults.minimizer_max_iterations),
        );

    let sampling = SamplingConfigBuilder::new()
        .iterations(
            args.iterations
                .or(sampling_file.iterations)
                .unwrap_or(defaults.iterations),
        )
        .temperature(
            args.temperature
                .or(sampling_file.temperature)
                .unwrap_or(defaults.temperature),
        )
        .step_size(
            args.step_size
                .or(sampling_file.step_size)
                .unwrap_or(defaults.step_size),
        )
        .seed(args.seed.or(sampling_file.seed))
        .recover_lowest(
            sampling_file
                .recover_lowest
                .unwrap_or(defaults.recover_lowest),
        )
        .fold_tree(fold_tree)
        .repack(repack)
        .minimizer(minimizer)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig {
        input_path,
        output_path: args.output.clone(),
        ss: args.ss.clone(),
        trajectories: args.trajectories,
        sampling,
        weights: ScoreWeights::from_map(file_config.weights.take().unwrap_or_default()),
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();

        if let Some(term) = key.strip_prefix("weights.") {
            config
                .weights
                .get_or_insert_with(Default::default)
                .insert(term.to_string(), parse_value(key, value, "float")?);
            continue;
        }

        match key {
            "sampling.iterations" => {
                config.sampling.get_or_insert_with(Default::default).iterations =
                    Some(parse_value(key, value, "integer")?);
            }
            "sampling.temperature" => {
                config.sampling.get_or_insert_with(Default::default).temperature =
                    Some(parse_value(key, value, "float")?);
            }
            "sampling.step-size" => {
                config.sampling.get_or_insert_with(Default::default).step_size =
                    Some(parse_value(key, value, "float")?);
            }
            "sampling.seed" => {
                config.sampling.get_or_insert_with(Default::default).seed =
                    Some(parse_value(key, value, "integer")?);
            }
            "sampling.recover-lowest" => {
                config
                    .sampling
                    .get_or_insert_with(Default::default)
                    .recover_lowest = Some(parse_value(key, value, "boolean")?);
            }
            "fold-tree.extend-trailing" => {
                config
                    .fold_tree
                    .get_or_insert_with(Default::default)
                    .extend_trailing = Some(parse_value(key, value, "boolean")?);
            }
            "fold-tree.chainbreak-weight" => {
                config
                    .fold_tree
                    .get_or_insert_with(Default::default)
                    .chainbreak_weight = Some(parse_value(key, value, "float")?);
            }
            "minimizer.algorithm" => {
                config.minimizer.get_or_insert_with(Default::default).algorithm =
                    Some(value.trim().to_string());
            }
            "minimizer.tolerance" => {
                config.minimizer.get_or_insert_with(Default::default).tolerance =
                    Some(parse_value(key, value, "float")?);
            }
            "minimizer.max-iterations" => {
                config
                    .minimizer
                    .get_or_insert_with(Default::default)
                    .max_iterations = Some(parse_value(key, value, "integer")?);
            }
            "repack.max-passes" => {
                config.repack.get_or_insert_with(Default::default).max_passes =
                    Some(parse_value(key, value, "integer")?);
            }
            "repack.include-current" => {
                config
                    .repack
                    .get_or_insert_with(Default::default)
                    .include_current = Some(parse_value(key, value, "boolean")?);
            }
            "repack.rotamer-library" => {
                config
                    .repack
                    .get_or_insert_with(Default::default)
                    .rotamer_library = Some(PathBuf::from(value.trim()));
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
