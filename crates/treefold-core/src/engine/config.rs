use super::tasks::minimize::MinimizerOptions;
use crate::core::kinematics::builder::TrailingCoverage;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    Invalid {
        parameter: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoldTreeConfig {
    pub coverage: TrailingCoverage,
    /// Weight given to `linear_chainbreak` when the tree has cutpoints.
    pub chainbreak_weight: f64,
}

impl Default for FoldTreeConfig {
    fn default() -> Self {
        Self {
            coverage: TrailingCoverage::Extend,
            chainbreak_weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepackConfig {
    pub max_passes: usize,
    pub include_current: bool,
    /// Rotamer library file; the built-in grid library when absent.
    pub rotamer_library_path: Option<PathBuf>,
}

impl Default for RepackConfig {
    fn default() -> Self {
        Self {
            max_passes: 2,
            include_current: true,
            rotamer_library_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    pub iterations: usize,
    /// Metropolis temperature kT; zero rejects every uphill move.
    pub temperature: f64,
    /// Standard deviation of phi/psi perturbations, in degrees.
    pub step_size: f64,
    pub seed: Option<u64>,
    /// Return the lowest-scoring pose as the final pose.
    pub recover_lowest: bool,
    pub fold_tree: FoldTreeConfig,
    pub repack: RepackConfig,
    pub minimizer: MinimizerOptions,
}

#[derive(Default)]
pub struct SamplingConfigBuilder {
    iterations: Option<usize>,
    temperature: Option<f64>,
    step_size: Option<f64>,
    seed: Option<u64>,
    recover_lowest: bool,
    fold_tree: Option<FoldTreeConfig>,
    repack: Option<RepackConfig>,
    minimizer: Option<MinimizerOptions>,
}

impl SamplingConfigBuilder {
    pub const DEFAULT_STEP_SIZE: f64 = 1.0;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = Some(iterations);
        self
    }
    pub fn temperature(mut self, kt: f64) -> Self {
        self.temperature = Some(kt);
        self
    }
    pub fn step_size(mut self, degrees: f64) -> Self {
        self.step_size = Some(degrees);
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
    pub fn recover_lowest(mut self, recover: bool) -> Self {
        self.recover_lowest = recover;
        self
    }
    pub fn fold_tree(mut self, config: FoldTreeConfig) -> Self {
        self.fold_tree = Some(config);
        self
    }
    pub fn repack(mut self, config: RepackConfig) -> Self {
        self.repack = Some(config);
        self
    }
    pub fn minimizer(mut self, options: MinimizerOptions) -> Self {
        self.minimizer = Some(options);
        self
    }

    pub fn build(self) -> Result<SamplingConfig, ConfigError> {
        let iterations = self
            .iterations
            .ok_or(ConfigError::MissingParameter("iterations"))?;
        let temperature = self
            .temperature
            .ok_or(ConfigError::MissingParameter("temperature"))?;
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(invalid("temperature", "must be finite and non-negative", temperature));
        }
        let step_size = self.step_size.unwrap_or(Self::DEFAULT_STEP_SIZE);
        if !step_size.is_finite() || step_size <= 0.0 {
            return Err(invalid("step_size", "must be finite and positive", step_size));
        }

        let fold_tree = self.fold_tree.unwrap_or_default();
        if !fold_tree.chainbreak_weight.is_finite() || fold_tree.chainbreak_weight < 0.0 {
            return Err(invalid(
                "chainbreak_weight",
                "must be finite and non-negative",
                fold_tree.chainbreak_weight,
            ));
        }
        let repack = self.repack.unwrap_or_default();
        if repack.max_passes == 0 {
            return Err(ConfigError::Invalid {
                parameter: "max_passes",
                reason: "at least one packing pass is required".to_string(),
            });
        }

        Ok(SamplingConfig {
            iterations,
            temperature,
            step_size,
            seed: self.seed,
            recover_lowest: self.recover_lowest,
            fold_tree,
            repack,
            minimizer: self.minimizer.unwrap_or_default(),
        })
    }
}

fn invalid(parameter: &'static str, requirement: &str, value: f64) -> ConfigError {
    ConfigError::Invalid {
        parameter,
        reason: format!("{requirement}, got {value}"),
    }
}
