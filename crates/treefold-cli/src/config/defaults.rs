/// Built-in values used when neither the command line, `-S` overrides nor the
/// configuration file set a parameter.
pub struct DefaultsConfig {
    pub iterations: usize,
    pub temperature: f64,
    pub step_size: f64,
    pub recover_lowest: bool,
    pub extend_trailing: bool,
    pub chainbreak_weight: f64,
    pub minimizer_algorithm: String,
    pub minimizer_tolerance: f64,
    pub minimizer_max_iterations: usize,
    pub repack_max_passes: usize,
    pub repack_include_current: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            temperature: 1.0,
            step_size: 1.0,
            recover_lowest: false,
            extend_trailing: true,
            chainbreak_weight: 1.0,
            minimizer_algorithm: "lbfgs_armijo_atol".to_string(),
            minimizer_tolerance: 0.01,
            minimizer_max_iterations: 200,
            repack_max_passes: 2,
            repack_include_current: true,
        }
    }
}
