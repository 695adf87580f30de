use crate::error::{CliError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSamplingConfig {
    pub iterations: Option<usize>,
    pub temperature: Option<f64>,
    pub step_size: Option<f64>,
    pub seed: Option<u64>,
    pub recover_lowest: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileFoldTreeConfig {
    pub extend_trailing: Option<bool>,
    pub chainbreak_weight: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileMinimizerConfig {
    pub algorithm: Option<String>,
    pub tolerance: Option<f64>,
    pub max_iterations: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileRepackConfig {
    pub max_passes: Option<usize>,
    pub include_current: Option<bool>,
    pub rotamer_library: Option<PathBuf>,
}

/// The configuration file as written by the user; every field is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub sampling: Option<FileSamplingConfig>,
    pub fold_tree: Option<FileFoldTreeConfig>,
    pub minimizer: Option<FileMinimizerConfig>,
    pub repack: Option<FileRepackConfig>,
    pub weights: Option<BTreeMap<String, f64>>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kebab_case_sections() {
        let config: FileConfig = toml::from_str(
            r#"
            [sampling]
            iterations = 25
            step-size = 2.5
            recover-lowest = true

            [fold-tree]
            extend-trailing = false

            [minimizer]
            algorithm = "steepest_descent"
            max-iterations = 10

            [repack]
            rotamer-library = "lib/rotamers.toml"

            [weights]
            vdw = 0.5
            linear_chainbreak = 2.0
            "#,
        )
        .unwrap();

        let sampling = config.sampling.unwrap();
        assert_eq!(sampling.iterations, Some(25));
        assert_eq!(sampling.step_size, Some(2.5));
        assert_eq!(sampling.recover_lowest, Some(true));
        assert_eq!(sampling.temperature, None);
        assert_eq!(config.fold_tree.unwrap().extend_trailing, Some(false));
        assert_eq!(config.minimizer.unwrap().max_iterations, Some(10));
        assert_eq!(
            config.repack.unwrap().rotamer_library,
            Some(PathBuf::from("lib/rotamers.toml"))
        );
        assert_eq!(config.weights.unwrap().get("linear_chainbreak"), Some(&2.0));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<FileConfig>("[sampling]\nkt = 1.0\n").is_err());
        assert!(toml::from_str::<FileConfig>("[annealing]\n").is_err());
    }

    #[test]
    fn from_file_reports_the_offending_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[sampling]\niterations = \"many\"\n").unwrap();

        match FileConfig::from_file(&path) {
            Err(CliError::FileParsing { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileConfig::from_file(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
