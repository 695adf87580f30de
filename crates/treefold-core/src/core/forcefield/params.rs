use super::scoring::{ScoreFunction, ScoringError};
use super::term::ScoreType;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeightsLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Unknown score term '{0}' in weights")]
    UnknownTerm(String),
    #[error("Could not apply weights: {0}")]
    Scoring(#[from] ScoringError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WeightsFile {
    weights: BTreeMap<String, f64>,
}

/// Term weights keyed by term name, as read from a `[weights]` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreWeights {
    weights: BTreeMap<String, f64>,
}

impl ScoreWeights {
    pub fn from_map(weights: BTreeMap<String, f64>) -> Self {
        Self { weights }
    }

    /// Reads a TOML file containing a `[weights]` table.
    pub fn load(path: &Path) -> Result<Self, WeightsLoadError> {
        let display = path.to_string_lossy().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| WeightsLoadError::Io {
            path: display.clone(),
            source: e,
        })?;
        Self::parse(&content, &display)
    }

    fn parse(content: &str, origin: &str) -> Result<Self, WeightsLoadError> {
        let file: WeightsFile = toml::from_str(content).map_err(|e| WeightsLoadError::Toml {
            path: origin.to_string(),
            source: e,
        })?;
        Ok(Self::from_map(file.weights))
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.weights.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(name, &w)| (name.as_str(), w))
    }

    /// Sets every listed weight on `sfxn`. Names are validated before any
    /// weight is changed.
    pub fn apply_to(&self, sfxn: &mut ScoreFunction) -> Result<(), WeightsLoadError> {
        let parsed = self
            .weights
            .iter()
            .map(|(name, &weight)| {
                name.parse::<ScoreType>()
                    .map(|score_type| (score_type, weight))
                    .map_err(|_| WeightsLoadError::UnknownTerm(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        for (score_type, weight) in parsed {
            sfxn.set_weight(score_type, weight)?;
        }
        Ok(())
    }
}
