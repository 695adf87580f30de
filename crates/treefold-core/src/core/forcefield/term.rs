use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifies one energy term of a score function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScoreType {
    Vdw,
    Rama,
    Omega,
    LinearChainbreak,
    /// A term supplied by a caller-defined energy method.
    Custom(&'static str),
}

impl ScoreType {
    pub const BUILT_IN: [ScoreType; 4] = [
        ScoreType::Vdw,
        ScoreType::Rama,
        ScoreType::Omega,
        ScoreType::LinearChainbreak,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScoreType::Vdw => "vdw",
            ScoreType::Rama => "rama",
            ScoreType::Omega => "omega",
            ScoreType::LinearChainbreak => "linear_chainbreak",
            ScoreType::Custom(name) => name,
        }
    }

    pub fn is_built_in(&self) -> bool {
        !matches!(self, ScoreType::Custom(_))
    }
}

impl fmt::Display for ScoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown score term: '{0}'")]
pub struct ParseScoreTypeError(pub String);

impl FromStr for ScoreType {
    type Err = ParseScoreTypeError;

    /// Parses built-in term names; `-` and `_` are interchangeable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        ScoreType::BUILT_IN
            .into_iter()
            .find(|t| t.name() == normalized)
            .ok_or_else(|| ParseScoreTypeError(s.trim().to_string()))
    }
}

/// Weighted per-term energies of one pose, in the order the terms were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergyMap {
    terms: Vec<(ScoreType, f64)>,
    total: f64,
}

impl EnergyMap {
    pub(crate) fn push(&mut self, score_type: ScoreType, weighted: f64) {
        self.terms.push((score_type, weighted));
        self.total += weighted;
    }

    pub fn get(&self, score_type: ScoreType) -> Option<f64> {
        self.terms
            .iter()
            .find(|(t, _)| *t == score_type)
            .map(|&(_, e)| e)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScoreType, f64)> + '_ {
        self.terms.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.total
    }
}

impl fmt::Display for EnergyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (score_type, energy) in &self.terms {
            write!(f, "{score_type}: {energy:.3}  ")?;
        }
        write!(f, "total: {:.3}", self.total)
    }
}
