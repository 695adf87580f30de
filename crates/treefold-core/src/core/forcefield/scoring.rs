use super::methods::{LinearChainbreakEnergy, OmegaEnergy, RamaEnergy, VdwEnergy};
use super::term::{EnergyMap, ScoreType};
use crate::core::models::ids::SeqPos;
use crate::core::models::pose::Pose;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Energy term '{term}' evaluated to a non-finite value ({value})")]
    NonFinite { term: String, value: f64 },
    #[error("Unknown score term '{0}'")]
    UnknownTerm(String),
    #[error("Invalid weight {weight} for term '{term}'")]
    InvalidWeight { term: String, weight: f64 },
    #[error("Residue {seqpos} is out of range for a pose of {len} residues")]
    ResidueOutOfRange { seqpos: SeqPos, len: usize },
}

/// One unweighted energy term evaluated over a pose.
pub trait EnergyMethod: Send + Sync + fmt::Debug {
    fn score_type(&self) -> ScoreType;

    fn evaluate(&self, pose: &Pose) -> f64;

    /// Energy attributable to one residue. Methods without a per-residue
    /// decomposition report their full value.
    fn residue_energy(&self, pose: &Pose, seqpos: SeqPos) -> f64 {
        let _ = seqpos;
        self.evaluate(pose)
    }
}

#[derive(Debug, Clone)]
struct WeightedTerm {
    method: Arc<dyn EnergyMethod>,
    weight: f64,
}

/// A weighted sum of energy methods.
///
/// Terms with zero weight are kept (so their weight can be read back) but are
/// never evaluated.
#[derive(Debug, Clone, Default)]
pub struct ScoreFunction {
    terms: Vec<WeightedTerm>,
}

fn built_in_method(score_type: ScoreType) -> Option<Arc<dyn EnergyMethod>> {
    match score_type {
        ScoreType::Vdw => Some(Arc::new(VdwEnergy::default())),
        ScoreType::Rama => Some(Arc::new(RamaEnergy)),
        ScoreType::Omega => Some(Arc::new(OmegaEnergy)),
        ScoreType::LinearChainbreak => Some(Arc::new(LinearChainbreakEnergy)),
        ScoreType::Custom(_) => None,
    }
}

impl ScoreFunction {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Default weights: `vdw` 1.0, `rama` 0.5, `omega` 0.5.
    pub fn standard() -> Self {
        let mut sfxn = Self::empty();
        sfxn.add_method(Arc::new(VdwEnergy::default()), 1.0)
            .add_method(Arc::new(RamaEnergy), 0.5)
            .add_method(Arc::new(OmegaEnergy), 0.5);
        sfxn
    }

    /// Adds `method`, replacing any method with the same score type.
    pub fn add_method(&mut self, method: Arc<dyn EnergyMethod>, weight: f64) -> &mut Self {
        let score_type = method.score_type();
        let term = WeightedTerm { method, weight };
        match self
            .terms
            .iter_mut()
            .find(|t| t.method.score_type() == score_type)
        {
            Some(existing) => *existing = term,
            None => self.terms.push(term),
        }
        self
    }

    /// Sets the weight of a term, instantiating built-in terms on demand.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::UnknownTerm`] for a custom term that was never
    /// added and [`ScoringError::InvalidWeight`] for a non-finite weight.
    pub fn set_weight(&mut self, score_type: ScoreType, weight: f64) -> Result<(), ScoringError> {
        if !weight.is_finite() {
            return Err(ScoringError::InvalidWeight {
                term: score_type.to_string(),
                weight,
            });
        }
        if let Some(term) = self
            .terms
            .iter_mut()
            .find(|t| t.method.score_type() == score_type)
        {
            term.weight = weight;
            return Ok(());
        }
        let method = built_in_method(score_type)
            .ok_or_else(|| ScoringError::UnknownTerm(score_type.to_string()))?;
        self.terms.push(WeightedTerm { method, weight });
        Ok(())
    }

    pub fn weight(&self, score_type: ScoreType) -> f64 {
        self.terms
            .iter()
            .find(|t| t.method.score_type() == score_type)
            .map_or(0.0, |t| t.weight)
    }

    pub fn score_types(&self) -> Vec<ScoreType> {
        self.terms.iter().map(|t| t.method.score_type()).collect()
    }

    fn active_terms(&self) -> impl Iterator<Item = &WeightedTerm> {
        self.terms.iter().filter(|t| t.weight != 0.0)
    }

    /// Weighted per-term breakdown of the energy of `pose`.
    pub fn score(&self, pose: &Pose) -> Result<EnergyMap, ScoringError> {
        let mut map = EnergyMap::default();
        for term in self.active_terms() {
            let score_type = term.method.score_type();
            let weighted = term.weight * term.method.evaluate(pose);
            check_finite(&score_type.to_string(), weighted)?;
            map.push(score_type, weighted);
        }
        check_finite("total", map.total())?;
        Ok(map)
    }

    pub fn total(&self, pose: &Pose) -> Result<f64, ScoringError> {
        self.score(pose).map(|map| map.total())
    }

    /// Weighted energy attributable to one residue.
    pub fn residue_energy(&self, pose: &Pose, seqpos: SeqPos) -> Result<f64, ScoringError> {
        if seqpos == 0 || seqpos > pose.len() {
            return Err(ScoringError::ResidueOutOfRange {
                seqpos,
                len: pose.len(),
            });
        }
        let mut total = 0.0;
        for term in self.active_terms() {
            let weighted = term.weight * term.method.residue_energy(pose, seqpos);
            check_finite(term.method.score_type().name(), weighted)?;
            total += weighted;
        }
        check_finite("total", total)?;
        Ok(total)
    }
}

fn check_finite(term: &str, value: f64) -> Result<(), ScoringError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ScoringError::NonFinite {
            term: term.to_string(),
            value,
        })
    }
}
