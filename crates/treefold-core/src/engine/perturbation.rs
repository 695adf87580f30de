use crate::core::models::ids::SeqPos;
use crate::core::models::pose::{Pose, PoseError};
use crate::core::models::torsion::TorsionKind;
use rand::Rng;
use rand_distr::StandardNormal;

/// A proposed change of one residue's phi and psi, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perturbation {
    pub residue: SeqPos,
    pub d_phi: f64,
    pub d_psi: f64,
}

impl Perturbation {
    /// Adds the deltas to the residue's current torsions.
    pub fn apply(&self, pose: &mut Pose) -> Result<(), PoseError> {
        let phi = pose.phi(self.residue)?;
        let psi = pose.psi(self.residue)?;
        pose.set_torsion(self.residue, TorsionKind::Phi, phi + self.d_phi)?;
        pose.set_torsion(self.residue, TorsionKind::Psi, psi + self.d_psi)
    }
}

/// Draws random backbone perturbations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerturbationSampler {
    step_size: f64,
}

impl Default for PerturbationSampler {
    fn default() -> Self {
        Self { step_size: 1.0 }
    }
}

impl PerturbationSampler {
    pub fn new(step_size: f64) -> Self {
        Self { step_size }
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Picks a residue uniformly and draws both deltas from N(0, step_size²).
    pub fn propose<R: Rng + ?Sized>(&self, pose: &Pose, rng: &mut R) -> Perturbation {
        let residue = rng.gen_range(1..=pose.len().max(1));
        let d_phi: f64 = rng.sample(StandardNormal);
        let d_psi: f64 = rng.sample(StandardNormal);
        Perturbation {
            residue,
            d_phi: d_phi * self.step_size,
            d_psi: d_psi * self.step_size,
        }
    }
}
