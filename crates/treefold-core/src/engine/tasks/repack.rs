use crate::core::forcefield::scoring::{ScoreFunction, ScoringError};
use crate::core::models::ids::SeqPos;
use crate::core::models::pose::{Pose, PoseError};
use crate::core::rotamers::library::RotamerLibrary;
use crate::core::utils::geometry::angle_difference;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepackError {
    #[error("Task allows sequence design, which this packer does not support")]
    DesignNotSupported,
    #[error("Packer task covers {task} residues but the pose has {pose}")]
    SizeMismatch { task: usize, pose: usize },
    #[error("Scoring failed while packing: {0}")]
    Scoring(#[from] ScoringError),
    #[error("Could not place rotamer: {0}")]
    Pose(#[from] PoseError),
}

/// Which residues a packer may change, and whether it may change their identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackerTask {
    packable: Vec<bool>,
    design: bool,
}

impl PackerTask {
    /// Every residue packable, design allowed.
    pub fn repack_all(pose: &Pose) -> Self {
        Self {
            packable: vec![true; pose.len()],
            design: true,
        }
    }

    /// Forbids identity changes; side chains may still move.
    pub fn restrict_to_repacking(mut self) -> Self {
        self.design = false;
        self
    }

    pub fn prevent_repacking(mut self, seqpos: SeqPos) -> Self {
        if let Some(flag) = seqpos.checked_sub(1).and_then(|i| self.packable.get_mut(i)) {
            *flag = false;
        }
        self
    }

    pub fn is_packable(&self, seqpos: SeqPos) -> bool {
        seqpos
            .checked_sub(1)
            .and_then(|i| self.packable.get(i))
            .copied()
            .unwrap_or(false)
    }

    pub fn allows_design(&self) -> bool {
        self.design
    }

    pub fn len(&self) -> usize {
        self.packable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packable.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepackOutcome {
    Repacked { residues_changed: usize },
    /// No packable residue has a rotamer to try.
    NothingToPack,
}

/// Side-chain packing over the residues a task allows.
pub trait Repacker: Send + Sync {
    fn repack(
        &self,
        pose: &mut Pose,
        sfxn: &ScoreFunction,
        task: &PackerTask,
    ) -> Result<RepackOutcome, RepackError>;
}

/// Packs one residue at a time, keeping the rotamer with the lowest residue
/// energy, and sweeps the chain until a pass changes nothing.
#[derive(Debug, Clone)]
pub struct GreedyRepacker {
    library: RotamerLibrary,
    max_passes: usize,
    include_current: bool,
}

impl Default for GreedyRepacker {
    fn default() -> Self {
        Self::new(RotamerLibrary::standard())
    }
}

impl GreedyRepacker {
    pub fn new(library: RotamerLibrary) -> Self {
        Self {
            library,
            max_passes: 2,
            include_current: true,
        }
    }

    pub fn max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes.max(1);
        self
    }

    /// When set, a residue keeps its current side chain unless a rotamer
    /// scores strictly lower, so packing never raises a residue's energy.
    pub fn include_current(mut self, include: bool) -> Self {
        self.include_current = include;
        self
    }

    fn pack_residue(
        &self,
        pose: &mut Pose,
        sfxn: &ScoreFunction,
        seqpos: SeqPos,
    ) -> Result<bool, RepackError> {
        let Some(residue) = pose.residue(seqpos) else {
            return Ok(false);
        };
        let aa = residue.aa();
        let current = residue.chis().to_vec();

        let mut best_chis = current.clone();
        let mut best_energy = if self.include_current {
            sfxn.residue_energy(pose, seqpos)?
        } else {
            f64::INFINITY
        };
        for rotamer in self.library.rotamers_for(aa) {
            pose.set_chis(seqpos, &rotamer.chis)?;
            let energy = sfxn.residue_energy(pose, seqpos)?;
            if energy < best_energy {
                best_energy = energy;
                best_chis.clone_from(&rotamer.chis);
            }
        }
        pose.set_chis(seqpos, &best_chis)?;

        let changed = best_chis
            .iter()
            .zip(&current)
            .any(|(a, b)| angle_difference(*a, *b) > 1e-9);
        Ok(changed)
    }
}

impl Repacker for GreedyRepacker {
    fn repack(
        &self,
        pose: &mut Pose,
        sfxn: &ScoreFunction,
        task: &PackerTask,
    ) -> Result<RepackOutcome, RepackError> {
        if task.allows_design() {
            return Err(RepackError::DesignNotSupported);
        }
        if task.len() != pose.len() {
            return Err(RepackError::SizeMismatch {
                task: task.len(),
                pose: pose.len(),
            });
        }

        let targets: Vec<SeqPos> = pose
            .residues()
            .iter()
            .enumerate()
            .map(|(index, residue)| (index + 1, residue.aa()))
            .filter(|&(seqpos, aa)| {
                task.is_packable(seqpos) && !self.library.rotamers_for(aa).is_empty()
            })
            .map(|(seqpos, _)| seqpos)
            .collect();
        if targets.is_empty() {
            return Ok(RepackOutcome::NothingToPack);
        }

        let mut changed = BTreeSet::new();
        for pass in 1..=self.max_passes {
            let mut pass_changed = false;
            for &seqpos in &targets {
                if self.pack_residue(pose, sfxn, seqpos)? {
                    changed.insert(seqpos);
                    pass_changed = true;
                }
            }
            debug!(pass, changed = changed.len(), "Greedy packing pass finished");
            if !pass_changed {
                break;
            }
        }

        Ok(RepackOutcome::Repacked {
            residues_changed: changed.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::scoring::EnergyMethod;
    use crate::core::forcefield::term::ScoreType;
    use std::sync::Arc;

    /// Prefers chi1 close to +60 on every residue.
    #[derive(Debug)]
    struct Gauche;

    impl EnergyMethod for Gauche {
        fn score_type(&self) -> ScoreType {
            ScoreType::Custom("gauche")
        }

        fn evaluate(&self, pose: &Pose) -> f64 {
            (1..=pose.len()).map(|i| self.residue_energy(pose, i)).sum()
        }

        fn residue_energy(&self, pose: &Pose, seqpos: SeqPos) -> f64 {
            pose.chi(seqpos, 1)
                .map(|chi| angle_difference(chi, 60.0) / 10.0)
                .unwrap_or(0.0)
        }
    }

    fn gauche_sfxn() -> ScoreFunction {
        let mut sfxn = ScoreFunction::empty();
        sfxn.add_method(Arc::new(Gauche), 1.0);
        sfxn
    }

    #[test]
    fn task_flags() {
        let pose = Pose::from_sequence("ASK").unwrap();
        let task = PackerTask::repack_all(&pose);
        assert!(task.allows_design());
        let task = task.restrict_to_repacking().prevent_repacking(2);
        assert!(!task.allows_design());
        assert!(task.is_packable(1));
        assert!(!task.is_packable(2));
        assert!(!task.is_packable(0));
        assert!(!task.is_packable(4));
        assert_eq!(task.len(), 3);
    }

    #[test]
    fn greedy_repack_picks_lowest_energy_rotamers() {
        let mut pose = Pose::from_sequence("SKL").unwrap();
        let sfxn = gauche_sfxn();
        let task = PackerTask::repack_all(&pose).restrict_to_repacking();

        let outcome = GreedyRepacker::default().repack(&mut pose, &sfxn, &task).unwrap();

        assert_eq!(outcome, RepackOutcome::Repacked { residues_changed: 3 });
        for seqpos in 1..=3 {
            assert!((pose.chi(seqpos, 1).unwrap() - 60.0).abs() < 1e-9);
        }
        assert!(sfxn.total(&pose).unwrap().abs() < 1e-9);
    }

    #[test]
    fn greedy_repack_never_raises_residue_energy() {
        let mut pose = Pose::from_sequence("MKVLS").unwrap();
        pose.set_chis(1, &[55.0, 170.0, 75.0]).unwrap();
        let sfxn = ScoreFunction::standard();
        let before = sfxn.residue_energy(&pose, 1).unwrap();

        let mut task = PackerTask::repack_all(&pose).restrict_to_repacking();
        for seqpos in 2..=5 {
            task = task.prevent_repacking(seqpos);
        }
        GreedyRepacker::default().repack(&mut pose, &sfxn, &task).unwrap();

        assert!(sfxn.residue_energy(&pose, 1).unwrap() <= before + 1e-9);
    }

    #[test]
    fn current_conformation_is_kept_when_nothing_beats_it() {
        let mut pose = Pose::from_sequence("S").unwrap();
        pose.set_chis(1, &[61.0]).unwrap();
        let repacker = GreedyRepacker::default();
        let task = PackerTask::repack_all(&pose).restrict_to_repacking();

        let outcome = repacker.repack(&mut pose, &gauche_sfxn(), &task).unwrap();
        assert_eq!(outcome, RepackOutcome::Repacked { residues_changed: 1 });
        assert_eq!(pose.chi(1, 1).unwrap(), 60.0);

        pose.set_chis(1, &[60.0]).unwrap();
        let outcome = repacker.repack(&mut pose, &gauche_sfxn(), &task).unwrap();
        assert_eq!(outcome, RepackOutcome::Repacked { residues_changed: 0 });
        assert_eq!(pose.chi(1, 1).unwrap(), 60.0);
    }

    #[test]
    fn excluding_current_conformation_always_picks_a_rotamer() {
        let mut pose = Pose::from_sequence("S").unwrap();
        pose.set_chis(1, &[59.0]).unwrap();
        let task = PackerTask::repack_all(&pose).restrict_to_repacking();

        GreedyRepacker::default()
            .include_current(true)
            .repack(&mut pose, &gauche_sfxn(), &task)
            .unwrap();
        assert_eq!(pose.chi(1, 1).unwrap(), 60.0);

        pose.set_chis(1, &[-170.0]).unwrap();
        let mut sfxn = ScoreFunction::empty();
        sfxn.add_method(Arc::new(Gauche), -1.0);
        GreedyRepacker::default()
            .include_current(false)
            .repack(&mut pose, &sfxn, &task)
            .unwrap();
        assert_eq!(pose.chi(1, 1).unwrap(), -60.0);
    }

    #[test]
    fn nothing_to_pack_and_design_rejection() {
        let mut pose = Pose::from_sequence("GAG").unwrap();
        let sfxn = gauche_sfxn();
        let task = PackerTask::repack_all(&pose);
        assert_eq!(
            GreedyRepacker::default().repack(&mut pose, &sfxn, &task),
            Err(RepackError::DesignNotSupported)
        );
        let task = task.restrict_to_repacking();
        assert_eq!(
            GreedyRepacker::default().repack(&mut pose, &sfxn, &task),
            Ok(RepackOutcome::NothingToPack)
        );

        let other = Pose::from_sequence("GA").unwrap();
        let task = PackerTask::repack_all(&other).restrict_to_repacking();
        assert_eq!(
            GreedyRepacker::default().repack(&mut pose, &sfxn, &task),
            Err(RepackError::SizeMismatch { task: 2, pose: 3 })
        );
    }
}
