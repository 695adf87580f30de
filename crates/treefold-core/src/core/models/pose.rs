use super::coords::ResidueCoords;
use super::ids::{JumpId, SeqPos};
use super::residue::{AminoAcid, Residue};
use super::torsion::TorsionKind;
use crate::core::kinematics::fold_tree::{FoldTree, FoldTreeError};
use crate::core::kinematics::jump::Jump;
use crate::core::kinematics::tree::{Conformation, KinematicTree, build_local_atoms};
use crate::core::utils::geometry::{backbone_stub, dihedral, normalize_angle};
use nalgebra::{Isometry3, Point3};
use thiserror::Error;

pub const BACKBONE_ATOM_NAMES: [&str; 4] = ["N", "CA", "C", "O"];

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PoseError {
    #[error("Cannot build a pose from an empty sequence")]
    EmptySequence,
    #[error("Unknown residue code '{code}' at sequence position {position}")]
    UnknownResidue { position: usize, code: char },
    #[error("Residue {seqpos} is out of range for a pose of {len} residues")]
    ResidueOutOfRange { seqpos: SeqPos, len: usize },
    #[error("Residue {seqpos} has no torsion {kind}")]
    NoSuchTorsion { seqpos: SeqPos, kind: TorsionKind },
    #[error("Torsion {kind} of residue {seqpos} must be finite")]
    NonFiniteTorsion { seqpos: SeqPos, kind: TorsionKind },
    #[error("Residue {seqpos} has {expected} chi angles, got {found}")]
    ChiCountMismatch {
        seqpos: SeqPos,
        expected: usize,
        found: usize,
    },
    #[error("Pose has no jump with id {0}")]
    NoSuchJump(JumpId),
    #[error("Invalid fold tree: {0}")]
    FoldTree(#[from] FoldTreeError),
    #[error("Fold tree spans {tree} residues but the pose has {pose}")]
    SizeMismatch { tree: usize, pose: usize },
}

/// One modelled atom of a pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseAtom {
    pub seqpos: SeqPos,
    pub aa: AminoAcid,
    pub name: &'static str,
    pub position: Point3<f64>,
}

impl PoseAtom {
    /// Element symbol, taken from the first letter of the atom name.
    pub fn element(&self) -> char {
        self.name.chars().next().unwrap_or('X')
    }
}

/// A single protein chain described by internal coordinates.
///
/// The pose owns the residues' torsions, the fold tree with its jumps and the
/// root stub; Cartesian coordinates are derived from those and kept up to date
/// by every mutator. Cloning produces an independent deep copy.
#[derive(Debug, Clone)]
pub struct Pose {
    residues: Vec<Residue>,
    coords: Vec<ResidueCoords>,
    fold_tree: FoldTree,
    kinematics: KinematicTree,
    jumps: Vec<Jump>,
    root_stub: Isometry3<f64>,
}

impl Pose {
    /// Builds an extended chain from one-letter amino-acid codes.
    ///
    /// Whitespace in `sequence` is ignored. The pose gets the simple fold tree
    /// rooted at residue 1 and the identity root stub.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::EmptySequence`] if no residues remain after removing
    /// whitespace, or [`PoseError::UnknownResidue`] for an unrecognised code.
    pub fn from_sequence(sequence: &str) -> Result<Self, PoseError> {
        let residues = sequence
            .chars()
            .filter(|c| !c.is_whitespace())
            .enumerate()
            .map(|(i, code)| {
                AminoAcid::from_one_letter(code)
                    .map(Residue::new)
                    .ok_or(PoseError::UnknownResidue {
                        position: i + 1,
                        code,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_residues(residues, Isometry3::identity())
    }

    /// Builds a pose from residues with known torsions.
    ///
    /// Residue 1 is placed in `root_stub`; the rest follow the simple fold tree.
    pub fn from_residues(
        residues: Vec<Residue>,
        root_stub: Isometry3<f64>,
    ) -> Result<Self, PoseError> {
        if residues.is_empty() {
            return Err(PoseError::EmptySequence);
        }
        let fold_tree = FoldTree::simple(residues.len());
        let kinematics = KinematicTree::from_fold_tree(&fold_tree)?;
        let coords = residues
            .iter()
            .map(|r| ResidueCoords::unbuilt(r.aa().side_chain_spine().len()))
            .collect();

        let mut pose = Self {
            residues,
            coords,
            fold_tree,
            kinematics,
            jumps: Vec::new(),
            root_stub,
        };
        pose.refold_all();
        Ok(pose)
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn residue(&self, seqpos: SeqPos) -> Option<&Residue> {
        seqpos.checked_sub(1).and_then(|i| self.residues.get(i))
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    pub fn sequence(&self) -> String {
        self.residues.iter().map(|r| r.aa().one_letter()).collect()
    }

    pub fn fold_tree(&self) -> &FoldTree {
        &self.fold_tree
    }

    pub fn kinematics(&self) -> &KinematicTree {
        &self.kinematics
    }

    pub fn root_stub(&self) -> &Isometry3<f64> {
        &self.root_stub
    }

    pub fn num_jumps(&self) -> usize {
        self.jumps.len()
    }

    /// Replaces the fold tree while keeping the current coordinates.
    ///
    /// Torsions are re-derived from the present coordinates, the root stub and
    /// every jump are measured from the present residue stubs, and the pose is
    /// refolded through the new plan. For ideal geometry this leaves every
    /// atom in place.
    ///
    /// # Errors
    ///
    /// Returns [`PoseError::FoldTree`] if the tree fails its consistency check
    /// and [`PoseError::SizeMismatch`] if it does not span exactly this pose.
    pub fn set_fold_tree(&mut self, tree: FoldTree) -> Result<(), PoseError> {
        tree.check()?;
        if tree.nres() != self.len() {
            return Err(PoseError::SizeMismatch {
                tree: tree.nres(),
                pose: self.len(),
            });
        }
        let kinematics = KinematicTree::from_fold_tree(&tree)?;

        self.sync_torsions_from_coords();

        let root = &self.coords[tree.root() - 1];
        self.root_stub = backbone_stub(&root.n, &root.ca, &root.c);

        let mut jumps = vec![Jump::identity(); tree.num_jumps()];
        for edge in tree.edges() {
            if let Some(id) = edge.jump_id() {
                let from = &self.coords[edge.start - 1];
                let to = &self.coords[edge.stop - 1];
                jumps[id - 1] = Jump::between(
                    &backbone_stub(&from.n, &from.ca, &from.c),
                    &backbone_stub(&to.n, &to.ca, &to.c),
                );
            }
        }

        self.jumps = jumps;
        self.fold_tree = tree;
        self.kinematics = kinematics;
        self.refold_all();
        Ok(())
    }

    pub fn torsion(&self, seqpos: SeqPos, kind: TorsionKind) -> Result<f64, PoseError> {
        let residue = self.checked_residue(seqpos)?;
        match kind {
            TorsionKind::Phi => Ok(residue.phi),
            TorsionKind::Psi => Ok(residue.psi),
            TorsionKind::Omega => Ok(residue.omega),
            TorsionKind::Chi(index) => index
                .checked_sub(1)
                .and_then(|i| residue.chis.get(i))
                .copied()
                .ok_or(PoseError::NoSuchTorsion { seqpos, kind }),
        }
    }

    pub fn phi(&self, seqpos: SeqPos) -> Result<f64, PoseError> {
        self.torsion(seqpos, TorsionKind::Phi)
    }

    pub fn psi(&self, seqpos: SeqPos) -> Result<f64, PoseError> {
        self.torsion(seqpos, TorsionKind::Psi)
    }

    pub fn omega(&self, seqpos: SeqPos) -> Result<f64, PoseError> {
        self.torsion(seqpos, TorsionKind::Omega)
    }

    pub fn chi(&self, seqpos: SeqPos, index: usize) -> Result<f64, PoseError> {
        self.torsion(seqpos, TorsionKind::Chi(index))
    }

    /// Sets one torsion and refolds the residues downstream of it.
    ///
    /// The value is normalised to (-180, 180]. Only the subtrees whose build
    /// steps consume the torsion are rebuilt, together with the residue's own
    /// carbonyl oxygen and side chain; all other atoms keep their positions.
    pub fn set_torsion(
        &mut self,
        seqpos: SeqPos,
        kind: TorsionKind,
        value: f64,
    ) -> Result<(), PoseError> {
        self.validate_torsion(seqpos, kind, value)?;
        self.store_torsion(seqpos, kind, value);

        let roots = self.kinematics.residues_moved_by(seqpos, kind);
        self.refold_from(&roots);
        build_local_atoms(seqpos, &self.residues, &mut self.coords);
        Ok(())
    }

    /// Sets many torsions at once with a single full refold.
    ///
    /// Every entry is validated before any is applied, so an error leaves the
    /// pose untouched.
    pub fn set_torsions(&mut self, torsions: &[(SeqPos, TorsionKind, f64)]) -> Result<(), PoseError> {
        for &(seqpos, kind, value) in torsions {
            self.validate_torsion(seqpos, kind, value)?;
        }
        for &(seqpos, kind, value) in torsions {
            self.store_torsion(seqpos, kind, value);
        }
        self.refold_all();
        Ok(())
    }

    /// Replaces all side-chain torsions of one residue.
    pub fn set_chis(&mut self, seqpos: SeqPos, chis: &[f64]) -> Result<(), PoseError> {
        let residue = self.checked_residue(seqpos)?;
        if residue.chis.len() != chis.len() {
            return Err(PoseError::ChiCountMismatch {
                seqpos,
                expected: residue.chis.len(),
                found: chis.len(),
            });
        }
        if let Some(index) = chis.iter().position(|chi| !chi.is_finite()) {
            return Err(PoseError::NonFiniteTorsion {
                seqpos,
                kind: TorsionKind::Chi(index + 1),
            });
        }

        let residue = &mut self.residues[seqpos - 1];
        for (stored, &chi) in residue.chis.iter_mut().zip(chis) {
            *stored = normalize_angle(chi);
        }
        build_local_atoms(seqpos, &self.residues, &mut self.coords);
        Ok(())
    }

    pub fn jump(&self, id: JumpId) -> Result<&Jump, PoseError> {
        id.checked_sub(1)
            .and_then(|i| self.jumps.get(i))
            .ok_or(PoseError::NoSuchJump(id))
    }

    /// Replaces a jump and refolds the subtree hanging from it.
    pub fn set_jump(&mut self, id: JumpId, jump: Jump) -> Result<(), PoseError> {
        self.jump(id)?;
        let target = self
            .kinematics
            .jump_target(id)
            .ok_or(PoseError::NoSuchJump(id))?;
        self.jumps[id - 1] = jump;
        self.refold_from(&[target]);
        Ok(())
    }

    pub fn coords(&self, seqpos: SeqPos) -> Option<&ResidueCoords> {
        seqpos.checked_sub(1).and_then(|i| self.coords.get(i))
    }

    pub fn all_coords(&self) -> &[ResidueCoords] {
        &self.coords
    }

    /// Position of a named atom, e.g. `"CA"` or `"CG"`.
    pub fn atom_position(&self, seqpos: SeqPos, name: &str) -> Option<Point3<f64>> {
        self.residue_atoms(seqpos)
            .into_iter()
            .find(|atom| atom.name == name)
            .map(|atom| atom.position)
    }

    /// All modelled atoms of one residue, backbone first.
    pub fn residue_atoms(&self, seqpos: SeqPos) -> Vec<PoseAtom> {
        let (Some(residue), Some(coords)) = (self.residue(seqpos), self.coords(seqpos)) else {
            return Vec::new();
        };
        let aa = residue.aa();
        let backbone = BACKBONE_ATOM_NAMES.iter().zip(coords.backbone());
        let side_chain = aa
            .side_chain_spine()
            .iter()
            .zip(coords.side_chain.iter().copied());
        backbone
            .chain(side_chain)
            .map(|(&name, position)| PoseAtom {
                seqpos,
                aa,
                name,
                position,
            })
            .collect()
    }

    /// All modelled atoms of the pose in residue order.
    pub fn atoms(&self) -> Vec<PoseAtom> {
        (1..=self.len())
            .flat_map(|seqpos| self.residue_atoms(seqpos))
            .collect()
    }

    /// Backbone stub of a residue in its current position.
    pub fn stub(&self, seqpos: SeqPos) -> Option<Isometry3<f64>> {
        self.coords(seqpos)
            .map(|c| backbone_stub(&c.n, &c.ca, &c.c))
    }

    fn checked_residue(&self, seqpos: SeqPos) -> Result<&Residue, PoseError> {
        self.residue(seqpos).ok_or(PoseError::ResidueOutOfRange {
            seqpos,
            len: self.len(),
        })
    }

    fn validate_torsion(&self, seqpos: SeqPos, kind: TorsionKind, value: f64) -> Result<(), PoseError> {
        self.torsion(seqpos, kind)?;
        if !value.is_finite() {
            return Err(PoseError::NonFiniteTorsion { seqpos, kind });
        }
        Ok(())
    }

    fn store_torsion(&mut self, seqpos: SeqPos, kind: TorsionKind, value: f64) {
        let value = normalize_angle(value);
        let residue = &mut self.residues[seqpos - 1];
        match kind {
            TorsionKind::Phi => residue.phi = value,
            TorsionKind::Psi => residue.psi = value,
            TorsionKind::Omega => residue.omega = value,
            TorsionKind::Chi(index) => residue.chis[index - 1] = value,
        }
    }

    fn refold_all(&mut self) {
        let root = self.kinematics.root();
        self.refold_from(&[root]);
    }

    fn refold_from(&mut self, roots: &[SeqPos]) {
        let conformation = Conformation {
            residues: &self.residues,
            jumps: &self.jumps,
            root_stub: &self.root_stub,
        };
        self.kinematics
            .refold(roots, &conformation, &mut self.coords);
    }

    /// Measures backbone torsions from the current coordinates. Values that
    /// cannot be measured (degenerate geometry) keep their stored value.
    fn sync_torsions_from_coords(&mut self) {
        let n = self.len();
        for i in 0..n {
            let here = &self.coords[i];
            if i > 0 {
                let prev = &self.coords[i - 1];
                let phi = dihedral(&prev.c, &here.n, &here.ca, &here.c);
                if phi.is_finite() {
                    self.residues[i].phi = phi;
                }
            }
            if i + 1 < n {
                let next = &self.coords[i + 1];
                let psi = dihedral(&here.n, &here.ca, &here.c, &next.n);
                let omega = dihedral(&here.ca, &here.c, &next.n, &next.ca);
                if psi.is_finite() {
                    self.residues[i].psi = psi;
                }
                if omega.is_finite() {
                    self.residues[i].omega = omega;
                }
            }
        }
    }
}
