use crate::core::models::ids::SeqPos;
use crate::core::models::pose::Pose;
use crate::core::models::torsion::TorsionKind;
use std::collections::HashMap;

/// Movability flags for one residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResidueMoves {
    pub bb: bool,
    pub chi: bool,
}

/// Selects the torsions a minimizer is allowed to change.
///
/// Global backbone and side-chain flags apply to every residue unless a
/// per-residue override is present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveMap {
    bb: bool,
    chi: bool,
    overrides: HashMap<SeqPos, ResidueMoves>,
}

impl MoveMap {
    /// A move map with nothing movable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backbone and side chains movable everywhere.
    pub fn all() -> Self {
        Self {
            bb: true,
            chi: true,
            overrides: HashMap::new(),
        }
    }

    pub fn set_bb(&mut self, movable: bool) -> &mut Self {
        self.bb = movable;
        self
    }

    pub fn set_chi(&mut self, movable: bool) -> &mut Self {
        self.chi = movable;
        self
    }

    pub fn set_residue(&mut self, seqpos: SeqPos, bb: bool, chi: bool) -> &mut Self {
        self.overrides.insert(seqpos, ResidueMoves { bb, chi });
        self
    }

    pub fn moves(&self, seqpos: SeqPos) -> ResidueMoves {
        self.overrides
            .get(&seqpos)
            .copied()
            .unwrap_or(ResidueMoves {
                bb: self.bb,
                chi: self.chi,
            })
    }

    /// Movable torsions of `pose` in residue order.
    ///
    /// Phi is skipped at the N-terminus and psi/omega at the C-terminus, where
    /// they position no atoms of a neighbour.
    pub fn degrees_of_freedom(&self, pose: &Pose) -> Vec<(SeqPos, TorsionKind)> {
        let nres = pose.len();
        let mut dofs = Vec::new();
        for (index, residue) in pose.residues().iter().enumerate() {
            let seqpos = index + 1;
            let moves = self.moves(seqpos);
            if moves.bb {
                if seqpos > 1 {
                    dofs.push((seqpos, TorsionKind::Phi));
                }
                if seqpos < nres {
                    dofs.push((seqpos, TorsionKind::Psi));
                    dofs.push((seqpos, TorsionKind::Omega));
                }
            }
            if moves.chi {
                dofs.extend((1..=residue.chis().len()).map(|k| (seqpos, TorsionKind::Chi(k))));
            }
        }
        dofs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_move_map_has_no_degrees_of_freedom() {
        let pose = Pose::from_sequence("AKA").unwrap();
        assert!(MoveMap::new().degrees_of_freedom(&pose).is_empty());
    }

    #[test]
    fn all_lists_backbone_and_chis_without_terminal_torsions() {
        let pose = Pose::from_sequence("GSG").unwrap();
        let dofs = MoveMap::all().degrees_of_freedom(&pose);
        assert_eq!(
            dofs,
            vec![
                (1, TorsionKind::Psi),
                (1, TorsionKind::Omega),
                (2, TorsionKind::Phi),
                (2, TorsionKind::Psi),
                (2, TorsionKind::Omega),
                (2, TorsionKind::Chi(1)),
                (3, TorsionKind::Phi),
            ]
        );
    }

    #[test]
    fn residue_overrides_take_precedence() {
        let pose = Pose::from_sequence("SSS").unwrap();
        let mut movemap = MoveMap::new();
        movemap.set_chi(true).set_residue(2, true, false);
        let dofs = movemap.degrees_of_freedom(&pose);
        assert_eq!(
            dofs,
            vec![
                (1, TorsionKind::Chi(1)),
                (2, TorsionKind::Phi),
                (2, TorsionKind::Psi),
                (2, TorsionKind::Omega),
                (3, TorsionKind::Chi(1)),
            ]
        );
        assert_eq!(movemap.moves(2), ResidueMoves { bb: true, chi: false });
    }
}
