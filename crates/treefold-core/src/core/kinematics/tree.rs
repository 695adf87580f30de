use super::fold_tree::{FoldTree, FoldTreeError};
use super::jump::{Jump, ideal_backbone_in_stub};
use crate::core::models::coords::{ResidueCoords, ideal};
use crate::core::models::ids::{JumpId, SeqPos};
use crate::core::models::residue::Residue;
use crate::core::models::torsion::TorsionKind;
use crate::core::utils::geometry::{backbone_stub, place_atom};
use nalgebra::{Isometry3, Point3};

/// How the backbone of one residue is positioned during a refold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    /// Placed directly from the pose's root stub.
    Root,
    /// Placed from the stub of `parent` composed with jump `jump`.
    Jump { parent: SeqPos, jump: JumpId },
    /// Built from residue `seqpos - 1` along a peptide edge.
    Forward,
    /// Built from residue `seqpos + 1` along a peptide edge.
    Backward,
}

impl BuildStep {
    pub fn parent(&self, seqpos: SeqPos) -> Option<SeqPos> {
        match *self {
            BuildStep::Root => None,
            BuildStep::Jump { parent, .. } => Some(parent),
            BuildStep::Forward => Some(seqpos - 1),
            BuildStep::Backward => Some(seqpos + 1),
        }
    }
}

/// Build plan derived from a fold tree: one step per residue plus the
/// parent/child structure used to limit refolds to the affected subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KinematicTree {
    root: SeqPos,
    steps: Vec<BuildStep>,
    children: Vec<Vec<SeqPos>>,
}

/// Everything a refold reads besides the plan itself.
pub(crate) struct Conformation<'a> {
    pub residues: &'a [Residue],
    pub jumps: &'a [Jump],
    pub root_stub: &'a Isometry3<f64>,
}

impl KinematicTree {
    /// Derives the build plan of a fold tree, which is checked first.
    pub fn from_fold_tree(tree: &FoldTree) -> Result<Self, FoldTreeError> {
        tree.check()?;
        let nres = tree.nres();
        let mut steps = vec![BuildStep::Root; nres];
        let mut children = vec![Vec::new(); nres];

        for edge in tree.edges() {
            match edge.jump_id() {
                Some(jump) => {
                    steps[edge.stop - 1] = BuildStep::Jump {
                        parent: edge.start,
                        jump,
                    };
                    children[edge.start - 1].push(edge.stop);
                }
                None => {
                    let forward = edge.start < edge.stop;
                    for seqpos in edge.downstream() {
                        let (step, parent) = if forward {
                            (BuildStep::Forward, seqpos - 1)
                        } else {
                            (BuildStep::Backward, seqpos + 1)
                        };
                        steps[seqpos - 1] = step;
                        children[parent - 1].push(seqpos);
                    }
                }
            }
        }

        Ok(Self {
            root: tree.root(),
            steps,
            children,
        })
    }

    pub fn root(&self) -> SeqPos {
        self.root
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, seqpos: SeqPos) -> BuildStep {
        self.steps[seqpos - 1]
    }

    pub fn parent(&self, seqpos: SeqPos) -> Option<SeqPos> {
        self.step(seqpos).parent(seqpos)
    }

    pub fn children(&self, seqpos: SeqPos) -> &[SeqPos] {
        &self.children[seqpos - 1]
    }

    /// Residue positioned by jump `id`, if any.
    pub fn jump_target(&self, id: JumpId) -> Option<SeqPos> {
        self.steps
            .iter()
            .position(|step| matches!(step, BuildStep::Jump { jump, .. } if *jump == id))
            .map(|index| index + 1)
    }

    /// `seqpos` and all its descendants, parents always before children.
    pub fn subtree(&self, seqpos: SeqPos) -> Vec<SeqPos> {
        let mut order = Vec::new();
        let mut stack = vec![seqpos];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        order
    }

    /// Build order for the whole pose.
    pub fn build_order(&self) -> Vec<SeqPos> {
        self.subtree(self.root)
    }

    /// Residues whose backbone build step consumes the given torsion.
    ///
    /// Rebuilding the subtree of each returned residue is sufficient to
    /// propagate a change of that torsion. Side-chain torsions never move
    /// other residues and yield an empty list.
    pub fn residues_moved_by(&self, seqpos: SeqPos, kind: TorsionKind) -> Vec<SeqPos> {
        let mut moved = Vec::new();
        match kind {
            TorsionKind::Phi => {
                if self.step(seqpos) == BuildStep::Forward {
                    moved.push(seqpos);
                }
                if seqpos > 1 && self.step(seqpos - 1) == BuildStep::Backward {
                    moved.push(seqpos - 1);
                }
            }
            TorsionKind::Psi | TorsionKind::Omega => {
                if seqpos < self.len() && self.step(seqpos + 1) == BuildStep::Forward {
                    moved.push(seqpos + 1);
                }
                if self.step(seqpos) == BuildStep::Backward {
                    moved.push(seqpos);
                }
            }
            TorsionKind::Chi(_) => {}
        }
        moved
    }

    /// Rebuilds every residue in the subtrees rooted at `roots`.
    pub(crate) fn refold(
        &self,
        roots: &[SeqPos],
        conformation: &Conformation<'_>,
        coords: &mut [ResidueCoords],
    ) {
        for &root in roots {
            for seqpos in self.subtree(root) {
                self.build_backbone(seqpos, conformation, coords);
                build_local_atoms(seqpos, conformation.residues, coords);
            }
        }
    }

    fn build_backbone(
        &self,
        seqpos: SeqPos,
        conformation: &Conformation<'_>,
        coords: &mut [ResidueCoords],
    ) {
        let i = seqpos - 1;
        let residues = conformation.residues;
        match self.step(seqpos) {
            BuildStep::Root => {
                let (n, ca, c) = ideal_backbone_in_stub(conformation.root_stub);
                set_backbone(&mut coords[i], n, ca, c);
            }
            BuildStep::Jump { parent, jump } => {
                let from = &coords[parent - 1];
                let upstream = backbone_stub(&from.n, &from.ca, &from.c);
                let stub = conformation.jumps[jump - 1].apply(&upstream);
                let (n, ca, c) = ideal_backbone_in_stub(&stub);
                set_backbone(&mut coords[i], n, ca, c);
            }
            BuildStep::Forward => {
                let prev = &coords[i - 1];
                let (prev_res, res) = (&residues[i - 1], &residues[i]);
                let n = place_atom(
                    &prev.n,
                    &prev.ca,
                    &prev.c,
                    ideal::C_N,
                    ideal::CA_C_N,
                    prev_res.psi,
                );
                let ca = place_atom(
                    &prev.ca,
                    &prev.c,
                    &n,
                    ideal::N_CA,
                    ideal::C_N_CA,
                    prev_res.omega,
                );
                let c = place_atom(&prev.c, &n, &ca, ideal::CA_C, ideal::N_CA_C, res.phi);
                set_backbone(&mut coords[i], n, ca, c);
            }
            BuildStep::Backward => {
                let next = &coords[i + 1];
                let (res, next_res) = (&residues[i], &residues[i + 1]);
                let c = place_atom(
                    &next.c,
                    &next.ca,
                    &next.n,
                    ideal::C_N,
                    ideal::C_N_CA,
                    next_res.phi,
                );
                let ca = place_atom(&next.ca, &next.n, &c, ideal::CA_C, ideal::CA_C_N, res.omega);
                let n = place_atom(&next.n, &c, &ca, ideal::N_CA, ideal::N_CA_C, res.psi);
                set_backbone(&mut coords[i], n, ca, c);
            }
        }
    }
}

fn set_backbone(
    coords: &mut ResidueCoords,
    n: Point3<f64>,
    ca: Point3<f64>,
    c: Point3<f64>,
) {
    coords.n = n;
    coords.ca = ca;
    coords.c = c;
}

/// Rebuilds the carbonyl oxygen and side-chain spine of one residue from its
/// already placed backbone.
pub(crate) fn build_local_atoms(seqpos: SeqPos, residues: &[Residue], coords: &mut [ResidueCoords]) {
    let residue = &residues[seqpos - 1];
    let atoms = &mut coords[seqpos - 1];

    atoms.o = place_atom(
        &atoms.n,
        &atoms.ca,
        &atoms.c,
        ideal::C_O,
        ideal::CA_C_O,
        residue.psi + 180.0,
    );

    let spine_len = residue.aa().side_chain_spine().len();
    atoms.side_chain.resize(spine_len, Point3::origin());
    if spine_len == 0 {
        return;
    }

    atoms.side_chain[0] = place_atom(
        &atoms.n,
        &atoms.c,
        &atoms.ca,
        ideal::CA_CB,
        ideal::C_CA_CB,
        ideal::N_C_CA_CB,
    );
    for k in 1..spine_len {
        let chain_atom = |j: usize| match j {
            0 => atoms.n,
            1 => atoms.ca,
            _ => atoms.side_chain[j - 2],
        };
        let (a, b, c) = (chain_atom(k - 1), chain_atom(k), chain_atom(k + 1));
        atoms.side_chain[k] = place_atom(
            &a,
            &b,
            &c,
            ideal::SIDE_CHAIN_BOND,
            ideal::SIDE_CHAIN_ANGLE,
            residue.chis[k - 1],
        );
    }
}
