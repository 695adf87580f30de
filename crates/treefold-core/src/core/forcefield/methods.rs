use super::potentials::{gaussian_well, soft_lennard_jones};
use super::scoring::EnergyMethod;
use super::term::ScoreType;
use crate::core::models::coords::ideal;
use crate::core::models::ids::SeqPos;
use crate::core::models::pose::{Pose, PoseAtom};
use crate::core::utils::geometry::{angle_difference, place_atom};
use phf::{Map, phf_map};

/// Half of the Lennard-Jones minimum distance (Å) and well depth (kcal/mol),
/// keyed by element.
static ATOM_PARAMS: Map<char, (f64, f64)> = phf_map! {
    'C' => (1.90, 0.10),
    'N' => (1.80, 0.16),
    'O' => (1.70, 0.20),
    'S' => (2.00, 0.25),
};

const FALLBACK_PARAMS: (f64, f64) = (1.90, 0.10);

fn atom_params(atom: &PoseAtom) -> (f64, f64) {
    ATOM_PARAMS
        .get(&atom.element())
        .copied()
        .unwrap_or(FALLBACK_PARAMS)
}

/// Softened Lennard-Jones repulsion and attraction between heavy atoms of
/// residues at least `min_separation` apart in sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VdwEnergy {
    pub cutoff: f64,
    pub min_separation: usize,
}

impl Default for VdwEnergy {
    fn default() -> Self {
        Self {
            cutoff: 8.0,
            min_separation: 2,
        }
    }
}

impl VdwEnergy {
    fn residue_pair(&self, pose: &Pose, atoms: &[Vec<PoseAtom>], i: SeqPos, j: SeqPos) -> f64 {
        let (Some(ci), Some(cj)) = (pose.coords(i), pose.coords(j)) else {
            return 0.0;
        };
        if (ci.ca - cj.ca).norm() > ci.extent() + cj.extent() + self.cutoff {
            return 0.0;
        }

        let mut energy = 0.0;
        for a in &atoms[i - 1] {
            let (radius_a, depth_a) = atom_params(a);
            for b in &atoms[j - 1] {
                let dist = (a.position - b.position).norm();
                if dist > self.cutoff {
                    continue;
                }
                let (radius_b, depth_b) = atom_params(b);
                energy += soft_lennard_jones(dist, radius_a + radius_b, (depth_a * depth_b).sqrt());
            }
        }
        energy
    }

    fn residue_atoms(pose: &Pose) -> Vec<Vec<PoseAtom>> {
        (1..=pose.len()).map(|seqpos| pose.residue_atoms(seqpos)).collect()
    }
}

impl EnergyMethod for VdwEnergy {
    fn score_type(&self) -> ScoreType {
        ScoreType::Vdw
    }

    fn evaluate(&self, pose: &Pose) -> f64 {
        let atoms = Self::residue_atoms(pose);
        let nres = pose.len();
        let mut energy = 0.0;
        for i in 1..=nres {
            for j in (i + self.min_separation)..=nres {
                energy += self.residue_pair(pose, &atoms, i, j);
            }
        }
        energy
    }

    fn residue_energy(&self, pose: &Pose, seqpos: SeqPos) -> f64 {
        let atoms = Self::residue_atoms(pose);
        (1..=pose.len())
            .filter(|&other| other.abs_diff(seqpos) >= self.min_separation)
            .map(|other| self.residue_pair(pose, &atoms, seqpos, other))
            .sum()
    }
}

/// `(phi, psi, depth, width)` of the right-handed helix, beta and
/// left-handed helix basins.
const RAMA_BASINS: [(f64, f64, f64, f64); 3] = [
    (-63.0, -43.0, 1.0, 20.0),
    (-120.0, 130.0, 1.0, 25.0),
    (57.0, 47.0, 0.5, 20.0),
];

/// Three-basin Ramachandran well over interior residues.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RamaEnergy;

impl RamaEnergy {
    pub fn well(phi: f64, psi: f64) -> f64 {
        RAMA_BASINS
            .iter()
            .map(|&(phi0, psi0, depth, width)| {
                gaussian_well(
                    angle_difference(phi, phi0),
                    angle_difference(psi, psi0),
                    depth,
                    width,
                )
            })
            .sum()
    }
}

impl EnergyMethod for RamaEnergy {
    fn score_type(&self) -> ScoreType {
        ScoreType::Rama
    }

    fn evaluate(&self, pose: &Pose) -> f64 {
        (1..=pose.len())
            .map(|seqpos| self.residue_energy(pose, seqpos))
            .sum()
    }

    fn residue_energy(&self, pose: &Pose, seqpos: SeqPos) -> f64 {
        if seqpos <= 1 || seqpos >= pose.len() {
            return 0.0;
        }
        pose.residue(seqpos)
            .map_or(0.0, |r| Self::well(r.phi(), r.psi()))
    }
}

/// Penalty `1 + cos(omega)` on every peptide bond; zero for trans.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OmegaEnergy;

impl EnergyMethod for OmegaEnergy {
    fn score_type(&self) -> ScoreType {
        ScoreType::Omega
    }

    fn evaluate(&self, pose: &Pose) -> f64 {
        (1..pose.len())
            .map(|seqpos| self.residue_energy(pose, seqpos))
            .sum()
    }

    fn residue_energy(&self, pose: &Pose, seqpos: SeqPos) -> f64 {
        if seqpos >= pose.len() {
            return 0.0;
        }
        pose.residue(seqpos)
            .map_or(0.0, |r| 1.0 + r.omega().to_radians().cos())
    }
}

/// Closure of every cutpoint in the fold tree.
///
/// For a cut between `c` and `c + 1`, the N and CA that residue `c` would
/// place for its successor and the C that residue `c + 1` would place for its
/// predecessor are compared with the actual atoms; the energy is the sum of
/// the three distances.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinearChainbreakEnergy;

impl LinearChainbreakEnergy {
    pub fn cut_energy(pose: &Pose, cut: SeqPos) -> f64 {
        let (Some(here), Some(next), Some(res), Some(next_res)) = (
            pose.coords(cut),
            pose.coords(cut + 1),
            pose.residue(cut),
            pose.residue(cut + 1),
        ) else {
            return 0.0;
        };

        let virtual_n = place_atom(&here.n, &here.ca, &here.c, ideal::C_N, ideal::CA_C_N, res.psi());
        let virtual_ca = place_atom(
            &here.ca,
            &here.c,
            &virtual_n,
            ideal::N_CA,
            ideal::C_N_CA,
            res.omega(),
        );
        let virtual_c = place_atom(
            &next.c,
            &next.ca,
            &next.n,
            ideal::C_N,
            ideal::C_N_CA,
            next_res.phi(),
        );

        (virtual_n - next.n).norm() + (virtual_ca - next.ca).norm() + (virtual_c - here.c).norm()
    }
}

impl EnergyMethod for LinearChainbreakEnergy {
    fn score_type(&self) -> ScoreType {
        ScoreType::LinearChainbreak
    }

    fn evaluate(&self, pose: &Pose) -> f64 {
        pose.fold_tree()
            .cutpoints()
            .into_iter()
            .map(|cut| Self::cut_energy(pose, cut))
            .sum()
    }

    fn residue_energy(&self, pose: &Pose, seqpos: SeqPos) -> f64 {
        pose.fold_tree()
            .cutpoints()
            .into_iter()
            .filter(|&cut| cut == seqpos || cut + 1 == seqpos)
            .map(|cut| Self::cut_energy(pose, cut))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kinematics::fold_tree::FoldTree;
    use crate::core::kinematics::jump::Jump;
    use crate::core::models::torsion::TorsionKind;
    use nalgebra::{Isometry3, Translation3, UnitQuaternion};

    fn branched_pose() -> Pose {
        let mut pose = Pose::from_sequence(&"A".repeat(10)).unwrap();
        let mut tree = FoldTree::new(3);
        tree.add_peptide_edge(3, 1);
        tree.add_peptide_edge(3, 5);
        tree.add_jump_edge(3, 8, 1);
        tree.add_peptide_edge(8, 6);
        tree.add_peptide_edge(8, 10);
        pose.set_fold_tree(tree).unwrap();
        pose
    }

    #[test]
    fn vdw_ignores_sequence_neighbours() {
        let pose = Pose::from_sequence("AA").unwrap();
        assert_eq!(VdwEnergy::default().evaluate(&pose), 0.0);
    }

    #[test]
    fn vdw_residue_energies_count_each_pair_twice() {
        let mut pose = Pose::from_sequence("MKTAYIAK").unwrap();
        pose.set_torsions(&[(4, TorsionKind::Phi, -60.0), (4, TorsionKind::Psi, -45.0)])
            .unwrap();
        let vdw = VdwEnergy::default();
        let total = vdw.evaluate(&pose);
        let per_residue: f64 = (1..=pose.len()).map(|s| vdw.residue_energy(&pose, s)).sum();
        assert!(total.is_finite());
        assert!((per_residue - 2.0 * total).abs() < 1e-9);
    }

    #[test]
    fn vdw_penalises_collapsed_structures() {
        let extended = Pose::from_sequence(&"V".repeat(8)).unwrap();
        let mut collapsed = extended.clone();
        let hairpin: Vec<_> = (3..=6)
            .flat_map(|s| [(s, TorsionKind::Phi, 0.0), (s, TorsionKind::Psi, 0.0)])
            .collect();
        collapsed.set_torsions(&hairpin).unwrap();
        let vdw = VdwEnergy::default();
        assert!(vdw.evaluate(&collapsed) > vdw.evaluate(&extended));
    }

    #[test]
    fn rama_prefers_basins_and_skips_termini() {
        let helix = RamaEnergy::well(-63.0, -43.0);
        let strand = RamaEnergy::well(-150.0, 150.0);
        let forbidden = RamaEnergy::well(0.0, 180.0);
        assert!(helix < strand && strand < forbidden);
        assert!(helix < -0.9);

        let pose = Pose::from_sequence("AAAA").unwrap();
        assert_eq!(RamaEnergy.residue_energy(&pose, 1), 0.0);
        assert_eq!(RamaEnergy.residue_energy(&pose, 4), 0.0);
        assert!((RamaEnergy.evaluate(&pose) - 2.0 * strand).abs() < 1e-12);
    }

    #[test]
    fn omega_is_zero_for_trans_and_two_for_cis() {
        let mut pose = Pose::from_sequence("AAAA").unwrap();
        assert!(OmegaEnergy.evaluate(&pose).abs() < 1e-12);
        pose.set_torsion(2, TorsionKind::Omega, 0.0).unwrap();
        assert!((OmegaEnergy.evaluate(&pose) - 2.0).abs() < 1e-12);
        assert!((OmegaEnergy.residue_energy(&pose, 2) - 2.0).abs() < 1e-12);
        assert_eq!(OmegaEnergy.residue_energy(&pose, 4), 0.0);
    }

    #[test]
    fn chainbreak_is_zero_without_cutpoints() {
        let pose = Pose::from_sequence("AAAAAA").unwrap();
        assert_eq!(LinearChainbreakEnergy.evaluate(&pose), 0.0);
    }

    #[test]
    fn chainbreak_is_zero_for_closed_cut_and_positive_when_distorted() {
        let mut pose = branched_pose();
        assert!(LinearChainbreakEnergy.evaluate(&pose) < 1e-6);

        let shifted = Isometry3::from_parts(Translation3::new(1.5, 0.0, 0.0), UnitQuaternion::identity())
            * pose.jump(1).unwrap().transform();
        pose.set_jump(1, Jump::from_isometry(shifted)).unwrap();
        let broken = LinearChainbreakEnergy.evaluate(&pose);
        assert!(broken > 1.0);
        assert_eq!(LinearChainbreakEnergy.residue_energy(&pose, 6), broken);
        assert_eq!(LinearChainbreakEnergy.residue_energy(&pose, 2), 0.0);
    }

    #[test]
    fn chainbreak_opens_when_torsion_at_cut_changes() {
        let mut pose = branched_pose();
        pose.set_torsion(5, TorsionKind::Psi, 60.0).unwrap();
        assert!(LinearChainbreakEnergy.evaluate(&pose) > 0.1);
    }
}
