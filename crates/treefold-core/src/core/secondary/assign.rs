use crate::core::models::pose::Pose;
use crate::core::utils::geometry::angle_difference;

const HELIX_TARGET: (f64, f64) = (-57.0, -48.0);
const HELIX_WINDOW: f64 = 55.0;
const STRAND_TARGET: (f64, f64) = (-129.0, 124.0);
const STRAND_WINDOW: f64 = 40.0;

const MIN_HELIX_RUN: usize = 4;
const MIN_STRAND_RUN: usize = 3;

const LOOP_CODE: char = 'L';

fn within(angle: Option<f64>, target: f64, window: f64) -> bool {
    angle.is_none_or(|value| angle_difference(value, target) <= window)
}

fn classify(phi: Option<f64>, psi: Option<f64>) -> char {
    if phi.is_none() && psi.is_none() {
        return LOOP_CODE;
    }
    if within(phi, HELIX_TARGET.0, HELIX_WINDOW) && within(psi, HELIX_TARGET.1, HELIX_WINDOW) {
        'H'
    } else if within(phi, STRAND_TARGET.0, STRAND_WINDOW)
        && within(psi, STRAND_TARGET.1, STRAND_WINDOW)
    {
        'E'
    } else {
        LOOP_CODE
    }
}

/// Annotates every residue of `pose` as helix (`H`), strand (`E`) or loop (`L`)
/// from its backbone torsions.
///
/// The first residue is judged by psi alone and the last by phi alone. Helix
/// runs shorter than four residues and strand runs shorter than three are
/// reported as loop.
pub fn assign(pose: &Pose) -> String {
    let nres = pose.len();
    let mut codes: Vec<char> = pose
        .residues()
        .iter()
        .enumerate()
        .map(|(index, residue)| {
            let phi = (index > 0).then(|| residue.phi());
            let psi = (index + 1 < nres).then(|| residue.psi());
            classify(phi, psi)
        })
        .collect();

    let mut start = 0;
    while start < codes.len() {
        let code = codes[start];
        let end = codes[start..]
            .iter()
            .position(|&c| c != code)
            .map_or(codes.len(), |offset| start + offset);
        let min_run = match code {
            'H' => MIN_HELIX_RUN,
            'E' => MIN_STRAND_RUN,
            _ => 0,
        };
        if end - start < min_run {
            codes[start..end].fill(LOOP_CODE);
        }
        start = end;
    }

    codes.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::torsion::TorsionKind;

    fn make_helical(pose: &mut Pose, residues: std::ops::RangeInclusive<usize>) {
        let torsions: Vec<_> = residues
            .flat_map(|seqpos| {
                [
                    (seqpos, TorsionKind::Phi, -57.0),
                    (seqpos, TorsionKind::Psi, -47.0),
                ]
            })
            .collect();
        pose.set_torsions(&torsions).unwrap();
    }

    #[test]
    fn extended_pose_is_all_strand() {
        let pose = Pose::from_sequence("AAAAAA").unwrap();
        assert_eq!(assign(&pose), "EEEEEE");
    }

    #[test]
    fn helical_stretch_is_detected_and_short_runs_demoted() {
        let mut pose = Pose::from_sequence(&"A".repeat(10)).unwrap();
        make_helical(&mut pose, 2..=7);
        assert_eq!(assign(&pose), "LHHHHHHEEE");
    }

    #[test]
    fn isolated_helical_residue_becomes_loop() {
        let mut pose = Pose::from_sequence(&"A".repeat(8)).unwrap();
        make_helical(&mut pose, 5..=5);
        assert_eq!(assign(&pose), "EEEELEEE");
    }

    #[test]
    fn torsions_outside_both_windows_are_loop() {
        let mut pose = Pose::from_sequence("AAAAA").unwrap();
        pose.set_torsions(&[(3, TorsionKind::Phi, 60.0), (3, TorsionKind::Psi, 40.0)])
            .unwrap();
        assert_eq!(assign(&pose), "LLLLL");
    }

    #[test]
    fn single_residue_pose_is_loop() {
        let pose = Pose::from_sequence("G").unwrap();
        assert_eq!(assign(&pose), "L");
    }
}
