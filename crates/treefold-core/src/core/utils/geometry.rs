use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};

/// Places a fourth atom from three reference atoms and internal coordinates.
///
/// This is the natural extension reference frame (NeRF) construction: the new
/// atom `d` is bonded to `c` with length `bond_length`, the angle `b-c-d` equals
/// `bond_angle` and the dihedral `a-b-c-d` equals `torsion`. Angles are in degrees.
///
/// # Arguments
///
/// * `a`, `b`, `c` - The three preceding atoms along the chain.
/// * `bond_length` - Distance between `c` and the new atom (Å).
/// * `bond_angle` - Angle `b-c-d` in degrees.
/// * `torsion` - Dihedral `a-b-c-d` in degrees.
///
/// # Return
///
/// The position of the new atom.
pub fn place_atom(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    bond_length: f64,
    bond_angle: f64,
    torsion: f64,
) -> Point3<f64> {
    let bc = (c - b).normalize();
    let n = (b - a).cross(&bc).normalize();
    let m = n.cross(&bc);

    let theta = bond_angle.to_radians();
    let chi = torsion.to_radians();

    let d2 = Vector3::new(
        -bond_length * theta.cos(),
        bond_length * theta.sin() * chi.cos(),
        bond_length * theta.sin() * chi.sin(),
    );

    c + bc * d2.x + m * d2.y + n * d2.z
}

/// Dihedral angle `a-b-c-d` in degrees, in the range (-180, 180].
pub fn dihedral(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    let b0 = a - b;
    let b1 = (c - b).normalize();
    let b2 = d - c;

    let v = b0 - b1 * b0.dot(&b1);
    let w = b2 - b1 * b2.dot(&b1);

    let x = v.dot(&w);
    let y = b1.cross(&v).dot(&w);
    normalize_angle(y.atan2(x).to_degrees())
}

/// Bond angle `a-b-c` in degrees.
pub fn bond_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ba = (a - b).normalize();
    let bc = (c - b).normalize();
    ba.dot(&bc).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Wraps an angle in degrees into (-180, 180].
#[inline]
pub fn normalize_angle(degrees: f64) -> f64 {
    let wrapped = degrees % 360.0;
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Smallest absolute difference between two angles in degrees.
#[inline]
pub fn angle_difference(a: f64, b: f64) -> f64 {
    normalize_angle(a - b).abs()
}

/// Builds the backbone stub of a residue: an orthonormal frame centred at CA
/// with x along CA→C and z normal to the N-CA-C plane.
pub fn backbone_stub(n: &Point3<f64>, ca: &Point3<f64>, c: &Point3<f64>) -> Isometry3<f64> {
    let x = (c - ca).normalize();
    let z = x.cross(&(n - ca)).normalize();
    let y = z.cross(&x);

    let rotation = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]));
    Isometry3::from_parts(
        Translation3::from(ca.coords),
        UnitQuaternion::from_rotation_matrix(&rotation),
    )
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn assert_points_close(p1: &Point3<f64>, p2: &Point3<f64>, tol: f64) {
        assert!(
            (p1 - p2).norm() < tol,
            "Points not close: {:?} vs {:?} (distance {})",
            p1,
            p2,
            (p1 - p2).norm()
        );
    }

    fn reference_atoms() -> (Point3<f64>, Point3<f64>, Point3<f64>) {
        (
            Point3::new(-1.2, 1.1, 0.3),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
        )
    }

    #[test]
    fn place_atom_reproduces_requested_internal_coordinates() {
        let (a, b, c) = reference_atoms();
        for torsion in [-170.0, -60.0, 0.0, 45.0, 120.0, 180.0] {
            let d = place_atom(&a, &b, &c, 1.33, 116.2, torsion);
            assert!(((d - c).norm() - 1.33).abs() < TOLERANCE);
            assert!((bond_angle(&b, &c, &d) - 116.2).abs() < 1e-7);
            assert!(angle_difference(dihedral(&a, &b, &c, &d), torsion) < 1e-7);
        }
    }

    #[test]
    fn dihedral_of_planar_cis_and_trans_arrangements() {
        let a = Point3::new(0.0, 1.0, 0.0);
        let b = Point3::new(0.0, 0.0, 0.0);
        let c = Point3::new(1.0, 0.0, 0.0);
        let cis = Point3::new(1.0, 1.0, 0.0);
        let trans = Point3::new(1.0, -1.0, 0.0);
        assert!(dihedral(&a, &b, &c, &cis).abs() < TOLERANCE);
        assert!((dihedral(&a, &b, &c, &trans) - 180.0).abs() < TOLERANCE);
    }

    #[test]
    fn dihedral_is_symmetric_under_reversal() {
        let a = Point3::new(0.3, 1.0, -0.2);
        let b = Point3::new(0.0, 0.0, 0.0);
        let c = Point3::new(1.4, 0.1, 0.0);
        let d = Point3::new(1.9, 0.4, 1.2);
        assert!((dihedral(&a, &b, &c, &d) - dihedral(&d, &c, &b, &a)).abs() < TOLERANCE);
    }

    #[test]
    fn normalize_angle_wraps_into_half_open_range() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert_eq!(normalize_angle(180.0), 180.0);
        assert_eq!(normalize_angle(-180.0), 180.0);
        assert!((normalize_angle(190.0) - (-170.0)).abs() < TOLERANCE);
        assert!((normalize_angle(-190.0) - 170.0).abs() < TOLERANCE);
        assert!((normalize_angle(725.0) - 5.0).abs() < TOLERANCE);
    }

    #[test]
    fn angle_difference_takes_the_short_way_round() {
        assert!((angle_difference(170.0, -170.0) - 20.0).abs() < TOLERANCE);
        assert!((angle_difference(-57.0, -48.0) - 9.0).abs() < TOLERANCE);
    }

    #[test]
    fn backbone_stub_is_centred_at_ca_with_x_towards_c() {
        let n = Point3::new(-0.5, 1.4, 0.0);
        let ca = Point3::new(0.0, 0.0, 0.0);
        let c = Point3::new(1.525, 0.0, 0.0);
        let stub = backbone_stub(&n, &ca, &c);

        assert_points_close(&(stub * Point3::origin()), &ca, TOLERANCE);
        assert_points_close(&(stub * Point3::new(1.525, 0.0, 0.0)), &c, TOLERANCE);

        let local_n = stub.inverse() * n;
        assert!(local_n.z.abs() < TOLERANCE);
        assert!(local_n.y > 0.0);
    }

    #[test]
    fn calculate_rmsd_handles_identical_and_mismatched_inputs() {
        let coords = vec![Point3::new(1.0, 2.0, 3.0), Point3::new(-1.0, 0.0, 2.0)];
        assert_eq!(calculate_rmsd(&coords, &coords), Some(0.0));
        assert_eq!(calculate_rmsd(&coords, &coords[..1]), None);
        assert_eq!(calculate_rmsd(&[], &[]), None);
    }
}
