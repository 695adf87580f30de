use nalgebra::{Isometry3, Point3, Vector3};

use crate::core::models::coords::ideal;

/// Backbone atoms of a residue expressed in its own stub frame.
///
/// CA sits at the origin, C on the x axis and N in the xy plane with positive y,
/// matching the frame produced by `geometry::backbone_stub`.
pub fn ideal_backbone_in_stub(stub: &Isometry3<f64>) -> (Point3<f64>, Point3<f64>, Point3<f64>) {
    let angle = ideal::N_CA_C.to_radians();
    let n_local = Point3::new(ideal::N_CA * angle.cos(), ideal::N_CA * angle.sin(), 0.0);
    let c_local = Point3::new(ideal::CA_C, 0.0, 0.0);
    (stub * n_local, stub * Point3::origin(), stub * c_local)
}

/// A rigid-body transform between two residue stubs.
///
/// Composing the upstream stub with the jump yields the downstream stub:
/// `downstream = upstream * jump`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jump {
    transform: Isometry3<f64>,
}

impl Jump {
    pub fn identity() -> Self {
        Self {
            transform: Isometry3::identity(),
        }
    }

    pub fn from_isometry(transform: Isometry3<f64>) -> Self {
        Self { transform }
    }

    /// The jump that carries `upstream` onto `downstream`.
    pub fn between(upstream: &Isometry3<f64>, downstream: &Isometry3<f64>) -> Self {
        Self {
            transform: upstream.inverse() * downstream,
        }
    }

    /// Downstream stub produced by applying this jump to `upstream`.
    pub fn apply(&self, upstream: &Isometry3<f64>) -> Isometry3<f64> {
        upstream * self.transform
    }

    pub fn transform(&self) -> &Isometry3<f64> {
        &self.transform
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.transform.translation.vector
    }

    /// Rotation magnitude in degrees.
    pub fn rotation_angle(&self) -> f64 {
        self.transform.rotation.angle().to_degrees()
    }
}

impl Default for Jump {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::utils::geometry::{backbone_stub, bond_angle};
    use nalgebra::{Translation3, UnitQuaternion};

    const TOLERANCE: f64 = 1e-9;

    fn sample_stub(angle: f64, offset: Vector3<f64>) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::from(offset),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle.to_radians()),
        )
    }

    #[test]
    fn ideal_backbone_has_ideal_geometry() {
        let (n, ca, c) = ideal_backbone_in_stub(&Isometry3::identity());
        assert!(((n - ca).norm() - ideal::N_CA).abs() < TOLERANCE);
        assert!(((c - ca).norm() - ideal::CA_C).abs() < TOLERANCE);
        assert!((bond_angle(&n, &ca, &c) - ideal::N_CA_C).abs() < 1e-7);
    }

    #[test]
    fn stub_of_ideal_backbone_recovers_original_frame() {
        let stub = sample_stub(37.0, Vector3::new(1.0, -2.0, 5.0));
        let (n, ca, c) = ideal_backbone_in_stub(&stub);
        let recovered = backbone_stub(&n, &ca, &c);
        let delta = recovered.inverse() * stub;
        assert!(delta.translation.vector.norm() < TOLERANCE);
        assert!(delta.rotation.angle() < 1e-6);
    }

    #[test]
    fn between_then_apply_reproduces_downstream_stub() {
        let upstream = sample_stub(10.0, Vector3::new(0.0, 1.0, 0.0));
        let downstream = sample_stub(-80.0, Vector3::new(4.0, 2.0, -3.0));
        let jump = Jump::between(&upstream, &downstream);
        let rebuilt = jump.apply(&upstream);
        assert!((rebuilt.translation.vector - downstream.translation.vector).norm() < TOLERANCE);
        assert!((jump.rotation_angle() - 90.0).abs() < 1e-7);
    }

    #[test]
    fn identity_jump_maps_stub_onto_itself() {
        let stub = sample_stub(45.0, Vector3::new(3.0, 3.0, 3.0));
        assert_eq!(Jump::default(), Jump::identity());
        let applied = Jump::identity().apply(&stub);
        assert!((applied.translation.vector - stub.translation.vector).norm() < TOLERANCE);
        assert!(Jump::identity().translation().norm() < TOLERANCE);
    }
}
