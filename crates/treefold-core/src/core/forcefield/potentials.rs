/// Fraction of `r_min` below which the Lennard-Jones repulsion is linearised.
pub const SOFT_CORE_FRACTION: f64 = 0.8;

#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return 1e10;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    well_depth * (rho12 - 2.0 * rho6)
}

/// Derivative of [`lennard_jones_12_6`] with respect to distance.
#[inline]
pub fn lennard_jones_12_6_slope(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    12.0 * well_depth * (rho6 - rho6 * rho6) / dist
}

/// Lennard-Jones 12-6 with a linear core.
///
/// Below `SOFT_CORE_FRACTION * r_min` the potential continues along its tangent
/// at the switch distance, so overlapping atoms give large but finite energies.
#[inline]
pub fn soft_lennard_jones(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    let switch = SOFT_CORE_FRACTION * r_min;
    if dist >= switch {
        return lennard_jones_12_6(dist, r_min, well_depth);
    }
    let at_switch = lennard_jones_12_6(switch, r_min, well_depth);
    let slope = lennard_jones_12_6_slope(switch, r_min, well_depth);
    at_switch + slope * (dist - switch)
}

/// Isotropic Gaussian well evaluated at offset `(dx, dy)` from its centre.
#[inline]
pub fn gaussian_well(dx: f64, dy: f64, depth: f64, width: f64) -> f64 {
    -depth * (-(dx * dx + dy * dy) / (2.0 * width * width)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn lennard_jones_at_minimum_distance_returns_negative_well_depth() {
        let energy = lennard_jones_12_6(2.0, 2.0, 10.0);
        assert!(f64_approx_equal(energy, -10.0));
    }

    #[test]
    fn lennard_jones_at_very_small_distance_returns_large_positive_energy() {
        let energy = lennard_jones_12_6(1e-7, 2.0, 10.0);
        assert!(f64_approx_equal(energy, 1e10));
    }

    #[test]
    fn lennard_jones_slope_vanishes_at_minimum_and_matches_finite_difference() {
        assert!(f64_approx_equal(lennard_jones_12_6_slope(2.0, 2.0, 10.0), 0.0));
        let h = 1e-6;
        let numeric =
            (lennard_jones_12_6(2.5 + h, 2.0, 1.0) - lennard_jones_12_6(2.5 - h, 2.0, 1.0)) / (2.0 * h);
        assert!((numeric - lennard_jones_12_6_slope(2.5, 2.0, 1.0)).abs() < 1e-6);
    }

    #[test]
    fn soft_lennard_jones_matches_plain_potential_outside_core() {
        for dist in [1.7, 2.0, 3.5, 8.0] {
            assert!(f64_approx_equal(
                soft_lennard_jones(dist, 2.0, 0.2),
                lennard_jones_12_6(dist, 2.0, 0.2)
            ));
        }
    }

    #[test]
    fn soft_lennard_jones_is_finite_and_monotonic_inside_core() {
        let at_zero = soft_lennard_jones(0.0, 3.8, 0.2);
        let at_half = soft_lennard_jones(1.9, 3.8, 0.2);
        let at_switch = soft_lennard_jones(0.8 * 3.8, 3.8, 0.2);
        assert!(at_zero.is_finite());
        assert!(at_zero > at_half && at_half > at_switch);
    }

    #[test]
    fn gaussian_well_is_deepest_at_centre() {
        assert!(f64_approx_equal(gaussian_well(0.0, 0.0, 2.0, 10.0), -2.0));
        assert!(gaussian_well(10.0, 0.0, 2.0, 10.0) > -2.0);
        assert!(gaussian_well(200.0, 200.0, 2.0, 10.0).abs() < 1e-12);
    }
}
