//! Angle helpers.

use std::f64::consts::{PI, TAU};
use tangentcam_core::Tolerance;

/// Normalize `angle` into the 2*PI interval centered at `center`.
///
/// `center = PI` gives [0, 2*PI), `center = 0` gives [-PI, PI).
pub fn normalize_angle(angle: f64, center: f64) -> f64 {
    angle - TAU * ((angle + PI - center) / TAU).floor()
}

/// Shortest signed rotation from `start` to `end`, in [-PI, PI].
pub fn calc_rotation(start: f64, end: f64, tol: Tolerance) -> f64 {
    if tol.angle_eq(start, end) {
        return 0.0;
    }
    let mut rotation = normalize_angle(end, 0.0) - normalize_angle(start, 0.0);
    if rotation < -PI {
        rotation += TAU;
    } else if rotation > PI {
        rotation -= TAU;
    }
    rotation
}

/// True if two direction angles point the same way.
pub fn directions_eq(a: f64, b: f64, tol: Tolerance) -> bool {
    tol.angle_is_zero(calc_rotation(a, b, tol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_normalize() {
        assert!((normalize_angle(3.0 * PI, PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(-FRAC_PI_2, PI) - 1.5 * PI).abs() < 1e-12);
        assert!((normalize_angle(1.5 * PI, 0.0) + FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_takes_short_way() {
        let tol = Tolerance::default();
        let r = calc_rotation(170f64.to_radians(), -170f64.to_radians(), tol);
        assert!((r - 20f64.to_radians()).abs() < 1e-9);
        let r = calc_rotation(-170f64.to_radians(), 170f64.to_radians(), tol);
        assert!((r + 20f64.to_radians()).abs() < 1e-9);
        assert_eq!(calc_rotation(1.0, 1.0, tol), 0.0);
    }

    #[test]
    fn test_directions_eq_across_wrap() {
        let tol = Tolerance::default();
        assert!(directions_eq(PI, -PI, tol));
        assert!(!directions_eq(0.0, 0.1, tol));
    }
}
