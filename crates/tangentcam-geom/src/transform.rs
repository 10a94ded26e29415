//! 2D affine transforms.

use serde::{Deserialize, Serialize};
use tangentcam_core::Tolerance;

use crate::point::{Point, Vector};

/// Affine transform in SVG matrix order:
///
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2D {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn translate(dx: f64, dy: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Counterclockwise rotation about `origin`.
    pub fn rotate(angle: f64, origin: Point) -> Self {
        let (s, c) = angle.sin_cos();
        Self::translate(origin.x, origin.y)
            .after(&Self::new(c, s, -s, c, 0.0, 0.0))
            .after(&Self::translate(-origin.x, -origin.y))
    }

    /// Mirror the Y axis about a page of the given height. Used to convert
    /// from top-left (SVG) to bottom-left (machine) origin.
    pub fn flip_y(page_height: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, -1.0, 0.0, page_height)
    }

    /// Composition `self * other`. The result applies `other` first, then
    /// `self`, as in `self.apply_point(other.apply_point(p))`.
    pub fn after(&self, other: &Transform2D) -> Transform2D {
        Transform2D::new(
            self.a * other.a + self.c * other.b,
            self.b * other.a + self.d * other.b,
            self.a * other.c + self.c * other.d,
            self.b * other.c + self.d * other.d,
            self.a * other.e + self.c * other.f + self.e,
            self.b * other.e + self.d * other.f + self.f,
        )
    }

    pub fn apply_point(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Linear part only, no translation.
    pub fn apply_vector(&self, v: Vector) -> Vector {
        Vector::new(self.a * v.x + self.c * v.y, self.b * v.x + self.d * v.y)
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// True if circles stay circles (rotation, uniform scale, reflection, translation).
    pub fn is_similarity(&self, tol: Tolerance) -> bool {
        let rotation = tol.eq(self.a, self.d) && tol.eq(self.b, -self.c);
        let reflection = tol.eq(self.a, -self.d) && tol.eq(self.b, self.c);
        rotation || reflection
    }

    /// Uniform scale factor of a similarity transform.
    pub fn similarity_scale(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    /// True if the transform mirrors orientation.
    pub fn is_reflection(&self) -> bool {
        self.determinant() < 0.0
    }

    pub fn is_identity(&self, tol: Tolerance) -> bool {
        let id = Self::identity();
        [
            (self.a, id.a),
            (self.b, id.b),
            (self.c, id.c),
            (self.d, id.d),
            (self.e, id.e),
            (self.f, id.f),
        ]
        .iter()
        .all(|(x, y)| tol.eq(*x, *y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_rotate_about_origin_point() {
        let m = Transform2D::rotate(FRAC_PI_2, Point::new(1.0, 1.0));
        let p = m.apply_point(Point::new(2.0, 1.0));
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_composition_order() {
        let translate = Transform2D::translate(10.0, 0.0);
        let scale = Transform2D::scale(2.0, 2.0);
        let p = Point::new(1.0, 1.0);

        let scaled_then_moved = translate.after(&scale);
        assert_eq!(scaled_then_moved.apply_point(p), Point::new(12.0, 2.0));
        assert_eq!(scaled_then_moved.apply_point(p), translate.apply_point(scale.apply_point(p)));

        let moved_then_scaled = scale.after(&translate);
        assert_eq!(moved_then_scaled.apply_point(p), Point::new(22.0, 2.0));
    }

    #[test]
    fn test_similarity() {
        let tol = Tolerance::default();
        assert!(Transform2D::rotate(0.3, Point::ORIGIN).is_similarity(tol));
        assert!(Transform2D::flip_y(100.0).is_similarity(tol));
        assert!(Transform2D::flip_y(100.0).is_reflection());
        assert!(!Transform2D::scale(1.0, 2.0).is_similarity(tol));
        assert!((Transform2D::scale(3.0, 3.0).similarity_scale() - 3.0).abs() < 1e-12);
    }
}
