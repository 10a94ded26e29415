//! Cubic Bézier curves.

use serde::{Deserialize, Serialize};
use tangentcam_core::{GeometryError, Result, Tolerance};

use crate::angle::normalize_angle;
use crate::arc::Arc;
use crate::bbox::BoundingBox;
use crate::line::Line;
use crate::point::{Point, Vector};
use crate::transform::Transform2D;

/// Cubic Bézier with endpoints `p1`, `p2` and control points `c1`, `c2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub p1: Point,
    pub c1: Point,
    pub c2: Point,
    pub p2: Point,
}

impl CubicBezier {
    pub fn new(p1: Point, c1: Point, c2: Point, p2: Point) -> Self {
        Self { p1, c1, c2, p2 }
    }

    /// Degree elevation of a quadratic Bézier.
    pub fn from_quadratic(q1: Point, control: Point, q2: Point) -> Self {
        let c1 = q1 + (control - q1) * (2.0 / 3.0);
        let c2 = q2 + (control - q2) * (2.0 / 3.0);
        Self::new(q1, c1, c2, q2)
    }

    /// Approximation of a circular arc of at most a quarter turn.
    pub fn from_circular_arc(arc: &Arc) -> Self {
        let n = (arc.sweep / 2.0).tan();
        let alpha = arc.sweep.sin() * ((4.0 + 3.0 * n * n).sqrt() - 1.0) / 3.0;
        let v1 = arc.p1 - arc.center;
        let v2 = arc.p2 - arc.center;
        Self::new(arc.p1, arc.p1 + v1.normal() * alpha, arc.p2 - v2.normal() * alpha, arc.p2)
    }

    pub fn points(&self) -> [Point; 4] {
        [self.p1, self.c1, self.c2, self.p2]
    }

    pub fn is_finite(&self) -> bool {
        self.points().iter().all(Point::is_finite)
    }

    /// All four points coincide.
    pub fn is_degenerate(&self, tol: Tolerance) -> bool {
        self.points().iter().all(|p| p.almost_eq(&self.p1, tol))
    }

    pub fn point_at(&self, t: f64) -> Point {
        if t <= 0.0 {
            return self.p1;
        }
        if t >= 1.0 {
            return self.p2;
        }
        let mt = 1.0 - t;
        let (b0, b1, b2, b3) = (mt * mt * mt, 3.0 * t * mt * mt, 3.0 * t * t * mt, t * t * t);
        Point::new(
            b0 * self.p1.x + b1 * self.c1.x + b2 * self.c2.x + b3 * self.p2.x,
            b0 * self.p1.y + b1 * self.c1.y + b2 * self.c2.y + b3 * self.p2.y,
        )
    }

    pub fn midpoint(&self) -> Point {
        self.point_at(0.5)
    }

    /// First derivative.
    pub fn derivative1(&self, t: f64) -> Vector {
        let mt = 1.0 - t;
        (self.c1 - self.p1) * (3.0 * mt * mt)
            + (self.c2 - self.c1) * (6.0 * t * mt)
            + (self.p2 - self.c2) * (3.0 * t * t)
    }

    /// Second derivative.
    pub fn derivative2(&self, t: f64) -> Vector {
        let a = (self.c2 - self.c1) - (self.c1 - self.p1);
        let b = (self.p2 - self.c2) - (self.c2 - self.c1);
        (a * (1.0 - t) + b * t) * 6.0
    }

    /// Signed curvature, positive when the curve bends left.
    pub fn curvature(&self, t: f64) -> f64 {
        let d1 = self.derivative1(t);
        let d2 = self.derivative2(t);
        d1.cross(&d2) / d1.length_squared().powf(1.5)
    }

    /// Tangent direction at `t`. At the endpoints a control point that
    /// coincides with its endpoint falls back to the other control point.
    pub fn tangent_at(&self, t: f64, tol: Tolerance) -> Vector {
        if t <= 0.0 {
            if self.c1.almost_eq(&self.p1, tol) {
                if self.c2.almost_eq(&self.p1, tol) {
                    self.p2 - self.p1
                } else {
                    self.c2 - self.p1
                }
            } else {
                self.c1 - self.p1
            }
        } else if t >= 1.0 {
            if self.c2.almost_eq(&self.p2, tol) {
                if self.c1.almost_eq(&self.p2, tol) {
                    self.p2 - self.p1
                } else {
                    self.p2 - self.c1
                }
            } else {
                self.p2 - self.c2
            }
        } else {
            self.derivative1(t)
        }
    }

    pub fn start_tangent_angle(&self, tol: Tolerance) -> f64 {
        self.tangent_at(0.0, tol).angle()
    }

    pub fn end_tangent_angle(&self, tol: Tolerance) -> f64 {
        normalize_angle(self.tangent_at(1.0, tol).angle(), 0.0)
    }

    /// Convex hull flatness: the largest distance from a control point to
    /// the chord.
    pub fn flatness(&self) -> f64 {
        let chord = Line::new(self.p1, self.p2);
        chord
            .distance_to_point(&self.c1, true)
            .max(chord.distance_to_point(&self.c2, true))
    }

    pub fn is_straight_line(&self, flatness: f64, tol: Tolerance) -> bool {
        (self.p1.almost_eq(&self.c1, tol) && self.p2.almost_eq(&self.c2, tol))
            || self.flatness() < flatness
    }

    /// De Casteljau points at `t`: `(d01, d012, split, d123, d23)`.
    pub fn controlpoints_at(&self, t: f64) -> (Point, Point, Point, Point, Point) {
        let d01 = self.p1.lerp(&self.c1, t);
        let d12 = self.c1.lerp(&self.c2, t);
        let d23 = self.c2.lerp(&self.p2, t);
        let d012 = d01.lerp(&d12, t);
        let d123 = d12.lerp(&d23, t);
        let split = d012.lerp(&d123, t);
        (d01, d012, split, d123, d23)
    }

    /// Split at `t` with De Casteljau's algorithm.
    pub fn subdivide(&self, t: f64) -> (Self, Self) {
        let (d01, d012, split, d123, d23) = self.controlpoints_at(t);
        (
            Self::new(self.p1, d01, d012, split),
            Self::new(split, d123, d23, self.p2),
        )
    }

    /// Parameters in (0, 1) where the curvature changes sign.
    pub fn find_inflections(&self, tol: Tolerance) -> Vec<f64> {
        // B' x B'' = 0 reduces to a quadratic in t.
        let v1 = self.c1 - self.p1;
        let v2 = self.c2 - self.c1 - v1;
        let v3 = self.p2 - self.c2 - v1 - v2 * 2.0;
        let a = v2.cross(&v3);
        let b = v1.cross(&v3);
        let c = v1.cross(&v2);
        let mut roots = Vec::new();
        if a.abs() > 0.0 {
            let disc = b * b - 4.0 * a * c;
            if disc >= 0.0 {
                let sq = disc.sqrt();
                roots.push((-b - sq) / (2.0 * a));
                roots.push((-b + sq) / (2.0 * a));
            }
        } else if b.abs() > 0.0 {
            roots.push(-c / b);
        }
        let mut roots: Vec<f64> = roots
            .into_iter()
            .filter(|t| *t > tol.linear && *t < 1.0 - tol.linear)
            .collect();
        roots.sort_by(f64::total_cmp);
        roots.dedup_by(|a, b| (*a - *b).abs() < tol.linear);
        roots
    }

    /// Split at the inflection points, giving one to three curves.
    pub fn subdivide_inflections(&self, tol: Tolerance) -> Vec<Self> {
        let mut curves = Vec::with_capacity(3);
        let mut rest = *self;
        let mut consumed = 0.0;
        for t in self.find_inflections(tol) {
            // Rescale the parameter onto the remaining piece.
            let local = (t - consumed) / (1.0 - consumed);
            let (head, tail) = rest.subdivide(local);
            curves.push(head);
            rest = tail;
            consumed = t;
        }
        curves.push(rest);
        curves
    }

    /// Arc length using Gravesen's control polygon estimate.
    pub fn length(&self, tol: Tolerance) -> f64 {
        self.length_recursive(tol.linear.max(1e-9), 0)
    }

    fn length_recursive(&self, tolerance: f64, depth: u32) -> f64 {
        let polygon = self.p1.distance_to(&self.c1)
            + self.c1.distance_to(&self.c2)
            + self.c2.distance_to(&self.p2);
        let chord = self.p1.distance_to(&self.p2);
        if polygon - chord > tolerance && depth < 24 {
            let (a, b) = self.subdivide(0.5);
            a.length_recursive(tolerance, depth + 1) + b.length_recursive(tolerance, depth + 1)
        } else {
            0.5 * chord + 0.5 * polygon
        }
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.p2, self.c2, self.c1, self.p1)
    }

    pub fn transform(&self, matrix: &Transform2D) -> Self {
        Self::new(
            matrix.apply_point(self.p1),
            matrix.apply_point(self.c1),
            matrix.apply_point(self.c2),
            matrix.apply_point(self.p2),
        )
    }

    /// Fails for NaN coordinates or a curve that is a single point.
    pub fn validate(&self, tol: Tolerance) -> Result<()> {
        if !self.is_finite() {
            return Err(GeometryError::NonFinite { context: "bezier" }.into());
        }
        if self.is_degenerate(tol) {
            return Err(GeometryError::CoincidentPoints { what: "bezier" }.into());
        }
        Ok(())
    }

    /// Exact bounding box from the derivative roots.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::from_corners(self.p1, self.p2);
        let axis = |p0: f64, p1: f64, p2: f64, p3: f64| -> Vec<f64> {
            // B'(t)/3 = a t^2 + b t + c
            let a = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
            let b = 2.0 * (p0 - 2.0 * p1 + p2);
            let c = p1 - p0;
            if a.abs() < 1e-12 {
                if b.abs() < 1e-12 {
                    return Vec::new();
                }
                return vec![-c / b];
            }
            let disc = b * b - 4.0 * a * c;
            if disc < 0.0 {
                return Vec::new();
            }
            let sq = disc.sqrt();
            vec![(-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)]
        };
        let ts = axis(self.p1.x, self.c1.x, self.c2.x, self.p2.x)
            .into_iter()
            .chain(axis(self.p1.y, self.c1.y, self.c2.y, self.p2.y));
        for t in ts.filter(|t| *t > 0.0 && *t < 1.0) {
            bbox = bbox.include(self.point_at(t));
        }
        bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    fn s_curve() -> CubicBezier {
        CubicBezier::new(
            Point::new(0.0, 0.0),
            Point::new(1.0, 2.0),
            Point::new(2.0, -2.0),
            Point::new(3.0, 0.0),
        )
    }

    #[test]
    fn test_endpoints_and_midpoint() {
        let c = s_curve();
        assert_eq!(c.point_at(0.0), c.p1);
        assert_eq!(c.point_at(1.0), c.p2);
        let m = c.midpoint();
        assert!((m.x - 1.5).abs() < 1e-12 && m.y.abs() < 1e-12);
    }

    #[test]
    fn test_subdivide_continuity() {
        let (a, b) = s_curve().subdivide(0.3);
        assert_eq!(a.p2, b.p1);
        let p = s_curve().point_at(0.3);
        assert!(a.p2.almost_eq(&p, tol()));
        // Tangent continuity at the split.
        let ta = a.tangent_at(1.0, tol()).unit(tol()).unwrap();
        let tb = b.tangent_at(0.0, tol()).unit(tol()).unwrap();
        assert!((ta - tb).length() < 1e-9);
    }

    #[test]
    fn test_inflection_of_s_curve() {
        let roots = s_curve().find_inflections(tol());
        assert_eq!(roots.len(), 1);
        assert!((roots[0] - 0.5).abs() < 1e-9);
        assert_eq!(s_curve().subdivide_inflections(tol()).len(), 2);
    }

    #[test]
    fn test_convex_curve_has_no_inflection() {
        let c = CubicBezier::new(
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 2.0),
            Point::new(2.0, 2.0),
        );
        assert!(c.find_inflections(tol()).is_empty());
        assert_eq!(c.subdivide_inflections(tol()).len(), 1);
    }

    #[test]
    fn test_flatness() {
        let line_like = CubicBezier::new(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.0),
        );
        assert_eq!(line_like.flatness(), 0.0);
        assert!(line_like.is_straight_line(0.001, tol()));
        assert!((s_curve().flatness() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_length_of_straight_curve() {
        let c = CubicBezier::from_quadratic(Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(10.0, 0.0));
        assert!((c.length(tol()) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_tangent_with_coincident_control() {
        let c = CubicBezier::new(
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 0.0),
        );
        let t = c.tangent_at(0.0, tol());
        assert!((t.angle() - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn test_bounding_box_includes_extrema() {
        let bbox = s_curve().bounding_box();
        assert!(bbox.max.y > 0.5 && bbox.min.y < -0.5);
        assert_eq!(bbox.min.x, 0.0);
        assert_eq!(bbox.max.x, 3.0);
    }

    #[test]
    fn test_validate_point_curve() {
        let p = Point::new(1.0, 1.0);
        assert!(CubicBezier::new(p, p, p, p).validate(tol()).is_err());
        assert!(s_curve().validate(tol()).is_ok());
    }
}
