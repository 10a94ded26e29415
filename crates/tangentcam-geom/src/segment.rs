//! Path segments and input curves.
//!
//! A [`Segment`] is what paths are made of after approximation: a line or a
//! circular arc. A [`Curve`] is anything the input may contain.

use serde::{Deserialize, Serialize};
use tangentcam_core::{Result, Tolerance};

use crate::angle::directions_eq;
use crate::arc::Arc;
use crate::bbox::BoundingBox;
use crate::bezier::CubicBezier;
use crate::ellipse::EllipticalArc;
use crate::line::Line;
use crate::point::Point;
use crate::transform::Transform2D;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment {
    Line(Line),
    Arc(Arc),
}

impl Segment {
    pub fn p1(&self) -> Point {
        match self {
            Segment::Line(l) => l.p1,
            Segment::Arc(a) => a.p1,
        }
    }

    pub fn p2(&self) -> Point {
        match self {
            Segment::Line(l) => l.p2,
            Segment::Arc(a) => a.p2,
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            Segment::Line(l) => l.length(),
            Segment::Arc(a) => a.length(),
        }
    }

    /// Direction of travel at `p1`.
    pub fn start_tangent_angle(&self) -> f64 {
        match self {
            Segment::Line(l) => l.angle(),
            Segment::Arc(a) => a.start_tangent_angle(),
        }
    }

    /// Direction of travel at `p2`.
    pub fn end_tangent_angle(&self) -> f64 {
        match self {
            Segment::Line(l) => l.angle(),
            Segment::Arc(a) => a.end_tangent_angle(),
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Segment::Line(l) => Segment::Line(l.reversed()),
            Segment::Arc(a) => Segment::Arc(a.reversed()),
        }
    }

    pub fn point_at(&self, mu: f64) -> Point {
        match self {
            Segment::Line(l) => l.point_at(mu),
            Segment::Arc(a) => a.point_at(mu),
        }
    }

    pub fn midpoint(&self) -> Point {
        self.point_at(0.5)
    }

    /// Unit distance of the projection of `p` along the segment.
    pub fn mu(&self, p: &Point) -> f64 {
        match self {
            Segment::Line(l) => l.mu(p),
            Segment::Arc(a) => a.mu(p),
        }
    }

    /// Split at unit distance `mu`.
    pub fn subdivide(&self, mu: f64) -> (Self, Self) {
        match self {
            Segment::Line(l) => {
                let p = l.point_at(mu);
                (Segment::Line(Line::new(l.p1, p)), Segment::Line(Line::new(p, l.p2)))
            }
            Segment::Arc(a) => {
                let (a1, a2) = a.subdivide(mu);
                (Segment::Arc(a1), Segment::Arc(a2))
            }
        }
    }

    /// Distance from `p` to the segment, clamped to the endpoints.
    pub fn distance_to_point(&self, p: &Point, tol: Tolerance) -> f64 {
        match self {
            Segment::Line(l) => l.distance_to_point(p, true),
            Segment::Arc(a) => a.distance_to_point(p, false, tol).unwrap_or(f64::INFINITY),
        }
    }

    /// Side on which a ray leaving `p2` in direction `angle` lies.
    pub fn which_side_angle(&self, angle: f64, tol: Tolerance) -> i8 {
        match self {
            Segment::Line(l) => l.which_side_angle(angle, tol),
            Segment::Arc(a) => a.which_side_angle(angle, tol),
        }
    }

    pub fn is_degenerate(&self, tol: Tolerance) -> bool {
        match self {
            Segment::Line(l) => l.is_degenerate(tol),
            Segment::Arc(a) => {
                a.radius < tol.linear || a.length() < tol.linear
            }
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Segment::Line(l) => l.p1.is_finite() && l.p2.is_finite(),
            Segment::Arc(a) => {
                a.p1.is_finite()
                    && a.p2.is_finite()
                    && a.center.is_finite()
                    && a.radius.is_finite()
                    && a.sweep.is_finite()
            }
        }
    }

    pub fn bounding_box(&self, tol: Tolerance) -> BoundingBox {
        match self {
            Segment::Line(l) => l.bounding_box(),
            Segment::Arc(a) => a.bounding_box(tol),
        }
    }

    /// Same segment with its end point replaced, keeping the start.
    ///
    /// Arcs keep their center; the sweep is adjusted to the new end.
    pub fn with_end(&self, p: Point) -> Self {
        match self {
            Segment::Line(l) => Segment::Line(Line::new(l.p1, p)),
            Segment::Arc(a) => {
                let sweep = a.sweep - a.center.angle2(&p, &a.p2);
                Segment::Arc(Arc::new(a.p1, p, a.radius, sweep, a.center))
            }
        }
    }

    /// Same segment with its start point replaced, keeping the end.
    pub fn with_start(&self, p: Point) -> Self {
        match self {
            Segment::Line(l) => Segment::Line(Line::new(p, l.p2)),
            Segment::Arc(a) => {
                let sweep = a.sweep - a.center.angle2(&a.p1, &p);
                Segment::Arc(Arc::new(p, a.p2, a.radius, sweep, a.center))
            }
        }
    }

    pub fn as_arc(&self) -> Option<&Arc> {
        match self {
            Segment::Arc(a) => Some(a),
            Segment::Line(_) => None,
        }
    }
}

impl From<Line> for Segment {
    fn from(line: Line) -> Self {
        Segment::Line(line)
    }
}

impl From<Arc> for Segment {
    fn from(arc: Arc) -> Self {
        Segment::Arc(arc)
    }
}

/// True if `seg2` continues `seg1` without a change of direction.
pub fn segments_are_g1(seg1: &Segment, seg2: &Segment, tol: Tolerance) -> bool {
    seg1.p2().almost_eq(&seg2.p1(), tol)
        && directions_eq(seg1.end_tangent_angle(), seg2.start_tangent_angle(), tol)
}

/// Input geometry before approximation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Curve {
    Line(Line),
    Arc(Arc),
    Bezier(CubicBezier),
    Ellipse(EllipticalArc),
}

impl Curve {
    pub fn p1(&self) -> Point {
        match self {
            Curve::Line(l) => l.p1,
            Curve::Arc(a) => a.p1,
            Curve::Bezier(b) => b.p1,
            Curve::Ellipse(e) => e.p1(),
        }
    }

    pub fn p2(&self) -> Point {
        match self {
            Curve::Line(l) => l.p2,
            Curve::Arc(a) => a.p2,
            Curve::Bezier(b) => b.p2,
            Curve::Ellipse(e) => e.p2(),
        }
    }

    /// Apply an affine transform. Circular arcs become elliptical arcs
    /// unless the transform is a similarity.
    pub fn transform(&self, matrix: &Transform2D, tol: Tolerance) -> Self {
        match self {
            Curve::Line(l) => Curve::Line(l.transform(matrix)),
            Curve::Arc(a) => match a.transform(matrix, tol) {
                Some(arc) => Curve::Arc(arc),
                None => Curve::Ellipse(EllipticalArc::from_arc(a).transform(matrix)),
            },
            Curve::Bezier(b) => Curve::Bezier(b.transform(matrix)),
            Curve::Ellipse(e) => Curve::Ellipse(e.transform(matrix)),
        }
    }

    /// Reject non-finite coordinates and collapsed primitives.
    pub fn validate(&self, tol: Tolerance) -> Result<()> {
        match self {
            Curve::Line(l) => Line::try_new(l.p1, l.p2, tol).map(|_| ()),
            Curve::Arc(a) => {
                a.center.finite("arc center")?;
                Arc::from_center(a.center, a.radius, a.start_angle(), a.sweep, tol).map(|_| ())
            }
            Curve::Bezier(b) => b.validate(tol),
            Curve::Ellipse(e) => e.validate(tol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    #[test]
    fn test_g1_line_to_tangent_arc() {
        let line = Segment::Line(Line::new(Point::new(0.0, -10.0), Point::new(10.0, -10.0)));
        let arc = Segment::Arc(
            Arc::from_center(Point::new(10.0, 0.0), 10.0, -FRAC_PI_2, FRAC_PI_2, tol()).unwrap(),
        );
        assert!(segments_are_g1(&line, &arc, tol()));
        let corner = Segment::Line(Line::new(Point::new(10.0, -10.0), Point::new(10.0, 0.0)));
        assert!(!segments_are_g1(&line, &corner, tol()));
    }

    #[test]
    fn test_with_end_trims_arc() {
        let arc = Arc::from_center(Point::ORIGIN, 1.0, 0.0, FRAC_PI_2, tol()).unwrap();
        let mid = arc.midpoint();
        let trimmed = Segment::Arc(arc).with_end(mid);
        assert!((trimmed.length() - arc.length() / 2.0).abs() < 1e-9);
        let tail = Segment::Arc(arc).with_start(mid);
        assert!((tail.length() - arc.length() / 2.0).abs() < 1e-9);
        assert!(tail.p2().almost_eq(&arc.p2, tol()));
    }

    #[test]
    fn test_curve_transform_makes_ellipse() {
        let arc = Arc::from_center(Point::ORIGIN, 1.0, 0.0, FRAC_PI_2, tol()).unwrap();
        let curve = Curve::Arc(arc);
        assert!(matches!(
            curve.transform(&Transform2D::scale(2.0, 1.0), tol()),
            Curve::Ellipse(_)
        ));
        assert!(matches!(
            curve.transform(&Transform2D::scale(2.0, 2.0), tol()),
            Curve::Arc(_)
        ));
    }

    #[test]
    fn test_validate_rejects_zero_length_line() {
        let p = Point::new(3.0, 3.0);
        assert!(Curve::Line(Line::new(p, p)).validate(tol()).is_err());
    }
}
