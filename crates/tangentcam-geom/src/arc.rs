//! Circular arc segments.
//!
//! An [`Arc`] keeps its exact endpoints together with the center, the radius
//! and a signed sweep angle. A negative sweep means the arc runs clockwise.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use tangentcam_core::{GeometryError, Result, Tolerance};

use crate::angle::normalize_angle;
use crate::bbox::BoundingBox;
use crate::line::Line;
use crate::point::{Point, Vector};
use crate::transform::Transform2D;

/// Winding direction of an arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArcDirection {
    /// Clockwise arc (G2)
    Clockwise,
    /// Counter-clockwise arc (G3)
    CounterClockwise,
}

impl ArcDirection {
    /// Returns the G-code command for this direction.
    pub fn gcode_command(&self) -> &'static str {
        match self {
            ArcDirection::Clockwise => "G02",
            ArcDirection::CounterClockwise => "G03",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub p1: Point,
    pub p2: Point,
    pub radius: f64,
    /// Signed central angle in radians, negative for clockwise.
    pub sweep: f64,
    pub center: Point,
}

impl Arc {
    pub fn new(p1: Point, p2: Point, radius: f64, sweep: f64, center: Point) -> Self {
        Self {
            p1,
            p2,
            radius,
            sweep,
            center,
        }
    }

    /// Arc from its center, radius, start angle and signed sweep.
    pub fn from_center(
        center: Point,
        radius: f64,
        start_angle: f64,
        sweep: f64,
        tol: Tolerance,
    ) -> Result<Self> {
        center.finite("arc center")?;
        if !radius.is_finite() || !start_angle.is_finite() || !sweep.is_finite() {
            return Err(GeometryError::NonFinite { context: "arc" }.into());
        }
        if radius < tol.linear {
            return Err(GeometryError::ZeroRadius { radius }.into());
        }
        if sweep.abs() < tol.angular || sweep.abs() > TAU + tol.angular {
            return Err(GeometryError::ZeroLength { what: "arc" }.into());
        }
        let p1 = center + Vector::from_polar(radius, start_angle);
        let p2 = center + Vector::from_polar(radius, start_angle + sweep);
        Ok(Self::new(p1, p2, radius, sweep.clamp(-TAU, TAU), center))
    }

    /// Arc between two points around `center`. The shorter way round is
    /// chosen unless `large_arc` is set.
    pub fn from_two_points_and_center(p1: Point, p2: Point, center: Point, large_arc: bool) -> Self {
        let radius = center.distance_to(&p1);
        let mut sweep = center.angle2(&p1, &p2);
        if large_arc {
            sweep = if sweep >= 0.0 { sweep - TAU } else { sweep + TAU };
        }
        Self::new(p1, p2, radius, sweep, center)
    }

    /// Arc from `p1` to `p2` that leaves `p1` along `tangent`.
    ///
    /// With `reverse` set the returned arc runs from `p2` to `p1`.
    pub fn from_two_points_and_tangent(
        p1: Point,
        tangent: Vector,
        p2: Point,
        reverse: bool,
        tol: Tolerance,
    ) -> Result<Self> {
        if p1.almost_eq(&p2, tol) {
            return Err(GeometryError::CoincidentPoints { what: "arc" }.into());
        }
        if tangent.length() < tol.linear {
            return Err(GeometryError::ZeroLength {
                what: "arc tangent",
            }
            .into());
        }
        // The central angle is twice the angle between tangent and chord.
        let sweep = 2.0 * tangent.angle_to(&(p2 - p1));
        let half_sin = (sweep / 2.0).sin();
        if half_sin.abs() < tol.angular {
            return Err(GeometryError::ZeroRadius { radius: 0.0 }.into());
        }
        let radius = (p1.distance_to(&p2) / (2.0 * half_sin)).abs();
        let center = Self::calc_center(p1, p2, radius, sweep);
        let arc = if reverse {
            Self::new(p2, p1, radius, -sweep, center)
        } else {
            Self::new(p1, p2, radius, sweep, center)
        };
        arc.center.finite("arc center")?;
        Ok(arc)
    }

    /// Center of the arc through `p1` and `p2` with the given radius and sweep.
    pub fn calc_center(p1: Point, p2: Point, radius: f64, sweep: f64) -> Point {
        let chord = p2 - p1;
        let chord_len = chord.length();
        if chord_len == 0.0 {
            return p1;
        }
        let mid = p1.midpoint(&p2);
        let c2m = (radius * radius - chord_len * chord_len / 4.0).max(0.0).sqrt();
        // Minor counterclockwise arcs have their center on the left of the chord.
        let left = (sweep > 0.0) != (sweep.abs() > PI);
        let side = if left { 1.0 } else { -1.0 };
        mid + chord.normal() * (side * c2m / chord_len)
    }

    pub fn is_clockwise(&self) -> bool {
        self.sweep < 0.0
    }

    pub fn direction(&self) -> ArcDirection {
        if self.is_clockwise() {
            ArcDirection::Clockwise
        } else {
            ArcDirection::CounterClockwise
        }
    }

    fn winding(&self) -> f64 {
        if self.is_clockwise() {
            -1.0
        } else {
            1.0
        }
    }

    /// Polar angle of `p1` about the center.
    pub fn start_angle(&self) -> f64 {
        (self.p1 - self.center).angle()
    }

    /// Polar angle of `p2` about the center.
    pub fn end_angle(&self) -> f64 {
        (self.p2 - self.center).angle()
    }

    /// Direction of travel at `p1`, in [-PI, PI).
    pub fn start_tangent_angle(&self) -> f64 {
        normalize_angle(self.start_angle() + self.winding() * FRAC_PI_2, 0.0)
    }

    /// Direction of travel at `p2`, in [-PI, PI).
    pub fn end_tangent_angle(&self) -> f64 {
        normalize_angle(self.end_angle() + self.winding() * FRAC_PI_2, 0.0)
    }

    pub fn length(&self) -> f64 {
        (self.radius * self.sweep).abs()
    }

    /// Angle travelled from `p1` to reach the ray through `p`, in [0, 2*PI).
    pub fn angle_from_start(&self, p: &Point) -> f64 {
        let a = (*p - self.center).angle();
        let rel = (a - self.start_angle()) * self.winding();
        normalize_angle(rel, PI)
    }

    /// True if the ray from the center through `p` crosses the arc.
    pub fn contains_angle(&self, p: &Point, tol: Tolerance) -> bool {
        let rel = self.angle_from_start(p);
        rel <= self.sweep.abs() + tol.angular || rel >= TAU - tol.angular
    }

    /// Point reached after travelling `angle` radians from `p1`.
    pub fn point_at_angle(&self, angle: f64) -> Point {
        if angle <= 0.0 {
            return self.p1;
        }
        if angle >= self.sweep.abs() {
            return self.p2;
        }
        let a = self.start_angle() + self.winding() * angle;
        self.center + Vector::from_polar(self.radius, a)
    }

    /// Point at unit distance `mu` along the arc.
    pub fn point_at(&self, mu: f64) -> Point {
        self.point_at_angle(mu * self.sweep.abs())
    }

    /// Unit distance of `p` (projected onto the circle) along the arc.
    pub fn mu(&self, p: &Point) -> f64 {
        let sweep = self.sweep.abs();
        if sweep == 0.0 {
            return 0.0;
        }
        let rel = self.angle_from_start(p);
        // Points just before p1 wrap to nearly 2*PI.
        if rel > sweep && rel > (TAU + sweep) / 2.0 {
            (rel - TAU) / sweep
        } else {
            rel / sweep
        }
    }

    pub fn midpoint(&self) -> Point {
        self.point_at(0.5)
    }

    /// Distance from `p` to the arc.
    ///
    /// `None` if `segment` is set and the radial projection of `p` misses
    /// the arc. Without `segment` the distance to the nearest endpoint is
    /// used in that case.
    pub fn distance_to_point(&self, p: &Point, segment: bool, tol: Tolerance) -> Option<f64> {
        if self.contains_angle(p, tol) {
            Some((self.center.distance_to(p) - self.radius).abs())
        } else if segment {
            None
        } else {
            Some(self.p1.distance_to(p).min(self.p2.distance_to(p)))
        }
    }

    /// Concentric arc with the radius grown by `distance`, same sweep.
    pub fn offset(&self, distance: f64, tol: Tolerance) -> Result<Self> {
        let radius = self.radius + distance;
        if radius < tol.linear {
            return Err(GeometryError::ZeroRadius { radius }.into());
        }
        let scale = radius / self.radius;
        let p1 = self.center + (self.p1 - self.center) * scale;
        let p2 = self.center + (self.p2 - self.center) * scale;
        Ok(Self::new(p1, p2, radius, self.sweep, self.center))
    }

    /// Split at unit distance `mu`.
    pub fn subdivide(&self, mu: f64) -> (Self, Self) {
        let p = self.point_at(mu);
        let a1 = self.sweep * mu;
        (
            Self::new(self.p1, p, self.radius, a1, self.center),
            Self::new(p, self.p2, self.radius, self.sweep - a1, self.center),
        )
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.p2, self.p1, self.radius, -self.sweep, self.center)
    }

    /// Image under a similarity transform, `None` otherwise.
    pub fn transform(&self, matrix: &Transform2D, tol: Tolerance) -> Option<Self> {
        if !matrix.is_similarity(tol) {
            return None;
        }
        let sweep = if matrix.is_reflection() {
            -self.sweep
        } else {
            self.sweep
        };
        Some(Self::new(
            matrix.apply_point(self.p1),
            matrix.apply_point(self.p2),
            self.radius * matrix.similarity_scale(),
            sweep,
            matrix.apply_point(self.center),
        ))
    }

    /// Intersections of the circle with a line.
    pub fn intersect_line(&self, line: &Line, on_arc: bool, on_line: bool, tol: Tolerance) -> Vec<Point> {
        let d = line.vector();
        let len2 = d.length_squared();
        if len2 == 0.0 {
            return Vec::new();
        }
        let f = line.p1 - self.center;
        let b = 2.0 * f.dot(&d);
        let c = f.length_squared() - self.radius * self.radius;
        let disc = b * b - 4.0 * len2 * c;
        let mut params = Vec::new();
        // Tangency is detected on the distance scale, not the raw discriminant.
        let gap = line.distance_to_point(&self.center, false) - self.radius;
        if gap.abs() < tol.linear {
            params.push(-b / (2.0 * len2));
        } else if disc > 0.0 {
            let sq = disc.sqrt();
            params.push((-b - sq) / (2.0 * len2));
            params.push((-b + sq) / (2.0 * len2));
        }
        let slack = tol.linear / len2.sqrt();
        params
            .into_iter()
            .filter(|t| !on_line || (*t >= -slack && *t <= 1.0 + slack))
            .map(|t| line.point_at(t))
            .filter(|p| !on_arc || self.contains_angle(p, tol))
            .collect()
    }

    /// Intersections of the two circles, optionally restricted to both arcs.
    pub fn intersect_arc(&self, other: &Arc, on_arc: bool, tol: Tolerance) -> Vec<Point> {
        intersect_circles(self.center, self.radius, other.center, other.radius, tol)
            .into_iter()
            .filter(|p| !on_arc || (self.contains_angle(p, tol) && other.contains_angle(p, tol)))
            .collect()
    }

    /// Side on which a ray leaving `p2` with direction `angle` lies,
    /// relative to the end tangent: 1 left, -1 right, 0 inline.
    pub fn which_side_angle(&self, angle: f64, tol: Tolerance) -> i8 {
        let tangent = Vector::from_polar(1.0, self.end_tangent_angle());
        let cross = tangent.cross(&Vector::from_polar(1.0, angle));
        if cross.abs() < tol.angular {
            0
        } else if cross > 0.0 {
            1
        } else {
            -1
        }
    }

    pub fn bounding_box(&self, tol: Tolerance) -> BoundingBox {
        let mut bbox = BoundingBox::from_corners(self.p1, self.p2);
        for k in 0..4 {
            let p = self.center + Vector::from_polar(self.radius, k as f64 * FRAC_PI_2);
            if self.contains_angle(&p, tol) {
                bbox = bbox.include(p);
            }
        }
        bbox
    }
}

/// Intersection points of two circles (zero, one or two).
pub fn intersect_circles(c1: Point, r1: f64, c2: Point, r2: f64, tol: Tolerance) -> Vec<Point> {
    let v = c2 - c1;
    let d = v.length();
    if d < tol.linear || d > r1 + r2 + tol.linear || d < (r1 - r2).abs() - tol.linear {
        return Vec::new();
    }
    let a = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
    let h2 = r1 * r1 - a * a;
    let base = c1 + v * (a / d);
    if h2 <= tol.linear * tol.linear {
        return vec![base];
    }
    let h = h2.sqrt();
    let off = v.normal() * (h / d);
    vec![base + off, base - off]
}
