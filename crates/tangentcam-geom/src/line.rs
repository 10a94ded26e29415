//! Straight line segments.

use serde::{Deserialize, Serialize};
use tangentcam_core::{GeometryError, Result, Tolerance};

use crate::bbox::BoundingBox;
use crate::point::{Point, Vector};
use crate::transform::Transform2D;

/// Directed segment from `p1` to `p2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub p1: Point,
    pub p2: Point,
}

impl Line {
    pub fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    /// Validated constructor: endpoints must be finite and distinct.
    pub fn try_new(p1: Point, p2: Point, tol: Tolerance) -> Result<Self> {
        p1.finite("line start")?;
        p2.finite("line end")?;
        if p1.almost_eq(&p2, tol) {
            return Err(GeometryError::ZeroLength { what: "line" }.into());
        }
        Ok(Self::new(p1, p2))
    }

    /// Line starting at `p` with the given length and direction.
    pub fn from_polar(p: Point, length: f64, angle: f64) -> Self {
        Self::new(p, p + Vector::from_polar(length, angle))
    }

    pub fn vector(&self) -> Vector {
        self.p2 - self.p1
    }

    pub fn length(&self) -> f64 {
        self.vector().length()
    }

    /// Direction angle in (-PI, PI].
    pub fn angle(&self) -> f64 {
        self.vector().angle()
    }

    /// Unit direction vector.
    pub fn direction(&self, tol: Tolerance) -> Result<Vector> {
        self.vector().unit(tol)
    }

    pub fn midpoint(&self) -> Point {
        self.p1.midpoint(&self.p2)
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.p2, self.p1)
    }

    pub fn is_degenerate(&self, tol: Tolerance) -> bool {
        self.p1.almost_eq(&self.p2, tol)
    }

    /// Point at unit distance `mu` from `p1` (`mu = 1` is `p2`).
    pub fn point_at(&self, mu: f64) -> Point {
        self.p1.lerp(&self.p2, mu)
    }

    /// Unit distance of the normal projection of `p` along this line.
    pub fn mu(&self, p: &Point) -> f64 {
        let v = self.vector();
        let len2 = v.length_squared();
        if len2 == 0.0 {
            return 0.0;
        }
        (*p - self.p1).dot(&v) / len2
    }

    /// Translate the segment along its own direction by `distance`.
    pub fn shift(&self, distance: f64) -> Self {
        let len = self.length();
        if len == 0.0 {
            return *self;
        }
        let delta = self.vector() * (distance / len);
        Self::new(self.p1 + delta, self.p2 + delta)
    }

    /// Parallel line at `distance`; positive offsets go to the left.
    pub fn offset(&self, distance: f64) -> Self {
        let len = self.length();
        if len == 0.0 {
            return *self;
        }
        let delta = self.vector().normal() * (distance / len);
        Self::new(self.p1 + delta, self.p2 + delta)
    }

    /// Lengthen (or shorten, if negative) the segment at `p2`.
    pub fn extend(&self, distance: f64) -> Self {
        let len = self.length();
        if len == 0.0 {
            return *self;
        }
        Self::new(self.p1, self.p2 + self.vector() * (distance / len))
    }

    /// Foot of the perpendicular from `p`.
    ///
    /// With `segment` set the foot must lie between the endpoints.
    pub fn normal_projection_point(&self, p: &Point, segment: bool, tol: Tolerance) -> Option<Point> {
        if self.is_degenerate(tol) {
            return None;
        }
        let mu = self.mu(p);
        if segment {
            let slack = tol.linear / self.length();
            if mu < -slack || mu > 1.0 + slack {
                return None;
            }
        }
        Some(self.point_at(mu))
    }

    /// Distance from `p` to the segment (or to the infinite line).
    pub fn distance_to_point(&self, p: &Point, segment: bool) -> f64 {
        let v = self.vector();
        let len2 = v.length_squared();
        if len2 == 0.0 {
            return self.p1.distance_to(p);
        }
        let mut mu = (*p - self.p1).dot(&v) / len2;
        if segment {
            mu = mu.clamp(0.0, 1.0);
        }
        self.point_at(mu).distance_to(p)
    }

    /// Intersection with another line.
    ///
    /// Parallel or coincident lines have no single intersection. With
    /// `segment` set the point must lie on both segments.
    pub fn intersection(&self, other: &Line, segment: bool, tol: Tolerance) -> Option<Point> {
        let r = self.vector();
        let s = other.vector();
        let (r_len, s_len) = (r.length(), s.length());
        if r_len == 0.0 || s_len == 0.0 {
            return None;
        }
        let denom = r.cross(&s);
        if (denom / (r_len * s_len)).abs() < tol.angular {
            return None;
        }
        let qp = other.p1 - self.p1;
        let t = qp.cross(&s) / denom;
        let u = qp.cross(&r) / denom;
        if segment {
            let t_slack = tol.linear / r_len;
            let u_slack = tol.linear / s_len;
            if t < -t_slack || t > 1.0 + t_slack || u < -u_slack || u > 1.0 + u_slack {
                return None;
            }
        }
        let p = self.point_at(t);
        p.is_finite().then_some(p)
    }

    /// Side of the line `p` lies on: 1 left, -1 right, 0 on the line.
    pub fn which_side(&self, p: &Point, tol: Tolerance) -> i8 {
        let len = self.length();
        if len == 0.0 {
            return 0;
        }
        let d = self.vector().cross(&(*p - self.p1)) / len;
        if d.abs() < tol.linear {
            0
        } else if d > 0.0 {
            1
        } else {
            -1
        }
    }

    /// Side on which a ray leaving `p2` with direction `angle` lies.
    pub fn which_side_angle(&self, angle: f64, tol: Tolerance) -> i8 {
        let dir = match self.direction(tol) {
            Ok(d) => d,
            Err(_) => return 0,
        };
        let cross = dir.cross(&Vector::from_polar(1.0, angle));
        if cross.abs() < tol.angular {
            0
        } else if cross > 0.0 {
            1
        } else {
            -1
        }
    }

    /// Perpendicular bisector through the midpoint.
    pub fn bisector(&self) -> Line {
        let mid = self.midpoint();
        Line::new(mid, mid + self.vector().normal())
    }

    pub fn transform(&self, matrix: &Transform2D) -> Self {
        Self::new(matrix.apply_point(self.p1), matrix.apply_point(self.p2))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_corners(self.p1, self.p2)
    }
}
