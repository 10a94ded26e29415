//! Elliptical arcs.
//!
//! Ellipses only appear as input geometry. They are converted to cubic
//! Béziers and then to biarcs before any compensation happens.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};
use tangentcam_core::{GeometryError, Result, Tolerance};

use crate::arc::Arc;
use crate::bezier::CubicBezier;
use crate::point::{Point, Vector};
use crate::transform::Transform2D;

/// Elliptical arc in parametric form.
///
/// `point_at(t) = center + u·cos(t) + v·sin(t)` for `t` from `start` to
/// `start + sweep`. For an axis-aligned ellipse `u` and `v` are the semi-major
/// and semi-minor axes. After an arbitrary affine transform they are conjugate
/// semi-diameters, which keeps the transform exact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipticalArc {
    pub center: Point,
    pub u: Vector,
    pub v: Vector,
    /// Parametric start angle.
    pub start: f64,
    /// Signed parametric sweep.
    pub sweep: f64,
}

impl EllipticalArc {
    /// Ellipse with radii `rx`, `ry` rotated by `rotation` about its center.
    pub fn new(center: Point, rx: f64, ry: f64, rotation: f64, start: f64, sweep: f64) -> Self {
        Self {
            center,
            u: Vector::from_polar(rx, rotation),
            v: Vector::from_polar(ry, rotation + FRAC_PI_2),
            start,
            sweep,
        }
    }

    /// Full ellipse, counterclockwise from the `u` axis.
    pub fn full(center: Point, rx: f64, ry: f64, rotation: f64) -> Self {
        Self::new(center, rx, ry, rotation, 0.0, TAU)
    }

    /// Exact elliptical form of a circular arc.
    pub fn from_arc(arc: &Arc) -> Self {
        Self {
            center: arc.center,
            u: Vector::new(arc.radius, 0.0),
            v: Vector::new(0.0, arc.radius),
            start: arc.start_angle(),
            sweep: arc.sweep,
        }
    }

    /// Fails if the ellipse has collapsed to a line or a point.
    pub fn validate(&self, tol: Tolerance) -> Result<()> {
        self.center.finite("ellipse center")?;
        if !(self.u.is_finite() && self.v.is_finite() && self.start.is_finite() && self.sweep.is_finite()) {
            return Err(GeometryError::NonFinite { context: "ellipse" }.into());
        }
        // |u x v| is the product of the semi-axes.
        let area = self.u.cross(&self.v).abs();
        if area < tol.linear * tol.linear
            || self.u.length() < tol.linear
            || self.v.length() < tol.linear
        {
            return Err(GeometryError::ZeroRadius {
                radius: self.u.length().min(self.v.length()),
            }
            .into());
        }
        if self.sweep.abs() < tol.angular {
            return Err(GeometryError::ZeroLength {
                what: "elliptical arc",
            }
            .into());
        }
        Ok(())
    }

    pub fn point_at(&self, t: f64) -> Point {
        let (s, c) = t.sin_cos();
        self.center + self.u * c + self.v * s
    }

    /// First derivative with respect to the parameter.
    pub fn derivative(&self, t: f64) -> Vector {
        let (s, c) = t.sin_cos();
        self.v * c - self.u * s
    }

    pub fn p1(&self) -> Point {
        self.point_at(self.start)
    }

    pub fn p2(&self) -> Point {
        self.point_at(self.start + self.sweep)
    }

    pub fn transform(&self, matrix: &Transform2D) -> Self {
        // Orientation under a reflection is carried by the sign of u x v.
        Self {
            center: matrix.apply_point(self.center),
            u: matrix.apply_vector(self.u),
            v: matrix.apply_vector(self.v),
            start: self.start,
            sweep: self.sweep,
        }
    }

    /// Cubic Bézier approximation, one curve per quarter turn or less.
    pub fn to_beziers(&self, tol: Tolerance) -> Result<Vec<CubicBezier>> {
        self.validate(tol)?;
        let sweep = self.sweep.clamp(-TAU, TAU);
        let count = ((sweep.abs() - tol.angular) / FRAC_PI_2).ceil().max(1.0) as usize;
        let step = sweep / count as f64;
        let curves = (0..count)
            .map(|i| {
                let t1 = self.start + step * i as f64;
                self.bezier_between(t1, t1 + step)
            })
            .collect();
        Ok(curves)
    }

    /// Single Bézier between two parameters; accurate up to a quarter turn.
    fn bezier_between(&self, t1: f64, t2: f64) -> CubicBezier {
        let delta = t2 - t1;
        let n = (delta / 2.0).tan();
        let alpha = delta.sin() * ((4.0 + 3.0 * n * n).sqrt() - 1.0) / 3.0;
        let p1 = self.point_at(t1);
        let p2 = self.point_at(t2);
        CubicBezier::new(
            p1,
            p1 + self.derivative(t1) * alpha,
            p2 - self.derivative(t2) * alpha,
            p2,
        )
    }
}
