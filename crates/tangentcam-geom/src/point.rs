//! Points and vectors.
//!
//! [`Point`] is a location, [`Vector`] a direction with magnitude. The
//! arithmetic only allows the combinations that make sense: point minus point
//! is a vector, point plus vector is a point.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};
use tangentcam_core::{GeometryError, Result, Tolerance};

use crate::transform::Transform2D;

/// A location on the XY plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A 2D displacement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at `distance` from the origin in direction `angle`.
    pub fn from_polar(distance: f64, angle: f64) -> Self {
        Self::new(distance * angle.cos(), distance * angle.sin())
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (*other - *self).length()
    }

    /// Tolerance-based equality.
    pub fn almost_eq(&self, other: &Point, tol: Tolerance) -> bool {
        self.distance_to(other) < tol.linear
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Linear interpolation, `t = 0` is `self` and `t = 1` is `other`.
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        *self + (*other - *self) * t
    }

    /// Signed angle at this vertex from the ray towards `a` to the ray
    /// towards `b`, in (-PI, PI]. Positive is counterclockwise.
    pub fn angle2(&self, a: &Point, b: &Point) -> f64 {
        let va = *a - *self;
        let vb = *b - *self;
        va.angle_to(&vb)
    }

    /// Direction angle of the vector from the origin to this point.
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Displacement from the origin.
    pub fn to_vector(self) -> Vector {
        Vector::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Fails with [`GeometryError::NonFinite`] for NaN or infinite coordinates.
    pub fn finite(self, context: &'static str) -> Result<Self> {
        if self.is_finite() {
            Ok(self)
        } else {
            Err(GeometryError::NonFinite { context }.into())
        }
    }

    pub fn transform(&self, matrix: &Transform2D) -> Point {
        matrix.apply_point(*self)
    }
}

impl Vector {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector of magnitude `length` pointing in direction `angle`.
    pub fn from_polar(length: f64, angle: f64) -> Self {
        Self::new(length * angle.cos(), length * angle.sin())
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Unit vector in the same direction.
    ///
    /// A vector shorter than the linear tolerance has no direction.
    pub fn unit(&self, tol: Tolerance) -> Result<Vector> {
        let len = self.length();
        if len < tol.linear || !len.is_finite() {
            return Err(GeometryError::ZeroLength { what: "vector" }.into());
        }
        Ok(*self / len)
    }

    /// The vector rotated 90 degrees counterclockwise.
    pub fn normal(&self) -> Vector {
        Vector::new(-self.y, self.x)
    }

    pub fn dot(&self, other: &Vector) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product.
    pub fn cross(&self, other: &Vector) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Direction angle in (-PI, PI].
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Signed angle from this vector to `other`, in (-PI, PI].
    pub fn angle_to(&self, other: &Vector) -> f64 {
        self.cross(other).atan2(self.dot(other))
    }

    pub fn rotate(&self, angle: f64) -> Vector {
        let (s, c) = angle.sin_cos();
        Vector::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, rhs: Point) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, rhs: Vector) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign<Vector> for Point {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub<Vector> for Point {
    type Output = Point;

    fn sub(self, rhs: Vector) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        Vector::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vector {
    type Output = Vector;

    fn div(self, rhs: f64) -> Vector {
        Vector::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_point_vector_arithmetic() {
        let p = Point::new(1.0, 2.0);
        let q = Point::new(4.0, 6.0);
        let v = q - p;
        assert_eq!(v, Vector::new(3.0, 4.0));
        assert_eq!(v.length(), 5.0);
        assert_eq!(p + v, q);
        assert_eq!(p.distance_to(&q), 5.0);
    }

    #[test]
    fn test_angle2_sign() {
        let o = Point::ORIGIN;
        let a = Point::new(1.0, 0.0);
        let b = Point::new(0.0, 1.0);
        assert!((o.angle2(&a, &b) - FRAC_PI_2).abs() < 1e-12);
        assert!((o.angle2(&b, &a) + FRAC_PI_2).abs() < 1e-12);
        let c = Point::new(-1.0, 0.0);
        assert!((o.angle2(&a, &c) - PI).abs() < 1e-12);
    }

    #[test]
    fn test_unit_of_zero_vector_fails() {
        let tol = Tolerance::default();
        assert!(Vector::new(0.0, 0.0).unit(tol).is_err());
        let u = Vector::new(0.0, 3.0).unit(tol).unwrap();
        assert!((u.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normal_is_left() {
        let v = Vector::new(1.0, 0.0);
        assert_eq!(v.normal(), Vector::new(-0.0, 1.0));
        assert!(v.cross(&v.normal()) > 0.0);
    }

    #[test]
    fn test_finite_check() {
        assert!(Point::new(f64::NAN, 0.0).finite("test").is_err());
        assert!(Point::new(1.0, 0.0).finite("test").is_ok());
    }
}
