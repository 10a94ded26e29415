//! Numeric tolerance for geometric comparisons.
//!
//! A single immutable [`Tolerance`] value is created from configuration at the
//! start of a run and passed by value into every geometry operation that
//! compares floating point numbers. There is no process-wide epsilon.

use serde::{Deserialize, Serialize};

/// Epsilon values for distance and angle comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Linear tolerance for distance comparisons (in document units)
    pub linear: f64,
    /// Angular tolerance (in radians)
    pub angular: f64,
}

impl Tolerance {
    pub const DEFAULT_LINEAR: f64 = 1e-6;
    pub const DEFAULT_ANGULAR: f64 = 1e-6;

    const MIN_PRECISION: usize = 2;
    const MAX_PRECISION: usize = 15;

    pub fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }

    /// Same epsilon for distances and angles.
    pub fn uniform(epsilon: f64) -> Self {
        Self::new(epsilon, epsilon)
    }

    /// Check if two values are equal within linear tolerance
    pub fn eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.linear
    }

    /// Check if a value is zero within linear tolerance
    pub fn is_zero(self, v: f64) -> bool {
        v.abs() < self.linear
    }

    /// Check if two angles are equal within angular tolerance
    pub fn angle_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.angular
    }

    /// Check if an angle is zero within angular tolerance
    pub fn angle_is_zero(self, a: f64) -> bool {
        a.abs() < self.angular
    }

    /// Number of digits after the decimal point implied by the linear epsilon.
    ///
    /// `1e-6` gives 6 digits. The result is clamped to `2..=15`.
    pub fn precision(self) -> usize {
        if !(self.linear.is_finite() && self.linear > 0.0) {
            return Self::MAX_PRECISION;
        }
        let digits = self.linear.log10().abs().round() as usize;
        digits.clamp(Self::MIN_PRECISION, Self::MAX_PRECISION)
    }

    /// Both epsilons must be positive and finite.
    pub fn is_valid(self) -> bool {
        self.linear.is_finite()
            && self.linear > 0.0
            && self.angular.is_finite()
            && self.angular > 0.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LINEAR, Self::DEFAULT_ANGULAR)
    }
}
