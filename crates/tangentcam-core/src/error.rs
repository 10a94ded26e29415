//! Error handling for tangentcam
//!
//! The pipeline distinguishes four kinds of failure:
//! - Degenerate geometry (zero-length lines, zero-radius arcs, broken paths)
//! - Unreachable approximation tolerance (recoverable, best effort output)
//! - Invalid configuration (always fatal, reported before processing)
//! - Unsupported input (unknown geometry types)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Degenerate geometry details.
///
/// Produced by the geometry kernel whenever an operation would otherwise
/// yield NaN or infinite coordinates.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A segment whose endpoints coincide
    #[error("zero-length {what}")]
    ZeroLength {
        /// The kind of primitive that collapsed.
        what: &'static str,
    },

    /// An arc or circle with a radius below tolerance
    #[error("zero radius arc (radius {radius})")]
    ZeroRadius {
        /// The offending radius.
        radius: f64,
    },

    /// All defining points of a primitive coincide
    #[error("coincident points in {what}")]
    CoincidentPoints {
        /// The kind of primitive.
        what: &'static str,
    },

    /// Consecutive path segments do not connect
    #[error("path is discontinuous at segment {index} (gap {gap})")]
    Discontinuous {
        /// Index of the segment whose start does not meet the previous end.
        index: usize,
        /// Size of the gap.
        gap: f64,
    },

    /// A coordinate or parameter is NaN or infinite
    #[error("non-finite value in {context}")]
    NonFinite {
        /// Where the value was found.
        context: &'static str,
    },
}

/// Main error type for tangentcam
///
/// A unified error type covering the failure taxonomy of every pipeline stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Degenerate input or intermediate geometry
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(#[from] GeometryError),

    /// Subdivision depth exhausted before the curve tolerance was met
    #[error(
        "Tolerance {tolerance} unreachable after {depth} subdivisions (max deviation {deviation})"
    )]
    ToleranceUnreachable {
        /// The requested tolerance.
        tolerance: f64,
        /// The best deviation that was reached.
        deviation: f64,
        /// The subdivision depth limit.
        depth: u32,
    },

    /// Out-of-range or inconsistent configuration value
    #[error("Invalid configuration for '{name}': {reason}")]
    InvalidConfiguration {
        /// The option name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Geometry type the pipeline cannot handle
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),
}

impl Error {
    /// Create a configuration error for the named option.
    pub fn invalid_config(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Recoverable errors only affect a single path; the batch may continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::DegenerateGeometry(_)
                | Error::ToleranceUnreachable { .. }
                | Error::UnsupportedInput(_)
        )
    }

    /// Check if this is a configuration error
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Error::InvalidConfiguration { .. })
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

/// Reject NaN and infinite values.
pub fn ensure_finite(value: f64, context: &'static str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GeometryError::NonFinite { context }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err: Error = GeometryError::ZeroLength { what: "line" }.into();
        assert_eq!(err.to_string(), "Degenerate geometry: zero-length line");

        let err = Error::invalid_config("tool.width", "must be >= 0");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for 'tool.width': must be >= 0"
        );

        let err = Error::UnsupportedInput("quadratic".to_string());
        assert_eq!(err.to_string(), "Unsupported input: quadratic");
    }

    #[test]
    fn test_recoverable() {
        assert!(Error::from(GeometryError::ZeroRadius { radius: 0.0 }).is_recoverable());
        assert!(Error::ToleranceUnreachable {
            tolerance: 0.01,
            deviation: 0.02,
            depth: 4
        }
        .is_recoverable());
        assert!(!Error::invalid_config("depth", "negative").is_recoverable());
        assert!(Error::invalid_config("depth", "negative").is_configuration_error());
    }

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite(1.5, "x").ok(), Some(1.5));
        assert!(matches!(
            ensure_finite(f64::NAN, "x"),
            Err(Error::DegenerateGeometry(GeometryError::NonFinite { context: "x" }))
        ));
        assert!(ensure_finite(f64::INFINITY, "y").is_err());
    }
}
