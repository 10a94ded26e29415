//! Error types for toolpath assembly and G-code emission.

use thiserror::Error;

/// Errors raised while sequencing or writing a toolpath.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolpathError {
    /// An arc feed whose start point is not on its circle.
    #[error("Mismatching arc radii: start radius {start}, end radius {end}")]
    ArcRadiusMismatch {
        /// Distance from the center to the current position.
        start: f64,
        /// Distance from the center to the arc end point.
        end: f64,
    },

    /// NaN or infinity about to be written.
    #[error("Non-finite value for axis {axis}")]
    NonFiniteValue {
        /// Parameter letter.
        axis: char,
    },

    /// A motion command was issued before any position was known.
    #[error("Unknown current position for {0}")]
    UnknownPosition(&'static str),

    /// A path without segments reached the assembler.
    #[error("Path {index} is empty")]
    EmptyPath {
        /// Position of the path in the assembly order.
        index: usize,
    },

    /// Configuration or geometry failure from a lower layer.
    #[error(transparent)]
    Core(#[from] tangentcam_core::Error),
}

impl ToolpathError {
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, ToolpathError::Core(e) if e.is_configuration_error())
    }
}

/// Result type for toolpath operations.
pub type ToolpathResult<T> = Result<T, ToolpathError>;
