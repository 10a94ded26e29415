//! # tangentcam Core
//!
//! Core types shared by every stage of the tangentcam pipeline:
//! the error taxonomy, the explicit numeric [`Tolerance`] value that is
//! threaded through all geometry comparisons, and output unit handling.

pub mod error;
pub mod tolerance;
pub mod units;

pub use error::{ensure_finite, Error, GeometryError, Result};
pub use tolerance::Tolerance;
pub use units::{DocumentUnit, GcodeUnits, OutputUnits, UnitResolution};
