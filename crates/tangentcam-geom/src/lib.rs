//! # tangentcam-geom
//!
//! Immutable 2D primitives for the tangentcam pipeline and the biarc curve
//! approximator.
//!
//! Every comparison takes an explicit [`Tolerance`]; there is no global
//! epsilon. Operations that would produce NaN or infinite coordinates return
//! [`tangentcam_core::Error::DegenerateGeometry`] instead.

pub mod angle;
pub mod arc;
pub mod bbox;
pub mod bezier;
pub mod biarc;
pub mod ellipse;
pub mod fillet;
pub mod line;
pub mod path;
pub mod point;
pub mod segment;
pub mod transform;

pub use angle::{calc_rotation, directions_eq, normalize_angle};
pub use arc::{intersect_circles, Arc, ArcDirection};
pub use bbox::BoundingBox;
pub use bezier::CubicBezier;
pub use biarc::{approximate_bezier, approximate_curve, fit_biarc, Approximation, BiarcOptions};
pub use ellipse::EllipticalArc;
pub use fillet::{connect_fillet, create_fillet_arc};
pub use line::Line;
pub use path::Path;
pub use point::{Point, Vector};
pub use segment::{segments_are_g1, Curve, Segment};
pub use transform::Transform2D;

pub use tangentcam_core::Tolerance;
