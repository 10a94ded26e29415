//! # tangentcam CAM Tools
//!
//! Geometry compensation for tangential tools (brushes, drag knives).
//!
//! ## Stages
//!
//! - **Trail offset**: move the rotation center ahead of the contact point
//! - **Tool fillets**: round corners by half the tool width
//! - **Tangent split**: break paths at corners instead of rotating in place
//! - **G1 preservation**: re-smooth joins the trail offset broke
//! - **Smoothing fillets**: round remaining corners and spread the rotation

pub mod compensate;
pub mod cut_path;
pub mod fillet;
pub mod offset;
pub mod smoothing;
pub mod split;

pub use compensate::{compensate, CompensationOptions, CornerPolicy, RotationMode};
pub use cut_path::{CutPath, CutSegment};
pub use fillet::{adjusted_fillet, clamped_fillet, fillet_path, FilletOptions};
pub use offset::{offset_arc, offset_path};
pub use smoothing::{fix_g1_path, smoothing_curve};
pub use split::split_path_g1;
