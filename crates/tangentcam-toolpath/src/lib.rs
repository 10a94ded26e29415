//! # tangentcam Toolpath
//!
//! Toolpath assembly and G-code emission for tangential-tool machines.
//!
//! The [`ToolpathAssembler`] sequences compensated paths into typed motions
//! with the full machine state recorded after each one: depth passes, spindle
//! control, brush landing and overshoot moves, reloads and A axis tracking.
//! [`ToolpathToGcode`] writes the result as G-code, emitting only the words
//! that changed.

pub mod assembler;
pub mod brush;
pub mod error;
pub mod gcode_gen;
pub mod machine;
pub mod multipass;
pub mod ordering;
pub mod toolpath;

pub use assembler::ToolpathAssembler;
pub use brush::{prepare_stroke, ReloadCounter, Stroke, StrokeSegment, ZTarget};
pub use error::{ToolpathError, ToolpathResult};
pub use gcode_gen::{GcodeOptions, ToolpathToGcode, TARGET_MACHINE};
pub use machine::{
    BlendMode, Feeds, LandingOptions, MachineOptions, OvershootMode, PathOrder, PauseMode,
    ReloadPolicy, SpindleMode, SpindleSettings, ToolState,
};
pub use multipass::{DepthStrategy, MultiPassConfig};
pub use ordering::{flip_paths, order_paths, Traversable};
pub use toolpath::{arc_length, Axes, MachineState, Motion, Toolpath, ToolpathSegment};
