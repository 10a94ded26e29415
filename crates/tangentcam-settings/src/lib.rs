//! # tangentcam Settings
//!
//! Run configuration for tangentcam: a sectioned [`Config`] that loads from
//! and saves to TOML or JSON, range checks every value, and resolves into
//! the option types of the pipeline stages ([`JobSettings`]).

pub mod config;
pub mod error;
pub mod resolve;

pub use config::{
    BlendKind, BlendSettings, BrushSettings, CompensationSettings, Config, ConfigFormat,
    DepthSettings, OrderingSettings, OutputSettings, OvershootKind, ToolSettings,
};
pub use error::{SettingsError, SettingsResult};
pub use resolve::JobSettings;
