//! Configuration for a tangentcam run
//!
//! The configuration is a flat set of options grouped into sections, the way
//! a user writes it in a TOML or JSON file or passes it on the command line.
//! [`Config::resolve`](crate::resolve) turns it into the typed option
//! structs the pipeline stages take.
//!
//! Lengths are in output units, angles in degrees and times in seconds.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tangentcam_camtools::RotationMode;
use tangentcam_core::{OutputUnits, Tolerance};
use tangentcam_geom::BiarcOptions;
use tangentcam_toolpath::{DepthStrategy, Feeds, PathOrder, SpindleSettings};
use tracing::debug;

use crate::error::{SettingsError, SettingsResult};

/// Tool geometry and motion around the tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Width of the blade or brush
    pub width: f64,
    /// Distance the contact point trails the rotation axis
    pub trail_offset: f64,
    /// Added to every A value, in degrees
    pub angular_offset: f64,
    pub rotation: RotationMode,
    /// Seconds to wait after raising the tool
    pub wait_up: f64,
    /// Seconds to wait after lowering the tool
    pub wait_down: f64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            width: 0.0,
            trail_offset: 0.0,
            angular_offset: 0.0,
            rotation: RotationMode::Tangent,
            wait_up: 0.0,
            wait_down: 0.0,
        }
    }
}

/// Corner handling and smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompensationSettings {
    /// Round corners so the tool width does not gouge while rotating
    pub fillet: bool,
    /// Defaults to half the tool width
    pub fillet_radius: Option<f64>,
    /// Fillet the seam of closed paths too
    pub close_polygons: bool,
    /// Break paths at non-tangent corners instead of rotating in place
    pub split_tangents: bool,
    /// Re-smooth tangent joins after the trail offset
    pub preserve_g1: bool,
    pub smoothing: bool,
    pub smoothing_radius: f64,
}

impl Default for CompensationSettings {
    fn default() -> Self {
        Self {
            fillet: false,
            fillet_radius: None,
            close_polygons: true,
            split_tangents: false,
            preserve_g1: true,
            smoothing: false,
            smoothing_radius: 0.0,
        }
    }
}

/// Cut depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthSettings {
    /// Final depth below the work surface
    #[serde(rename = "final")]
    pub final_depth: f64,
    /// Maximum depth of one pass, 0 for a single pass
    pub per_pass: f64,
    pub strategy: DepthStrategy,
    /// Z height for rapid moves
    pub z_safe: f64,
}

impl Default for DepthSettings {
    fn default() -> Self {
        Self {
            final_depth: 0.0,
            per_pass: 0.0,
            strategy: DepthStrategy::Stepped,
            z_safe: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendKind {
    #[default]
    Default,
    /// G64
    Blend,
    /// G61
    Exact,
}

/// Controller path blending.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendSettings {
    pub mode: BlendKind,
    /// G64 P
    pub tolerance: Option<f64>,
    /// G64 Q, only written together with P
    pub q_tolerance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OvershootKind {
    #[default]
    None,
    /// Half the tool width
    Auto,
    Manual,
}

/// Brush specific motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushSettings {
    pub reload: bool,
    /// Paths between reloads
    pub reload_paths: u32,
    /// Rotate to `reload_angle` while reloading
    pub reload_rotate: bool,
    pub reload_angle: f64,
    /// Stop until the operator resumes
    pub reload_pause: bool,
    /// Dwell instead of stopping, when greater than zero
    pub reload_dwell: f64,
    pub soft_landing: bool,
    pub landing_strip: f64,
    pub overshoot: OvershootKind,
    pub overshoot_distance: f64,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            reload: false,
            reload_paths: 1,
            reload_rotate: false,
            reload_angle: 0.0,
            reload_pause: false,
            reload_dwell: 0.0,
            soft_landing: false,
            landing_strip: 0.0,
            overshoot: OvershootKind::None,
            overshoot_distance: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingSettings {
    pub order: PathOrder,
    /// Leave out the first paths, to resume an interrupted job
    pub skip_paths: usize,
}

/// Output files and program layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub units: OutputUnits,
    /// Defaults to the home directory
    pub directory: Option<PathBuf>,
    pub basename: String,
    pub extension: String,
    /// Append `_NNNN`, counting up from the highest existing file
    pub auto_suffix: bool,
    /// One program per path group
    pub split_groups: bool,
    pub line_numbers: bool,
    pub comments: bool,
    pub creation_date: bool,
    /// List changed settings in the program header
    pub settings_in_header: bool,
    /// Return to X0 Y0 A0 at the end
    pub home_when_done: bool,
    /// Reset the A axis origin after it winds past a full turn
    pub unwrap_a: bool,
    pub header_comments: Vec<String>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            units: OutputUnits::Inferred,
            directory: None,
            basename: "output".to_string(),
            extension: "ngc".to_string(),
            auto_suffix: false,
            split_groups: false,
            line_numbers: false,
            comments: true,
            creation_date: true,
            settings_in_header: false,
            home_when_done: false,
            unwrap_a: false,
            header_comments: Vec::new(),
        }
    }
}

/// Complete run configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Abort on the first path that fails instead of skipping it
    pub strict: bool,
    pub tolerance: Tolerance,
    pub approximation: BiarcOptions,
    pub tool: ToolSettings,
    pub compensation: CompensationSettings,
    pub depth: DepthSettings,
    pub feeds: Feeds,
    pub blend: BlendSettings,
    pub spindle: SpindleSettings,
    pub brush: BrushSettings,
    pub ordering: OrderingSettings,
    pub output: OutputSettings,
}

/// Serialization format of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Format implied by the file extension.
    pub fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            _ => Err(SettingsError::UnsupportedFormat(format!(
                "{} (config files must be .toml or .json)",
                path.display()
            ))),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Location of the per-user config file, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tangentcam").join("config.toml"))
    }

    /// Load the per-user config file if it exists.
    pub fn load_default() -> SettingsResult<Option<Self>> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_from_file(&path).map(Some),
            _ => Ok(None),
        }
    }

    /// Parse a config string in the given format without validating it.
    pub fn parse(content: &str, format: ConfigFormat) -> SettingsResult<Self> {
        let config = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Ok(config)
    }

    /// Load config from a `.toml` or `.json` file and validate it.
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content, format)?;
        config.validate()?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Serialize in the given format.
    pub fn to_string_as(&self, format: ConfigFormat) -> SettingsResult<String> {
        let content = match format {
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
        };
        Ok(content)
    }

    /// Save config to a `.toml` or `.json` file.
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        let format = ConfigFormat::from_path(path)?;
        self.validate()?;
        let content = self.to_string_as(format)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check every value. The first problem found is returned.
    pub fn validate(&self) -> SettingsResult<()> {
        self.resolve().map(|_| ())
    }

    /// Settings that differ from the defaults, as `section.key = value`.
    pub fn changed_settings(&self) -> Vec<String> {
        let (Ok(current), Ok(defaults)) = (
            toml::Value::try_from(self),
            toml::Value::try_from(Self::default()),
        ) else {
            return Vec::new();
        };
        let mut changed = Vec::new();
        diff_values("", &current, Some(&defaults), &mut changed);
        changed
    }
}

fn diff_values(prefix: &str, value: &toml::Value, default: Option<&toml::Value>, out: &mut Vec<String>) {
    match value {
        toml::Value::Table(table) => {
            for (key, item) in table {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                let default_item = default.and_then(|d| d.get(key));
                diff_values(&name, item, default_item, out);
            }
        }
        _ if default == Some(value) => {}
        _ => out.push(format!("{prefix} = {value}")),
    }
}
