//! Machine and tool parameters for toolpath assembly.
//!
//! Every mode is a closed enum resolved once from configuration, so the
//! assembler can match on it exhaustively instead of checking flags.
//! Lengths are in output units, feeds in output units per minute, angles
//! in radians and times in seconds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tangentcam_camtools::RotationMode;
use tangentcam_core::{Error, Result};

use crate::multipass::{DepthStrategy, MultiPassConfig};

/// Tool geometry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolState {
    /// Width of the tool blade or brush
    pub width: f64,
    /// Distance the contact point trails the rotation axis
    pub trail_offset: f64,
}

/// When the spindle runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpindleMode {
    #[default]
    Off,
    /// On at the start of the run, off at the end
    Once,
    /// On before and off after every path
    PerPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpindleSettings {
    pub mode: SpindleMode,
    pub rpm: f64,
    pub clockwise: bool,
    /// Dwell after spindle on, before the first cutting move
    pub warmup: f64,
}

impl Default for SpindleSettings {
    fn default() -> Self {
        Self {
            mode: SpindleMode::Off,
            rpm: 0.0,
            clockwise: true,
            warmup: 0.0,
        }
    }
}

/// Controller cornering policy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum BlendMode {
    /// Leave the controller default alone
    #[default]
    Default,
    /// G64, with optional path (P) and naive cam (Q) tolerances
    Blend {
        tolerance: Option<f64>,
        q_tolerance: Option<f64>,
    },
    /// G61
    Exact,
}

/// How the machine waits at a reload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PauseMode {
    /// M0, until the operator resumes
    Indefinite,
    /// Dwell for a fixed number of seconds
    Timed { seconds: f64 },
}

/// Brush reload sequencing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ReloadPolicy {
    #[default]
    Disabled,
    /// Reload after every `paths` cut paths.
    Every {
        paths: u32,
        /// Rotate to this A angle while reloading
        angle: Option<f64>,
        pause: Option<PauseMode>,
    },
}

/// Extra travel past the end of a path.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum OvershootMode {
    #[default]
    None,
    /// Half the tool width
    Auto,
    Manual { distance: f64 },
}

impl OvershootMode {
    pub fn distance(&self, tool: &ToolState) -> f64 {
        match self {
            OvershootMode::None => 0.0,
            OvershootMode::Auto => tool.width / 2.0,
            OvershootMode::Manual { distance } => *distance,
        }
    }
}

/// Path entry options for flexible tools.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingOptions {
    /// Ramp down over the trail offset distance before the path start
    pub soft_landing: bool,
    /// Straight run-in prepended along the start direction
    pub landing_strip: f64,
}

/// Path ordering policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathOrder {
    /// Keep document order
    #[default]
    #[serde(rename = "none")]
    None,
    /// Keep order, reverse paths to shorten rapids
    #[serde(rename = "flip")]
    Flip,
    /// Bottom to top, left to right
    #[serde(rename = "optimize")]
    Optimize,
    #[serde(rename = "y+")]
    YAscending,
    #[serde(rename = "y-")]
    YDescending,
    #[serde(rename = "x+")]
    XAscending,
    #[serde(rename = "x-")]
    XDescending,
}

impl fmt::Display for PathOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PathOrder::None => "none",
            PathOrder::Flip => "flip",
            PathOrder::Optimize => "optimize",
            PathOrder::YAscending => "y+",
            PathOrder::YDescending => "y-",
            PathOrder::XAscending => "x+",
            PathOrder::XDescending => "x-",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PathOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(PathOrder::None),
            "flip" => Ok(PathOrder::Flip),
            "optimize" => Ok(PathOrder::Optimize),
            "y+" => Ok(PathOrder::YAscending),
            "y-" => Ok(PathOrder::YDescending),
            "x+" => Ok(PathOrder::XAscending),
            "x-" => Ok(PathOrder::XDescending),
            _ => Err(format!("Unknown path order: {}", s)),
        }
    }
}

/// Feed rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feeds {
    pub xy: f64,
    pub z: f64,
    /// Degrees per minute
    pub a: f64,
    /// Derive the A feed so the tool edge moves at the XY feed
    pub match_a_to_xy: bool,
}

impl Default for Feeds {
    fn default() -> Self {
        Self {
            xy: 400.0,
            z: 400.0,
            a: 360.0,
            match_a_to_xy: false,
        }
    }
}

impl Feeds {
    /// A axis feed in degrees per minute.
    ///
    /// When matched, one revolution covers the circumference of a tool of
    /// `tool_width`. Narrow tools fall back to the configured feed.
    pub fn a_feed(&self, tool_width: f64) -> f64 {
        if self.match_a_to_xy && tool_width > f64::EPSILON {
            360.0 * self.xy / (std::f64::consts::PI * tool_width)
        } else {
            self.a
        }
    }
}

/// Everything the assembler needs besides the paths.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineOptions {
    pub rotation: RotationMode,
    pub tool: ToolState,
    /// Final cut depth below the work surface (positive is down)
    pub depth: f64,
    /// Maximum depth per pass, if multiple passes are wanted
    pub depth_per_pass: Option<f64>,
    pub depth_strategy: DepthStrategy,
    /// Z height for rapid moves
    pub z_safe: f64,
    pub feeds: Feeds,
    pub spindle: SpindleSettings,
    pub reload: ReloadPolicy,
    pub overshoot: OvershootMode,
    pub landing: LandingOptions,
    /// Paths to skip before output starts, for resuming a job
    pub skip_paths: usize,
    /// Seconds to wait after the tool goes up
    pub tool_wait_up: f64,
    /// Seconds to wait after the tool goes down
    pub tool_wait_down: f64,
    /// Return to X0 Y0 A0 at the end of the run
    pub home_when_done: bool,
    /// Reset the A axis origin when it has wound up past a full turn
    pub unwrap_a: bool,
}

impl Default for MachineOptions {
    fn default() -> Self {
        Self {
            rotation: RotationMode::Tangent,
            tool: ToolState::default(),
            depth: 0.0,
            depth_per_pass: None,
            depth_strategy: DepthStrategy::Stepped,
            z_safe: 10.0,
            feeds: Feeds::default(),
            spindle: SpindleSettings::default(),
            reload: ReloadPolicy::Disabled,
            overshoot: OvershootMode::None,
            landing: LandingOptions::default(),
            skip_paths: 0,
            tool_wait_up: 0.0,
            tool_wait_down: 0.0,
            home_when_done: false,
            unwrap_a: false,
        }
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_config(
            name,
            format!("must be a non-negative number, got {value}"),
        ))
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_config(
            name,
            format!("must be greater than zero, got {value}"),
        ))
    }
}

impl MachineOptions {
    /// Range checks. Called before any path is processed.
    pub fn validate(&self) -> Result<()> {
        non_negative("tool.width", self.tool.width)?;
        non_negative("tool.trail_offset", self.tool.trail_offset)?;
        if !self.depth.is_finite() {
            return Err(Error::invalid_config("depth.final", "must be finite"));
        }
        if let Some(step) = self.depth_per_pass {
            positive("depth.per_pass", step)?;
            let passes = MultiPassConfig::new(self.depth, Some(step)).required_passes();
            if passes > MultiPassConfig::MAX_PASSES as f64 {
                return Err(Error::invalid_config(
                    "depth.per_pass",
                    format!(
                        "{step} needs {passes} passes to reach {}, at most {} are allowed",
                        self.depth,
                        MultiPassConfig::MAX_PASSES
                    ),
                ));
            }
        }
        if !self.z_safe.is_finite() || self.z_safe < 0.0 {
            return Err(Error::invalid_config(
                "depth.z_safe",
                format!("must be at or above the work surface, got {}", self.z_safe),
            ));
        }
        positive("feeds.xy", self.feeds.xy)?;
        positive("feeds.z", self.feeds.z)?;
        positive("feeds.a", self.feeds.a)?;
        non_negative("spindle.rpm", self.spindle.rpm)?;
        non_negative("spindle.warmup", self.spindle.warmup)?;
        if self.spindle.mode != SpindleMode::Off {
            positive("spindle.rpm", self.spindle.rpm)?;
        }
        if let ReloadPolicy::Every { paths, angle, pause } = self.reload {
            if paths == 0 {
                return Err(Error::invalid_config("brush.reload_paths", "must be at least 1"));
            }
            if angle.is_some_and(|a| !a.is_finite()) {
                return Err(Error::invalid_config("brush.reload_angle", "must be finite"));
            }
            if let Some(PauseMode::Timed { seconds }) = pause {
                non_negative("brush.reload_dwell", seconds)?;
            }
        }
        if let OvershootMode::Manual { distance } = self.overshoot {
            non_negative("brush.overshoot_distance", distance)?;
        }
        non_negative("brush.landing_strip", self.landing.landing_strip)?;
        non_negative("tool.wait_up", self.tool_wait_up)?;
        non_negative("tool.wait_down", self.tool_wait_down)?;
        Ok(())
    }

    pub fn rotation_enabled(&self) -> bool {
        self.rotation == RotationMode::Tangent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(MachineOptions::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut options = MachineOptions::default();
        options.tool.width = -1.0;
        assert!(options.validate().unwrap_err().is_configuration_error());

        let options = MachineOptions {
            depth_per_pass: Some(0.0),
            ..MachineOptions::default()
        };
        assert!(options.validate().is_err());

        let options = MachineOptions {
            depth: 100.0,
            depth_per_pass: Some(1e-9),
            ..MachineOptions::default()
        };
        let err = options.validate().unwrap_err();
        assert!(err.is_configuration_error());
        assert!(err.to_string().contains("depth.per_pass"), "{err}");

        let options = MachineOptions {
            depth: 100.0,
            depth_per_pass: Some(0.01),
            ..MachineOptions::default()
        };
        assert!(options.validate().is_ok());

        let options = MachineOptions {
            reload: ReloadPolicy::Every {
                paths: 0,
                angle: None,
                pause: None,
            },
            ..MachineOptions::default()
        };
        assert!(options.validate().is_err());

        let options = MachineOptions {
            spindle: SpindleSettings {
                mode: SpindleMode::Once,
                rpm: 0.0,
                ..SpindleSettings::default()
            },
            ..MachineOptions::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_a_feed_matching() {
        let feeds = Feeds {
            xy: 100.0,
            match_a_to_xy: true,
            ..Feeds::default()
        };
        let width = 10.0;
        let expected = 360.0 * 100.0 / (std::f64::consts::PI * 10.0);
        assert!((feeds.a_feed(width) - expected).abs() < 1e-9);
        assert_eq!(feeds.a_feed(0.0), feeds.a);
    }

    #[test]
    fn test_path_order_names() {
        for order in [
            PathOrder::None,
            PathOrder::Flip,
            PathOrder::Optimize,
            PathOrder::YAscending,
            PathOrder::YDescending,
            PathOrder::XAscending,
            PathOrder::XDescending,
        ] {
            assert_eq!(order.to_string().parse::<PathOrder>(), Ok(order));
        }
        assert!("spiral".parse::<PathOrder>().is_err());
    }

    #[test]
    fn test_overshoot_distance() {
        let tool = ToolState {
            width: 6.0,
            ..ToolState::default()
        };
        assert_eq!(OvershootMode::Auto.distance(&tool), 3.0);
        assert_eq!(OvershootMode::Manual { distance: 1.5 }.distance(&tool), 1.5);
        assert_eq!(OvershootMode::None.distance(&tool), 0.0);
    }
}
