//! Resolution of a [`Config`] into the option types of the pipeline stages.
//!
//! Every flag combination is turned into a closed enum here, once, so the
//! stages never look at raw flags.

use tangentcam_camtools::{CompensationOptions, CornerPolicy, RotationMode};
use tangentcam_core::{OutputUnits, Tolerance};
use tangentcam_geom::BiarcOptions;
use tangentcam_toolpath::{
    BlendMode, GcodeOptions, LandingOptions, MachineOptions, OvershootMode, PathOrder, PauseMode,
    ReloadPolicy, ToolState,
};
use tracing::warn;

use crate::config::{BlendKind, Config, OvershootKind};
use crate::error::{SettingsError, SettingsResult};

/// Subdivision depths beyond this produce millions of arcs per curve.
const MAX_SUBDIVISION_DEPTH: u32 = 16;

/// Fully resolved options for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSettings {
    pub tolerance: Tolerance,
    pub biarc: BiarcOptions,
    pub compensation: CompensationOptions,
    pub machine: MachineOptions,
    /// Units are filled in once the document unit is known.
    pub gcode: GcodeOptions,
    pub order: PathOrder,
    pub units: OutputUnits,
    pub strict: bool,
}

fn non_negative(key: &str, value: f64) -> SettingsResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::invalid(
            key,
            format!("must be a non-negative number, got {value}"),
        ))
    }
}

fn positive(key: &str, value: f64) -> SettingsResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::invalid(
            key,
            format!("must be greater than zero, got {value}"),
        ))
    }
}

fn finite(key: &str, value: f64) -> SettingsResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SettingsError::invalid(key, "must be a finite number"))
    }
}

impl Config {
    /// Validate and convert to per-stage options.
    pub fn resolve(&self) -> SettingsResult<JobSettings> {
        let tolerance = self.resolve_tolerance()?;
        let biarc = self.resolve_biarc()?;
        let compensation = self.resolve_compensation(biarc)?;
        compensation.validate()?;
        let machine = self.resolve_machine()?;
        machine.validate()?;
        let gcode = self.resolve_gcode(tolerance, machine.feeds.xy)?;

        if self.output.basename.trim().is_empty() {
            return Err(SettingsError::invalid("output.basename", "must not be empty"));
        }
        if self.output.extension.trim_start_matches('.').is_empty() {
            return Err(SettingsError::invalid("output.extension", "must not be empty"));
        }

        Ok(JobSettings {
            tolerance,
            biarc,
            compensation,
            machine,
            gcode,
            order: self.ordering.order,
            units: self.output.units,
            strict: self.strict,
        })
    }

    fn resolve_tolerance(&self) -> SettingsResult<Tolerance> {
        positive("tolerance.linear", self.tolerance.linear)?;
        positive("tolerance.angular", self.tolerance.angular)?;
        Ok(self.tolerance)
    }

    fn resolve_biarc(&self) -> SettingsResult<BiarcOptions> {
        let biarc = self.approximation;
        positive("approximation.tolerance", biarc.tolerance)?;
        non_negative("approximation.line_flatness", biarc.line_flatness)?;
        non_negative("approximation.min_arc_radius", biarc.min_arc_radius)?;
        if biarc.max_depth > MAX_SUBDIVISION_DEPTH {
            return Err(SettingsError::invalid(
                "approximation.max_depth",
                format!("must be at most {MAX_SUBDIVISION_DEPTH}, got {}", biarc.max_depth),
            ));
        }
        Ok(biarc)
    }

    fn resolve_compensation(&self, biarc: BiarcOptions) -> SettingsResult<CompensationOptions> {
        let comp = &self.compensation;
        let corners = match (comp.fillet, comp.split_tangents) {
            (true, true) => {
                return Err(SettingsError::invalid(
                    "compensation.split_tangents",
                    "cannot be combined with fillets",
                ))
            }
            (true, false) => CornerPolicy::Fillet {
                radius: comp.fillet_radius.unwrap_or(self.tool.width / 2.0),
            },
            (false, true) => CornerPolicy::Split,
            (false, false) => CornerPolicy::None,
        };
        let smoothing_radius = if comp.smoothing {
            positive("compensation.smoothing_radius", comp.smoothing_radius)?;
            Some(comp.smoothing_radius)
        } else {
            None
        };
        Ok(CompensationOptions {
            rotation: self.tool.rotation,
            trail_offset: self.tool.trail_offset,
            corners,
            close_polygons: comp.close_polygons,
            preserve_g1: comp.preserve_g1,
            smoothing_radius,
            biarc,
        })
    }

    fn resolve_machine(&self) -> SettingsResult<MachineOptions> {
        let brush = &self.brush;
        non_negative("depth.final", self.depth.final_depth)?;
        non_negative("depth.per_pass", self.depth.per_pass)?;
        non_negative("tool.wait_up", self.tool.wait_up)?;
        non_negative("tool.wait_down", self.tool.wait_down)?;
        non_negative("brush.landing_strip", brush.landing_strip)?;

        let reload = if brush.reload {
            finite("brush.reload_angle", brush.reload_angle)?;
            non_negative("brush.reload_dwell", brush.reload_dwell)?;
            let pause = if brush.reload_dwell > 0.0 {
                Some(PauseMode::Timed {
                    seconds: brush.reload_dwell,
                })
            } else if brush.reload_pause {
                Some(PauseMode::Indefinite)
            } else {
                None
            };
            ReloadPolicy::Every {
                paths: brush.reload_paths,
                angle: brush.reload_rotate.then(|| brush.reload_angle.to_radians()),
                pause,
            }
        } else {
            ReloadPolicy::Disabled
        };

        let overshoot = match brush.overshoot {
            OvershootKind::None => OvershootMode::None,
            OvershootKind::Auto => OvershootMode::Auto,
            OvershootKind::Manual => {
                non_negative("brush.overshoot_distance", brush.overshoot_distance)?;
                OvershootMode::Manual {
                    distance: brush.overshoot_distance,
                }
            }
        };

        if brush.soft_landing && self.tool.trail_offset <= 0.0 {
            warn!("soft landing needs a trail offset; tool will plunge normally");
        }
        if self.tool.rotation == RotationMode::Disabled && brush.reload_rotate {
            warn!("reload rotation ignored while rotation is disabled");
        }

        Ok(MachineOptions {
            rotation: self.tool.rotation,
            tool: ToolState {
                width: self.tool.width,
                trail_offset: self.tool.trail_offset,
            },
            depth: self.depth.final_depth,
            depth_per_pass: (self.depth.per_pass > 0.0).then_some(self.depth.per_pass),
            depth_strategy: self.depth.strategy,
            z_safe: self.depth.z_safe,
            feeds: self.feeds,
            spindle: self.spindle,
            reload,
            overshoot,
            landing: LandingOptions {
                soft_landing: brush.soft_landing,
                landing_strip: brush.landing_strip,
            },
            skip_paths: self.ordering.skip_paths,
            tool_wait_up: self.tool.wait_up,
            tool_wait_down: self.tool.wait_down,
            home_when_done: self.output.home_when_done,
            unwrap_a: self.output.unwrap_a,
        })
    }

    fn resolve_gcode(&self, tolerance: Tolerance, default_feed: f64) -> SettingsResult<GcodeOptions> {
        finite("tool.angular_offset", self.tool.angular_offset)?;
        let blend = match self.blend.mode {
            BlendKind::Default => BlendMode::Default,
            BlendKind::Exact => BlendMode::Exact,
            BlendKind::Blend => {
                if let Some(p) = self.blend.tolerance {
                    non_negative("blend.tolerance", p)?;
                }
                if let Some(q) = self.blend.q_tolerance {
                    non_negative("blend.q_tolerance", q)?;
                }
                BlendMode::Blend {
                    tolerance: self.blend.tolerance,
                    q_tolerance: self.blend.q_tolerance,
                }
            }
        };

        let mut header_comments = self.output.header_comments.clone();
        if self.output.settings_in_header {
            header_comments.extend(self.changed_settings());
        }

        Ok(GcodeOptions {
            tolerance,
            line_numbers: self.output.line_numbers,
            comments: self.output.comments,
            angular_offset: self.tool.angular_offset,
            blend,
            default_feed,
            header_comments,
            ..GcodeOptions::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_resolution() {
        let job = Config::default().resolve().unwrap();
        assert_eq!(job.compensation, CompensationOptions::default());
        assert_eq!(job.machine, MachineOptions::default());
        assert_eq!(job.order, PathOrder::None);
        assert_eq!(job.units, OutputUnits::Inferred);
        assert_eq!(job.gcode.blend, BlendMode::Default);
        assert!(!job.strict);
    }

    #[test]
    fn test_fillet_radius_defaults_to_half_width() {
        let mut config = Config::default();
        config.tool.width = 6.0;
        config.compensation.fillet = true;
        let job = config.resolve().unwrap();
        assert_eq!(job.compensation.corners, CornerPolicy::Fillet { radius: 3.0 });

        config.compensation.fillet_radius = Some(1.0);
        let job = config.resolve().unwrap();
        assert_eq!(job.compensation.corners, CornerPolicy::Fillet { radius: 1.0 });
    }

    #[test]
    fn test_fillet_and_split_conflict() {
        let mut config = Config::default();
        config.compensation.fillet = true;
        config.compensation.split_tangents = true;
        let err = config.resolve().unwrap_err();
        assert!(matches!(err, SettingsError::InvalidSetting { ref key, .. } if key == "compensation.split_tangents"));
    }

    #[test]
    fn test_reload_resolution() {
        let mut config = Config::default();
        config.brush.reload = true;
        config.brush.reload_paths = 3;
        config.brush.reload_rotate = true;
        config.brush.reload_angle = 90.0;
        config.brush.reload_pause = true;
        let job = config.resolve().unwrap();
        let ReloadPolicy::Every { paths, angle, pause } = job.machine.reload else {
            panic!("reload not enabled");
        };
        assert_eq!(paths, 3);
        assert!((angle.unwrap() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(pause, Some(PauseMode::Indefinite));

        // A dwell time wins over an indefinite pause.
        config.brush.reload_dwell = 2.0;
        let job = config.resolve().unwrap();
        assert!(matches!(
            job.machine.reload,
            ReloadPolicy::Every { pause: Some(PauseMode::Timed { seconds }), .. } if seconds == 2.0
        ));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let cases: Vec<(&str, Box<dyn Fn(&mut Config)>)> = vec![
            ("tool.width", Box::new(|c: &mut Config| c.tool.width = -1.0)),
            ("tool.trail_offset", Box::new(|c: &mut Config| c.tool.trail_offset = f64::NAN)),
            ("feeds.xy", Box::new(|c: &mut Config| c.feeds.xy = 0.0)),
            ("tolerance.linear", Box::new(|c: &mut Config| c.tolerance.linear = 0.0)),
            ("approximation.max_depth", Box::new(|c: &mut Config| c.approximation.max_depth = 40)),
            ("depth.final", Box::new(|c: &mut Config| c.depth.final_depth = -2.0)),
            ("depth.per_pass", Box::new(|c: &mut Config| {
                c.depth.final_depth = 100.0;
                c.depth.per_pass = 1e-9;
            })),
            ("brush.reload_paths", Box::new(|c: &mut Config| {
                c.brush.reload = true;
                c.brush.reload_paths = 0;
            })),
            ("output.extension", Box::new(|c: &mut Config| c.output.extension = ".".to_string())),
        ];
        for (expected, mutate) in cases {
            let mut config = Config::default();
            mutate(&mut config);
            match config.validate() {
                Err(SettingsError::InvalidSetting { key, .. }) => assert_eq!(key, expected),
                other => panic!("{expected}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_depth_and_gcode_resolution() {
        let mut config = Config::default();
        config.depth.final_depth = 3.0;
        config.depth.per_pass = 1.0;
        config.tool.angular_offset = 90.0;
        config.blend.mode = BlendKind::Blend;
        config.blend.tolerance = Some(0.01);
        config.output.line_numbers = true;
        config.output.settings_in_header = true;
        let job = config.resolve().unwrap();
        assert_eq!(job.machine.depth, 3.0);
        assert_eq!(job.machine.depth_per_pass, Some(1.0));
        assert_eq!(job.gcode.angular_offset, 90.0);
        assert!(job.gcode.line_numbers);
        assert_eq!(
            job.gcode.blend,
            BlendMode::Blend {
                tolerance: Some(0.01),
                q_tolerance: None
            }
        );
        assert!(job.gcode.header_comments.iter().any(|c| c == "depth.final = 3.0"));
    }
}
