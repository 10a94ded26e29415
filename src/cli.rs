//! Command line interface.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tangentcam_camtools::RotationMode;
use tangentcam_core::{OutputUnits, Tolerance};
use tangentcam_settings::{BlendKind, Config, ConfigFormat, OvershootKind};
use tangentcam_toolpath::{PathOrder, SpindleMode};

#[derive(Debug, Parser)]
#[command(name = "tangentcam", version)]
#[command(about = "Generate G-code for tangential-tool CNC machines", long_about = None)]
pub struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (.toml or .json). Defaults to the per-user config file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert a geometry file to G-code
    Generate(GenerateArgs),
    /// Check a config file and report the first invalid setting
    CheckConfig {
        /// Config file to check
        file: PathBuf,
    },
    /// Print the effective configuration
    PrintConfig {
        #[arg(long, value_enum, default_value_t = FormatArg::Toml)]
        format: FormatArg,
        #[command(flatten)]
        overrides: Overrides,
    },
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Geometry file (.json or .toml)
    pub input: PathBuf,

    /// Output file, `-` for standard output
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Save the effective configuration to this file
    #[arg(long, value_name = "FILE")]
    pub write_config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Toml,
    Json,
}

impl From<FormatArg> for ConfigFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Toml => ConfigFormat::Toml,
            FormatArg::Json => ConfigFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SpindleArg {
    Off,
    Once,
    PerPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BlendArg {
    Default,
    Blend,
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OvershootArg {
    None,
    Auto,
    Manual,
}

/// Command line values that override the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Numeric epsilon for geometry comparisons
    #[arg(long, value_name = "EPS", help_heading = "Approximation")]
    pub epsilon: Option<f64>,
    /// Maximum distance between a curve and its arcs
    #[arg(long, help_heading = "Approximation")]
    pub curve_tolerance: Option<f64>,
    #[arg(long, value_name = "N", help_heading = "Approximation")]
    pub max_subdivisions: Option<u32>,
    /// Curves flatter than this become lines
    #[arg(long, help_heading = "Approximation")]
    pub flatness: Option<f64>,
    /// Arcs below this radius become lines
    #[arg(long, help_heading = "Approximation")]
    pub min_arc_radius: Option<f64>,

    #[arg(long, help_heading = "Tool")]
    pub tool_width: Option<f64>,
    #[arg(long, help_heading = "Tool")]
    pub trail_offset: Option<f64>,
    /// Degrees added to every A value
    #[arg(long, allow_negative_numbers = true, help_heading = "Tool")]
    pub angular_offset: Option<f64>,
    /// Keep the A axis fixed
    #[arg(long, help_heading = "Tool")]
    pub no_rotation: bool,
    /// Round corners (radius defaults to half the tool width)
    #[arg(long, help_heading = "Tool")]
    pub fillet: bool,
    #[arg(long, help_heading = "Tool")]
    pub fillet_radius: Option<f64>,
    /// Start a new path at every non-tangent corner
    #[arg(long, help_heading = "Tool")]
    pub split_tangents: bool,
    #[arg(long, help_heading = "Tool")]
    pub smoothing_radius: Option<f64>,

    /// Final depth below the surface
    #[arg(long, help_heading = "Depth")]
    pub depth: Option<f64>,
    #[arg(long, help_heading = "Depth")]
    pub depth_per_pass: Option<f64>,
    #[arg(long, help_heading = "Depth")]
    pub z_safe: Option<f64>,

    #[arg(long, help_heading = "Feeds")]
    pub feed_xy: Option<f64>,
    #[arg(long, help_heading = "Feeds")]
    pub feed_z: Option<f64>,
    /// Degrees per minute
    #[arg(long, help_heading = "Feeds")]
    pub feed_a: Option<f64>,
    /// Turn the tool edge at the XY feed
    #[arg(long, help_heading = "Feeds")]
    pub match_a_feed: bool,
    #[arg(long, value_enum, help_heading = "Feeds")]
    pub blend: Option<BlendArg>,
    /// G64 P tolerance
    #[arg(long, help_heading = "Feeds")]
    pub blend_tolerance: Option<f64>,

    #[arg(long, value_enum, help_heading = "Spindle")]
    pub spindle: Option<SpindleArg>,
    #[arg(long, help_heading = "Spindle")]
    pub rpm: Option<f64>,
    /// Run the spindle counterclockwise (M4)
    #[arg(long, help_heading = "Spindle")]
    pub ccw: bool,
    /// Seconds to wait after starting the spindle
    #[arg(long, help_heading = "Spindle")]
    pub warmup: Option<f64>,

    /// Reload the brush after this many paths
    #[arg(long, value_name = "N", help_heading = "Brush")]
    pub reload_every: Option<u32>,
    /// Rotate to this angle (degrees) while reloading
    #[arg(long, allow_negative_numbers = true, help_heading = "Brush")]
    pub reload_angle: Option<f64>,
    /// Stop at every reload until resumed
    #[arg(long, help_heading = "Brush")]
    pub reload_pause: bool,
    /// Dwell this many seconds at every reload
    #[arg(long, help_heading = "Brush")]
    pub reload_dwell: Option<f64>,
    #[arg(long, help_heading = "Brush")]
    pub soft_landing: bool,
    #[arg(long, help_heading = "Brush")]
    pub landing_strip: Option<f64>,
    #[arg(long, value_enum, help_heading = "Brush")]
    pub overshoot: Option<OvershootArg>,
    /// Manual overshoot distance
    #[arg(long, help_heading = "Brush")]
    pub overshoot_distance: Option<f64>,

    /// none, flip, optimize, y+, y-, x+ or x-
    #[arg(long, help_heading = "Output")]
    pub order: Option<PathOrder>,
    /// Leave out the first N paths
    #[arg(long, value_name = "N", help_heading = "Output")]
    pub skip_paths: Option<usize>,
    /// inferred, in or mm
    #[arg(long, help_heading = "Output")]
    pub units: Option<OutputUnits>,
    #[arg(long, help_heading = "Output")]
    pub line_numbers: bool,
    #[arg(long, help_heading = "Output")]
    pub no_comments: bool,
    /// Write one file per path group
    #[arg(long, help_heading = "Output")]
    pub split_groups: bool,
    /// Append an incrementing _NNNN to the file name
    #[arg(long, help_heading = "Output")]
    pub auto_suffix: bool,
    /// Reset the A origin once it passes a full turn
    #[arg(long, help_heading = "Output")]
    pub unwrap_a: bool,
    /// Return to X0 Y0 A0 at the end
    #[arg(long, help_heading = "Output")]
    pub home: bool,
    /// Extra header comment (repeatable)
    #[arg(long = "comment", value_name = "TEXT", help_heading = "Output")]
    pub comments: Vec<String>,
    /// Abort on the first failing path
    #[arg(long, help_heading = "Output")]
    pub strict: bool,
}

impl Overrides {
    /// Apply the values given on the command line to `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(eps) = self.epsilon {
            config.tolerance = Tolerance::uniform(eps);
        }
        let approx = &mut config.approximation;
        set(&mut approx.tolerance, self.curve_tolerance);
        set(&mut approx.max_depth, self.max_subdivisions);
        set(&mut approx.line_flatness, self.flatness);
        set(&mut approx.min_arc_radius, self.min_arc_radius);

        set(&mut config.tool.width, self.tool_width);
        set(&mut config.tool.trail_offset, self.trail_offset);
        set(&mut config.tool.angular_offset, self.angular_offset);
        if self.no_rotation {
            config.tool.rotation = RotationMode::Disabled;
        }
        let comp = &mut config.compensation;
        if self.fillet || self.fillet_radius.is_some() {
            comp.fillet = true;
        }
        if self.fillet_radius.is_some() {
            comp.fillet_radius = self.fillet_radius;
        }
        comp.split_tangents |= self.split_tangents;
        if let Some(radius) = self.smoothing_radius {
            comp.smoothing = true;
            comp.smoothing_radius = radius;
        }

        set(&mut config.depth.final_depth, self.depth);
        set(&mut config.depth.per_pass, self.depth_per_pass);
        set(&mut config.depth.z_safe, self.z_safe);

        set(&mut config.feeds.xy, self.feed_xy);
        set(&mut config.feeds.z, self.feed_z);
        set(&mut config.feeds.a, self.feed_a);
        config.feeds.match_a_to_xy |= self.match_a_feed;
        if let Some(blend) = self.blend {
            config.blend.mode = match blend {
                BlendArg::Default => BlendKind::Default,
                BlendArg::Blend => BlendKind::Blend,
                BlendArg::Exact => BlendKind::Exact,
            };
        }
        if self.blend_tolerance.is_some() {
            config.blend.tolerance = self.blend_tolerance;
        }

        if let Some(spindle) = self.spindle {
            config.spindle.mode = match spindle {
                SpindleArg::Off => SpindleMode::Off,
                SpindleArg::Once => SpindleMode::Once,
                SpindleArg::PerPath => SpindleMode::PerPath,
            };
        }
        set(&mut config.spindle.rpm, self.rpm);
        if self.ccw {
            config.spindle.clockwise = false;
        }
        set(&mut config.spindle.warmup, self.warmup);

        let brush = &mut config.brush;
        if let Some(every) = self.reload_every {
            brush.reload = true;
            brush.reload_paths = every;
        }
        if let Some(angle) = self.reload_angle {
            brush.reload_rotate = true;
            brush.reload_angle = angle;
        }
        brush.reload_pause |= self.reload_pause;
        set(&mut brush.reload_dwell, self.reload_dwell);
        brush.soft_landing |= self.soft_landing;
        set(&mut brush.landing_strip, self.landing_strip);
        if let Some(overshoot) = self.overshoot {
            brush.overshoot = match overshoot {
                OvershootArg::None => OvershootKind::None,
                OvershootArg::Auto => OvershootKind::Auto,
                OvershootArg::Manual => OvershootKind::Manual,
            };
        }
        if let Some(distance) = self.overshoot_distance {
            brush.overshoot = OvershootKind::Manual;
            brush.overshoot_distance = distance;
        }

        set(&mut config.ordering.order, self.order);
        set(&mut config.ordering.skip_paths, self.skip_paths);
        let output = &mut config.output;
        set(&mut output.units, self.units);
        output.line_numbers |= self.line_numbers;
        if self.no_comments {
            output.comments = false;
        }
        output.split_groups |= self.split_groups;
        output.auto_suffix |= self.auto_suffix;
        output.unwrap_a |= self.unwrap_a;
        output.home_when_done |= self.home;
        output.header_comments.extend(self.comments.iter().cloned());
        config.strict |= self.strict;
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_generate_with_overrides() {
        let cli = parse(&[
            "tangentcam",
            "-v",
            "generate",
            "drawing.json",
            "-o",
            "-",
            "--tool-width",
            "3",
            "--order",
            "y-",
            "--units",
            "mm",
            "--spindle",
            "per-path",
            "--reload-every",
            "4",
            "--reload-angle",
            "-90",
            "--overshoot-distance",
            "2.5",
            "--comment",
            "hello",
        ]);
        assert!(cli.verbose);
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.input, PathBuf::from("drawing.json"));
        assert_eq!(args.output, Some(PathBuf::from("-")));

        let mut config = Config::default();
        args.overrides.apply(&mut config);
        assert_eq!(config.tool.width, 3.0);
        assert_eq!(config.ordering.order, PathOrder::YDescending);
        assert_eq!(config.output.units, OutputUnits::Mm);
        assert_eq!(config.spindle.mode, SpindleMode::PerPath);
        assert!(config.brush.reload);
        assert_eq!(config.brush.reload_paths, 4);
        assert_eq!(config.brush.reload_angle, -90.0);
        assert_eq!(config.brush.overshoot, OvershootKind::Manual);
        assert_eq!(config.output.header_comments, vec!["hello".to_string()]);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = Config::default();
        config.tool.width = 5.0;
        config.output.comments = true;
        Overrides::default().apply(&mut config);
        assert_eq!(config.tool.width, 5.0);
        assert!(config.output.comments);
        assert_eq!(config, {
            let mut expected = Config::default();
            expected.tool.width = 5.0;
            expected
        });
    }

    #[test]
    fn test_other_commands() {
        let cli = parse(&["tangentcam", "check-config", "my.toml"]);
        assert!(matches!(cli.command, Commands::CheckConfig { ref file } if file == &PathBuf::from("my.toml")));

        let cli = parse(&["tangentcam", "print-config", "--format", "json", "--depth", "2"]);
        let Commands::PrintConfig { format, overrides } = cli.command else {
            panic!("expected print-config");
        };
        assert_eq!(format, FormatArg::Json);
        assert_eq!(overrides.depth, Some(2.0));
    }

    #[test]
    fn test_bad_order_is_rejected() {
        assert!(Cli::try_parse_from(["tangentcam", "generate", "a.json", "--order", "diagonal"]).is_err());
    }
}
