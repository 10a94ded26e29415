//! # tangentcam
//!
//! Converts 2D vector paths into G-code for tangential-tool CNC machines:
//! drag knives, brushes and other tools whose A axis has to follow the
//! direction of travel.
//!
//! ## Architecture
//!
//! tangentcam is organized as a workspace with multiple crates:
//!
//! 1. **tangentcam-core** - Error taxonomy, numeric tolerance, units
//! 2. **tangentcam-geom** - Geometry kernel and biarc curve approximation
//! 3. **tangentcam-camtools** - Trail offset, fillets, smoothing, tangent splitting
//! 4. **tangentcam-toolpath** - Toolpath assembly and G-code emission
//! 5. **tangentcam-settings** - Configuration files and validation
//! 6. **tangentcam** - Input files, the pipeline driver and the CLI

pub mod cli;
pub mod input;
pub mod output;
pub mod pipeline;

pub use input::{InputDocument, PathGroup, PathSpec, SegmentSpec};
pub use output::{output_path, OutputTarget};
pub use pipeline::{Pipeline, Program, RunStats};

pub use tangentcam_core::{Error, Result, Tolerance};
pub use tangentcam_settings::{Config, JobSettings, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Log lines go to stderr so that G-code written to stdout stays clean.
/// `RUST_LOG` takes precedence over the default level, which is INFO, or
/// DEBUG when `verbose` is set.
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    Ok(())
}
