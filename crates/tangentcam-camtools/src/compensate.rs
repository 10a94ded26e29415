//! The compensation pipeline.
//!
//! Stages run in a fixed order on each path:
//!
//! 1. tool-width fillets or tangent splitting (whichever corner policy is set)
//! 2. trail offset
//! 3. tangent re-smoothing of joins the offset broke
//! 4. smoothing fillets with rotation hint adjustment
//!
//! With tangent rotation disabled none of this applies and the path passes
//! through unchanged.

use serde::{Deserialize, Serialize};
use tangentcam_core::{Error, Result, Tolerance};
use tangentcam_geom::{BiarcOptions, Path};
use tracing::debug;

use crate::cut_path::CutPath;
use crate::fillet::{fillet_path, FilletOptions};
use crate::offset::offset_path;
use crate::smoothing::fix_g1_path;
use crate::split::split_path_g1;

/// Whether the A axis follows the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationMode {
    #[default]
    Tangent,
    Disabled,
}

/// What happens at corners where the direction of travel jumps.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum CornerPolicy {
    /// Rotate in place.
    #[default]
    None,
    /// Round the corner with an arc of this radius.
    Fillet { radius: f64 },
    /// End the path and start a new one.
    Split,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompensationOptions {
    pub rotation: RotationMode,
    pub trail_offset: f64,
    pub corners: CornerPolicy,
    /// Fillets also round the seam of closed paths.
    pub close_polygons: bool,
    /// Re-smooth tangent joins broken by the trail offset.
    pub preserve_g1: bool,
    /// Radius of the final smoothing fillets, if enabled.
    pub smoothing_radius: Option<f64>,
    /// Used by the re-smoothing pass.
    pub biarc: BiarcOptions,
}

impl Default for CompensationOptions {
    fn default() -> Self {
        Self {
            rotation: RotationMode::Tangent,
            trail_offset: 0.0,
            corners: CornerPolicy::None,
            close_polygons: true,
            preserve_g1: true,
            smoothing_radius: None,
            biarc: BiarcOptions::default(),
        }
    }
}

impl CompensationOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.trail_offset.is_finite() || self.trail_offset < 0.0 {
            return Err(Error::invalid_config(
                "tool.trail_offset",
                format!("must be a non-negative number, got {}", self.trail_offset),
            ));
        }
        if let CornerPolicy::Fillet { radius } = self.corners {
            if !radius.is_finite() || radius < 0.0 {
                return Err(Error::invalid_config(
                    "compensation.fillet_radius",
                    format!("must be a non-negative number, got {radius}"),
                ));
            }
        }
        if let Some(radius) = self.smoothing_radius {
            if !radius.is_finite() || radius < 0.0 {
                return Err(Error::invalid_config(
                    "compensation.smoothing_radius",
                    format!("must be a non-negative number, got {radius}"),
                ));
            }
        }
        Ok(())
    }

    /// True if no stage would change a path.
    pub fn is_passthrough(&self, tol: Tolerance) -> bool {
        let corners = match self.corners {
            CornerPolicy::None => true,
            CornerPolicy::Fillet { radius } => radius < tol.linear,
            CornerPolicy::Split => false,
        };
        self.rotation == RotationMode::Disabled
            || (corners
                && tol.is_zero(self.trail_offset)
                && self.smoothing_radius.is_none_or(|r| r < tol.linear))
    }
}

/// Compensate one path. Tangent splitting may turn it into several.
pub fn compensate(path: &Path, options: &CompensationOptions, tol: Tolerance) -> Result<Vec<CutPath>> {
    let input = CutPath::from(path);
    if options.rotation == RotationMode::Disabled || input.is_empty() {
        return Ok(vec![input]);
    }

    let parts = match options.corners {
        CornerPolicy::None => vec![input],
        CornerPolicy::Fillet { radius } => {
            let fillet = FilletOptions {
                radius,
                close: options.close_polygons,
                adjust_rotation: false,
                mark_fillet: true,
            };
            vec![fillet_path(&input, &fillet, tol)]
        }
        CornerPolicy::Split => split_path_g1(&input, tol),
    };

    let mut result = Vec::with_capacity(parts.len());
    for part in parts {
        let mut part = part;
        if !tol.is_zero(options.trail_offset) {
            part = offset_path(&part, options.trail_offset, tol)?;
            if options.preserve_g1 {
                part = fix_g1_path(&part, &options.biarc, tol);
            }
        }
        if let Some(radius) = options.smoothing_radius.filter(|r| *r >= tol.linear) {
            let smoothing = FilletOptions {
                radius,
                close: options.close_polygons,
                adjust_rotation: true,
                mark_fillet: false,
            };
            part = fillet_path(&part, &smoothing, tol);
        }
        if !part.is_empty() {
            result.push(part);
        }
    }
    debug!(paths = result.len(), "path compensated");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangentcam_geom::Point;

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    fn triangle() -> Path {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(5.0, 8.0)];
        Path::from_points(&pts, true, tol()).unwrap()
    }

    #[test]
    fn test_disabled_rotation_bypasses_everything() {
        let options = CompensationOptions {
            rotation: RotationMode::Disabled,
            trail_offset: 3.0,
            corners: CornerPolicy::Split,
            ..CompensationOptions::default()
        };
        let out = compensate(&triangle(), &options, tol()).unwrap();
        assert_eq!(out, vec![CutPath::from(&triangle())]);
        assert!(options.is_passthrough(tol()));
    }

    #[test]
    fn test_split_then_offset() {
        let options = CompensationOptions {
            trail_offset: 1.0,
            corners: CornerPolicy::Split,
            ..CompensationOptions::default()
        };
        let out = compensate(&triangle(), &options, tol()).unwrap();
        assert_eq!(out.len(), 3);
        // Each side moves forward by the trail offset.
        assert!(out[0].start().unwrap().almost_eq(&Point::new(1.0, 0.0), tol()));
    }

    #[test]
    fn test_fillet_policy_marks_arcs() {
        let options = CompensationOptions {
            corners: CornerPolicy::Fillet { radius: 0.5 },
            ..CompensationOptions::default()
        };
        let out = compensate(&triangle(), &options, tol()).unwrap();
        assert_eq!(out.len(), 1);
        let fillets: Vec<_> = out[0].iter().filter(|s| s.fillet).collect();
        assert_eq!(fillets.len(), 3);
    }

    #[test]
    fn test_validation() {
        let options = CompensationOptions {
            trail_offset: -1.0,
            ..CompensationOptions::default()
        };
        assert!(options.validate().unwrap_err().is_configuration_error());
        assert!(CompensationOptions::default().validate().is_ok());
    }
}
