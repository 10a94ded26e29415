//! Splitting paths at corners.

use tangentcam_core::Tolerance;
use tangentcam_geom::directions_eq;

use crate::cut_path::{CutPath, CutSegment};

/// Split `path` wherever the direction of travel jumps, or a fillet arc
/// is involved. Every returned sub-path is tangent continuous internally.
pub fn split_path_g1(path: &CutPath, tol: Tolerance) -> Vec<CutPath> {
    let mut paths = Vec::new();
    let mut current: Vec<CutSegment> = Vec::new();
    for seg in path.iter() {
        if let Some(prev) = current.last() {
            let tangent = directions_eq(
                prev.geometry.end_tangent_angle(),
                seg.geometry.start_tangent_angle(),
                tol,
            );
            if !tangent || prev.fillet || seg.fillet {
                paths.push(CutPath::new(std::mem::take(&mut current)));
            }
        }
        current.push(*seg);
    }
    if !current.is_empty() {
        paths.push(CutPath::new(current));
    }
    paths
}
