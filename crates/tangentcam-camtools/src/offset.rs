//! Trail offset compensation.
//!
//! A drag knife or brush touches the work some distance behind its
//! rotation axis. To make the contact point follow the drawn path, the
//! rotation center has to run ahead of it: lines are shifted forward along
//! their direction and arcs are rebuilt so that every point sits `offset`
//! further along the original tangent. Where the shifted segments no
//! longer meet, a connector is inserted that swings the tool around the
//! original vertex.

use tangentcam_core::{Result, Tolerance};
use tangentcam_geom::{directions_eq, segments_are_g1, Arc, Line, Segment, Vector};
use tracing::debug;

use crate::cut_path::{CutPath, CutSegment};

/// Recalculate `path` for a tool trailing its rotation center by `offset`.
///
/// A zero offset returns the path unchanged.
pub fn offset_path(path: &CutPath, offset: f64, tol: Tolerance) -> Result<CutPath> {
    if tol.is_zero(offset) || path.is_empty() {
        return Ok(path.clone());
    }

    let mut result: Vec<CutSegment> = Vec::with_capacity(path.len() * 2);
    let mut prev: Option<&CutSegment> = None;

    for seg in path.iter() {
        if seg.p1().almost_eq(&seg.p2(), tol) {
            continue;
        }
        let shifted = match &seg.geometry {
            Segment::Line(line) => CutSegment {
                geometry: Segment::Line(line.shift(offset)),
                ..*seg
            },
            Segment::Arc(arc) => CutSegment {
                geometry: Segment::Arc(offset_arc(arc, offset)),
                start_angle: Some(arc.start_tangent_angle()),
                end_angle: Some(arc.end_tangent_angle()),
                ..*seg
            },
        };
        let shifted = CutSegment { g1: false, ..shifted };

        if let (Some(prev_seg), Some(prev_offset)) = (prev, result.last_mut()) {
            if !prev_offset.p2().almost_eq(&shifted.p1(), tol) {
                let bridge = connector(prev_seg, prev_offset, seg, &shifted, offset, tol);
                result.push(bridge);
            } else if !prev_seg.fillet
                && !seg.fillet
                && segments_are_g1(&prev_seg.geometry, &seg.geometry, tol)
            {
                prev_offset.g1 = true;
            }
        }
        prev = Some(seg);
        result.push(shifted);
    }

    let (Some(first_orig), Some(first)) = (path.segments.first(), result.first_mut()) else {
        return Ok(CutPath::default());
    };
    // The tool starts out already facing from the contact point to the
    // rotation center.
    let lead = first.p1() - first_orig.p1();
    if lead.length() > tol.linear {
        first.start_angle = Some(lead.angle());
    }
    for seg in &result {
        seg.p1().finite("offset path")?;
        seg.p2().finite("offset path")?;
    }
    Ok(CutPath::new(result))
}

/// Arc whose points lie `offset` ahead of the original arc along its
/// tangent. The center and sweep are unchanged.
pub fn offset_arc(arc: &Arc, offset: f64) -> Arc {
    let p1 = arc.p1 + Vector::from_polar(offset, arc.start_tangent_angle());
    let p2 = arc.p2 + Vector::from_polar(offset, arc.end_tangent_angle());
    let radius = offset.hypot(arc.radius);
    Arc::new(p1, p2, radius, arc.sweep, arc.center)
}

/// Segment bridging the gap between two offset segments.
fn connector(
    prev_seg: &CutSegment,
    prev_offset: &CutSegment,
    seg: &CutSegment,
    shifted: &CutSegment,
    offset: f64,
    tol: Tolerance,
) -> CutSegment {
    let p1 = prev_offset.p2();
    let p2 = shifted.p1();
    let geometry = if directions_eq(
        prev_offset.geometry.end_tangent_angle(),
        shifted.geometry.start_tangent_angle(),
        tol,
    ) {
        Segment::Line(Line::new(p1, p2))
    } else {
        // Swing around the vertex the contact point is parked on.
        let vertex = prev_seg.p2();
        let sweep = vertex.angle2(&p1, &p2);
        debug!(x = vertex.x, y = vertex.y, sweep, "trail offset rotation connector");
        Segment::Arc(Arc::new(p1, p2, offset.abs(), sweep, vertex))
    };
    CutSegment::with_hints(
        geometry,
        prev_seg.geometry.end_tangent_angle(),
        seg.geometry.start_tangent_angle(),
    )
}
