//! Restoring tangent continuity after trail offsetting.
//!
//! Offsetting a tangent line/arc join leaves a tiny kink because the offset
//! arc is rotated with respect to the original one. Segments marked `g1` by
//! the offset pass are replaced by a Bézier whose control points follow the
//! neighbouring segments (Shemanarev's interpolation), converted back to
//! arcs with a shallow biarc pass.

use std::f64::consts::PI;
use tangentcam_core::Tolerance;
use tangentcam_geom::{
    approximate_bezier, normalize_angle, BiarcOptions, CubicBezier, Line, Point, Segment, Vector,
};
use tracing::debug;

use crate::cut_path::{CutPath, CutSegment};

/// Line-to-line control point scale factor (times smoothness).
const K_LINE: f64 = 1.2;
/// Control point length for a quarter circle of unit radius.
const K_ARC: f64 = 0.552_284_749_830_8;
/// First control point scale on an arc cusp.
const K_CUSP_1: f64 = 1.5;
/// Second control point scale on an arc cusp.
const K_CUSP_2: f64 = 0.5;

/// Default smoothness of the interpolating curve.
pub const DEFAULT_SMOOTHNESS: f64 = 0.5;

/// Bézier running from `seg1.p1` to `seg1.p2` that leaves tangent to the
/// previous curve and arrives tangent to the next one.
///
/// `cp1` is the first control point handed over by the previous call;
/// `None` marks the start of a run. `seg2` is `None` for the last segment.
/// Returns the curve and the first control point for the next call.
pub fn smoothing_curve(
    seg1: &Segment,
    seg2: Option<&Segment>,
    cp1: Option<Point>,
    smoothness: f64,
    match_arcs: bool,
    tol: Tolerance,
) -> (CubicBezier, Point) {
    let p1 = seg1.p1();
    let p2 = seg1.p2();
    let Some(seg2) = seg2 else {
        let control = cp1.unwrap_or(p1);
        return (CubicBezier::from_quadratic(p1, control, p2), p2);
    };

    let k = K_LINE * smoothness;
    let len1 = seg1.length();
    let ratio = len1 / (len1 + seg2.length());
    let mid_line = Line::new(seg1.midpoint(), seg2.midpoint());
    let mut cp1 = cp1;

    let mut cp2_mag = match (match_arcs, seg1) {
        (true, Segment::Arc(arc)) => {
            let mut mag = arc_control_length(arc.radius, arc.sweep);
            // The winding flips across the vertex.
            let side = Line::new(p1, seg2.p2()).which_side(&p2, tol);
            if (arc.is_clockwise() && side < 0) || (!arc.is_clockwise() && side > 0) {
                cp1 = cp1.map(|cp| p1 + (cp - p1) * K_CUSP_1);
                mag *= K_CUSP_2;
            }
            mag
        }
        _ => ratio * mid_line.length() * k,
    };
    if !cp2_mag.is_finite() {
        cp2_mag = ratio * mid_line.length() * k;
    }
    let next_mag = match (match_arcs, seg2) {
        (true, Segment::Arc(arc)) => arc_control_length(arc.radius, arc.sweep),
        _ => (1.0 - ratio) * mid_line.length() * k,
    };

    let angle = mid_line.angle();
    let cp2 = p2 + Vector::from_polar(cp2_mag, angle + PI);
    let next_cp1 = p2 + Vector::from_polar(next_mag, angle);

    let curve = match (cp1, seg1) {
        (Some(cp1), _) => CubicBezier::new(p1, cp1, cp2, p2),
        (None, Segment::Arc(arc)) => {
            let arc_curve = CubicBezier::from_circular_arc(arc);
            CubicBezier::new(p1, arc_curve.c1, cp2, p2)
        }
        (None, Segment::Line(_)) => CubicBezier::from_quadratic(p1, cp2, p2),
    };
    (curve, next_cp1)
}

/// Control point distance of a circular arc with the given sweep.
fn arc_control_length(radius: f64, sweep: f64) -> f64 {
    radius * (sweep.abs() / 2.0).tan() * K_ARC
}

/// Biarcs replacing `seg1`, with rotation hints interpolated by length
/// between the original start and end tool angles.
fn smoothing_arcs(
    seg1: &CutSegment,
    seg2: Option<&CutSegment>,
    cp1: Option<Point>,
    options: &BiarcOptions,
    tol: Tolerance,
) -> (Vec<CutSegment>, Option<Point>) {
    let (curve, next_cp1) = smoothing_curve(
        &seg1.geometry,
        seg2.map(|s| &s.geometry),
        cp1,
        DEFAULT_SMOOTHNESS,
        true,
        tol,
    );
    let segments = match approximate_bezier(&curve, options, tol) {
        Ok(approx) if !approx.segments.is_empty() => approx.segments,
        Ok(_) => return (vec![*seg1], Some(seg1.p2())),
        Err(err) => {
            debug!(error = %err, "smoothing curve rejected, keeping segment");
            return (vec![*seg1], Some(seg1.p2()));
        }
    };
    let total: f64 = segments.iter().map(Segment::length).sum();
    let start = seg1.start_angle();
    let sweep = normalize_angle(seg1.end_angle() - start, 0.0);
    let scale = if total > tol.linear { sweep / total } else { 0.0 };

    let mut angle = start;
    let arcs = segments
        .into_iter()
        .map(|geometry| {
            let end = angle + geometry.length() * scale;
            let seg = CutSegment::with_hints(geometry, angle, end);
            angle = end;
            seg
        })
        .collect();
    (arcs, Some(next_cp1))
}

/// Replace every segment marked `g1` with smoothing biarcs.
///
/// The biarc pass uses at most one subdivision; the replacement only has to
/// remove the offset kink.
pub fn fix_g1_path(path: &CutPath, biarc: &BiarcOptions, tol: Tolerance) -> CutPath {
    if path.len() < 2 {
        return path.clone();
    }
    let options = BiarcOptions {
        max_depth: 1,
        min_arc_radius: 0.0,
        ..*biarc
    };
    let mut result = Vec::with_capacity(path.len() * 2);
    let mut cp1: Option<Point> = None;
    let segments = &path.segments;
    for (i, seg1) in segments.iter().enumerate() {
        let seg2 = segments.get(i + 1);
        if seg1.g1 {
            let (arcs, next) = smoothing_arcs(seg1, seg2, cp1, &options, tol);
            result.extend(arcs);
            cp1 = next;
        } else {
            result.push(*seg1);
            cp1 = None;
        }
    }
    CutPath::new(result)
}
