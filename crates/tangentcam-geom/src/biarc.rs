//! Biarc approximation of curves.
//!
//! A cubic Bézier is replaced by pairs of tangent-continuous circular arcs.
//! The curve is first split at its inflection points, then each piece is
//! fitted with a biarc whose joint lies on the joint circle through both
//! endpoints. If the sampled deviation exceeds the tolerance the piece is
//! split in half and both halves are fitted again, up to `max_depth` levels.

use serde::{Deserialize, Serialize};
use tangentcam_core::{Error, GeometryError, Result, Tolerance};
use tracing::debug;

use crate::arc::Arc;
use crate::bezier::CubicBezier;
use crate::line::Line;
use crate::point::{Point, Vector};
use crate::segment::{Curve, Segment};

/// Number of intervals sampled when measuring deviation.
const DEVIATION_SAMPLES: usize = 9;

/// Approximation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiarcOptions {
    /// Maximum distance between the curve and its approximation
    pub tolerance: f64,
    /// Maximum number of recursive subdivisions
    pub max_depth: u32,
    /// Curves flatter than this become a single line
    pub line_flatness: f64,
    /// Arcs with a smaller radius are replaced by their chord
    pub min_arc_radius: f64,
}

impl Default for BiarcOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            max_depth: 4,
            line_flatness: 0.001,
            min_arc_radius: 0.0,
        }
    }
}

/// Result of approximating one curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Approximation {
    pub segments: Vec<Segment>,
    /// Largest sampled distance between the curve and the segments.
    pub max_deviation: f64,
    /// False if subdivision stopped at `max_depth` above tolerance.
    pub converged: bool,
}

impl Approximation {
    fn new() -> Self {
        Self {
            segments: Vec::new(),
            max_deviation: 0.0,
            converged: true,
        }
    }

    fn push(&mut self, segments: Vec<Segment>, deviation: f64, converged: bool) {
        self.segments.extend(segments);
        self.max_deviation = self.max_deviation.max(deviation);
        self.converged &= converged;
    }

    fn extend(&mut self, other: Approximation) {
        self.push(other.segments, other.max_deviation, other.converged);
    }

    /// The non-convergence as a recoverable [`Error::ToleranceUnreachable`].
    pub fn tolerance_error(&self, options: &BiarcOptions) -> Option<Error> {
        (!self.converged).then(|| Error::ToleranceUnreachable {
            tolerance: options.tolerance,
            deviation: self.max_deviation,
            depth: options.max_depth,
        })
    }
}

/// Convert any input curve to lines and arcs.
pub fn approximate_curve(curve: &Curve, options: &BiarcOptions, tol: Tolerance) -> Result<Approximation> {
    curve.validate(tol)?;
    let mut approx = Approximation::new();
    match curve {
        Curve::Line(line) => approx.push(vec![Segment::Line(*line)], 0.0, true),
        Curve::Arc(arc) if arc.radius < options.min_arc_radius => approx.extend(chord_arc(arc, options)),
        Curve::Arc(arc) => approx.push(vec![Segment::Arc(*arc)], 0.0, true),
        Curve::Bezier(bezier) => approx.extend(approximate_bezier(bezier, options, tol)?),
        Curve::Ellipse(ellipse) => {
            for bezier in ellipse.to_beziers(tol)? {
                approx.extend(approximate_bezier(&bezier, options, tol)?);
            }
        }
    }
    Ok(approx)
}

/// Approximate a cubic Bézier with biarcs.
pub fn approximate_bezier(curve: &CubicBezier, options: &BiarcOptions, tol: Tolerance) -> Result<Approximation> {
    curve.validate(tol)?;
    let mut approx = Approximation::new();
    approximate_recursive(curve, options, tol, 0, &mut approx)?;
    Ok(approx)
}

fn approximate_recursive(
    curve: &CubicBezier,
    options: &BiarcOptions,
    tol: Tolerance,
    depth: u32,
    out: &mut Approximation,
) -> Result<()> {
    if curve.p1.almost_eq(&curve.p2, tol) {
        if curve.is_degenerate(tol) {
            return Err(GeometryError::CoincidentPoints { what: "bezier" }.into());
        }
        // A closed loop has no chord to fit against.
        let (a, b) = curve.subdivide(0.5);
        approximate_recursive(&a, options, tol, depth + 1, out)?;
        return approximate_recursive(&b, options, tol, depth + 1, out);
    }

    if curve.is_straight_line(options.line_flatness, tol) {
        let line = vec![Segment::Line(Line::new(curve.p1, curve.p2))];
        let deviation = deviation(curve, &line, tol);
        out.push(line, deviation, true);
        return Ok(());
    }

    if depth == 0 {
        let pieces = curve.subdivide_inflections(tol);
        if pieces.len() > 1 {
            debug!(count = pieces.len(), "splitting bezier at inflections");
            for piece in &pieces {
                approximate_recursive(piece, options, tol, depth + 1, out)?;
            }
            return Ok(());
        }
    }

    // Tight arcs become chords before the deviation is measured.
    let candidate = fit_biarc(curve, tol).map(|mut segments| {
        replace_small_arcs(&mut segments, options.min_arc_radius, tol);
        segments
    });
    let can_split = depth < options.max_depth;
    match candidate {
        Some(segments) => {
            let dev = deviation(curve, &segments, tol);
            if dev > options.tolerance && can_split {
                split_and_recurse(curve, options, tol, depth, out)
            } else {
                out.push(segments, dev, dev <= options.tolerance);
                Ok(())
            }
        }
        None if can_split => split_and_recurse(curve, options, tol, depth, out),
        None => {
            let chord = vec![Segment::Line(Line::new(curve.p1, curve.p2))];
            let dev = deviation(curve, &chord, tol);
            out.push(chord, dev, dev <= options.tolerance);
            Ok(())
        }
    }
}

fn split_and_recurse(
    curve: &CubicBezier,
    options: &BiarcOptions,
    tol: Tolerance,
    depth: u32,
    out: &mut Approximation,
) -> Result<()> {
    let (a, b) = curve.subdivide(0.5);
    approximate_recursive(&a, options, tol, depth + 1, out)?;
    approximate_recursive(&b, options, tol, depth + 1, out)
}

/// The circle through both endpoints on which every biarc joint lies.
pub fn biarc_joint_arc(curve: &CubicBezier, tol: Tolerance) -> Option<Arc> {
    let u1 = (curve.c1 - curve.p1).unit(tol).ok()?;
    let u2 = (curve.c2 - curve.p2).unit(tol).ok()?;
    let chord = Line::new(curve.p1, curve.p2);
    let useg = Line::new(curve.p1 + u1, curve.p2 - u2);
    let center = chord.bisector().intersection(&useg.bisector(), false, tol)?;
    let radius = center.distance_to(&curve.p1);
    if radius < tol.linear {
        return None;
    }
    let sweep = center.angle2(&curve.p1, &curve.p2);
    Some(Arc::new(curve.p1, curve.p2, radius, sweep, center))
}

/// One or two segments matching the end tangents of `curve`, without
/// subdivision. `None` if no biarc can be built.
pub fn fit_biarc(curve: &CubicBezier, tol: Tolerance) -> Option<Vec<Segment>> {
    if curve.p1.almost_eq(&curve.c1, tol) {
        let seg = tangent_segment(curve.p2, curve.c2 - curve.p2, curve.p1, true, tol)?;
        return Some(vec![seg]);
    }
    if curve.p2.almost_eq(&curve.c2, tol) {
        let seg = tangent_segment(curve.p1, curve.c1 - curve.p1, curve.p2, false, tol)?;
        return Some(vec![seg]);
    }
    let joint_arc = biarc_joint_arc(curve, tol)?;
    if joint_arc.length() < tol.linear {
        return None;
    }
    let mid = curve.midpoint();
    let dir = (mid - joint_arc.center).unit(tol).ok()?;
    let joint = joint_arc.center + dir * joint_arc.radius;
    if joint.almost_eq(&curve.p1, tol) || joint.almost_eq(&curve.p2, tol) {
        return None;
    }
    let first = tangent_segment(curve.p1, curve.c1 - curve.p1, joint, false, tol)?;
    let second = tangent_segment(curve.p2, curve.c2 - curve.p2, joint, true, tol)?;
    Some(vec![first, second])
}

/// Arc from `p1` leaving along `tangent` to `p2`, or a line if the tangent
/// points along the chord.
fn tangent_segment(p1: Point, tangent: Vector, p2: Point, reverse: bool, tol: Tolerance) -> Option<Segment> {
    let chord = (p2 - p1).unit(tol).ok()?;
    let dir = tangent.unit(tol).ok()?;
    if dir.cross(&chord).abs() < tol.angular && dir.dot(&chord) > 0.0 {
        let line = Line::new(p1, p2);
        return Some(Segment::Line(if reverse { line.reversed() } else { line }));
    }
    Arc::from_two_points_and_tangent(p1, tangent, p2, reverse, tol)
        .ok()
        .map(Segment::Arc)
}

/// Largest distance from evenly spaced curve samples to the segments.
fn deviation(curve: &CubicBezier, segments: &[Segment], tol: Tolerance) -> f64 {
    (0..=DEVIATION_SAMPLES)
        .map(|i| {
            let p = curve.point_at(i as f64 / DEVIATION_SAMPLES as f64);
            segments
                .iter()
                .map(|s| s.distance_to_point(&p, tol))
                .fold(f64::INFINITY, f64::min)
        })
        .fold(0.0, f64::max)
}

/// An arc tighter than the minimum radius as a chain of equal chords, as few
/// as keep the sagitta within tolerance. The chain is capped at
/// `2^max_depth` chords.
fn chord_arc(arc: &Arc, options: &BiarcOptions) -> Approximation {
    let sweep = arc.sweep.abs();
    let max_chords = 1u32 << options.max_depth.min(16);
    let half_angle = (1.0 - options.tolerance / arc.radius).clamp(-1.0, 1.0).acos();
    let mut chords = if half_angle > 0.0 {
        (sweep / (2.0 * half_angle)).ceil() as u32
    } else {
        max_chords
    };
    if sweep > std::f64::consts::PI {
        chords = chords.max(2);
    }
    let chords = chords.clamp(1, max_chords.max(2));
    let deviation = arc.radius * (1.0 - (sweep / (2.0 * chords as f64)).cos());

    let mut approx = Approximation::new();
    let points: Vec<Point> = (0..=chords)
        .map(|i| match i {
            0 => arc.p1,
            i if i == chords => arc.p2,
            i => arc.point_at(i as f64 / chords as f64),
        })
        .collect();
    let lines = points
        .windows(2)
        .map(|pair| Segment::Line(Line::new(pair[0], pair[1])))
        .collect();
    approx.push(lines, deviation, deviation <= options.tolerance);
    approx
}

/// Replace arcs tighter than `min_radius` with their chords. Full circles
/// have no chord and are kept.
fn replace_small_arcs(segments: &mut [Segment], min_radius: f64, tol: Tolerance) {
    if min_radius <= 0.0 {
        return;
    }
    for seg in segments.iter_mut() {
        if let Segment::Arc(arc) = seg {
            if arc.radius < min_radius && !arc.p1.almost_eq(&arc.p2, tol) {
                *seg = Segment::Line(Line::new(arc.p1, arc.p2));
            }
        }
    }
}
