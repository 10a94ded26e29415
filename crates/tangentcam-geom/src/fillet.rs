//! Fillet arcs between connected segments.
//!
//! These are the geometric primitives only. Radius clamping and path-level
//! policy live in the compensation engine.

use std::f64::consts::PI;
use tangentcam_core::Tolerance;

use crate::arc::{intersect_circles, Arc};
use crate::line::Line;
use crate::point::Point;
use crate::segment::{segments_are_g1, Segment};

/// Arc of `radius` tangent to both segments, or `None` if the segments are
/// already tangent, the fillet does not fit, or the geometry is degenerate.
///
/// The arc runs from its tangent point on `seg1` to its tangent point on
/// `seg2`.
pub fn create_fillet_arc(seg1: &Segment, seg2: &Segment, radius: f64, tol: Tolerance) -> Option<Arc> {
    if radius < tol.linear || segments_are_g1(seg1, seg2, tol) {
        return None;
    }
    match (seg1, seg2) {
        (Segment::Line(l1), Segment::Line(l2)) => fillet_line_line(l1, l2, radius, tol),
        (Segment::Line(l), Segment::Arc(a)) => fillet_line_arc(l, a, radius, tol),
        (Segment::Arc(a), Segment::Line(l)) => {
            // Solve the mirrored line->arc case and flip the result.
            fillet_line_arc(&l.reversed(), &a.reversed(), radius, tol).map(|f| f.reversed())
        }
        (Segment::Arc(a1), Segment::Arc(a2)) => fillet_arc_arc(a1, a2, radius, tol),
    }
}

/// Trim `seg1` and `seg2` back to the fillet tangent points.
pub fn connect_fillet(seg1: &Segment, fillet: &Arc, seg2: &Segment) -> (Segment, Arc, Segment) {
    (seg1.with_end(fillet.p1), *fillet, seg2.with_start(fillet.p2))
}

/// Fillet between two lines.
pub fn fillet_line_line(line1: &Line, line2: &Line, radius: f64, tol: Tolerance) -> Option<Arc> {
    let side = line1.which_side(&line2.p2, tol);
    if side == 0 {
        return None;
    }
    let offset = radius * f64::from(side);
    let center = line1.offset(offset).intersection(&line2.offset(offset), false, tol)?;
    let fp1 = line1.normal_projection_point(&center, true, tol)?;
    let fp2 = line2.normal_projection_point(&center, true, tol)?;
    if fp1.almost_eq(&fp2, tol) {
        return None;
    }
    Some(Arc::from_two_points_and_center(fp1, fp2, center, false))
}

/// Fillet from a line into an arc that starts at the line's end.
pub fn fillet_line_arc(line: &Line, arc: &Arc, radius: f64, tol: Tolerance) -> Option<Arc> {
    let side = line.which_side_angle(arc.start_tangent_angle(), tol);
    if side == 0 {
        return None;
    }
    // The fillet circle is inside the arc circle when the arc bends towards
    // the same side as the turn.
    let bends_away = (side > 0 && arc.is_clockwise()) || (side < 0 && !arc.is_clockwise());
    let (h, along) = if bends_away {
        (arc.radius + radius, line.angle() + PI)
    } else {
        (arc.radius - radius, line.angle())
    };
    if h <= tol.linear {
        return None;
    }
    let rail = line.offset(radius * f64::from(side));
    let foot = rail.normal_projection_point(&arc.center, false, tol)?;
    let b = foot.distance_to(&arc.center);
    let a2 = h * h - b * b;
    if a2 < 0.0 {
        return None;
    }
    let center = Line::from_polar(foot, a2.sqrt(), along).p2;
    let fp1 = line.normal_projection_point(&center, true, tol)?;
    let fp2 = tangent_point_on_arc(arc, &center, tol)?;
    if fp1.almost_eq(&fp2, tol) || !tol.eq(center.distance_to(&fp1), center.distance_to(&fp2)) {
        return None;
    }
    Some(Arc::from_two_points_and_center(fp1, fp2, center, false))
}

/// Fillet between two arcs that meet end to start.
pub fn fillet_arc_arc(arc1: &Arc, arc2: &Arc, radius: f64, tol: Tolerance) -> Option<Arc> {
    let side = f64::from(arc1.which_side_angle(arc2.start_tangent_angle(), tol));
    if side == 0.0 {
        return None;
    }
    let cw = |a: &Arc| if a.is_clockwise() { 1.0 } else { -1.0 };
    let r1 = arc1.radius + radius * side * cw(arc1);
    let r2 = arc2.radius + radius * side * cw(arc2);
    if r1 <= tol.linear || r2 <= tol.linear {
        return None;
    }
    let joint = arc1.p2;
    intersect_circles(arc1.center, r1, arc2.center, r2, tol)
        .into_iter()
        .filter_map(|center| {
            let fp1 = tangent_point_on_arc(arc1, &center, tol)?;
            let fp2 = tangent_point_on_arc(arc2, &center, tol)?;
            (!fp1.almost_eq(&fp2, tol)).then_some((center, fp1, fp2))
        })
        .min_by(|a, b| joint.distance_to(&a.0).total_cmp(&joint.distance_to(&b.0)))
        .map(|(center, fp1, fp2)| Arc::from_two_points_and_center(fp1, fp2, center, false))
}

/// Where a circle centered at `center` touches `arc`, if that point lies on
/// the arc.
fn tangent_point_on_arc(arc: &Arc, center: &Point, tol: Tolerance) -> Option<Point> {
    let dir = (*center - arc.center).unit(tol).ok()?;
    let p = arc.center + dir * arc.radius;
    arc.contains_angle(&p, tol).then_some(p)
}
