//! Path-level fillet insertion.
//!
//! Used twice by the compensation pipeline: once with half the tool width
//! before offsetting, so a wide tool does not gouge while it turns on a
//! corner, and once at the end with the smoothing radius to round off
//! whatever corners are left.
//!
//! A requested radius that does not fit between the neighbouring segments
//! is reduced until it does. Each segment may give up at most half its
//! length to a fillet at either end, except where the path has a free end:
//! the first segment of an open path may be consumed up to its start and
//! the last one up to its end.

use tangentcam_core::Tolerance;
use tangentcam_geom::{
    calc_rotation, connect_fillet, create_fillet_arc, segments_are_g1, Arc, Segment,
};
use tracing::debug;

use crate::cut_path::{CutPath, CutSegment};

/// Bisection steps used to shrink a fillet that involves an arc.
const CLAMP_STEPS: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilletOptions {
    pub radius: f64,
    /// Also round the seam of a closed path.
    pub close: bool,
    /// Spread the A axis rotation over the trimmed segment ends.
    pub adjust_rotation: bool,
    /// Flag inserted arcs so later passes never treat their joins as tangent.
    pub mark_fillet: bool,
}

impl FilletOptions {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            close: true,
            adjust_rotation: false,
            mark_fillet: false,
        }
    }
}

/// Insert fillet arcs at every corner of `path` where one fits.
///
/// Returns a copy of the input if no fillet was created.
pub fn fillet_path(path: &CutPath, options: &FilletOptions, tol: Tolerance) -> CutPath {
    let n = path.len();
    if options.radius < tol.linear || n < 2 {
        return path.clone();
    }
    let closed = options.close && n > 2 && path.is_closed(tol);
    let mut result: Vec<CutSegment> = Vec::with_capacity(n * 2);
    let mut created = 0usize;

    let mut seg1 = path.segments[0];
    for (i, seg2) in path.segments.iter().enumerate().skip(1) {
        let avail1 = if i == 1 && closed {
            seg1.length() / 2.0
        } else {
            seg1.length()
        };
        let avail2 = if i == n - 1 && !closed {
            seg2.length()
        } else {
            seg2.length() / 2.0
        };
        match adjusted_fillet(&seg1, seg2, options, avail1, avail2, tol) {
            Some((s1, fillet, s2)) => {
                push_trimmed(&mut result, s1, tol);
                result.push(fillet);
                created += 1;
                seg1 = s2;
            }
            None => {
                result.push(seg1);
                seg1 = *seg2;
            }
        }
    }
    push_trimmed(&mut result, seg1, tol);

    if closed && result.len() >= 2 {
        let last = result[result.len() - 1];
        let first = result[0];
        if let Some((s1, fillet, s2)) =
            adjusted_fillet(&last, &first, options, last.length(), first.length(), tol)
        {
            result.pop();
            push_trimmed(&mut result, s1, tol);
            result.push(fillet);
            if s2.length() < tol.linear {
                result.remove(0);
            } else {
                result[0] = s2;
            }
            created += 1;
        }
    }

    if created == 0 {
        return path.clone();
    }
    debug!(fillets = created, radius = options.radius, "fillets inserted");
    CutPath::new(result)
}

fn push_trimmed(result: &mut Vec<CutSegment>, seg: CutSegment, tol: Tolerance) {
    if seg.length() >= tol.linear {
        result.push(seg);
    }
}

/// Fillet between two cut segments, with trimmed neighbours.
///
/// Hints are carried over to the trimmed segments. With
/// `adjust_rotation` the rotation each segment still has to perform is
/// scaled down by the fraction the fillet cut away, and the fillet picks
/// up where they leave off.
pub fn adjusted_fillet(
    seg1: &CutSegment,
    seg2: &CutSegment,
    options: &FilletOptions,
    avail1: f64,
    avail2: f64,
    tol: Tolerance,
) -> Option<(CutSegment, CutSegment, CutSegment)> {
    if segments_are_g1(&seg1.geometry, &seg2.geometry, tol) {
        return None;
    }
    let arc = clamped_fillet(&seg1.geometry, &seg2.geometry, options.radius, avail1, avail2, tol)?;
    let (g1, _, g2) = connect_fillet(&seg1.geometry, &arc, &seg2.geometry);
    let mut s1 = seg1.with_geometry(g1);
    let mut s2 = seg2.with_geometry(g2);
    let mut fillet = CutSegment::new(Segment::Arc(arc));
    fillet.fillet = options.mark_fillet;

    if options.adjust_rotation {
        let (a1, a2) = (seg1.start_angle(), seg1.end_angle());
        let mu = 1.0 - seg1.geometry.mu(&arc.p1);
        let rest = calc_rotation(a1, a2, tol) * mu;
        if tol.angle_is_zero(rest) {
            fillet.start_angle = Some(a2);
        } else {
            s1.end_angle = Some(a2 - rest);
            fillet.start_angle = s1.end_angle;
        }

        let (a1, a2) = (seg2.start_angle(), seg2.end_angle());
        let mu = seg2.geometry.mu(&arc.p2);
        let done = calc_rotation(a1, a2, tol) * mu;
        if tol.angle_is_zero(done) {
            fillet.end_angle = Some(a1);
        } else {
            s2.start_angle = Some(a1 + done);
            fillet.end_angle = s2.start_angle;
        }
    }
    Some((s1, fillet, s2))
}

/// The largest fillet no larger than `radius` that trims at most `avail1`
/// from the end of `seg1` and `avail2` from the start of `seg2`.
pub fn clamped_fillet(
    seg1: &Segment,
    seg2: &Segment,
    radius: f64,
    avail1: f64,
    avail2: f64,
    tol: Tolerance,
) -> Option<Arc> {
    let fits = |r: f64| {
        let arc = create_fillet_arc(seg1, seg2, r, tol)?;
        let trim1 = seg1.length() * (1.0 - seg1.mu(&arc.p1)).clamp(0.0, 1.0);
        let trim2 = seg2.length() * seg2.mu(&arc.p2).clamp(0.0, 1.0);
        (trim1 <= avail1 + tol.linear && trim2 <= avail2 + tol.linear).then_some(arc)
    };
    if let Some(arc) = fits(radius) {
        return Some(arc);
    }

    // Two lines: the tangent points sit r * tan(turn / 2) from the corner.
    if let (Segment::Line(_), Segment::Line(_)) = (seg1, seg2) {
        let turn = calc_rotation(seg1.end_tangent_angle(), seg2.start_tangent_angle(), tol).abs();
        let t = (turn / 2.0).tan();
        if t > tol.angular && t.is_finite() {
            let r = avail1.min(avail2) / t;
            if r < radius {
                if let Some(arc) = fits(r) {
                    debug!(requested = radius, clamped = r, "fillet radius clamped");
                    return Some(arc);
                }
            }
        }
    }

    let (mut lo, mut hi) = (0.0, radius);
    let mut best = None;
    for _ in 0..CLAMP_STEPS {
        let mid = (lo + hi) / 2.0;
        match fits(mid) {
            Some(arc) => {
                lo = mid;
                best = Some(arc);
            }
            None => hi = mid,
        }
    }
    if let Some(arc) = &best {
        debug!(requested = radius, clamped = arc.radius, "fillet radius clamped");
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangentcam_geom::{Line, Path, Point};

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    fn polygon(points: &[Point], closed: bool) -> CutPath {
        CutPath::from(&Path::from_points(points, closed, tol()).unwrap())
    }

    #[test]
    fn test_square_gets_four_fillets() {
        let square = polygon(
            &[
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ],
            true,
        );
        let filleted = fillet_path(&square, &FilletOptions::new(1.0), tol());
        assert_eq!(filleted.len(), 8);
        assert!(filleted.is_closed(tol()));
        let arcs = filleted.geometry().filter(|s| s.as_arc().is_some()).count();
        assert_eq!(arcs, 4);
        for pair in filleted.segments.windows(2) {
            assert!(segments_are_g1(&pair[0].geometry, &pair[1].geometry, Tolerance::new(1e-6, 1e-6)));
        }
    }

    #[test]
    fn test_open_path_leaves_seam_alone() {
        let square = polygon(
            &[
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ],
            true,
        );
        let options = FilletOptions {
            close: false,
            ..FilletOptions::new(1.0)
        };
        let filleted = fillet_path(&square, &options, tol());
        assert_eq!(filleted.len(), 7);
        assert_eq!(filleted.start(), Some(Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_radius_is_clamped_on_short_segments() {
        // The middle segment is 2 units long, so each fillet may use 1.
        let path = polygon(
            &[
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 2.0),
                Point::new(20.0, 2.0),
            ],
            false,
        );
        let filleted = fillet_path(&path, &FilletOptions::new(5.0), tol());
        let radii: Vec<f64> = filleted
            .geometry()
            .filter_map(|s| s.as_arc().map(|a| a.radius))
            .collect();
        assert_eq!(radii.len(), 2);
        for r in radii {
            assert!((r - 1.0).abs() < 1e-6, "radius {r}");
        }
        for pair in filleted.segments.windows(2) {
            assert!(pair[0].p2().almost_eq(&pair[1].p1(), tol()));
        }
    }

    #[test]
    fn test_mark_and_adjust_rotation() {
        let l1 = CutSegment::new(Line::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0)).into());
        let l2 = CutSegment::new(Line::new(Point::new(10.0, 0.0), Point::new(10.0, 10.0)).into());
        let options = FilletOptions {
            adjust_rotation: true,
            mark_fillet: true,
            ..FilletOptions::new(1.0)
        };
        let (s1, f, s2) = adjusted_fillet(&l1, &l2, &options, 10.0, 5.0, tol()).unwrap();
        assert!(f.fillet);
        assert!(!s1.fillet && !s2.fillet);
        // Lines do not rotate, so the fillet inherits their directions.
        assert_eq!(f.start_angle, Some(l1.end_angle()));
        assert_eq!(f.end_angle, Some(l2.start_angle()));
        assert!(s1.end_angle.is_none());
    }

    #[test]
    fn test_tangent_path_is_returned_unchanged() {
        let path = polygon(
            &[Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(10.0, 0.0)],
            false,
        );
        assert_eq!(fillet_path(&path, &FilletOptions::new(1.0), tol()), path);
    }
}
