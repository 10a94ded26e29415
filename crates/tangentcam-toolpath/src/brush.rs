//! Entry and exit moves for flexible tools, and reload counting.
//!
//! A brush bends behind its rotation axis while it is down, so it needs a
//! run-in before it reaches its working position and a run-out after the
//! path ends.

use tangentcam_camtools::{CutPath, CutSegment};
use tangentcam_core::Tolerance;
use tangentcam_geom::{Line, Point, Segment, Vector};

use crate::machine::{MachineOptions, ReloadPolicy};

/// Depth a stroke segment feeds towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZTarget {
    /// Current pass depth
    Pass,
    /// Work surface (Z 0)
    Surface,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSegment {
    pub cut: CutSegment,
    pub z: ZTarget,
}

/// A cut path with its entry and exit moves.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub segments: Vec<StrokeSegment>,
    /// The tool stops at the surface before the first segment and ramps
    /// down along it.
    pub soft_landing: bool,
}

impl Stroke {
    pub fn start(&self) -> Option<Point> {
        self.segments.first().map(|s| s.cut.p1())
    }

    /// Tool angle at the start of the stroke.
    pub fn start_angle(&self) -> Option<f64> {
        self.segments.first().map(|s| s.cut.start_angle())
    }
}

/// Straight segment of `length` ending at `end`, arriving at `angle`.
fn run_in(end: Point, angle: f64, length: f64) -> CutSegment {
    let start = end - Vector::from_polar(length, angle);
    CutSegment::with_hints(Segment::Line(Line::new(start, end)), angle, angle)
}

/// Straight segment of `length` leaving `start` at `angle`.
fn run_out(start: Point, angle: f64, length: f64) -> CutSegment {
    let end = start + Vector::from_polar(length, angle);
    CutSegment::with_hints(Segment::Line(Line::new(start, end)), angle, angle)
}

/// Add the landing strip, soft landing ramp, overshoot and lift-off moves
/// configured in `options` around `path`.
///
/// Returns `None` for an empty path.
pub fn prepare_stroke(path: &CutPath, options: &MachineOptions, tol: Tolerance) -> Option<Stroke> {
    let first = path.segments.first()?;
    let last = path.segments.last()?;
    let start_angle = first.start_angle();
    let end_angle = last.end_angle();
    let mut segments = Vec::with_capacity(path.len() + 4);

    let mut entry = first.p1();
    let strip = options.landing.landing_strip;
    let strip_segment = (strip >= tol.linear).then(|| {
        let seg = run_in(entry, start_angle, strip);
        entry = seg.p1();
        seg
    });

    let ramp = options.tool.trail_offset;
    let soft_landing = options.landing.soft_landing && ramp >= tol.linear;
    if soft_landing {
        segments.push(StrokeSegment {
            cut: run_in(entry, start_angle, ramp),
            z: ZTarget::Pass,
        });
    }
    if let Some(cut) = strip_segment {
        segments.push(StrokeSegment { cut, z: ZTarget::Pass });
    }
    segments.extend(path.iter().map(|cut| StrokeSegment {
        cut: *cut,
        z: ZTarget::Pass,
    }));

    let overshoot = options.overshoot.distance(&options.tool);
    if overshoot >= tol.linear {
        let cut = run_out(last.p2(), end_angle, overshoot);
        let exit = cut.p2();
        segments.push(StrokeSegment { cut, z: ZTarget::Pass });
        if soft_landing {
            segments.push(StrokeSegment {
                cut: run_out(exit, end_angle, ramp),
                z: ZTarget::Surface,
            });
        }
    }

    Some(Stroke {
        segments,
        soft_landing,
    })
}

/// Counts finished paths and says when the tool needs a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadCounter {
    every: Option<u32>,
    count: u32,
}

impl ReloadCounter {
    pub fn new(policy: &ReloadPolicy) -> Self {
        let every = match policy {
            ReloadPolicy::Disabled => None,
            ReloadPolicy::Every { paths, .. } => Some((*paths).max(1)),
        };
        Self { every, count: 0 }
    }

    /// Record a finished path. True if a reload is due before the next one.
    pub fn path_done(&mut self) -> bool {
        self.count += 1;
        self.every.is_some_and(|n| self.count % n == 0)
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{LandingOptions, OvershootMode, ToolState};
    use tangentcam_geom::Path;

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    fn straight() -> CutPath {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        CutPath::from(&Path::from_points(&pts, false, tol()).unwrap())
    }

    #[test]
    fn test_plain_stroke_is_the_path() {
        let stroke = prepare_stroke(&straight(), &MachineOptions::default(), tol()).unwrap();
        assert_eq!(stroke.segments.len(), 1);
        assert!(!stroke.soft_landing);
        assert!(prepare_stroke(&CutPath::default(), &MachineOptions::default(), tol()).is_none());
    }

    #[test]
    fn test_full_brush_stroke() {
        let options = MachineOptions {
            tool: ToolState {
                width: 4.0,
                trail_offset: 1.0,
            },
            landing: LandingOptions {
                soft_landing: true,
                landing_strip: 3.0,
            },
            overshoot: OvershootMode::Auto,
            ..MachineOptions::default()
        };
        let stroke = prepare_stroke(&straight(), &options, tol()).unwrap();
        let ends: Vec<(Point, Point, ZTarget)> = stroke
            .segments
            .iter()
            .map(|s| (s.cut.p1(), s.cut.p2(), s.z))
            .collect();
        assert_eq!(
            ends,
            vec![
                (Point::new(-4.0, 0.0), Point::new(-3.0, 0.0), ZTarget::Pass),
                (Point::new(-3.0, 0.0), Point::new(0.0, 0.0), ZTarget::Pass),
                (Point::new(0.0, 0.0), Point::new(10.0, 0.0), ZTarget::Pass),
                (Point::new(10.0, 0.0), Point::new(12.0, 0.0), ZTarget::Pass),
                (Point::new(12.0, 0.0), Point::new(13.0, 0.0), ZTarget::Surface),
            ]
        );
        assert!(stroke.soft_landing);
        assert_eq!(stroke.start(), Some(Point::new(-4.0, 0.0)));
    }

    #[test]
    fn test_soft_landing_needs_trail_offset() {
        let options = MachineOptions {
            landing: LandingOptions {
                soft_landing: true,
                landing_strip: 0.0,
            },
            ..MachineOptions::default()
        };
        let stroke = prepare_stroke(&straight(), &options, tol()).unwrap();
        assert!(!stroke.soft_landing);
        assert_eq!(stroke.segments.len(), 1);
    }

    #[test]
    fn test_reload_counter() {
        let mut counter = ReloadCounter::new(&ReloadPolicy::Every {
            paths: 3,
            angle: None,
            pause: None,
        });
        let due: Vec<bool> = (0..7).map(|_| counter.path_done()).collect();
        assert_eq!(due, vec![false, false, true, false, false, true, false]);
        assert_eq!(counter.count(), 7);

        let mut disabled = ReloadCounter::new(&ReloadPolicy::Disabled);
        assert!(!disabled.path_done());
    }
}
