//! Toolpath data structures.
//!
//! A [`Toolpath`] is an ordered list of typed motions. Every entry also
//! carries the full machine state after the motion, so consumers never
//! have to replay the list to know where the tool is.

use std::f64::consts::TAU;
use tangentcam_geom::{normalize_angle, ArcDirection, Point};

/// Target coordinates of a straight move. Axes left as `None` do not move.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Axes {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    /// Radians
    pub a: Option<f64>,
}

impl Axes {
    pub fn xy(p: Point) -> Self {
        Self {
            x: Some(p.x),
            y: Some(p.y),
            ..Self::default()
        }
    }

    pub fn z(z: f64) -> Self {
        Self {
            z: Some(z),
            ..Self::default()
        }
    }

    pub fn a(a: f64) -> Self {
        Self {
            a: Some(a),
            ..Self::default()
        }
    }

    pub fn with_z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    pub fn with_a(mut self, a: Option<f64>) -> Self {
        self.a = a;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none() && self.a.is_none()
    }
}

/// One machine action.
#[derive(Debug, Clone, PartialEq)]
pub enum Motion {
    /// Comment line. An empty string is a blank separator line.
    Comment(String),
    /// Raise the tool to a safe height. Always written.
    Retract { z: f64 },
    /// Lower the tool at the Z feed.
    Plunge { z: f64, feed: f64 },
    /// G00
    Rapid(Axes),
    /// G01
    Feed { axes: Axes, feed: f64 },
    /// G02/G03 from the current position.
    Arc {
        end: Point,
        center: Point,
        direction: ArcDirection,
        z: Option<f64>,
        a: Option<f64>,
        feed: f64,
    },
    Dwell { seconds: f64 },
    /// Wait for the operator.
    Pause,
    SpindleOn { rpm: f64, clockwise: bool },
    SpindleOff,
    /// Redefine the current A position without moving.
    ResetAxis { a: f64 },
}

impl Motion {
    pub fn comment(text: impl Into<String>) -> Self {
        Motion::Comment(text.into())
    }

    pub fn is_cutting(&self) -> bool {
        matches!(self, Motion::Feed { .. } | Motion::Arc { .. })
    }
}

/// Machine state after a motion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MachineState {
    /// XY position, unknown until the first XY move
    pub position: Option<Point>,
    pub z: Option<f64>,
    /// Accumulated A axis angle in radians
    pub a: f64,
    pub feed: Option<f64>,
    pub spindle_on: bool,
}

impl MachineState {
    /// State after performing `motion`.
    pub fn apply(&self, motion: &Motion) -> MachineState {
        let mut next = *self;
        match motion {
            Motion::Comment(_) | Motion::Dwell { .. } | Motion::Pause => {}
            Motion::Retract { z } => next.z = Some(*z),
            Motion::Plunge { z, feed } => {
                next.z = Some(*z);
                next.feed = Some(*feed);
            }
            Motion::Rapid(axes) => next.move_to(axes),
            Motion::Feed { axes, feed } => {
                next.move_to(axes);
                next.feed = Some(*feed);
            }
            Motion::Arc { end, z, a, feed, .. } => {
                next.position = Some(*end);
                if let Some(z) = z {
                    next.z = Some(*z);
                }
                if let Some(a) = a {
                    next.a = *a;
                }
                next.feed = Some(*feed);
            }
            Motion::SpindleOn { .. } => next.spindle_on = true,
            Motion::SpindleOff => next.spindle_on = false,
            Motion::ResetAxis { a } => next.a = *a,
        }
        next
    }

    fn move_to(&mut self, axes: &Axes) {
        if axes.x.is_some() || axes.y.is_some() {
            let current = self.position.unwrap_or(Point::ORIGIN);
            self.position = Some(Point::new(
                axes.x.unwrap_or(current.x),
                axes.y.unwrap_or(current.y),
            ));
        }
        if let Some(z) = axes.z {
            self.z = Some(z);
        }
        if let Some(a) = axes.a {
            self.a = a;
        }
    }
}

/// A motion with the machine state it leaves behind.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolpathSegment {
    pub motion: Motion,
    pub state: MachineState,
}

/// A complete toolpath made up of multiple segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Toolpath {
    pub segments: Vec<ToolpathSegment>,
    /// Number of distinct input paths in this toolpath
    pub path_count: usize,
    /// Number of depth passes
    pub pass_count: usize,
}

impl Toolpath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a motion, recording the resulting state.
    pub fn add_segment(&mut self, motion: Motion) {
        let state = self.state().apply(&motion);
        self.segments.push(ToolpathSegment { motion, state });
    }

    /// State after the last segment.
    pub fn state(&self) -> MachineState {
        self.segments.last().map(|s| s.state).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ToolpathSegment> {
        self.segments.iter()
    }

    pub fn motions(&self) -> impl Iterator<Item = &Motion> + '_ {
        self.segments.iter().map(|s| &s.motion)
    }

    /// XY distance travelled while cutting.
    pub fn total_length(&self) -> f64 {
        self.xy_length(Motion::is_cutting)
    }

    /// XY distance travelled in rapids.
    pub fn rapid_length(&self) -> f64 {
        self.xy_length(|m| matches!(m, Motion::Rapid(_)))
    }

    fn xy_length(&self, filter: impl Fn(&Motion) -> bool) -> f64 {
        let mut previous: Option<Point> = None;
        let mut total = 0.0;
        for seg in &self.segments {
            if let (Some(start), Some(end)) = (previous, seg.state.position) {
                if filter(&seg.motion) {
                    total += match &seg.motion {
                        Motion::Arc {
                            center, direction, ..
                        } => arc_length(start, end, *center, *direction),
                        _ => start.distance_to(&end),
                    };
                }
            }
            previous = seg.state.position;
        }
        total
    }
}

impl<'a> IntoIterator for &'a Toolpath {
    type Item = &'a ToolpathSegment;
    type IntoIter = std::slice::Iter<'a, ToolpathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Length of the arc from `start` to `end` around `center`.
/// Coincident endpoints are a full circle.
pub fn arc_length(start: Point, end: Point, center: Point, direction: ArcDirection) -> f64 {
    let radius = center.distance_to(&start);
    let a1 = (start - center).angle();
    let a2 = (end - center).angle();
    let ccw = normalize_angle(a2 - a1, std::f64::consts::PI);
    let sweep = match direction {
        ArcDirection::CounterClockwise => ccw,
        ArcDirection::Clockwise => TAU - ccw,
    };
    let sweep = if sweep <= f64::EPSILON || sweep >= TAU { TAU } else { sweep };
    radius * sweep
}
