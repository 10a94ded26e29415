//! Connected sequences of segments.

use serde::{Deserialize, Serialize};
use tangentcam_core::{GeometryError, Result, Tolerance};

use crate::bbox::BoundingBox;
use crate::line::Line;
use crate::point::Point;
use crate::segment::Segment;

/// Ordered, connected sequence of lines and arcs.
///
/// Each segment starts where the previous one ends, within the tolerance the
/// path was built with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// Build a path, checking continuity and rejecting non-finite segments.
    pub fn new(segments: Vec<Segment>, tol: Tolerance) -> Result<Self> {
        for (index, seg) in segments.iter().enumerate() {
            if !seg.is_finite() {
                return Err(GeometryError::NonFinite { context: "path segment" }.into());
            }
            if index > 0 {
                let gap = segments[index - 1].p2().distance_to(&seg.p1());
                if gap >= tol.linear {
                    return Err(GeometryError::Discontinuous { index, gap }.into());
                }
            }
        }
        Ok(Self { segments })
    }

    /// Open polyline through `points`. Repeated points are dropped.
    pub fn from_points(points: &[Point], closed: bool, tol: Tolerance) -> Result<Self> {
        let mut vertices: Vec<Point> = Vec::with_capacity(points.len() + 1);
        for p in points {
            p.finite("polyline vertex")?;
            if vertices.last().is_none_or(|last| !last.almost_eq(p, tol)) {
                vertices.push(*p);
            }
        }
        if closed {
            if let (Some(first), Some(last)) = (vertices.first().copied(), vertices.last().copied()) {
                if !first.almost_eq(&last, tol) {
                    vertices.push(first);
                }
            }
        }
        if vertices.len() < 2 {
            return Err(GeometryError::ZeroLength { what: "polyline" }.into());
        }
        let segments = vertices
            .windows(2)
            .map(|w| Segment::Line(Line::new(w[0], w[1])))
            .collect();
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn start(&self) -> Option<Point> {
        self.segments.first().map(Segment::p1)
    }

    pub fn end(&self) -> Option<Point> {
        self.segments.last().map(Segment::p2)
    }

    /// True if the path ends where it starts.
    pub fn is_closed(&self, tol: Tolerance) -> bool {
        match (self.start(), self.end()) {
            (Some(s), Some(e)) => self.segments.len() > 1 && s.almost_eq(&e, tol),
            _ => false,
        }
    }

    pub fn length(&self) -> f64 {
        self.segments.iter().map(Segment::length).sum()
    }

    /// Same path traversed the other way.
    pub fn reversed(&self) -> Self {
        Self {
            segments: self.segments.iter().rev().map(Segment::reversed).collect(),
        }
    }

    pub fn bounding_box(&self, tol: Tolerance) -> Option<BoundingBox> {
        self.segments
            .iter()
            .map(|s| s.bounding_box(tol))
            .reduce(|a, b| a.union(&b))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
