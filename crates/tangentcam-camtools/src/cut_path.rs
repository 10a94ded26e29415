//! Compensated paths.
//!
//! A [`CutPath`] is what the compensation engine hands to the toolpath
//! assembler: line and arc segments plus per-segment rotation hints. When
//! the tool trails its rotation center the A axis no longer follows the
//! tangent of the trajectory, so the hints carry the angle the tool must
//! face at each end of a segment.

use tangentcam_core::Tolerance;
use tangentcam_geom::{Path, Point, Segment};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutSegment {
    pub geometry: Segment,
    /// Tool angle at `p1`, if different from the start tangent.
    pub start_angle: Option<f64>,
    /// Tool angle at `p2`, if different from the end tangent.
    pub end_angle: Option<f64>,
    /// The join with the next segment was tangent before offsetting and
    /// should be re-smoothed.
    pub g1: bool,
    /// Inserted by a tool-width fillet. Joins touching it are never
    /// treated as tangent.
    pub fillet: bool,
}

impl CutSegment {
    pub fn new(geometry: Segment) -> Self {
        Self {
            geometry,
            start_angle: None,
            end_angle: None,
            g1: false,
            fillet: false,
        }
    }

    pub fn with_hints(geometry: Segment, start_angle: f64, end_angle: f64) -> Self {
        Self {
            start_angle: Some(start_angle),
            end_angle: Some(end_angle),
            ..Self::new(geometry)
        }
    }

    /// Same hints and flags, different geometry.
    pub fn with_geometry(&self, geometry: Segment) -> Self {
        Self { geometry, ..*self }
    }

    pub fn p1(&self) -> Point {
        self.geometry.p1()
    }

    pub fn p2(&self) -> Point {
        self.geometry.p2()
    }

    pub fn length(&self) -> f64 {
        self.geometry.length()
    }

    /// Tool angle at the start of the segment.
    pub fn start_angle(&self) -> f64 {
        self.start_angle
            .unwrap_or_else(|| self.geometry.start_tangent_angle())
    }

    /// Tool angle at the end of the segment.
    pub fn end_angle(&self) -> f64 {
        self.end_angle
            .unwrap_or_else(|| self.geometry.end_tangent_angle())
    }

    pub fn has_hints(&self) -> bool {
        self.start_angle.is_some() || self.end_angle.is_some()
    }
}

impl From<Segment> for CutSegment {
    fn from(geometry: Segment) -> Self {
        Self::new(geometry)
    }
}

/// A sequence of connected cut segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CutPath {
    pub segments: Vec<CutSegment>,
}

impl CutPath {
    pub fn new(segments: Vec<CutSegment>) -> Self {
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn start(&self) -> Option<Point> {
        self.segments.first().map(CutSegment::p1)
    }

    pub fn end(&self) -> Option<Point> {
        self.segments.last().map(CutSegment::p2)
    }

    pub fn is_closed(&self, tol: Tolerance) -> bool {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) => self.len() > 1 && start.almost_eq(&end, tol),
            _ => false,
        }
    }

    pub fn length(&self) -> f64 {
        self.segments.iter().map(CutSegment::length).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CutSegment> {
        self.segments.iter()
    }

    pub fn geometry(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.segments.iter().map(|s| &s.geometry)
    }

    /// Opposite direction of travel.
    ///
    /// Rotation hints are dropped: they describe a trailing tool moving the
    /// other way and are meaningless after reversal.
    pub fn reversed(&self) -> Self {
        Self::new(
            self.segments
                .iter()
                .rev()
                .map(|s| CutSegment::new(s.geometry.reversed()))
                .collect(),
        )
    }
}

impl From<&Path> for CutPath {
    fn from(path: &Path) -> Self {
        Self::new(path.iter().copied().map(CutSegment::new).collect())
    }
}

impl<'a> IntoIterator for &'a CutPath {
    type Item = &'a CutSegment;
    type IntoIter = std::slice::Iter<'a, CutSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;
    use tangentcam_geom::Line;

    #[test]
    fn test_hints_fall_back_to_tangents() {
        let seg = CutSegment::new(Line::new(Point::new(0.0, 0.0), Point::new(0.0, 5.0)).into());
        assert!((seg.start_angle() - FRAC_PI_2).abs() < 1e-12);
        assert!(!seg.has_hints());

        let hinted = CutSegment::with_hints(seg.geometry, 0.0, 1.0);
        assert_eq!(hinted.start_angle(), 0.0);
        assert_eq!(hinted.end_angle(), 1.0);
    }

    #[test]
    fn test_closed_detection() {
        let tol = Tolerance::default();
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ];
        let path = Path::from_points(&pts, true, tol).unwrap();
        let cut = CutPath::from(&path);
        assert!(cut.is_closed(tol));
        assert_eq!(cut.len(), 3);
        assert!(cut.reversed().is_closed(tol));
    }
}
