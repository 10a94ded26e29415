//! Axis-aligned bounding boxes.

use serde::{Deserialize, Serialize};

use crate::point::Point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Smallest box containing both points.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        Self::new(
            Point::new(p1.x.min(p2.x), p1.y.min(p2.y)),
            Point::new(p1.x.max(p2.x), p1.y.max(p2.y)),
        )
    }

    /// `None` for an empty iterator.
    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |bbox, p| bbox.include(p)))
    }

    pub fn include(&self, p: Point) -> Self {
        Self::new(
            Point::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            Point::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        )
    }

    pub fn union(&self, other: &BoundingBox) -> Self {
        self.include(other.min).include(other.max)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        self.min.midpoint(&self.max)
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let bbox = BoundingBox::from_points(vec![
            Point::new(1.0, 5.0),
            Point::new(-2.0, 3.0),
            Point::new(4.0, -1.0),
        ])
        .unwrap();
        assert_eq!(bbox.min, Point::new(-2.0, -1.0));
        assert_eq!(bbox.max, Point::new(4.0, 5.0));
        assert_eq!(bbox.width(), 6.0);
        assert!(BoundingBox::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::from_corners(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        let b = BoundingBox::from_corners(Point::new(2.0, -1.0), Point::new(3.0, 0.5));
        let u = a.union(&b);
        assert_eq!(u.min, Point::new(0.0, -1.0));
        assert_eq!(u.max, Point::new(3.0, 1.0));
        assert!(u.contains(&Point::new(2.5, 0.0)));
    }
}
