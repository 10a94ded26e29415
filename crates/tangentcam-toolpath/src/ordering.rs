//! Path ordering.
//!
//! Ordering only looks at path endpoints, so it works on anything that can
//! report where it starts and ends and can be reversed.

use std::cmp::Ordering;
use tangentcam_camtools::CutPath;
use tangentcam_geom::{Path, Point};
use tracing::debug;

use crate::machine::PathOrder;

/// Something a tool traverses from a start point to an end point.
pub trait Traversable: Sized {
    fn start_point(&self) -> Option<Point>;
    fn end_point(&self) -> Option<Point>;
    /// The same geometry traversed the other way.
    fn reversed_path(&self) -> Self;
}

impl Traversable for Path {
    fn start_point(&self) -> Option<Point> {
        self.start()
    }

    fn end_point(&self) -> Option<Point> {
        self.end()
    }

    fn reversed_path(&self) -> Self {
        self.reversed()
    }
}

impl Traversable for CutPath {
    fn start_point(&self) -> Option<Point> {
        self.start()
    }

    fn end_point(&self) -> Option<Point> {
        self.end()
    }

    fn reversed_path(&self) -> Self {
        self.reversed()
    }
}

/// Reorder `paths` according to `order`. Sorting is stable.
pub fn order_paths<T: Traversable>(paths: Vec<T>, order: PathOrder) -> Vec<T> {
    match order {
        PathOrder::None => paths,
        PathOrder::Flip => flip_paths(paths),
        PathOrder::Optimize | PathOrder::YAscending => sort_by_start(paths, y_then_x, false),
        PathOrder::YDescending => sort_by_start(paths, y_then_x, true),
        PathOrder::XAscending => sort_by_start(paths, x_then_y, false),
        PathOrder::XDescending => sort_by_start(paths, x_then_y, true),
    }
}

/// Keep the order but reverse any path whose end is closer than its start
/// to where the previous path finished. The first path is never reversed.
pub fn flip_paths<T: Traversable>(paths: Vec<T>) -> Vec<T> {
    let mut result: Vec<T> = Vec::with_capacity(paths.len());
    let mut flipped = 0usize;
    for path in paths {
        let previous_end = result.last().and_then(Traversable::end_point);
        let path = match (previous_end, path.start_point(), path.end_point()) {
            (Some(endp), Some(start), Some(end)) if endp.distance_to(&end) < endp.distance_to(&start) => {
                flipped += 1;
                path.reversed_path()
            }
            _ => path,
        };
        result.push(path);
    }
    debug!(flipped, "paths flipped");
    result
}

fn y_then_x(a: &Point, b: &Point) -> Ordering {
    a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x))
}

fn x_then_y(a: &Point, b: &Point) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

fn sort_by_start<T: Traversable>(
    mut paths: Vec<T>,
    compare: fn(&Point, &Point) -> Ordering,
    descending: bool,
) -> Vec<T> {
    // Paths without a start point sort last in either direction.
    paths.sort_by(|a, b| match (a.start_point(), b.start_point()) {
        (Some(pa), Some(pb)) if descending => compare(&pb, &pa),
        (Some(pa), Some(pb)) => compare(&pa, &pb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangentcam_core::Tolerance;

    fn line_path(x1: f64, y1: f64, x2: f64, y2: f64) -> Path {
        Path::from_points(&[Point::new(x1, y1), Point::new(x2, y2)], false, Tolerance::default()).unwrap()
    }

    fn starts(paths: &[Path]) -> Vec<(f64, f64)> {
        paths
            .iter()
            .filter_map(|p| p.start())
            .map(|p| (p.x, p.y))
            .collect()
    }

    #[test]
    fn test_none_keeps_order() {
        let paths = vec![line_path(5.0, 5.0, 6.0, 5.0), line_path(0.0, 0.0, 1.0, 0.0)];
        let ordered = order_paths(paths.clone(), PathOrder::None);
        assert_eq!(ordered, paths);
    }

    #[test]
    fn test_flip_reverses_far_paths() {
        let paths = vec![
            line_path(0.0, 0.0, 10.0, 0.0),
            line_path(0.0, 1.0, 10.0, 1.0),
            line_path(0.0, 2.0, 10.0, 2.0),
        ];
        let ordered = order_paths(paths, PathOrder::Flip);
        assert_eq!(starts(&ordered), vec![(0.0, 0.0), (10.0, 1.0), (0.0, 2.0)]);
    }

    #[test]
    fn test_sort_orders() {
        let paths = vec![
            line_path(5.0, 1.0, 6.0, 1.0),
            line_path(1.0, 1.0, 2.0, 1.0),
            line_path(3.0, 0.0, 4.0, 0.0),
        ];
        let y_up = order_paths(paths.clone(), PathOrder::YAscending);
        assert_eq!(starts(&y_up), vec![(3.0, 0.0), (1.0, 1.0), (5.0, 1.0)]);
        assert_eq!(order_paths(paths.clone(), PathOrder::Optimize), y_up);

        let y_down = order_paths(paths.clone(), PathOrder::YDescending);
        assert_eq!(starts(&y_down), vec![(5.0, 1.0), (1.0, 1.0), (3.0, 0.0)]);

        let x_up = order_paths(paths.clone(), PathOrder::XAscending);
        assert_eq!(starts(&x_up), vec![(1.0, 1.0), (3.0, 0.0), (5.0, 1.0)]);

        let x_down = order_paths(paths, PathOrder::XDescending);
        assert_eq!(starts(&x_down), vec![(5.0, 1.0), (3.0, 0.0), (1.0, 1.0)]);
    }
}
