use proptest::prelude::*;
use std::f64::consts::{FRAC_PI_2, TAU};
use tangentcam_camtools::{
    compensate, fillet_path, CompensationOptions, CornerPolicy, CutPath, FilletOptions,
};
use tangentcam_geom::{Arc, Line, Path, Point, Segment, Tolerance};

fn tol() -> Tolerance {
    Tolerance::default()
}

/// Star-shaped polygon: one vertex per angular sector, so it never
/// self-intersects.
fn star_polygon() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec(5.0f64..50.0, 3..9).prop_map(|radii| {
        let n = radii.len() as f64;
        radii
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let a = TAU * i as f64 / n;
                Point::new(r * a.cos(), r * a.sin())
            })
            .collect()
    })
}

fn samples(seg: &Segment) -> impl Iterator<Item = Point> + '_ {
    (0..=16).map(move |i| seg.point_at(f64::from(i) / 16.0))
}

#[test]
fn test_polygon_without_options_passes_through() {
    let pts = [
        Point::new(0.0, 0.0),
        Point::new(30.0, 0.0),
        Point::new(30.0, 20.0),
        Point::new(10.0, 25.0),
        Point::new(0.0, 20.0),
    ];
    let path = Path::from_points(&pts, true, tol()).unwrap();
    let options = CompensationOptions::default();
    assert!(options.is_passthrough(tol()));
    let out = compensate(&path, &options, tol()).unwrap();
    assert_eq!(out.len(), 1);
    let segments: Vec<Segment> = out[0].geometry().copied().collect();
    assert_eq!(segments, path.segments());
}

#[test]
fn test_trail_offset_on_semicircle() {
    let arc = Arc::from_center(Point::ORIGIN, 10.0, -FRAC_PI_2, std::f64::consts::PI, tol()).unwrap();
    let lead_in = Line::new(Point::new(-20.0, -10.0), arc.p1);
    let path = Path::new(vec![lead_in.into(), arc.into()], tol()).unwrap();
    let options = CompensationOptions {
        trail_offset: 2.0,
        preserve_g1: false,
        ..CompensationOptions::default()
    };
    let out = compensate(&path, &options, tol()).unwrap();
    assert_eq!(out.len(), 1);
    let cut = &out[0];
    assert_eq!(cut.len(), 2);
    // Rotation center runs on the larger concentric circle.
    let offset_arc = cut.segments[1].geometry.as_arc().unwrap();
    assert!((offset_arc.radius - 104.0f64.sqrt()).abs() < 1e-9);
    // The contact point, two units behind the center along the hinted
    // direction, ends on the original arc end.
    let end_hint = cut.segments[1].end_angle();
    let contact = offset_arc.p2 - tangentcam_geom::Vector::from_polar(2.0, end_hint);
    assert!(contact.almost_eq(&arc.p2, Tolerance::uniform(1e-9)));
}

#[test]
fn test_smoothing_fillets_spread_rotation() {
    let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
    let path = Path::from_points(&pts, false, tol()).unwrap();
    let options = CompensationOptions {
        smoothing_radius: Some(1.0),
        ..CompensationOptions::default()
    };
    let out = compensate(&path, &options, tol()).unwrap();
    let cut = &out[0];
    assert_eq!(cut.len(), 3);
    let fillet = &cut.segments[1];
    assert!((fillet.start_angle() - 0.0).abs() < 1e-12);
    assert!((fillet.end_angle() - FRAC_PI_2).abs() < 1e-12);
}

proptest! {
    #[test]
    fn zero_trail_offset_is_identity(points in star_polygon()) {
        let path = Path::from_points(&points, true, tol()).unwrap();
        let out = compensate(&path, &CompensationOptions::default(), tol()).unwrap();
        prop_assert_eq!(out.len(), 1);
        prop_assert_eq!(out[0].clone(), CutPath::from(&path));
    }

    #[test]
    fn fillets_stay_within_radius_of_original(points in star_polygon(), radius in 0.1f64..8.0) {
        let path = Path::from_points(&points, true, tol()).unwrap();
        let filleted = fillet_path(&CutPath::from(&path), &FilletOptions::new(radius), tol());
        prop_assert!(filleted.is_closed(tol()));
        for seg in filleted.geometry() {
            if let Segment::Arc(arc) = seg {
                prop_assert!(arc.radius <= radius + 1e-9);
            }
            for p in samples(seg) {
                let deviation = path
                    .iter()
                    .map(|orig| orig.distance_to_point(&p, tol()))
                    .fold(f64::INFINITY, f64::min);
                prop_assert!(deviation <= radius + 1e-6, "deviation {} > {}", deviation, radius);
            }
        }
    }

    #[test]
    fn split_paths_cover_every_segment(points in star_polygon()) {
        let path = Path::from_points(&points, true, tol()).unwrap();
        let options = CompensationOptions {
            corners: CornerPolicy::Split,
            ..CompensationOptions::default()
        };
        let out = compensate(&path, &options, tol()).unwrap();
        let total: usize = out.iter().map(CutPath::len).sum();
        prop_assert_eq!(total, path.len());
    }
}
