//! Input geometry files
//!
//! A geometry file lists the paths to cut, optionally in named groups, in
//! JSON or TOML:
//!
//! ```toml
//! units = "mm"
//!
//! [[groups]]
//! name = "letters"
//! transform = [1.0, 0.0, 0.0, 1.0, 10.0, 0.0]
//!
//! [[groups.paths]]
//! closed = true
//! segments = [
//!     { type = "polyline", points = [[0, 0], [20, 0], [20, 20]] },
//! ]
//! ```
//!
//! Supported segment types are `line`, `arc`, `bezier`, `ellipse` and
//! `polyline`. Angles are in degrees, counterclockwise from +X. Paths at the
//! top level form an unnamed group.

use anyhow::Context;
use serde::Deserialize;
use std::path::Path as FsPath;
use tangentcam_core::{DocumentUnit, Error, GeometryError, Result};
use tangentcam_geom::{Arc, CubicBezier, Curve, EllipticalArc, Line, Point, Tolerance, Transform2D};

type Xy = [f64; 2];

fn point(p: Xy) -> Point {
    Point::new(p[0], p[1])
}

fn full_turn() -> f64 {
    360.0
}

/// One segment as written in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SegmentSpec {
    Line {
        from: Xy,
        to: Xy,
    },
    /// Circular arc; negative sweep is clockwise.
    Arc {
        center: Xy,
        radius: f64,
        start: f64,
        sweep: f64,
    },
    /// Cubic Bézier: start, two control points, end.
    Bezier {
        points: [Xy; 4],
    },
    Ellipse {
        center: Xy,
        rx: f64,
        ry: f64,
        #[serde(default)]
        rotation: f64,
        #[serde(default)]
        start: f64,
        #[serde(default = "full_turn")]
        sweep: f64,
    },
    Polyline {
        points: Vec<Xy>,
    },
    #[serde(other)]
    Unsupported,
}

impl SegmentSpec {
    fn push_curves(&self, tol: Tolerance, out: &mut Vec<Curve>) -> Result<()> {
        match self {
            SegmentSpec::Line { from, to } => {
                out.push(Curve::Line(Line::try_new(point(*from), point(*to), tol)?));
            }
            SegmentSpec::Arc {
                center,
                radius,
                start,
                sweep,
            } => {
                let arc = Arc::from_center(point(*center), *radius, start.to_radians(), sweep.to_radians(), tol)?;
                out.push(Curve::Arc(arc));
            }
            SegmentSpec::Bezier { points } => {
                let [p1, c1, c2, p2] = points.map(point);
                out.push(Curve::Bezier(CubicBezier::new(p1, c1, c2, p2)));
            }
            SegmentSpec::Ellipse {
                center,
                rx,
                ry,
                rotation,
                start,
                sweep,
            } => {
                out.push(Curve::Ellipse(EllipticalArc::new(
                    point(*center),
                    *rx,
                    *ry,
                    rotation.to_radians(),
                    start.to_radians(),
                    sweep.to_radians(),
                )));
            }
            SegmentSpec::Polyline { points } => {
                if points.len() < 2 {
                    return Err(GeometryError::ZeroLength { what: "polyline" }.into());
                }
                let mut previous: Option<Point> = None;
                for p in points.iter().copied().map(point) {
                    p.finite("polyline vertex")?;
                    match previous {
                        Some(prev) if prev.almost_eq(&p, tol) => continue,
                        Some(prev) => out.push(Curve::Line(Line::new(prev, p))),
                        None => {}
                    }
                    previous = Some(p);
                }
            }
            SegmentSpec::Unsupported => {
                return Err(Error::UnsupportedInput(
                    "unknown segment type (expected line, arc, bezier, ellipse or polyline)".to_string(),
                ))
            }
        }
        Ok(())
    }
}

/// One path as written in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PathSpec {
    pub segments: Vec<SegmentSpec>,
    /// Close the path with a line if it does not end where it starts
    #[serde(default)]
    pub closed: bool,
}

impl PathSpec {
    /// Curves of this path with `matrix` applied.
    pub fn to_curves(&self, matrix: &Transform2D, tol: Tolerance) -> Result<Vec<Curve>> {
        let mut curves = Vec::with_capacity(self.segments.len() + 1);
        for segment in &self.segments {
            segment.push_curves(tol, &mut curves)?;
        }
        let (Some(first), Some(last)) = (curves.first(), curves.last()) else {
            return Err(GeometryError::ZeroLength { what: "path" }.into());
        };
        let (start, end) = (first.p1(), last.p2());
        if self.closed && !start.almost_eq(&end, tol) {
            curves.push(Curve::Line(Line::new(end, start)));
        }
        Ok(curves.iter().map(|c| c.transform(matrix, tol)).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct GroupSpec {
    #[serde(default)]
    name: Option<String>,
    /// `[a, b, c, d, e, f]` as in SVG
    #[serde(default)]
    transform: Option<[f64; 6]>,
    #[serde(default)]
    paths: Vec<PathSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct DocumentSpec {
    #[serde(default = "default_unit")]
    units: DocumentUnit,
    #[serde(default)]
    paths: Vec<PathSpec>,
    #[serde(default)]
    groups: Vec<GroupSpec>,
}

fn default_unit() -> DocumentUnit {
    DocumentUnit::Mm
}

/// A named set of paths sharing a transform.
#[derive(Debug, Clone, PartialEq)]
pub struct PathGroup {
    pub name: String,
    pub transform: Transform2D,
    pub paths: Vec<PathSpec>,
}

/// Parsed geometry file.
#[derive(Debug, Clone, PartialEq)]
pub struct InputDocument {
    pub units: DocumentUnit,
    pub groups: Vec<PathGroup>,
}

impl InputDocument {
    /// Parse JSON if the text starts with `{`, TOML otherwise.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let spec: DocumentSpec = if text.trim_start().starts_with('{') {
            serde_json::from_str(text).context("invalid JSON geometry")?
        } else {
            toml::from_str(text).context("invalid TOML geometry")?
        };
        Ok(Self::from_spec(spec))
    }

    pub fn from_file(path: &FsPath) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    fn from_spec(spec: DocumentSpec) -> Self {
        let mut groups = Vec::with_capacity(spec.groups.len() + 1);
        if !spec.paths.is_empty() {
            groups.push(PathGroup {
                name: String::new(),
                transform: Transform2D::identity(),
                paths: spec.paths,
            });
        }
        for (index, group) in spec.groups.into_iter().enumerate() {
            let transform = group
                .transform
                .map(|[a, b, c, d, e, f]| Transform2D::new(a, b, c, d, e, f))
                .unwrap_or_default();
            groups.push(PathGroup {
                name: group.name.unwrap_or_else(|| format!("group{}", index + 1)),
                transform,
                paths: group.paths,
            });
        }
        Self {
            units: spec.units,
            groups,
        }
    }

    pub fn path_count(&self) -> usize {
        self.groups.iter().map(|g| g.paths.len()).sum()
    }

    /// All groups merged into one, keeping each path's group transform.
    pub fn merged(&self) -> Vec<(Transform2D, &PathSpec)> {
        self.groups
            .iter()
            .flat_map(|g| g.paths.iter().map(move |p| (g.transform, p)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_DOC: &str = r#"
units = "in"

[[paths]]
closed = true
segments = [{ type = "polyline", points = [[0, 0], [1, 0], [1, 1]] }]

[[groups]]
name = "curves"
transform = [1.0, 0.0, 0.0, 1.0, 5.0, 0.0]

[[groups.paths]]
segments = [
    { type = "line", from = [0, 0], to = [1, 0] },
    { type = "arc", center = [1, 1], radius = 1.0, start = -90, sweep = 90 },
    { type = "bezier", points = [[2, 1], [2, 2], [3, 2], [3, 3]] },
]

[[groups]]
[[groups.paths]]
segments = [{ type = "ellipse", center = [0, 0], rx = 2.0, ry = 1.0 }]
"#;

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    #[test]
    fn test_parse_toml_document() {
        let doc = InputDocument::parse(TOML_DOC).unwrap();
        assert_eq!(doc.units, DocumentUnit::In);
        assert_eq!(doc.path_count(), 3);
        let names: Vec<&str> = doc.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["", "curves", "group3"]);
    }

    #[test]
    fn test_closed_polyline_gets_closing_line() {
        let doc = InputDocument::parse(TOML_DOC).unwrap();
        let curves = doc.groups[0].paths[0].to_curves(&Transform2D::identity(), tol()).unwrap();
        assert_eq!(curves.len(), 3);
        assert!(curves[2].p2().almost_eq(&Point::new(0.0, 0.0), tol()));
    }

    #[test]
    fn test_group_transform_is_applied() {
        let doc = InputDocument::parse(TOML_DOC).unwrap();
        let group = &doc.groups[1];
        let curves = group.paths[0].to_curves(&group.transform, tol()).unwrap();
        assert_eq!(curves.len(), 3);
        assert!(curves[0].p1().almost_eq(&Point::new(5.0, 0.0), tol()));
        assert!(matches!(curves[1], Curve::Arc(_)));
        assert!(curves[1].p2().almost_eq(&Point::new(7.0, 1.0), tol()));
        assert!(curves[2].p2().almost_eq(&Point::new(8.0, 3.0), tol()));
    }

    #[test]
    fn test_parse_json_document() {
        let doc = InputDocument::parse(
            r#"{ "paths": [ { "segments": [ { "type": "line", "from": [0, 0], "to": [3, 4] } ] } ] }"#,
        )
        .unwrap();
        assert_eq!(doc.units, DocumentUnit::Mm);
        assert_eq!(doc.merged().len(), 1);
    }

    #[test]
    fn test_unknown_segment_type_is_unsupported() {
        let doc = InputDocument::parse(
            r#"{ "paths": [ { "segments": [ { "type": "spiral", "turns": 3 } ] } ] }"#,
        )
        .unwrap();
        let err = doc.groups[0].paths[0]
            .to_curves(&Transform2D::identity(), tol())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedInput(_)));
    }

    #[test]
    fn test_degenerate_segments_are_rejected() {
        let line = PathSpec {
            segments: vec![SegmentSpec::Line { from: [1.0, 1.0], to: [1.0, 1.0] }],
            closed: false,
        };
        assert!(matches!(
            line.to_curves(&Transform2D::identity(), tol()),
            Err(Error::DegenerateGeometry(_))
        ));

        let empty = PathSpec {
            segments: Vec::new(),
            closed: false,
        };
        assert!(empty.to_curves(&Transform2D::identity(), tol()).is_err());
    }

    #[test]
    fn test_polyline_drops_repeated_points() {
        let path = PathSpec {
            segments: vec![SegmentSpec::Polyline {
                points: vec![[0.0, 0.0], [0.0, 0.0], [2.0, 0.0], [2.0, 2.0]],
            }],
            closed: false,
        };
        let curves = path.to_curves(&Transform2D::identity(), tol()).unwrap();
        assert_eq!(curves.len(), 2);
    }
}
