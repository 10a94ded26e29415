//! The conversion pipeline
//!
//! Geometry file paths go through curve approximation, ordering, tool
//! compensation, assembly and emission. Approximation and compensation work
//! on one path at a time and run in parallel; their results are collected in
//! document order before the assembler sees them.
//!
//! A path that fails is skipped with a warning unless strict mode is on.
//! Configuration errors always abort the run.

use anyhow::Context;
use rayon::prelude::*;
use tangentcam_camtools::{compensate, CutPath};
use tangentcam_core::{Result, UnitResolution};
use tangentcam_geom::{approximate_curve, Path, Transform2D};
use tangentcam_settings::JobSettings;
use tangentcam_toolpath::{order_paths, ToolpathAssembler, ToolpathToGcode};
use tracing::{debug, info, warn};

use crate::input::{InputDocument, PathSpec};

/// Counters for one generated program.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    pub input_paths: usize,
    pub skipped_paths: usize,
    /// Curves whose approximation stopped short of the tolerance
    pub best_effort_curves: usize,
    pub cut_paths: usize,
    pub passes: usize,
    pub cut_length: f64,
    pub rapid_length: f64,
}

/// One generated G-code program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Path group the program was generated from, when split by group
    pub group: Option<String>,
    pub gcode: String,
    pub stats: RunStats,
}

pub struct Pipeline {
    job: JobSettings,
    creation_date: Option<String>,
}

impl Pipeline {
    pub fn new(job: JobSettings) -> Self {
        Self {
            job,
            creation_date: None,
        }
    }

    /// Date written into the program header.
    pub fn with_creation_date(mut self, date: Option<String>) -> Self {
        self.creation_date = date;
        self
    }

    pub fn job(&self) -> &JobSettings {
        &self.job
    }

    /// Generate one program per group, or a single program for all paths.
    pub fn run(&self, document: &InputDocument, split_groups: bool) -> anyhow::Result<Vec<Program>> {
        let units = self.job.units.resolve(document.units);
        debug!(
            document = ?document.units,
            output = ?units.units,
            scale = units.scale,
            "Resolved units"
        );
        if split_groups {
            document
                .groups
                .iter()
                .map(|group| {
                    let paths: Vec<(Transform2D, &PathSpec)> =
                        group.paths.iter().map(|p| (group.transform, p)).collect();
                    self.generate(Some(&group.name), &paths, units)
                        .with_context(|| format!("group '{}'", group.name))
                })
                .collect()
        } else {
            Ok(vec![self.generate(None, &document.merged(), units)?])
        }
    }

    /// Generate a program from `paths`, each with the transform of its group.
    pub fn generate(
        &self,
        group: Option<&str>,
        paths: &[(Transform2D, &PathSpec)],
        units: UnitResolution,
    ) -> anyhow::Result<Program> {
        let tol = self.job.tolerance;
        let scale = Transform2D::scale(units.scale, units.scale);
        let mut stats = RunStats {
            input_paths: paths.len(),
            ..RunStats::default()
        };

        let approximated: Vec<Result<(Path, usize)>> = paths
            .par_iter()
            .map(|(matrix, spec)| self.approximate(&scale.after(matrix), spec))
            .collect();
        let mut geometry = Vec::with_capacity(approximated.len());
        for (index, result) in approximated.into_iter().enumerate() {
            if let Some((path, best_effort)) = self.keep(index, result, &mut stats)? {
                stats.best_effort_curves += best_effort;
                geometry.push(path);
            }
        }

        let ordered = order_paths(geometry, self.job.order);
        let compensated: Vec<Result<Vec<CutPath>>> = ordered
            .par_iter()
            .map(|path| compensate(path, &self.job.compensation, tol))
            .collect();
        let mut cut_paths = Vec::with_capacity(compensated.len());
        for (index, result) in compensated.into_iter().enumerate() {
            if let Some(pieces) = self.keep(index, result, &mut stats)? {
                cut_paths.extend(pieces.into_iter().filter(|p| !p.is_empty()));
            }
        }
        if cut_paths.is_empty() {
            warn!("No paths left to cut");
        }

        let toolpath = ToolpathAssembler::new(self.job.machine.clone(), tol).assemble(&cut_paths)?;

        let mut options = self.job.gcode.clone();
        options.units = units.units;
        options.creation_date = self.creation_date.clone();
        if let Some(name) = group.filter(|name| !name.is_empty()) {
            options.header_comments.insert(0, format!("Group: {name}"));
        }
        let gcode = ToolpathToGcode::new(options).generate(&toolpath)?;

        stats.cut_paths = toolpath.path_count;
        stats.passes = toolpath.pass_count;
        stats.cut_length = toolpath.total_length();
        stats.rapid_length = toolpath.rapid_length();
        info!(
            group = group.unwrap_or(""),
            paths = stats.cut_paths,
            skipped = stats.skipped_paths,
            passes = stats.passes,
            cut_length = stats.cut_length,
            rapid_length = stats.rapid_length,
            "Program generated"
        );

        Ok(Program {
            group: group.map(str::to_string),
            gcode,
            stats,
        })
    }

    /// Approximate every curve of a path with lines and arcs. Also returns
    /// the number of curves that did not reach the tolerance.
    fn approximate(&self, matrix: &Transform2D, spec: &PathSpec) -> Result<(Path, usize)> {
        let tol = self.job.tolerance;
        let curves = spec.to_curves(matrix, tol)?;
        let mut segments = Vec::with_capacity(curves.len());
        let mut best_effort = 0;
        for curve in &curves {
            let approx = approximate_curve(curve, &self.job.biarc, tol)?;
            if let Some(err) = approx.tolerance_error(&self.job.biarc) {
                warn!(%err, "Using best effort approximation");
                best_effort += 1;
            }
            segments.extend(approx.segments);
        }
        Ok((Path::new(segments, tol)?, best_effort))
    }

    /// Skip a failed path, or fail the run in strict mode.
    fn keep<T>(&self, index: usize, result: Result<T>, stats: &mut RunStats) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if self.job.strict || err.is_configuration_error() => Err(err),
            Err(err) => {
                warn!(path = index + 1, error = %err, "Skipping path");
                stats.skipped_paths += 1;
                Ok(None)
            }
        }
    }
}
