//! Toolpath assembly.
//!
//! Turns compensated paths into a single ordered [`Toolpath`]. Every path is
//! cut once per depth pass: passes form the outer loop, paths the inner one.
//! The A axis angle is tracked as an unbounded accumulated value so the tool
//! always turns the short way and never snaps back across the +/-180 degree
//! seam.

use std::f64::consts::{PI, TAU};
use tangentcam_camtools::{CutPath, CutSegment};
use tangentcam_core::Tolerance;
use tangentcam_geom::{calc_rotation, normalize_angle, Point, Segment};
use tracing::{debug, info};

use crate::brush::{prepare_stroke, ReloadCounter, ZTarget};
use crate::error::{ToolpathError, ToolpathResult};
use crate::machine::{MachineOptions, PauseMode, ReloadPolicy, SpindleMode};
use crate::multipass::MultiPassConfig;
use crate::toolpath::{Axes, Motion, Toolpath};

/// Builds toolpaths from compensated paths.
#[derive(Debug, Clone)]
pub struct ToolpathAssembler {
    options: MachineOptions,
    tol: Tolerance,
}

impl ToolpathAssembler {
    pub fn new(options: MachineOptions, tol: Tolerance) -> Self {
        Self { options, tol }
    }

    pub fn options(&self) -> &MachineOptions {
        &self.options
    }

    /// Depth of every pass, shallowest first.
    pub fn pass_depths(&self) -> Vec<f64> {
        let mut passes = MultiPassConfig::new(self.options.depth, self.options.depth_per_pass);
        passes.set_strategy(self.options.depth_strategy);
        passes.get_all_pass_depths()
    }

    /// Assemble `paths`, already in cutting order, into one toolpath.
    pub fn assemble(&self, paths: &[CutPath]) -> ToolpathResult<Toolpath> {
        self.options.validate()?;
        if let Some(index) = paths.iter().position(CutPath::is_empty) {
            return Err(ToolpathError::EmptyPath { index });
        }

        let depths = self.pass_depths();
        let active: Vec<(usize, &CutPath)> = paths
            .iter()
            .enumerate()
            .skip(self.options.skip_paths)
            .collect();
        if self.options.skip_paths > 0 {
            info!(
                skipped = paths.len().min(self.options.skip_paths),
                "Skipping paths already cut"
            );
        }

        let mut run = Run::new(&self.options, self.tol);
        run.toolpath.path_count = active.len();
        run.toolpath.pass_count = depths.len();
        run.begin();

        let total = depths.len() * active.len();
        let mut done = 0usize;
        for (pass, depth) in depths.iter().enumerate() {
            for (index, path) in &active {
                done += 1;
                run.cut_path(*index, pass, *depth, path, done < total)?;
            }
        }
        run.end();

        info!(
            paths = active.len(),
            passes = depths.len(),
            segments = run.toolpath.len(),
            "Toolpath assembled"
        );
        Ok(run.toolpath)
    }
}

/// Mutable state of one assembly run.
struct Run<'a> {
    options: &'a MachineOptions,
    tol: Tolerance,
    toolpath: Toolpath,
    /// Accumulated A axis angle in radians
    angle: f64,
    reload: ReloadCounter,
    reload_due: bool,
}

impl<'a> Run<'a> {
    fn new(options: &'a MachineOptions, tol: Tolerance) -> Self {
        Self {
            options,
            tol,
            toolpath: Toolpath::new(),
            angle: 0.0,
            reload: ReloadCounter::new(&options.reload),
            reload_due: false,
        }
    }

    fn push(&mut self, motion: Motion) {
        self.toolpath.add_segment(motion);
    }

    fn begin(&mut self) {
        self.tool_up();
        if self.options.spindle.mode == SpindleMode::Once {
            self.spindle_on();
        }
    }

    fn end(&mut self) {
        if self.toolpath.state().z != Some(self.options.z_safe) {
            self.tool_up();
        }
        if self.options.home_when_done {
            let a = self.options.rotation_enabled().then_some(0.0);
            self.push(Motion::Rapid(Axes::xy(Point::ORIGIN).with_a(a)));
            self.angle = 0.0;
        }
        if self.options.spindle.mode == SpindleMode::Once {
            self.push(Motion::SpindleOff);
        }
    }

    fn cut_path(
        &mut self,
        index: usize,
        pass: usize,
        depth: f64,
        path: &CutPath,
        has_next: bool,
    ) -> ToolpathResult<()> {
        let stroke =
            prepare_stroke(path, self.options, self.tol).ok_or(ToolpathError::EmptyPath { index })?;
        let (Some(start), Some(start_angle)) = (stroke.start(), stroke.start_angle()) else {
            return Err(ToolpathError::EmptyPath { index });
        };

        if self.reload_due {
            self.reload_at(start);
            self.reload_due = false;
        }

        self.push(Motion::comment(""));
        self.push(Motion::comment(format!(
            "Path: {}, pass: {}, depth: {}",
            index + 1,
            pass + 1,
            depth
        )));

        let a = self.rotate_to(start_angle);
        self.push(Motion::Rapid(Axes::xy(start).with_a(a)));
        if self.options.spindle.mode == SpindleMode::PerPath {
            self.spindle_on();
        }

        let z_pass = -depth;
        let plunge = if stroke.soft_landing { 0.0 } else { z_pass };
        self.push(Motion::Plunge {
            z: plunge,
            feed: self.options.feeds.z,
        });
        self.wait(self.options.tool_wait_down);

        for seg in &stroke.segments {
            let z = match seg.z {
                ZTarget::Pass => z_pass,
                ZTarget::Surface => 0.0,
            };
            self.cut_segment(&seg.cut, z);
        }

        self.tool_up();
        if self.options.spindle.mode == SpindleMode::PerPath {
            self.push(Motion::SpindleOff);
        }
        if self.options.unwrap_a {
            self.unwrap_axis();
        }
        self.reload_due = self.reload.path_done() && has_next;
        Ok(())
    }

    /// Feed along one segment, turning the A axis from the segment's start
    /// angle to its end angle.
    fn cut_segment(&mut self, seg: &CutSegment, z: f64) {
        let end_a = if self.options.rotation_enabled() {
            let rotation = calc_rotation(self.angle, seg.start_angle(), self.tol);
            if !self.tol.angle_is_zero(rotation) {
                self.angle += rotation;
                self.push(Motion::Feed {
                    axes: Axes::a(self.angle),
                    feed: self.options.feeds.a_feed(self.options.tool.width),
                });
            }
            self.angle += segment_turn(seg, self.tol);
            Some(self.angle)
        } else {
            None
        };

        let feed = self.options.feeds.xy;
        let line = |end: Point| Motion::Feed {
            axes: Axes::xy(end).with_z(z).with_a(end_a),
            feed,
        };
        let motion = match seg.geometry {
            Segment::Line(l) => line(l.p2),
            Segment::Arc(arc) => {
                let start_radius = self
                    .toolpath
                    .state()
                    .position
                    .map(|p| arc.center.distance_to(&p));
                match start_radius {
                    Some(r) if self.tol.eq(r, arc.radius) => Motion::Arc {
                        end: arc.p2,
                        center: arc.center,
                        direction: arc.direction(),
                        z: Some(z),
                        a: end_a,
                        feed,
                    },
                    _ => {
                        debug!(
                            start_radius = ?start_radius,
                            radius = arc.radius,
                            "Arc does not start at the current position, cutting it as a line"
                        );
                        line(arc.p2)
                    }
                }
            }
        };
        self.push(motion);
    }

    /// Turn the A axis the short way to face `angle`.
    fn rotate_to(&mut self, angle: f64) -> Option<f64> {
        if !self.options.rotation_enabled() {
            return None;
        }
        self.angle += calc_rotation(self.angle, angle, self.tol);
        Some(self.angle)
    }

    fn reload_at(&mut self, start: Point) {
        let ReloadPolicy::Every { angle, pause, .. } = self.options.reload else {
            return;
        };
        self.push(Motion::comment("Reload"));
        let a = angle.and_then(|angle| self.rotate_to(angle));
        self.push(Motion::Rapid(Axes::xy(start).with_a(a)));
        match pause {
            Some(PauseMode::Timed { seconds }) => self.wait(seconds),
            Some(PauseMode::Indefinite) => self.push(Motion::Pause),
            None => {}
        }
    }

    fn tool_up(&mut self) {
        self.push(Motion::Retract {
            z: self.options.z_safe,
        });
        self.wait(self.options.tool_wait_up);
    }

    fn spindle_on(&mut self) {
        self.push(Motion::SpindleOn {
            rpm: self.options.spindle.rpm,
            clockwise: self.options.spindle.clockwise,
        });
        self.wait(self.options.spindle.warmup);
    }

    fn wait(&mut self, seconds: f64) {
        if seconds > 0.0 {
            self.push(Motion::Dwell { seconds });
        }
    }

    /// Bring the A axis origin back within one turn once it has wound up.
    fn unwrap_axis(&mut self) {
        if self.angle.abs() > TAU {
            let unwound = normalize_angle(self.angle, PI);
            debug!(from = self.angle, to = unwound, "Unwrapping A axis");
            self.angle = unwound;
            self.push(Motion::ResetAxis { a: unwound });
        }
    }
}

/// Rotation from a segment's start angle to its end angle.
///
/// The shortest turn is right for lines and short arcs. Arcs may turn more
/// than half a revolution, so the turn is taken in the arc's own direction
/// by adding whole turns towards its sweep.
fn segment_turn(seg: &CutSegment, tol: Tolerance) -> f64 {
    let turn = calc_rotation(seg.start_angle(), seg.end_angle(), tol);
    match seg.geometry {
        Segment::Arc(arc) => turn + TAU * ((arc.sweep - turn) / TAU).round(),
        Segment::Line(_) => turn,
    }
}
