//! G-code generation from toolpaths.
//!
//! The writer keeps the last value written for every modal word and only
//! writes words whose value changed, so the output stays compact. Motions
//! are written strictly in toolpath order.

use tangentcam_core::{GcodeUnits, Tolerance};
use tangentcam_geom::Point;

use crate::error::{ToolpathError, ToolpathResult};
use crate::machine::BlendMode;
use crate::toolpath::{Axes, Motion, Toolpath};

/// Controller dialect the output is written for.
pub const TARGET_MACHINE: &str = "LinuxCNC";

/// Output formatting options.
#[derive(Debug, Clone, PartialEq)]
pub struct GcodeOptions {
    pub units: GcodeUnits,
    /// Multiplier applied to X, Y, Z, I and J
    pub unit_scale: f64,
    /// Comparison epsilons. The linear one also fixes the number of digits.
    pub tolerance: Tolerance,
    pub line_numbers: bool,
    pub comments: bool,
    /// Degrees added to every A value
    pub angular_offset: f64,
    pub blend: BlendMode,
    /// Feed rate set in the header
    pub default_feed: f64,
    /// First line of the header comment block
    pub program_name: String,
    pub creation_date: Option<String>,
    pub header_comments: Vec<String>,
}

impl Default for GcodeOptions {
    fn default() -> Self {
        Self {
            units: GcodeUnits::Millimeter,
            unit_scale: 1.0,
            tolerance: Tolerance::default(),
            line_numbers: false,
            comments: true,
            angular_offset: 0.0,
            blend: BlendMode::Default,
            default_feed: 400.0,
            program_name: format!("tangentcam {}", env!("CARGO_PKG_VERSION")),
            creation_date: None,
            header_comments: Vec::new(),
        }
    }
}

/// Last written value of each modal word.
#[derive(Debug, Default)]
struct Modal {
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    a: Option<f64>,
    f: Option<f64>,
}

impl Modal {
    fn slot(&mut self, axis: char) -> Option<&mut Option<f64>> {
        match axis {
            'X' => Some(&mut self.x),
            'Y' => Some(&mut self.y),
            'Z' => Some(&mut self.z),
            'A' => Some(&mut self.a),
            'F' => Some(&mut self.f),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Word {
    axis: char,
    value: f64,
    force: bool,
}

impl Word {
    fn new(axis: char, value: f64) -> Self {
        Self {
            axis,
            value,
            force: false,
        }
    }

    fn forced(axis: char, value: f64) -> Self {
        Self {
            axis,
            value,
            force: true,
        }
    }
}

/// Stateful text writer for one program.
struct GcodeWriter<'a> {
    options: &'a GcodeOptions,
    precision: usize,
    out: String,
    line_number: u32,
    last: Modal,
    /// Actual tool position, for arc center offsets
    position: Option<Point>,
    axis_reset: bool,
}

impl<'a> GcodeWriter<'a> {
    fn new(options: &'a GcodeOptions) -> Self {
        Self {
            options,
            precision: options.tolerance.precision(),
            out: String::new(),
            line_number: 10,
            last: Modal::default(),
            position: None,
            axis_reset: false,
        }
    }

    fn fmt(&self, value: f64) -> String {
        format_value(value, self.precision)
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn comment(&mut self, text: &str) {
        if self.options.comments {
            self.out.push_str("; ");
            self.out.push_str(text);
            self.out.push('\n');
        }
    }

    /// Write a command line. Comment-only and empty lines are not numbered.
    fn line(&mut self, code: &str, comment: Option<&str>) {
        if self.options.line_numbers {
            self.out.push_str(&format!("N{} ", self.line_number));
            self.line_number += 10;
        }
        self.out.push_str(code);
        if let Some(comment) = comment.filter(|_| self.options.comments) {
            self.out.push_str(" ; ");
            self.out.push_str(comment);
        }
        self.out.push('\n');
    }

    /// Write a motion command with the words whose values changed.
    ///
    /// A line that would only change the feed rate is dropped, and the feed
    /// is not recorded, so it is written with the next real move instead.
    fn command(&mut self, command: &str, words: &[Word], comment: Option<&str>) -> ToolpathResult<()> {
        let tol = self.options.tolerance;
        let mut changed: Vec<Word> = Vec::with_capacity(words.len());
        for word in words {
            if !word.value.is_finite() {
                return Err(ToolpathError::NonFiniteValue { axis: word.axis });
            }
            let epsilon = if word.axis == 'A' { tol.angular } else { tol.linear };
            let last = self.last.slot(word.axis).and_then(|slot| *slot);
            let differs = last.is_none_or(|last| (word.value - last).abs() > epsilon);
            if word.force || differs {
                changed.push(*word);
            }
        }
        if changed.is_empty() || changed.iter().all(|w| w.axis == 'F') {
            return Ok(());
        }

        let mut code = String::from(command);
        for word in &changed {
            if let Some(slot) = self.last.slot(word.axis) {
                *slot = Some(word.value);
            }
            let value = match word.axis {
                'A' => word.value.to_degrees() + self.options.angular_offset,
                'F' => word.value,
                _ => word.value * self.options.unit_scale,
            };
            code.push(' ');
            code.push(word.axis);
            code.push_str(&self.fmt(value));
        }
        self.line(&code, comment);
        Ok(())
    }

    fn axis_words(axes: &Axes) -> Vec<Word> {
        [('X', axes.x), ('Y', axes.y), ('Z', axes.z), ('A', axes.a)]
            .into_iter()
            .filter_map(|(axis, value)| value.map(|v| Word::new(axis, v)))
            .collect()
    }

    fn motion(&mut self, motion: &Motion) -> ToolpathResult<()> {
        match motion {
            Motion::Comment(text) if text.is_empty() => self.blank(),
            Motion::Comment(text) => self.comment(text),
            Motion::Retract { z } => self.command("G00", &[Word::forced('Z', *z)], None)?,
            Motion::Plunge { z, feed } => {
                self.command("G01", &[Word::new('Z', *z), Word::new('F', *feed)], None)?
            }
            Motion::Rapid(axes) => self.command("G00", &Self::axis_words(axes), None)?,
            Motion::Feed { axes, feed } => {
                let mut words = Self::axis_words(axes);
                words.push(Word::new('F', *feed));
                self.command("G01", &words, None)?;
            }
            Motion::Arc {
                end,
                center,
                direction,
                z,
                a,
                feed,
            } => {
                let start = self.position.ok_or(ToolpathError::UnknownPosition("arc feed"))?;
                let start_radius = center.distance_to(&start);
                let end_radius = center.distance_to(end);
                if !self.options.tolerance.eq(start_radius, end_radius) {
                    return Err(ToolpathError::ArcRadiusMismatch {
                        start: start_radius,
                        end: end_radius,
                    });
                }
                let offset = *center - start;
                let mut words = vec![Word::new('X', end.x), Word::new('Y', end.y)];
                if let Some(z) = z {
                    words.push(Word::new('Z', *z));
                }
                words.push(Word::forced('I', offset.x));
                words.push(Word::forced('J', offset.y));
                if let Some(a) = a {
                    words.push(Word::new('A', *a));
                }
                words.push(Word::new('F', *feed));
                self.command(direction.gcode_command(), &words, None)?;
            }
            Motion::Dwell { seconds } => {
                if !seconds.is_finite() {
                    return Err(ToolpathError::NonFiniteValue { axis: 'P' });
                }
                self.line(&format!("G04 P{:.4}", seconds), Some("Dwell"));
            }
            Motion::Pause => self.line("M0", Some("Pause")),
            Motion::SpindleOn { rpm, clockwise } => {
                if !rpm.is_finite() {
                    return Err(ToolpathError::NonFiniteValue { axis: 'S' });
                }
                let code = if *clockwise { "M3" } else { "M4" };
                self.line(&format!("{} S{:.0}", code, rpm), Some("Spindle on"));
            }
            Motion::SpindleOff => self.line("M5", Some("Spindle off")),
            Motion::ResetAxis { a } => {
                if !a.is_finite() {
                    return Err(ToolpathError::NonFiniteValue { axis: 'A' });
                }
                let degrees = a.to_degrees() + self.options.angular_offset;
                let code = format!("G92 A{}", self.fmt(degrees));
                self.line(&code, Some("Normalize axis angle"));
                self.last.a = Some(*a);
                self.axis_reset = true;
            }
        }
        Ok(())
    }
}

/// Formats `value` with a fixed number of digits, without a negative zero.
fn format_value(value: f64, precision: usize) -> String {
    let text = format!("{:.*}", precision, value);
    match text.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => text,
    }
}

/// G-code generator for converting toolpaths to G-code commands.
#[derive(Debug, Clone, Default)]
pub struct ToolpathToGcode {
    options: GcodeOptions,
}

impl ToolpathToGcode {
    /// Creates a new G-code generator.
    pub fn new(options: GcodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GcodeOptions {
        &self.options
    }

    /// Generates a complete program from a toolpath.
    pub fn generate(&self, toolpath: &Toolpath) -> ToolpathResult<String> {
        let mut writer = GcodeWriter::new(&self.options);
        self.generate_header(&mut writer, toolpath)?;
        self.generate_body(&mut writer, toolpath)?;
        self.generate_footer(&mut writer);
        Ok(writer.out)
    }

    fn generate_header(&self, w: &mut GcodeWriter<'_>, toolpath: &Toolpath) -> ToolpathResult<()> {
        let options = &self.options;
        w.out.push_str("%\n");
        let rule = "-".repeat(56);
        w.comment(&rule);
        w.comment(&options.program_name);
        if let Some(date) = &options.creation_date {
            w.comment(&format!("Creation date: {}", date));
        }
        w.comment(&format!("Target machine: {}", TARGET_MACHINE));
        w.comment(&format!("Path count: {}", toolpath.path_count));
        if toolpath.pass_count > 1 {
            w.comment(&format!("Depth passes: {}", toolpath.pass_count));
        }
        for comment in &options.header_comments {
            w.comment(comment);
        }
        w.comment(&rule);
        w.blank();

        w.line("G17", Some("XY plane"));
        match options.units {
            GcodeUnits::Millimeter => w.line("G21", Some("Units are in millimeters")),
            GcodeUnits::Inch => w.line("G20", Some("Units are in inches")),
        }
        w.line("G90", Some("Use absolute positioning"));
        w.line("G40", Some("Cancel tool diameter compensation"));
        w.line("G49", Some("Cancel tool length compensation"));
        match options.blend {
            BlendMode::Default => {}
            BlendMode::Blend {
                tolerance: None, ..
            } => w.line("G64", Some("Blend with highest speed")),
            BlendMode::Blend {
                tolerance: Some(p),
                q_tolerance: None,
            } => {
                let code = format!("G64 P{}", w.fmt(p));
                w.line(&code, Some("Blend with tolerance"));
            }
            BlendMode::Blend {
                tolerance: Some(p),
                q_tolerance: Some(q),
            } => {
                let code = format!("G64 P{} Q{}", w.fmt(p), w.fmt(q));
                w.line(&code, Some("Blend with tolerances"));
            }
            BlendMode::Exact => w.line("G61", Some("Exact path mode")),
        }
        w.blank();

        if !options.default_feed.is_finite() {
            return Err(ToolpathError::NonFiniteValue { axis: 'F' });
        }
        w.comment("Default feed rate");
        let code = format!("F{}", w.fmt(options.default_feed));
        w.line(&code, None);
        w.last.f = Some(options.default_feed);
        w.blank();
        Ok(())
    }

    fn generate_body(&self, w: &mut GcodeWriter<'_>, toolpath: &Toolpath) -> ToolpathResult<()> {
        for segment in toolpath {
            w.motion(&segment.motion)?;
            w.position = segment.state.position;
        }
        Ok(())
    }

    fn generate_footer(&self, w: &mut GcodeWriter<'_>) {
        w.blank();
        if w.axis_reset {
            w.line("G92.1", Some("Reset axis offsets to zero"));
        }
        w.line("M2", Some("End program"));
        w.out.push_str("%\n");
    }
}
