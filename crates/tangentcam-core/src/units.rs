//! Unit handling
//!
//! Input geometry is expressed in document units. G-code is written in inches
//! or millimeters, either chosen explicitly or inferred from the document
//! unit family (imperial or metric).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Units a source document may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentUnit {
    /// Inch
    In,
    /// Foot
    Ft,
    /// Yard
    Yd,
    /// Pica (1/6 inch)
    Pc,
    /// Point (1/72 inch)
    Pt,
    /// CSS pixel (1/96 inch)
    Px,
    /// Millimeter
    Mm,
    /// Centimeter
    Cm,
    /// Meter
    M,
    /// Kilometer
    Km,
}

impl DocumentUnit {
    /// Length of one unit in millimeters.
    pub fn to_mm(self) -> f64 {
        match self {
            Self::In => 25.4,
            Self::Ft => 304.8,
            Self::Yd => 914.4,
            Self::Pc => 25.4 / 6.0,
            Self::Pt => 25.4 / 72.0,
            Self::Px => 25.4 / 96.0,
            Self::Mm => 1.0,
            Self::Cm => 10.0,
            Self::M => 1000.0,
            Self::Km => 1_000_000.0,
        }
    }

    /// Pica, point and pixel are treated as imperial.
    pub fn is_imperial(self) -> bool {
        matches!(
            self,
            Self::In | Self::Ft | Self::Yd | Self::Pc | Self::Pt | Self::Px
        )
    }
}

impl Default for DocumentUnit {
    fn default() -> Self {
        Self::Mm
    }
}

impl fmt::Display for DocumentUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::In => "in",
            Self::Ft => "ft",
            Self::Yd => "yd",
            Self::Pc => "pc",
            Self::Pt => "pt",
            Self::Px => "px",
            Self::Mm => "mm",
            Self::Cm => "cm",
            Self::M => "m",
            Self::Km => "km",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for DocumentUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in" | "inch" | "inches" => Ok(Self::In),
            "ft" => Ok(Self::Ft),
            "yd" => Ok(Self::Yd),
            "pc" => Ok(Self::Pc),
            "pt" => Ok(Self::Pt),
            "px" => Ok(Self::Px),
            "mm" => Ok(Self::Mm),
            "cm" => Ok(Self::Cm),
            "m" => Ok(Self::M),
            "km" => Ok(Self::Km),
            _ => Err(format!("Unknown document unit: {}", s)),
        }
    }
}

/// Units of the emitted G-code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GcodeUnits {
    /// G20
    Inch,
    /// G21
    Millimeter,
}

impl GcodeUnits {
    /// Length of one unit in millimeters.
    pub fn to_mm(self) -> f64 {
        match self {
            Self::Inch => 25.4,
            Self::Millimeter => 1.0,
        }
    }

    /// Short unit suffix used in comments.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Inch => "in",
            Self::Millimeter => "mm",
        }
    }
}

impl fmt::Display for GcodeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inch => write!(f, "inch"),
            Self::Millimeter => write!(f, "mm"),
        }
    }
}

/// Output unit selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputUnits {
    /// Follow the unit family of the document
    Inferred,
    /// Always inches
    Inch,
    /// Always millimeters
    Mm,
}

impl Default for OutputUnits {
    fn default() -> Self {
        Self::Inferred
    }
}

impl FromStr for OutputUnits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inferred" | "doc" | "auto" => Ok(Self::Inferred),
            "in" | "inch" => Ok(Self::Inch),
            "mm" | "metric" => Ok(Self::Mm),
            _ => Err(format!("Unknown output units: {}", s)),
        }
    }
}

impl fmt::Display for OutputUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inferred => write!(f, "inferred"),
            Self::Inch => write!(f, "in"),
            Self::Mm => write!(f, "mm"),
        }
    }
}

/// Output units plus the factor that scales document lengths into them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitResolution {
    pub units: GcodeUnits,
    pub scale: f64,
}

impl OutputUnits {
    /// Resolve against the document unit.
    pub fn resolve(self, document: DocumentUnit) -> UnitResolution {
        let units = match self {
            Self::Inch => GcodeUnits::Inch,
            Self::Mm => GcodeUnits::Millimeter,
            Self::Inferred if document.is_imperial() => GcodeUnits::Inch,
            Self::Inferred => GcodeUnits::Millimeter,
        };
        UnitResolution {
            units,
            scale: document.to_mm() / units.to_mm(),
        }
    }
}
