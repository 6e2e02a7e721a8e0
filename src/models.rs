use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One simulation variant inside a run directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub path: PathBuf,
}

impl Scenario {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Envelope surface class used by the orientation aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurfaceKind {
    Walls,
    Windows,
    Roofs,
    Other,
}

impl SurfaceKind {
    pub fn classify(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "walls" | "wall" => SurfaceKind::Walls,
            "windows" | "window" => SurfaceKind::Windows,
            "roofs" | "roof" => SurfaceKind::Roofs,
            _ => SurfaceKind::Other,
        }
    }
}

/// (orientation, surface type) pair of the oriented hull table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HullKey {
    pub orientation: String,
    pub surface: String,
    pub kind: SurfaceKind,
}

impl HullKey {
    pub fn new(orientation: &str, surface: &str) -> Self {
        Self {
            orientation: orientation.trim().to_lowercase(),
            surface: surface.trim().to_lowercase(),
            kind: SurfaceKind::classify(surface),
        }
    }

    /// `<orientation>_<type>`, both lower case
    pub fn column_name(&self) -> String {
        format!("{}_{}", self.orientation, self.surface)
    }
}

/// Aggregated hull quantity that can be related to a reference area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HullMetric {
    Walls,
    Windows,
    Roofs,
    HullAg,
}

impl HullMetric {
    pub const ALL: [HullMetric; 4] = [
        HullMetric::Walls,
        HullMetric::Windows,
        HullMetric::Roofs,
        HullMetric::HullAg,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            HullMetric::Walls => "walls",
            HullMetric::Windows => "windows",
            HullMetric::Roofs => "roofs",
            HullMetric::HullAg => "hull_ag",
        }
    }

}

/// Unit token of a demand column, parsed once at ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// `kW`, `kWh`, `kWhyr`, ...; the text after `kW` is kept
    Kilowatt { suffix: String },
    /// `MWh`, `MWhyr`, ...
    MegawattHour { suffix: String },
    Other(String),
}

impl Unit {
    pub fn parse(token: &str) -> Self {
        if let Some(rest) = token.strip_prefix("kW") {
            Unit::Kilowatt {
                suffix: rest.to_string(),
            }
        } else if let Some(rest) = token.strip_prefix("MWh") {
            Unit::MegawattHour {
                suffix: rest.to_string(),
            }
        } else {
            Unit::Other(token.to_string())
        }
    }

    /// Finer-grained unit for area-specific values, with the scale factor
    /// from this unit to it.
    pub fn area_specific(&self) -> (String, f64) {
        match self {
            Unit::Kilowatt { suffix } => (format!("W{}", suffix), 1000.0),
            Unit::MegawattHour { suffix } => (format!("kWh{}", suffix), 1000.0),
            Unit::Other(token) => (token.clone(), 1.0),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Kilowatt { suffix } => write!(f, "kW{}", suffix),
            Unit::MegawattHour { suffix } => write!(f, "MWh{}", suffix),
            Unit::Other(token) => f.write_str(token),
        }
    }
}

/// `<measure>_<unit>` demand column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricName {
    pub measure: String,
    pub unit: Unit,
}

impl MetricName {
    /// Splits on the last underscore. A name without one is all unit and an
    /// empty measure.
    pub fn parse(column: &str) -> Self {
        let (measure, unit) = match column.rsplit_once('_') {
            Some((measure, unit)) => (measure, unit),
            None => ("", column),
        };
        Self {
            measure: measure.to_string(),
            unit: Unit::parse(unit),
        }
    }

    /// `<measure>_<newunit>_<area_col>` and the factor applied before dividing
    /// by the area.
    pub fn area_specific(&self, area_col: &str) -> (String, f64) {
        let (unit, factor) = self.unit.area_specific();
        (format!("{}_{}_{}", self.measure, unit, area_col), factor)
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.measure, self.unit)
    }
}
