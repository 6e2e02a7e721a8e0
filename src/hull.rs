use crate::config::ScenarioLayout;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::frame::{read_csv, require, INDEX_COLUMN};
use crate::models::{HullKey, HullMetric, Scenario, SurfaceKind};
use glob::glob;
use polars::lazy::frame::pivot::pivot_stable;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const ORIENTATION_COL: &str = "orientation";
const TYPE_COL: &str = "TYPE";
const AREA_COL: &str = "AREA_m2";
const KEY_COL: &str = "hull_key";

/// Per-building envelope areas, one column per (orientation, type) pair.
#[derive(Debug, Clone)]
pub struct OrientedHull {
    /// `Name`, then the pair columns sorted by name; zero where a building
    /// lacks the pair
    frame: DataFrame,
    kinds: BTreeMap<String, SurfaceKind>,
}

impl OrientedHull {
    /// Sums `AREA_m2` per (building, pair) of a long `Name`/key/area frame
    /// and pivots the pairs into columns.
    fn from_long(long: DataFrame, kinds: BTreeMap<String, SurfaceKind>) -> Result<Self> {
        let grouped = long
            .lazy()
            .group_by_stable([col(INDEX_COLUMN), col(KEY_COL)])
            .agg([col(AREA_COL).sum()])
            .collect()?;

        let wide = pivot_stable(
            &grouped,
            [KEY_COL],
            Some([INDEX_COLUMN]),
            Some([AREA_COL]),
            true,
            None,
            None,
        )?;
        let fill: Vec<Expr> = kinds
            .keys()
            .map(|pair| col(pair.as_str()).fill_null(lit(0.0)))
            .collect();
        let frame = wide.lazy().with_columns(fill).collect()?;

        Ok(Self { frame, kinds })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Collapse oriented columns into walls, windows, roofs and hull_ag.
    pub fn aggregate(&self) -> Result<AggregatedHull> {
        let total = |kind: SurfaceKind| {
            self.kinds
                .iter()
                .filter(|(_, k)| **k == kind)
                .fold(lit(0.0), |acc, (pair, _)| acc + col(pair.as_str()))
        };

        let frame = self
            .frame
            .clone()
            .lazy()
            .select([
                col(INDEX_COLUMN),
                total(SurfaceKind::Walls).alias(HullMetric::Walls.column_name()),
                total(SurfaceKind::Windows).alias(HullMetric::Windows.column_name()),
                total(SurfaceKind::Roofs).alias(HullMetric::Roofs.column_name()),
            ])
            .with_column(
                (col(HullMetric::Walls.column_name())
                    + col(HullMetric::Windows.column_name())
                    + col(HullMetric::Roofs.column_name()))
                .alias(HullMetric::HullAg.column_name()),
            )
            .collect()?;

        Ok(AggregatedHull { frame })
    }
}

/// `Name`, walls, windows, roofs and hull_ag (walls + windows + roofs).
#[derive(Debug, Clone)]
pub struct AggregatedHull {
    frame: DataFrame,
}

impl AggregatedHull {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Write the four totals into a frame of the same buildings, in the same
    /// order, replacing columns of the same name.
    pub fn write_into(&self, frame: &mut DataFrame) -> Result<()> {
        let index = require(frame, INDEX_COLUMN, "hull table")?;
        if !index.equals(self.frame.column(INDEX_COLUMN)?) {
            return Err(Error::IndexMismatch {
                left: frame.height(),
                right: self.len(),
            });
        }
        for metric in HullMetric::ALL {
            frame.with_column(self.frame.column(metric.column_name())?.clone())?;
        }
        Ok(())
    }
}

/// Reads the per-building geometry files of a scenario.
pub struct HullGeometryAggregator {
    layout: ScenarioLayout,
}

impl HullGeometryAggregator {
    pub fn new(layout: ScenarioLayout) -> Self {
        Self { layout }
    }

    pub fn geometry_dir(&self, scenario: &Scenario) -> PathBuf {
        scenario.path.join(&self.layout.geometry_dir)
    }

    /// All `*<suffix>` files of the scenario's geometry directory, sorted.
    pub fn geometry_files(&self, scenario: &Scenario) -> Result<Vec<PathBuf>> {
        let dir = self.geometry_dir(scenario);
        let dir_str = dir.to_str().ok_or_else(|| Error::NonUtf8Path(dir.clone()))?;
        let pattern = format!(
            "{}/*{}",
            glob::Pattern::escape(dir_str),
            glob::Pattern::escape(&self.layout.geometry_suffix)
        );

        let mut files = Vec::new();
        for entry in glob(&pattern)? {
            let path = entry?;
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Build the oriented hull table of one scenario.
    pub fn load(&self, scenario: &Scenario, diag: &dyn Diagnostics) -> Result<OrientedHull> {
        let files = self.geometry_files(scenario)?;
        if files.is_empty() {
            return Err(Error::NoGeometryFiles {
                dir: self.geometry_dir(scenario),
                suffix: self.layout.geometry_suffix.clone(),
            });
        }

        let mut kinds = BTreeMap::new();
        let mut surfaces = Vec::with_capacity(files.len());
        for file in &files {
            let building = building_id(file);
            let rows = read_geometry_file(file, &building, &mut kinds)?;
            diag.debug(&format!(
                "{}: {} surfaces for building {}",
                scenario.name,
                rows.height(),
                building
            ));
            surfaces.push(rows.lazy());
        }
        let long = concat(surfaces.as_slice(), UnionArgs::default())?.collect()?;

        diag.info(&format!(
            "Loaded geometry of {} buildings from {}",
            files.len(),
            scenario.name
        ));
        OrientedHull::from_long(long, kinds)
    }
}

/// Leading underscore-delimited token of the file name.
fn building_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .and_then(|n| n.split('_').next().map(str::to_string))
        .unwrap_or_default()
}

/// Long `Name`/key/area frame of one geometry file. Surface labels are
/// classified here, once, and recorded in `kinds` by pair column.
fn read_geometry_file(
    path: &Path,
    building: &str,
    kinds: &mut BTreeMap<String, SurfaceKind>,
) -> Result<DataFrame> {
    let df = read_csv(path)?;
    let table = path.display().to_string();
    let orientations = require(&df, ORIENTATION_COL, &table)?.cast(&DataType::String)?;
    let types = require(&df, TYPE_COL, &table)?.cast(&DataType::String)?;
    let areas = require(&df, AREA_COL, &table)?.cast(&DataType::Float64)?;

    let keys: Vec<String> = orientations
        .str()?
        .into_iter()
        .zip(types.str()?)
        .map(|(orientation, surface)| {
            let key = HullKey::new(orientation.unwrap_or_default(), surface.unwrap_or_default());
            let name = key.column_name();
            kinds.insert(name.clone(), key.kind);
            name
        })
        .collect();

    Ok(DataFrame::new(vec![
        Series::new(INDEX_COLUMN.into(), vec![building; df.height()]),
        Series::new(KEY_COL.into(), keys),
        areas.with_name(AREA_COL.into()),
    ])?)
}

#[cfg(test)]
impl OrientedHull {
    /// Hull built from in-memory (building, orientation, type, area) rows.
    pub(crate) fn from_rows(rows: &[(&str, &str, &str, f64)]) -> Self {
        let mut kinds = BTreeMap::new();
        let keys: Vec<String> = rows
            .iter()
            .map(|(_, orientation, surface, _)| {
                let key = HullKey::new(orientation, surface);
                kinds.insert(key.column_name(), key.kind);
                key.column_name()
            })
            .collect();
        let long = df!(
            INDEX_COLUMN => rows.iter().map(|r| r.0).collect::<Vec<_>>(),
            KEY_COL => keys,
            AREA_COL => rows.iter().map(|r| r.3).collect::<Vec<_>>(),
        )
        .unwrap();
        Self::from_long(long, kinds).unwrap()
    }
}
