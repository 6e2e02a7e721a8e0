use crate::config::ScenarioLayout;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::frame::{float_column, read_csv, require, INDEX_COLUMN};
use crate::models::{MetricName, Scenario};
use crate::scenario::discover_scenarios;
use polars::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Column holding the scenario directory name.
pub const SCENARIO_COLUMN: &str = "scenario";

/// How a demand column is treated downstream, decided once from its header
/// and type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    /// Numeric `<measure>_<unit>` quantity
    Metric(MetricName),
    /// Numeric reference area; name contains `m2`
    Area,
    /// Anything non-numeric, passed through as text
    Attribute,
}

impl ColumnKind {
    fn classify(name: &str, dtype: &DataType) -> Self {
        if !dtype.is_numeric() {
            ColumnKind::Attribute
        } else if name.contains("m2") {
            ColumnKind::Area
        } else {
            ColumnKind::Metric(MetricName::parse(name))
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnKind::Attribute)
    }
}

/// Annual demand rows of one or more scenarios, one row per
/// (scenario, building).
#[derive(Debug, Clone, Default)]
pub struct DemandTable {
    /// `Name`, `scenario`, then the source columns; numeric ones as `f64`
    frame: DataFrame,
    kinds: Vec<(String, ColumnKind)>,
}

impl DemandTable {
    fn from_frame(frame: DataFrame) -> Self {
        let kinds = frame
            .get_columns()
            .iter()
            .filter(|s| {
                let name = s.name().as_str();
                name != INDEX_COLUMN && name != SCENARIO_COLUMN
            })
            .map(|s| {
                let name = s.name().as_str();
                (name.to_string(), ColumnKind::classify(name, s.dtype()))
            })
            .collect();
        Self { frame, kinds }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Source columns in file order with their kinds.
    pub fn kinds(&self) -> &[(String, ColumnKind)] {
        &self.kinds
    }

    pub fn kind(&self, name: &str) -> Option<&ColumnKind> {
        self.kinds.iter().find(|(n, _)| n == name).map(|(_, k)| k)
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Numeric column by name; absent or textual columns are errors.
    pub fn numeric(&self, name: &str) -> Result<Float64Chunked> {
        float_column(&self.frame, name, "demand table")
    }

    /// Row-wise concatenation with the union of all columns; rows of a
    /// table lacking a column get missing values there. A column that is
    /// numeric in one table and textual in another becomes textual.
    pub fn concat(tables: Vec<DemandTable>) -> Result<DemandTable> {
        if tables.is_empty() {
            return Ok(DemandTable::default());
        }
        let textual: HashSet<String> = tables
            .iter()
            .flat_map(|t| t.kinds.iter())
            .filter(|(_, kind)| !kind.is_numeric())
            .map(|(name, _)| name.clone())
            .collect();

        let mut frames = Vec::with_capacity(tables.len());
        for DemandTable { mut frame, kinds } in tables {
            for (name, kind) in &kinds {
                if kind.is_numeric() && textual.contains(name) {
                    let text = frame.column(name)?.cast(&DataType::String)?;
                    frame.with_column(text)?;
                }
            }
            frames.push(frame.lazy());
        }

        let frame = concat_lf_diagonal(frames, UnionArgs::default())?.collect()?;
        Ok(Self::from_frame(frame))
    }
}

/// Numeric columns widened to `f64`; an all-empty column counts as numeric.
fn widen(series: &Series) -> Result<Series> {
    if series.dtype().is_numeric() || series.null_count() == series.len() {
        Ok(series.cast(&DataType::Float64)?)
    } else {
        Ok(series.clone())
    }
}

/// Reads the total-demand table of each scenario.
pub struct DemandLoader {
    layout: ScenarioLayout,
}

impl DemandLoader {
    pub fn new(layout: ScenarioLayout) -> Self {
        Self { layout }
    }

    pub fn demand_path(&self, scenario: &Scenario) -> PathBuf {
        scenario.path.join(&self.layout.demand_file)
    }

    /// Demand table of one scenario, tagged with the scenario name.
    pub fn load_scenario(&self, scenario: &Scenario, diag: &dyn Diagnostics) -> Result<DemandTable> {
        let path = self.demand_path(scenario);
        if !path.is_file() {
            return Err(Error::MissingFile(path));
        }
        diag.info(&format!(
            "{} found in {}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            scenario.name
        ));

        let raw = read_csv(&path)?;
        let building_col = self.layout.building_col.as_str();
        let buildings = require(&raw, building_col, &path.display().to_string())?
            .cast(&DataType::String)?
            .with_name(INDEX_COLUMN.into());

        let mut columns = vec![
            buildings,
            Series::new(SCENARIO_COLUMN.into(), vec![scenario.name.as_str(); raw.height()]),
        ];
        for series in raw.get_columns() {
            if series.name().as_str() != building_col {
                columns.push(widen(series)?);
            }
        }
        Ok(DemandTable::from_frame(DataFrame::new(columns)?))
    }

    /// Demand of every scenario of a simulation run, concatenated row-wise.
    pub fn load_simulation(&self, simulation_dir: &Path, diag: &dyn Diagnostics) -> Result<DemandTable> {
        let scenarios = discover_scenarios(simulation_dir, diag)?;
        self.load_scenarios(&scenarios, diag)
    }

    pub fn load_scenarios(&self, scenarios: &[Scenario], diag: &dyn Diagnostics) -> Result<DemandTable> {
        let mut tables = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            tables.push(self.load_scenario(scenario, diag)?);
        }
        DemandTable::concat(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectedDiagnostics;
    use crate::models::Unit;
    use std::fs;
    use tempfile::TempDir;

    fn write_demand(root: &Path, scenario: &str, body: &str) -> Scenario {
        let scenario = Scenario::new(scenario, root.join(scenario));
        let dir = scenario.path.join("outputs/data/demand");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Total_demand.csv"), body).unwrap();
        scenario
    }

    fn text(table: &DemandTable, column: &str) -> Vec<Option<String>> {
        table
            .frame()
            .column(column)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    fn numbers(table: &DemandTable, column: &str) -> Vec<Option<f64>> {
        table.numeric(column).unwrap().into_iter().collect()
    }

    #[test]
    fn scenario_rows_are_tagged_and_typed() {
        let root = TempDir::new().unwrap();
        let scenario = write_demand(
            root.path(),
            "baseline",
            "Name,type,Af_m2,GFA_m2,Qhs_MWhyr,E_sys0_kW\n\
             B1,MULTI_RES,100,120,5.0,2.5\n\
             B2,OFFICE,200,240,,4\n",
        );

        let loader = DemandLoader::new(ScenarioLayout::default());
        let diag = CollectedDiagnostics::default();
        let demand = loader.load_scenario(&scenario, &diag).unwrap();

        assert_eq!(text(&demand, INDEX_COLUMN), vec![Some("B1".into()), Some("B2".into())]);
        assert_eq!(
            text(&demand, SCENARIO_COLUMN),
            vec![Some("baseline".into()), Some("baseline".into())]
        );
        assert_eq!(demand.kind("type"), Some(&ColumnKind::Attribute));
        assert_eq!(demand.kind("GFA_m2"), Some(&ColumnKind::Area));
        assert_eq!(
            demand.kind("E_sys0_kW"),
            Some(&ColumnKind::Metric(MetricName {
                measure: "E_sys0".to_string(),
                unit: Unit::Kilowatt {
                    suffix: String::new()
                },
            }))
        );
        assert_eq!(numbers(&demand, "Qhs_MWhyr"), vec![Some(5.0), None]);
        assert_eq!(numbers(&demand, "Af_m2"), vec![Some(100.0), Some(200.0)]);
        assert_eq!(
            &demand.frame().get_column_names_str()[..2],
            &[INDEX_COLUMN, SCENARIO_COLUMN]
        );
        assert!(diag.entries().iter().any(|(_, m)| m.contains("Total_demand.csv found in baseline")));
    }

    #[test]
    fn missing_demand_file_is_hard_failure() {
        let root = TempDir::new().unwrap();
        let scenario = Scenario::new("empty", root.path().join("empty"));
        fs::create_dir_all(&scenario.path).unwrap();

        let loader = DemandLoader::new(ScenarioLayout::default());
        let err = loader
            .load_scenario(&scenario, &CollectedDiagnostics::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingFile(_)));
    }

    #[test]
    fn missing_name_column_is_reported() {
        let root = TempDir::new().unwrap();
        let scenario = write_demand(root.path(), "baseline", "ID,Af_m2\nB1,100\n");
        let loader = DemandLoader::new(ScenarioLayout::default());
        let err = loader
            .load_scenario(&scenario, &CollectedDiagnostics::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingColumn { .. }));
    }

    #[test]
    fn custom_building_column_becomes_the_index() {
        let root = TempDir::new().unwrap();
        let scenario = write_demand(root.path(), "baseline", "ID,Af_m2\n1001,100\n");
        let layout = ScenarioLayout {
            building_col: "ID".to_string(),
            ..Default::default()
        };

        let demand = DemandLoader::new(layout)
            .load_scenario(&scenario, &CollectedDiagnostics::default())
            .unwrap();
        assert_eq!(text(&demand, INDEX_COLUMN), vec![Some("1001".into())]);
        assert_eq!(demand.kind("ID"), None);
    }

    #[test]
    fn simulation_concatenates_scenarios_with_column_union() {
        let root = TempDir::new().unwrap();
        write_demand(root.path(), "a_base", "Name,Af_m2,Qhs_MWhyr\nB1,100,5\nB2,50,1\n");
        write_demand(root.path(), "b_retrofit", "Name,Af_m2,QC_sys_MWhyr\nB1,100,2\n");

        let loader = DemandLoader::new(ScenarioLayout::default());
        let diag = CollectedDiagnostics::default();
        let demand = loader.load_simulation(root.path(), &diag).unwrap();

        assert_eq!(demand.len(), 3);
        assert_eq!(
            text(&demand, SCENARIO_COLUMN),
            vec![Some("a_base".into()), Some("a_base".into()), Some("b_retrofit".into())]
        );
        assert_eq!(numbers(&demand, "Qhs_MWhyr"), vec![Some(5.0), Some(1.0), None]);
        assert_eq!(numbers(&demand, "QC_sys_MWhyr"), vec![None, None, Some(2.0)]);
        assert_eq!(numbers(&demand, "Af_m2"), vec![Some(100.0), Some(50.0), Some(100.0)]);
    }

    #[test]
    fn conflicting_column_types_fall_back_to_text() {
        let root = TempDir::new().unwrap();
        write_demand(root.path(), "a", "Name,code\nB1,7\n");
        write_demand(root.path(), "b", "Name,code\nB1,X1\n");

        let loader = DemandLoader::new(ScenarioLayout::default());
        let demand = loader
            .load_simulation(root.path(), &CollectedDiagnostics::default())
            .unwrap();

        assert_eq!(demand.kind("code"), Some(&ColumnKind::Attribute));
        let codes = text(&demand, "code");
        assert_eq!(codes.len(), 2);
        assert!(codes[0].as_deref().is_some_and(|c| c.starts_with('7')));
        assert_eq!(codes[1].as_deref(), Some("X1"));
    }
}
