use crate::demand::{ColumnKind, DemandTable, SCENARIO_COLUMN};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::frame::INDEX_COLUMN;
use polars::prelude::*;
use std::collections::HashSet;

/// Rewrites absolute demand values into area-specific intensities.
#[derive(Debug, Clone)]
pub struct AreaNormalizer {
    area_col: String,
    value_cols: Option<Vec<String>>,
}

impl AreaNormalizer {
    pub fn new(area_col: impl Into<String>) -> Self {
        Self {
            area_col: area_col.into(),
            value_cols: None,
        }
    }

    /// Restrict normalization to these columns; non-numeric ones are skipped.
    pub fn with_value_cols(mut self, value_cols: Option<Vec<String>>) -> Self {
        self.value_cols = value_cols;
        self
    }

    /// `Name`, the normalized metrics (`<measure>_<newunit>_<area_col>`),
    /// `scenario`, then every other column under its original name. Area
    /// columns are never scaled.
    ///
    /// Two metrics that map to the same normalized name keep the position of
    /// the first and the values of the last; a pass-through column sharing a
    /// normalized name is dropped. Both cases are warned about.
    pub fn normalize(&self, demand: &DemandTable, diag: &dyn Diagnostics) -> Result<DataFrame> {
        demand.numeric(&self.area_col)?;
        let selected = self.selected_columns(demand)?;

        let mut outputs: Vec<(String, Expr)> = Vec::new();
        let mut normalized: HashSet<&str> = HashSet::new();
        for (name, kind) in demand.kinds() {
            let metric = match kind {
                ColumnKind::Metric(metric) if selected.contains(name.as_str()) => metric,
                _ => continue,
            };
            let (target, factor) = metric.area_specific(&self.area_col);
            let expr = (col(name.as_str()) * lit(factor) / col(self.area_col.as_str()))
                .alias(target.as_str());
            match outputs.iter_mut().find(|(existing, _)| *existing == target) {
                Some(slot) => {
                    diag.warn(&format!(
                        "{} normalizes to {} like an earlier column; keeping the values of {}",
                        name, target, name
                    ));
                    slot.1 = expr;
                }
                None => outputs.push((target, expr)),
            }
            normalized.insert(name.as_str());
        }

        let mut exprs = vec![col(INDEX_COLUMN)];
        exprs.extend(outputs.iter().map(|(_, expr)| expr.clone()));
        exprs.push(col(SCENARIO_COLUMN));
        for (name, _) in demand.kinds() {
            if normalized.contains(name.as_str()) {
                continue;
            }
            if outputs.iter().any(|(target, _)| target == name) {
                diag.warn(&format!(
                    "Column {} is replaced by the normalized column of the same name",
                    name
                ));
                continue;
            }
            exprs.push(col(name.as_str()));
        }

        Ok(demand.frame().clone().lazy().select(exprs).collect()?)
    }

    fn selected_columns<'a>(&'a self, demand: &'a DemandTable) -> Result<HashSet<&'a str>> {
        match &self.value_cols {
            None => Ok(demand
                .kinds()
                .iter()
                .filter(|(_, kind)| kind.is_numeric())
                .map(|(name, _)| name.as_str())
                .collect()),
            Some(names) => {
                let mut selected = HashSet::new();
                for name in names {
                    let kind = demand
                        .kind(name)
                        .ok_or_else(|| Error::missing_column(name.as_str(), "demand table"))?;
                    if kind.is_numeric() {
                        selected.insert(name.as_str());
                    }
                }
                Ok(selected)
            }
        }
    }
}

impl Default for AreaNormalizer {
    fn default() -> Self {
        Self::new("Af_m2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScenarioLayout;
    use crate::demand::DemandLoader;
    use crate::diagnostics::CollectedDiagnostics;
    use crate::frame::value;
    use crate::models::Scenario;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn demand_from(root: &Path, body: &str) -> DemandTable {
        let scenario = Scenario::new("baseline", root.join("baseline"));
        let dir = scenario.path.join("outputs/data/demand");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Total_demand.csv"), body).unwrap();
        DemandLoader::new(ScenarioLayout::default())
            .load_scenario(&scenario, &CollectedDiagnostics::default())
            .unwrap()
    }

    #[test]
    fn megawatt_hours_become_kilowatt_hours_per_area() {
        let root = TempDir::new().unwrap();
        let demand = demand_from(
            root.path(),
            "Name,Af_m2,GFA_m2,Qhs_MWh,E_sys0_kW,Qww_GJ\nB1,100,120,5,2,3\n",
        );

        let diag = CollectedDiagnostics::default();
        let frame = AreaNormalizer::default().normalize(&demand, &diag).unwrap();

        assert_eq!(value(&frame, "B1", "Qhs_kWh_Af_m2"), Some(50.0));
        assert_eq!(value(&frame, "B1", "E_sys0_W_Af_m2"), Some(20.0));
        assert_eq!(value(&frame, "B1", "Qww_GJ_Af_m2"), Some(0.03));
        assert_eq!(value(&frame, "B1", "Af_m2"), Some(100.0));
        assert_eq!(value(&frame, "B1", "GFA_m2"), Some(120.0));
        assert_eq!(
            frame.get_column_names_str(),
            vec![
                "Name",
                "Qhs_kWh_Af_m2",
                "E_sys0_W_Af_m2",
                "Qww_GJ_Af_m2",
                "scenario",
                "Af_m2",
                "GFA_m2"
            ]
        );
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn explicit_selection_passes_other_columns_through() {
        let root = TempDir::new().unwrap();
        let demand = demand_from(
            root.path(),
            "Name,type,Af_m2,Qhs_MWh,QC_MWh\nB1,OFFICE,50,10,4\nB2,SCHOOL,,1,1\n",
        );

        let frame = AreaNormalizer::new("Af_m2")
            .with_value_cols(Some(vec!["Qhs_MWh".to_string(), "type".to_string()]))
            .normalize(&demand, &CollectedDiagnostics::default())
            .unwrap();

        assert_eq!(frame.height(), 2);
        assert_eq!(value(&frame, "B1", "Qhs_kWh_Af_m2"), Some(200.0));
        assert_eq!(value(&frame, "B2", "Qhs_kWh_Af_m2"), None);
        assert_eq!(value(&frame, "B1", "QC_MWh"), Some(4.0));
        assert!(frame.column("type").is_ok());
        assert!(frame.column("QC_kWh_Af_m2").is_err());
    }

    #[test]
    fn clashing_normalized_names_keep_the_later_column() {
        let root = TempDir::new().unwrap();
        let demand = demand_from(
            root.path(),
            "Name,Af_m2,Aroof_m2,GFA_m2,Aocc_m2,Qhs_kW,Qhs_W\nB1,100,50,100,90,2,300\n",
        );

        let diag = CollectedDiagnostics::default();
        let frame = AreaNormalizer::default().normalize(&demand, &diag).unwrap();

        let clashing = frame
            .get_column_names_str()
            .into_iter()
            .filter(|c| *c == "Qhs_W_Af_m2")
            .count();
        assert_eq!(clashing, 1);
        assert_eq!(value(&frame, "B1", "Qhs_W_Af_m2"), Some(3.0));
        assert!(diag.has_warning_containing("Qhs_W_Af_m2"));
    }

    #[test]
    fn unknown_reference_area_is_rejected() {
        let root = TempDir::new().unwrap();
        let demand = demand_from(root.path(), "Name,GFA_m2,Qhs_MWh\nB1,100,5\n");

        let err = AreaNormalizer::new("Af_m2")
            .normalize(&demand, &CollectedDiagnostics::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == "Af_m2"));
    }

    #[test]
    fn unknown_selected_column_is_rejected() {
        let root = TempDir::new().unwrap();
        let demand = demand_from(root.path(), "Name,Af_m2,Qhs_MWh\nB1,100,5\n");

        let err = AreaNormalizer::default()
            .with_value_cols(Some(vec!["Qcs_MWh".to_string()]))
            .normalize(&demand, &CollectedDiagnostics::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingColumn { .. }));
    }
}
