use crate::demand::DemandTable;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::frame::INDEX_COLUMN;
use crate::hull::AggregatedHull;
use crate::models::HullMetric;
use polars::prelude::*;

fn is_consistent(first: Option<f64>, mean: Option<f64>) -> bool {
    match (first, mean) {
        (Some(first), Some(mean)) => (first - mean).abs() <= 1e-9 * mean.abs().max(1.0),
        (None, None) => true,
        _ => false,
    }
}

/// Hull-to-floor-area ratios per building.
#[derive(Debug, Clone)]
pub struct CompactnessCalculator {
    hull_metrics: Vec<HullMetric>,
    ref_col: String,
}

impl CompactnessCalculator {
    pub fn new(hull_metrics: Vec<HullMetric>, ref_col: impl Into<String>) -> Self {
        Self {
            hull_metrics,
            ref_col: ref_col.into(),
        }
    }

    pub fn column_name(&self, metric: HullMetric) -> String {
        format!("{}_to_{}", metric.column_name(), self.ref_col)
    }

    /// One row per hull building: `Name` and one `<hull>_to_<ref>` column
    /// per metric.
    ///
    /// Buildings listed more than once in `demand` (several scenarios or
    /// zones) are divided by their mean reference area. A mean that differs
    /// from the first listed area, or a building count that differs from the
    /// hull table, is warned about but not fatal.
    pub fn compute(
        &self,
        hull: &AggregatedHull,
        demand: &DemandTable,
        diag: &dyn Diagnostics,
    ) -> Result<DataFrame> {
        demand.numeric(&self.ref_col)?;
        let ref_col = self.ref_col.as_str();
        let first_col = format!("{}_first", ref_col);

        let reference = demand
            .frame()
            .clone()
            .lazy()
            .group_by_stable([col(INDEX_COLUMN)])
            .agg([
                col(ref_col).mean(),
                col(ref_col).first().alias(first_col.as_str()),
            ])
            .collect()?;

        let buildings = reference.column(INDEX_COLUMN)?.str()?;
        let means = reference.column(ref_col)?.f64()?;
        let firsts = reference.column(&first_col)?.f64()?;
        let inconsistent: Vec<&str> = buildings
            .into_iter()
            .zip(means)
            .zip(firsts)
            .filter(|((_, mean), first)| !is_consistent(*first, *mean))
            .filter_map(|((building, _), _)| building)
            .collect();
        if !inconsistent.is_empty() {
            diag.warn(&format!(
                "First {} of {} building(s) does not match the building mean: {}",
                ref_col,
                inconsistent.len(),
                inconsistent.join(", ")
            ));
        }
        if reference.height() != hull.len() {
            diag.warn(&format!(
                "The number of rows in the hull table ({}) and {} values ({}) don't match",
                hull.len(),
                ref_col,
                reference.height()
            ));
        }

        let mut ratios = vec![col(INDEX_COLUMN)];
        for &metric in &self.hull_metrics {
            ratios.push(
                (col(metric.column_name()) / col(ref_col)).alias(self.column_name(metric).as_str()),
            );
        }
        let means = reference.lazy().select([col(INDEX_COLUMN), col(ref_col)]);
        Ok(hull
            .frame()
            .clone()
            .lazy()
            .left_join(means, col(INDEX_COLUMN), col(INDEX_COLUMN))
            .select(ratios)
            .collect()?)
    }
}

impl Default for CompactnessCalculator {
    fn default() -> Self {
        Self::new(
            vec![HullMetric::Walls, HullMetric::Windows, HullMetric::HullAg],
            "GFA_m2",
        )
    }
}
