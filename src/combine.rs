use crate::category::CategoryClassifier;
use crate::compactness::CompactnessCalculator;
use crate::config::PipelineConfig;
use crate::demand::DemandLoader;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::frame::INDEX_COLUMN;
use crate::hull::HullGeometryAggregator;
use crate::models::HullMetric;
use crate::normalize::AreaNormalizer;
use crate::scenario::discover_scenarios;
use polars::prelude::*;
use std::path::Path;

/// Runs the whole aggregation for one simulation run directory.
pub struct CombineResults<'d> {
    config: PipelineConfig,
    diag: &'d dyn Diagnostics,
}

impl<'d> CombineResults<'d> {
    pub fn new(config: PipelineConfig, diag: &'d dyn Diagnostics) -> Self {
        Self { config, diag }
    }

    /// One row per demand row (scenario, building), keyed by `Name`.
    ///
    /// Geometry comes from the first scenario and is broadcast onto every
    /// demand row of the same building. Partial tables are left-joined onto
    /// the demand rows, so buildings missing from geometry get empty hull
    /// and compactness columns instead of an error, and geometry-only
    /// buildings are left out.
    pub fn run(&self, simulation_dir: &Path) -> Result<DataFrame> {
        self.config.validate()?;
        let diag = self.diag;
        let layout = &self.config.layout;

        let scenarios = discover_scenarios(simulation_dir, diag)?;
        let geometry_scenario = scenarios
            .first()
            .ok_or_else(|| Error::NoScenarios(simulation_dir.to_path_buf()))?;

        // Hull geometry
        let oriented = HullGeometryAggregator::new(layout.clone()).load(geometry_scenario, diag)?;
        let aggregated = oriented.aggregate()?;

        // Demand
        let demand = DemandLoader::new(layout.clone()).load_scenarios(&scenarios, diag)?;
        let normalized = AreaNormalizer::new(&self.config.area_col)
            .with_value_cols(self.config.value_cols.clone())
            .normalize(&demand, diag)?;

        let compactness = CompactnessCalculator::new(
            self.config.hull_metrics.clone(),
            &self.config.compactness_ref,
        )
        .compute(&aggregated, &demand, diag)?;

        let raw_area_cols = &self.config.raw_area_cols;
        for column in raw_area_cols {
            demand.numeric(column)?;
        }
        let raw_areas = demand.frame().select(raw_area_cols.iter().map(String::as_str))?;

        let keys = normalized.select([INDEX_COLUMN])?;
        let mut columns: Vec<Series> = Vec::new();
        for part in [oriented.frame(), aggregated.frame(), &compactness] {
            let joined = keys
                .clone()
                .lazy()
                .left_join(part.clone().lazy(), col(INDEX_COLUMN), col(INDEX_COLUMN))
                .collect()?;
            columns.extend(joined.drop(INDEX_COLUMN)?.take_columns());
        }
        columns.extend(raw_areas.take_columns());
        columns.extend(
            normalized
                .get_columns()
                .iter()
                .filter(|s| {
                    let name = s.name().as_str();
                    name != INDEX_COLUMN && !raw_area_cols.iter().any(|c| c == name)
                })
                .cloned(),
        );
        let mut combined = keys.hstack(&columns)?;

        let unmatched = combined
            .column(HullMetric::HullAg.column_name())?
            .null_count();
        if unmatched > 0 {
            diag.warn(&format!(
                "{} demand row(s) have no geometry in scenario {}",
                unmatched, geometry_scenario.name
            ));
        }

        if let Some(category) = &self.config.category {
            CategoryClassifier::from_config(category)?.apply(&mut combined)?;
        }

        diag.info(&format!(
            "Combined {} scenario(s): {} rows, {} columns",
            scenarios.len(),
            combined.height(),
            combined.width()
        ));
        Ok(combined)
    }
}

/// Convenience wrapper around [`CombineResults`].
pub fn combine_results(
    simulation_dir: &Path,
    config: &PipelineConfig,
    diag: &dyn Diagnostics,
) -> Result<DataFrame> {
    CombineResults::new(config.clone(), diag).run(simulation_dir)
}
