use crate::error::{Error, Result};
use crate::models::HullMetric;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Where a scenario keeps its outputs, relative to the scenario directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScenarioLayout {
    pub geometry_dir: PathBuf,
    pub geometry_suffix: String,
    pub demand_file: PathBuf,
    /// Building ID column of the demand table
    pub building_col: String,
}

impl Default for ScenarioLayout {
    fn default() -> Self {
        Self {
            geometry_dir: ["outputs", "data", "solar-radiation"].iter().collect(),
            geometry_suffix: "_geometry.csv".to_string(),
            demand_file: ["outputs", "data", "demand", "Total_demand.csv"]
                .iter()
                .collect(),
            building_col: "Name".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CategoryConfig {
    pub bins: Vec<f64>,
    pub labels: Vec<String>,
    pub source_col: String,
    pub dest_col: String,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            bins: Vec::new(),
            labels: Vec::new(),
            source_col: "hull_ag_to_GFA_m2".to_string(),
            dest_col: "compact_category".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub layout: ScenarioLayout,
    /// Reference area for area-specific demand values
    pub area_col: String,
    /// Demand columns to normalize; all numeric columns when `None`
    pub value_cols: Option<Vec<String>>,
    /// Reference area for compactness ratios
    pub compactness_ref: String,
    pub hull_metrics: Vec<HullMetric>,
    pub raw_area_cols: Vec<String>,
    pub category: Option<CategoryConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            layout: ScenarioLayout::default(),
            area_col: "Af_m2".to_string(),
            value_cols: None,
            compactness_ref: "GFA_m2".to_string(),
            hull_metrics: vec![HullMetric::Walls, HullMetric::Windows, HullMetric::HullAg],
            raw_area_cols: ["Af_m2", "Aroof_m2", "GFA_m2", "Aocc_m2"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            category: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::MissingFile(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        let config: PipelineConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.area_col.is_empty() {
            return Err(Error::config("area_col must not be empty"));
        }
        if self.compactness_ref.is_empty() {
            return Err(Error::config("compactness_ref must not be empty"));
        }
        if self.layout.geometry_suffix.is_empty() {
            return Err(Error::config("layout.geometry_suffix must not be empty"));
        }
        if let Some(category) = &self.category {
            if category.bins.len() != category.labels.len() + 1 {
                return Err(Error::BinLabelMismatch {
                    bins: category.bins.len(),
                    labels: category.labels.len(),
                });
            }
        }
        Ok(())
    }
}
