pub mod category;
pub mod combine;
pub mod compactness;
pub mod config;
pub mod demand;
pub mod diagnostics;
pub mod error;
pub mod frame;
pub mod hull;
pub mod models;
pub mod normalize;
pub mod scenario;

pub use category::{CategoryBins, CategoryClassifier};
pub use combine::{combine_results, CombineResults};
pub use compactness::CompactnessCalculator;
pub use config::{CategoryConfig, PipelineConfig, ScenarioLayout};
pub use demand::{DemandLoader, DemandTable, SCENARIO_COLUMN};
pub use diagnostics::{CollectedDiagnostics, Diagnostics, LogDiagnostics};
pub use error::{Error, Result};
pub use frame::INDEX_COLUMN;
pub use hull::{AggregatedHull, HullGeometryAggregator, OrientedHull};
pub use models::{HullMetric, MetricName, Scenario, Unit};
pub use normalize::AreaNormalizer;
pub use scenario::discover_scenarios;
