//! Error types for the results pipeline
//!
//! Configuration errors fail fast, data-availability errors propagate to the
//! caller, and consistency problems are reported through
//! [`crate::diagnostics::Diagnostics`] instead of this enum.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid user or file configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Category bins and labels do not line up
    #[error("there must be one more bin edge ({bins}) than labels ({labels})")]
    BinLabelMismatch { bins: usize, labels: usize },

    #[error("no scenarios found in {}", .0.display())]
    NoScenarios(PathBuf),

    #[error("no geometry files ending in '{suffix}' found in {}", .dir.display())]
    NoGeometryFiles { dir: PathBuf, suffix: String },

    #[error("required file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("column '{column}' not found in {table}")]
    MissingColumn { column: String, table: String },

    #[error("column '{column}' in {table} is not numeric")]
    NonNumericColumn { column: String, table: String },

    /// In-place write of hull totals into a table of different buildings
    #[error("hull table rows do not line up ({left} vs {right} buildings)")]
    IndexMismatch { left: usize, right: usize },

    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: polars::prelude::PolarsError,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to list files: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn missing_column(column: impl Into<String>, table: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
            table: table.into(),
        }
    }
}
