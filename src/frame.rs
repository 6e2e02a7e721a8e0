//! Polars helpers shared by the loaders and calculators.

use crate::error::{Error, Result};
use polars::prelude::*;
use std::path::Path;

/// Building ID column carried by every frame of the pipeline.
pub const INDEX_COLUMN: &str = "Name";

/// Reads a whole CSV file; column types are inferred from every row.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })
}

pub fn require<'a>(frame: &'a DataFrame, column: &str, table: &str) -> Result<&'a Series> {
    frame
        .column(column)
        .map_err(|_| Error::missing_column(column, table))
}

/// Numeric column widened to `f64`.
pub fn float_column(frame: &DataFrame, column: &str, table: &str) -> Result<Float64Chunked> {
    let series = require(frame, column, table)?;
    if !series.dtype().is_numeric() {
        return Err(Error::NonNumericColumn {
            column: column.to_string(),
            table: table.to_string(),
        });
    }
    Ok(series.cast(&DataType::Float64)?.f64()?.clone())
}

/// Value of a numeric column for the first row keyed `building`.
#[cfg(test)]
pub(crate) fn value(frame: &DataFrame, building: &str, column: &str) -> Option<f64> {
    let names = frame.column(INDEX_COLUMN).ok()?.str().ok()?;
    let row = names.into_iter().position(|n| n == Some(building))?;
    frame
        .column(column)
        .ok()?
        .cast(&DataType::Float64)
        .ok()?
        .f64()
        .ok()?
        .get(row)
}
