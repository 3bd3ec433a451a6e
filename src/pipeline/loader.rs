//! Survey extract loader for SAS transport, CSV and Parquet files

use std::collections::HashSet;
use std::path::Path;

use polars::prelude::*;

use super::error::{PipelineError, Result};
use super::table::{ColumnData, SubjectTable};
use super::xpt::read_xpt;

/// What to do when a subject identifier appears more than once in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail with a load error.
    #[default]
    Reject,
    /// Keep the first row for each identifier (the nutrition recall files
    /// carry one row per recall day).
    KeepFirst,
}

/// File formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Xpt,
    Csv,
    Parquet,
}

impl SourceFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "xpt" => Some(SourceFormat::Xpt),
            "csv" => Some(SourceFormat::Csv),
            "parquet" => Some(SourceFormat::Parquet),
            _ => None,
        }
    }
}

/// Load a file (XPT, CSV or Parquet based on extension) into a DataFrame.
pub fn load_frame(path: &Path) -> Result<DataFrame> {
    let format = SourceFormat::from_path(path).ok_or_else(|| {
        PipelineError::load(
            path,
            "Unsupported file format. Supported formats: xpt, csv, parquet",
        )
    })?;

    let df = match format {
        SourceFormat::Xpt => {
            let dataset = read_xpt(path)?;
            log::debug!(
                "Read transport member {} ({} rows) from {}",
                dataset.name,
                dataset.row_count,
                path.display()
            );
            dataset.into_frame()?
        }
        SourceFormat::Csv => LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10_000))
            .finish()?
            .collect()?,
        SourceFormat::Parquet => LazyFrame::scan_parquet(path, Default::default())?.collect()?,
    };

    log::debug!(
        "Loaded {} ({} rows, {} columns)",
        path.display(),
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Load a survey extract and key it by the identifier column.
pub fn load_subject_table(
    path: &Path,
    id_column: &str,
    policy: DuplicatePolicy,
) -> Result<SubjectTable> {
    let df = load_frame(path)?;
    frame_to_table(&df, id_column, policy, path)
}

/// Convert a DataFrame into a [`SubjectTable`].
///
/// Column types are fixed here: numeric and boolean dtypes become
/// [`ColumnData::Numeric`], everything else is rendered as text.
pub fn frame_to_table(
    df: &DataFrame,
    id_column: &str,
    policy: DuplicatePolicy,
    source: &Path,
) -> Result<SubjectTable> {
    let id_col = df
        .column(id_column)
        .map_err(|_| PipelineError::schema(source.display().to_string(), id_column))?;
    let raw_ids = parse_identifiers(id_col, source)?;

    let keep_rows = match policy {
        DuplicatePolicy::Reject => (0..raw_ids.len()).collect::<Vec<_>>(),
        DuplicatePolicy::KeepFirst => {
            let mut seen = HashSet::with_capacity(raw_ids.len());
            let rows: Vec<usize> = (0..raw_ids.len())
                .filter(|&r| seen.insert(raw_ids[r]))
                .collect();
            if rows.len() < raw_ids.len() {
                log::debug!(
                    "{}: kept first of duplicate rows ({} -> {})",
                    source.display(),
                    raw_ids.len(),
                    rows.len()
                );
            }
            rows
        }
    };

    let ids: Vec<u64> = keep_rows.iter().map(|&r| raw_ids[r]).collect();
    let mut table = SubjectTable::new(id_column, ids)
        .map_err(|e| PipelineError::load(source, e.to_string()))?;

    for column in df.get_columns() {
        let name = column.name().as_str();
        if name == id_column {
            continue;
        }
        let data = column_data(column)?;
        let data = if keep_rows.len() == df.height() {
            data
        } else {
            let rows: Vec<Option<usize>> = keep_rows.iter().map(|&r| Some(r)).collect();
            data.gather(&rows)
        };
        table.insert_column(name, data);
    }

    Ok(table)
}

/// Extract a column's values with its type tag.
fn column_data(column: &Column) -> Result<ColumnData> {
    let dtype = column.dtype();
    if dtype.is_primitive_numeric() || matches!(dtype, DataType::Boolean) {
        let cast = column.cast(&DataType::Float64)?;
        Ok(ColumnData::numeric(cast.f64()?.into_iter()))
    } else if matches!(dtype, DataType::String) {
        Ok(ColumnData::text(column.str()?.into_iter()))
    } else {
        let cast = column.cast(&DataType::String)?;
        Ok(ColumnData::text(cast.str()?.into_iter()))
    }
}

/// Identifiers must be positive integers. Text identifiers are parsed.
fn parse_identifiers(column: &Column, source: &Path) -> Result<Vec<u64>> {
    let values: Vec<Option<f64>> = if matches!(column.dtype(), DataType::String) {
        column
            .str()?
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()))
            .collect()
    } else {
        let cast = column.cast(&DataType::Float64)?;
        cast.f64()?.into_iter().collect()
    };

    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if v.is_finite() && v >= 1.0 && v.fract() == 0.0 => Ok(v as u64),
            Some(v) => Err(PipelineError::load(
                source,
                format!("invalid subject identifier {} at row {}", v, row),
            )),
            None => Err(PipelineError::load(
                source,
                format!("missing subject identifier at row {}", row),
            )),
        })
        .collect()
}
