//! Output writing: SubjectTable → DataFrame → CSV/Parquet, committed atomically

use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tempfile::NamedTempFile;

use super::error::{PipelineError, Result};
use super::loader::SourceFormat;
use super::table::{ColumnData, SubjectTable};

/// Build a DataFrame with the identifier as the first column.
pub fn table_to_frame(table: &SubjectTable) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(table.width() + 1);
    let ids: Vec<i64> = table.ids().iter().map(|&id| id as i64).collect();
    columns.push(Column::new(table.id_name().into(), ids));

    for column in table.columns() {
        let series = match &column.data {
            ColumnData::Numeric(v) => {
                let ca: Float64Chunked = v.iter().copied().collect();
                ca.with_name(column.name.as_str().into()).into_series()
            }
            ColumnData::Text(v) => {
                let ca: StringChunked = v.iter().map(|s| s.as_deref()).collect();
                ca.with_name(column.name.as_str().into()).into_series()
            }
        };
        columns.push(series.into());
    }

    Ok(DataFrame::new(columns)?)
}

/// Write a DataFrame to CSV or Parquet based on the path extension.
pub fn write_frame(df: &mut DataFrame, path: &Path) -> Result<()> {
    let format = output_format(path)?;
    let file = File::create(path)?;
    write_frame_to(df, file, format)
}

fn output_format(path: &Path) -> Result<SourceFormat> {
    match SourceFormat::from_path(path) {
        Some(format @ (SourceFormat::Csv | SourceFormat::Parquet)) => Ok(format),
        _ => Err(PipelineError::config(
            path,
            "Unsupported output format. Supported formats: csv, parquet",
        )),
    }
}

fn write_frame_to(df: &mut DataFrame, mut file: File, format: SourceFormat) -> Result<()> {
    match format {
        SourceFormat::Parquet => {
            ParquetWriter::new(file).finish(df)?;
        }
        _ => {
            CsvWriter::new(&mut file).finish(df)?;
        }
    }
    Ok(())
}

/// A set of output files that become visible together.
///
/// Each table is written to a temporary file in its destination directory;
/// nothing appears under the final names until [`StagedOutputs::commit`].
/// Dropping without committing removes the temporary files.
#[derive(Debug, Default)]
pub struct StagedOutputs {
    staged: Vec<(NamedTempFile, PathBuf)>,
}

impl StagedOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `table` to a temporary file destined for `path`.
    pub fn stage(&mut self, table: &SubjectTable, path: &Path) -> Result<()> {
        let format = output_format(path)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let temp = NamedTempFile::new_in(dir)?;
        let mut df = table_to_frame(table)?;
        write_frame_to(&mut df, temp.reopen()?, format)?;
        log::debug!("Staged {} ({} rows)", path.display(), df.height());
        self.staged.push((temp, path.to_path_buf()));
        Ok(())
    }

    /// Rename every staged file onto its final path.
    pub fn commit(self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.staged.len());
        for (temp, path) in self.staged {
            temp.persist(&path).map_err(|e| PipelineError::Io(e.error))?;
            written.push(path);
        }
        Ok(written)
    }
}
