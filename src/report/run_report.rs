//! JSON run report export

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{PipelineConfig, RunStats};

/// Metadata about the run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    /// cariesprep version
    pub version: String,
    pub base_path: String,
    pub output_dir: String,
    pub id_column: String,
    pub categorical_columns: Vec<String>,
    pub encode_missing: bool,
    pub missing_threshold: f64,
    pub quarantine_pattern: String,
    /// Output files written
    pub outputs: Vec<String>,
}

/// Complete run report
#[derive(Serialize)]
pub struct RunReport<'a> {
    pub metadata: RunMetadata,
    pub stats: &'a RunStats,
}

impl<'a> RunReport<'a> {
    pub fn new(config: &PipelineConfig, stats: &'a RunStats, outputs: &[std::path::PathBuf]) -> Self {
        Self {
            metadata: RunMetadata {
                timestamp: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                base_path: config.base_path.display().to_string(),
                output_dir: config.output_dir.display().to_string(),
                id_column: config.id_column.clone(),
                categorical_columns: config.categorical_columns.clone(),
                encode_missing: config.encode_missing,
                missing_threshold: config.missing_threshold,
                quarantine_pattern: config.quarantine_pattern.clone(),
                outputs: outputs.iter().map(|p| p.display().to_string()).collect(),
            },
            stats,
        }
    }
}

/// Write the run report as pretty-printed JSON
pub fn export_run_report(report: &RunReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write run report: {}", output_path.display()))?;
    Ok(())
}
