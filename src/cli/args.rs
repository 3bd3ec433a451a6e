//! Command-line argument definitions using clap

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::pipeline::{read_name_list, PipelineConfig, DEFAULT_BASE_PATH};

/// cariesprep - Build dental caries phenotypes and a merged survey feature table
#[derive(Parser, Debug)]
#[command(name = "cariesprep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Survey base directory containing demo/, lab/, quest/, examination/
    /// and nutrition/ plus the removal list
    #[arg(short, long, default_value = DEFAULT_BASE_PATH)]
    pub base_path: PathBuf,

    /// Output directory for both tables. Defaults to <base>/complete
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Dental examination file. Defaults to <base>/examination/OHXDEN_J.XPT
    #[arg(long)]
    pub dental_file: Option<PathBuf>,

    /// Demographic file. Defaults to <base>/demo/DEMO_J.XPT
    #[arg(long)]
    pub demographic_file: Option<PathBuf>,

    /// Column removal list, one name per line. Defaults to <base>/vars_to_remove.txt
    #[arg(long)]
    pub remove_list: Option<PathBuf>,

    /// Categorical variables to one-hot encode, one name per line.
    /// Defaults to the built-in survey list.
    #[arg(long)]
    pub categorical_file: Option<PathBuf>,

    /// Subject identifier column shared by every source
    #[arg(long, default_value = "SEQN")]
    pub id_column: String,

    /// Drop columns whose missing ratio is above this value
    #[arg(long, default_value = "0.5", value_parser = validate_ratio)]
    pub missing_threshold: f64,

    /// Do not add a `<col>_nan` indicator for missing categorical cells
    #[arg(long, default_value = "false")]
    pub no_missing_indicator: bool,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a single survey file (XPT, CSV or Parquet) to CSV or Parquet
    Convert {
        /// Input file path
        input: PathBuf,

        /// Output file path (optional, defaults to input with .parquet extension)
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Build the pipeline configuration from the survey layout and any overrides.
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::from_base(&self.base_path);
        config.id_column = self.id_column.clone();
        config.missing_threshold = self.missing_threshold;
        config.encode_missing = !self.no_missing_indicator;

        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(path) = &self.dental_file {
            config.dental_file = path.clone();
        }
        if let Some(path) = &self.demographic_file {
            config.demographic_file = path.clone();
        }
        if let Some(path) = &self.remove_list {
            config.removal_list = path.clone();
        }
        if let Some(path) = &self.categorical_file {
            config.categorical_columns = read_name_list(path).with_context(|| {
                format!("Failed to read categorical list: {}", path.display())
            })?;
        }

        Ok(config)
    }
}

fn validate_ratio(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "missing_threshold must be between 0.0 and 1.0, got {}",
            value
        ))
    } else {
        Ok(value)
    }
}
