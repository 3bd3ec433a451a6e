//! Pipeline configuration: survey layout, injected column lists and output names

use std::path::{Path, PathBuf};

use super::caries::DentalSettings;
use super::encode::DEFAULT_CATEGORICAL_COLUMNS;
use super::error::{PipelineError, Result};
use super::loader::DuplicatePolicy;
use super::merge::OUTCOME_COLUMN;
use super::prune::{MISSING_THRESHOLD, QUARANTINE_PATTERN};

/// Demographic variables kept from the demographic file (plus `outcome`).
pub const DEFAULT_DEMOGRAPHIC_COLUMNS: [&str; 22] = [
    "RIAGENDR", "RIDAGEYR", "RIDRETH1", "RIDRETH3", "DMDCITZN", "DMDEDUC2", "DMDMARTL", "SIALANG",
    "DMDHHSIZ", "DMDFMSIZ", "DMDHHSZA", "DMDHHSZB", "DMDHHSZE", "DMDHRGND", "WTINT2YR",
    "DMDHREDZ", "DMDHRAGZ", "DMDHRMAZ", "WTMEC2YR", "INDHHIN2", "INDFMIN2", "INDFMPIR",
];

/// One directory of survey extracts merged as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFamily {
    pub name: String,
    pub dir: PathBuf,
    pub duplicates: DuplicatePolicy,
    /// Only accept transport (`.xpt`) files
    pub xpt_only: bool,
}

impl SourceFamily {
    pub fn new(name: &str, dir: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            dir,
            duplicates: DuplicatePolicy::Reject,
            xpt_only: false,
        }
    }
}

/// Base directory used when none is given.
pub const DEFAULT_BASE_PATH: &str = "./data";

/// Everything the pipeline needs to know about inputs and outputs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub base_path: PathBuf,
    pub output_dir: PathBuf,
    pub id_column: String,
    pub dental_file: PathBuf,
    pub dental: DentalSettings,
    pub demographic_file: PathBuf,
    /// Demographic projection; `outcome` is appended automatically
    pub demographic_columns: Vec<String>,
    /// Merged in order: the last source to define a column wins
    pub sources: Vec<SourceFamily>,
    pub removal_list: PathBuf,
    pub categorical_columns: Vec<String>,
    pub encode_missing: bool,
    pub missing_threshold: f64,
    pub quarantine_pattern: String,
    pub phenotype_file_name: String,
    pub feature_file_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_base(DEFAULT_BASE_PATH)
    }
}

impl PipelineConfig {
    /// Standard survey layout under `base_path`.
    pub fn from_base(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        let mut nutrition = SourceFamily::new("nutrition", base_path.join("nutrition"));
        nutrition.duplicates = DuplicatePolicy::KeepFirst;
        nutrition.xpt_only = true;

        Self {
            output_dir: base_path.join("complete"),
            id_column: "SEQN".to_string(),
            dental_file: base_path.join("examination").join("OHXDEN_J.XPT"),
            dental: DentalSettings::default(),
            demographic_file: base_path.join("demo").join("DEMO_J.XPT"),
            demographic_columns: DEFAULT_DEMOGRAPHIC_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            sources: vec![
                SourceFamily::new("lab", base_path.join("lab")),
                SourceFamily::new("quest", base_path.join("quest")),
                SourceFamily::new("examination", base_path.join("examination")),
                nutrition,
            ],
            removal_list: base_path.join("vars_to_remove.txt"),
            categorical_columns: DEFAULT_CATEGORICAL_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            encode_missing: true,
            missing_threshold: MISSING_THRESHOLD,
            quarantine_pattern: QUARANTINE_PATTERN.to_string(),
            phenotype_file_name: "pheno_2018.csv".to_string(),
            feature_file_name: "demo_lab_quest_nut_binary_2018.csv".to_string(),
            base_path,
        }
    }

    pub fn phenotype_path(&self) -> PathBuf {
        self.output_dir.join(&self.phenotype_file_name)
    }

    pub fn feature_path(&self) -> PathBuf {
        self.output_dir.join(&self.feature_file_name)
    }

    /// Demographic projection including the outcome column.
    pub fn demographic_keep_list(&self) -> Vec<String> {
        let mut keep = self.demographic_columns.clone();
        if !keep.iter().any(|c| c == OUTCOME_COLUMN) {
            keep.push(OUTCOME_COLUMN.to_string());
        }
        keep
    }
}

/// Read a list of column names, one per line. Trailing whitespace is
/// stripped and blank lines are ignored.
pub fn read_name_list(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::config(path, e.to_string()))?;
    Ok(contents
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
