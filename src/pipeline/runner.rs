//! Pipeline driver: dental phenotype, source merge, cleaning and output

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::caries::{extract_caries_features, CariesFeatures};
use super::config::{read_name_list, PipelineConfig};
use super::discovery::discover_sources;
use super::encode::{CategoricalEncoder, EncodedColumn};
use super::error::{PipelineError, Result};
use super::loader::{load_subject_table, DuplicatePolicy};
use super::merge::{inject_column, MergeStats, TableMerger, OUTCOME_COLUMN};
use super::output::StagedOutputs;
use super::prune::{ColumnPruner, PruneReport};
use super::scrub::{retain_numeric, scrub_table};
use super::table::SubjectTable;

/// One file folded into the feature table.
#[derive(Debug, Clone, Serialize)]
pub struct SourceMerge {
    pub family: String,
    pub file: String,
    #[serde(flatten)]
    pub stats: MergeStats,
}

/// Result of the cleaning stages applied to the merged table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleaningReport {
    pub text_columns_dropped: Vec<String>,
    pub scrubbed_columns: usize,
    pub scrubbed_cells: usize,
    pub prune: PruneReport,
    pub encoded: Vec<EncodedColumn>,
}

/// Counts collected over a full run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub dental_subjects: usize,
    pub excluded_subjects: usize,
    pub tooth_columns: usize,
    pub caries_positive: usize,
    pub demographic_subjects: usize,
    pub sources: Vec<SourceMerge>,
    pub merged_columns: usize,
    pub cleaning: CleaningReport,
    pub final_subjects: usize,
    pub final_columns: usize,
}

impl RunStats {
    /// Gather the per-stage counts once every stage has run.
    pub fn collect(
        caries: &CariesFeatures,
        demographic_subjects: usize,
        sources: Vec<SourceMerge>,
        merged_columns: usize,
        cleaning: CleaningReport,
        features: &SubjectTable,
    ) -> Self {
        Self {
            dental_subjects: caries.phenotype.height(),
            excluded_subjects: caries.excluded_subjects,
            tooth_columns: caries.tooth_flags.width(),
            caries_positive: count_positive(caries),
            demographic_subjects,
            sources,
            merged_columns,
            cleaning,
            final_subjects: features.height(),
            final_columns: features.width(),
        }
    }
}

/// Everything a completed run produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub phenotype: SubjectTable,
    pub features: SubjectTable,
    pub stats: RunStats,
    pub written: Vec<PathBuf>,
}

/// Injected column lists, read before any table is loaded.
#[derive(Debug, Clone)]
pub struct ColumnLists {
    pub removal_list: Vec<String>,
}

impl ColumnLists {
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            removal_list: read_name_list(&config.removal_list)?,
        })
    }
}

/// Load the dental examination file and derive the phenotype table.
pub fn build_phenotype(config: &PipelineConfig) -> Result<CariesFeatures> {
    let dental = load_subject_table(
        &config.dental_file,
        &config.id_column,
        DuplicatePolicy::Reject,
    )?;
    extract_caries_features(dental, &config.dental)
}

/// Load the demographic file, inject the outcome and project onto the keep list.
pub fn build_demographic_base(
    config: &PipelineConfig,
    caries: &CariesFeatures,
) -> Result<SubjectTable> {
    let mut demo = load_subject_table(
        &config.demographic_file,
        &config.id_column,
        DuplicatePolicy::Reject,
    )?;
    inject_column(&mut demo, &caries.phenotype, "tooth_count", OUTCOME_COLUMN);

    demo.select(&config.demographic_keep_list())
        .map_err(|column| PipelineError::schema(config.demographic_file.display().to_string(), column))
}

/// Merge every source family, in configured order, onto `base`.
pub fn merge_sources(config: &PipelineConfig, base: &mut SubjectTable) -> Result<Vec<SourceMerge>> {
    let merger = TableMerger::default();
    let mut merges = Vec::new();

    for family in &config.sources {
        for path in discover_sources(family)? {
            let incoming = load_subject_table(&path, &config.id_column, family.duplicates)?;
            let stats = merger.merge(base, &incoming);
            log::debug!(
                "Merged {}: +{} columns, {} replaced, {} subjects matched",
                path.display(),
                stats.columns_added,
                stats.columns_replaced,
                stats.matched_subjects
            );
            merges.push(SourceMerge {
                family: family.name.clone(),
                file: file_label(&path),
                stats,
            });
        }
    }

    log::info!(
        "Merged {} source file(s): {} subjects x {} columns",
        merges.len(),
        base.height(),
        base.width()
    );
    Ok(merges)
}

/// Numeric selection, sentinel scrubbing, pruning and categorical encoding.
pub fn clean_features(
    config: &PipelineConfig,
    lists: &ColumnLists,
    table: &mut SubjectTable,
) -> CleaningReport {
    let text_columns_dropped = retain_numeric(table);

    let scrubbed = scrub_table(table);
    let scrubbed_cells = scrubbed.iter().map(|c| c.cells_replaced).sum();
    let scrubbed_columns = scrubbed.iter().filter(|c| c.cells_replaced > 0).count();

    let pruner = ColumnPruner {
        removal_list: lists.removal_list.clone(),
        missing_threshold: config.missing_threshold,
        quarantine_pattern: config.quarantine_pattern.clone(),
    };
    let prune = pruner.prune(table);

    let encoder = CategoricalEncoder::new(config.categorical_columns.clone(), config.encode_missing);
    let encoded = encoder.encode(table);

    CleaningReport {
        text_columns_dropped,
        scrubbed_columns,
        scrubbed_cells,
        prune,
        encoded,
    }
}

/// Write both tables; neither becomes visible unless both were written.
pub fn write_outputs(
    config: &PipelineConfig,
    phenotype: &SubjectTable,
    features: &SubjectTable,
) -> Result<Vec<PathBuf>> {
    let mut outputs = StagedOutputs::new();
    outputs.stage(phenotype, &config.phenotype_path())?;
    outputs.stage(features, &config.feature_path())?;
    outputs.commit()
}

/// Run every stage end to end.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineOutcome> {
    let lists = ColumnLists::load(config)?;

    let caries = build_phenotype(config)?;
    let mut features = build_demographic_base(config, &caries)?;
    let demographic_subjects = features.height();

    let sources = merge_sources(config, &mut features)?;
    let merged_columns = features.width();

    let cleaning = clean_features(config, &lists, &mut features);
    let written = write_outputs(config, &caries.phenotype, &features)?;

    let stats = RunStats::collect(
        &caries,
        demographic_subjects,
        sources,
        merged_columns,
        cleaning,
        &features,
    );

    Ok(PipelineOutcome {
        phenotype: caries.phenotype,
        features,
        stats,
        written,
    })
}

/// Subjects with at least one caries-positive tooth.
pub fn count_positive(caries: &CariesFeatures) -> usize {
    caries
        .outcome()
        .iter()
        .filter(|v| **v == Some(1.0))
        .count()
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
