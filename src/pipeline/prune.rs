//! Column pruning: removal list, missing-value analysis and quarantine prefix

use serde::Serialize;

use super::table::SubjectTable;

/// Missing ratio above which a column is dropped.
pub const MISSING_THRESHOLD: f64 = 0.5;

/// Substring of raw dental-exam fields superseded by the derived outcome.
pub const QUARANTINE_PATTERN: &str = "OHX";

/// Columns dropped by each rule, in application order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PruneReport {
    pub removal_list: Vec<String>,
    pub removal_list_absent: Vec<String>,
    pub high_missing: Vec<String>,
    pub quarantined: Vec<String>,
}

impl PruneReport {
    pub fn total_dropped(&self) -> usize {
        self.removal_list.len() + self.high_missing.len() + self.quarantined.len()
    }
}

/// Pruning rules.
#[derive(Debug, Clone)]
pub struct ColumnPruner {
    pub removal_list: Vec<String>,
    pub missing_threshold: f64,
    pub quarantine_pattern: String,
}

impl ColumnPruner {
    pub fn new(removal_list: Vec<String>) -> Self {
        Self {
            removal_list,
            missing_threshold: MISSING_THRESHOLD,
            quarantine_pattern: QUARANTINE_PATTERN.to_string(),
        }
    }

    /// Apply the three rules in order; each sees the survivors of the previous.
    pub fn prune(&self, table: &mut SubjectTable) -> PruneReport {
        let mut report = PruneReport {
            removal_list: table.drop_columns(&self.removal_list),
            ..Default::default()
        };
        report.removal_list_absent = self
            .removal_list
            .iter()
            .filter(|name| !report.removal_list.contains(name))
            .cloned()
            .collect();
        if !report.removal_list_absent.is_empty() {
            log::debug!(
                "{} removal-list column(s) not present: {:?}",
                report.removal_list_absent.len(),
                report.removal_list_absent
            );
        }

        let missing_ratios = analyze_missing_values(table);
        report.high_missing = get_features_above_threshold(&missing_ratios, self.missing_threshold);
        table.drop_columns(&report.high_missing);

        report.quarantined = table
            .column_names()
            .into_iter()
            .filter(|name| name.contains(&self.quarantine_pattern))
            .collect();
        table.drop_columns(&report.quarantined);

        log::info!(
            "Pruned {} columns ({} listed, {} mostly missing, {} quarantined)",
            report.total_dropped(),
            report.removal_list.len(),
            report.high_missing.len(),
            report.quarantined.len()
        );
        report
    }
}

/// Missing ratio per column, sorted descending.
pub fn analyze_missing_values(table: &SubjectTable) -> Vec<(String, f64)> {
    if table.height() == 0 {
        return Vec::new();
    }

    let total = table.height() as f64;
    let mut missing_ratios: Vec<(String, f64)> = table
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.data.null_count() as f64 / total))
        .collect();

    missing_ratios.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    missing_ratios
}

/// Columns whose missing ratio is strictly above `threshold`.
pub fn get_features_above_threshold(missing_ratios: &[(String, f64)], threshold: f64) -> Vec<String> {
    missing_ratios
        .iter()
        .filter(|(_, ratio)| *ratio > threshold)
        .map(|(name, _)| name.clone())
        .collect()
}
