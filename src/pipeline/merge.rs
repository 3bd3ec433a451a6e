//! Left-join of survey sources onto the demographic subject universe

use serde::Serialize;

use super::table::{ColumnData, SubjectTable};

/// Name of the injected caries outcome column.
pub const OUTCOME_COLUMN: &str = "outcome";

/// What a single merge did to the base table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Columns that did not exist in the base table
    pub columns_added: usize,
    /// Columns that overwrote an existing base column (last source wins)
    pub columns_replaced: usize,
    /// Incoming columns refused because the base column is protected
    pub columns_protected: Vec<String>,
    /// Base subjects that were found in the incoming table
    pub matched_subjects: usize,
}

/// Merges sources column by column, aligned on subject identifier.
///
/// Collision policy: an incoming column replaces the base column of the same
/// name in place (the later source wins), except for protected columns which
/// are never overwritten. The base table's subjects are the universe: subjects
/// only present in the incoming table are ignored and base subjects missing
/// from it get missing cells.
#[derive(Debug, Clone)]
pub struct TableMerger {
    protected: Vec<String>,
}

impl Default for TableMerger {
    fn default() -> Self {
        Self {
            protected: vec![OUTCOME_COLUMN.to_string()],
        }
    }
}

impl TableMerger {
    pub fn new(protected: Vec<String>) -> Self {
        Self { protected }
    }

    pub fn protected(&self) -> &[String] {
        &self.protected
    }

    pub fn merge(&self, base: &mut SubjectTable, incoming: &SubjectTable) -> MergeStats {
        let rows = incoming.align_to(base.ids());
        let mut stats = MergeStats {
            matched_subjects: rows.iter().filter(|r| r.is_some()).count(),
            ..Default::default()
        };

        for column in incoming.columns() {
            if self.protected.contains(&column.name) && base.has_column(&column.name) {
                log::warn!(
                    "Refusing to overwrite protected column '{}'",
                    column.name
                );
                stats.columns_protected.push(column.name.clone());
                continue;
            }

            let aligned = column.data.gather(&rows);
            match base.insert_column(column.name.clone(), aligned) {
                Some(_) => stats.columns_replaced += 1,
                None => stats.columns_added += 1,
            }
        }

        stats
    }
}

/// Add `column` from `source` to `base`, aligned by subject identifier.
///
/// Used to inject the caries outcome into the demographic table before any
/// other source is merged. Returns false when `source` lacks the column.
pub fn inject_column(
    base: &mut SubjectTable,
    source: &SubjectTable,
    column: &str,
    as_name: &str,
) -> bool {
    let Some(data) = source.column(column) else {
        return false;
    };
    let rows = source.align_to(base.ids());
    let aligned: ColumnData = data.gather(&rows);
    base.insert_column(as_name, aligned);
    true
}
