//! Survey sentinel-code removal
//!
//! The survey encodes "refused", "don't know" and similar answers as numeric
//! codes (7, 9, 77, 99, ...). Which codes are sentinels depends on the width of
//! the answer scale, so the set to remove is chosen from the column's
//! cardinality rather than from a per-variable codebook: small categorical
//! scales lose 7/9 as well, while continuous measurements only lose the large
//! repeated-digit codes.

use std::collections::HashSet;

use super::table::{ColumnData, SubjectTable};

/// Codes removed only from low-cardinality columns.
pub const SMALL_CODES: [f64; 2] = [9.0, 7.0];
/// Codes removed from low and medium cardinality columns.
pub const MEDIUM_CODES: [f64; 4] = [77.0, 99.0, 777.0, 999.0];
/// Codes removed from every numeric column.
pub const LARGE_CODES: [f64; 5] = [7777.0, 9999.0, 77777.0, 99999.0, 5555.0];

/// Columns with fewer distinct values than this use the full sentinel set.
pub const SMALL_CARDINALITY_LIMIT: usize = 9;
/// Columns with fewer distinct values than this (and at least
/// [`SMALL_CARDINALITY_LIMIT`]) drop the small codes from the set.
pub const MEDIUM_CARDINALITY_LIMIT: usize = 21;

/// Sentinel set band selected by cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelBand {
    /// cardinality < 9
    Small,
    /// 9 <= cardinality < 21
    Medium,
    /// cardinality >= 21
    Large,
}

impl SentinelBand {
    pub fn for_cardinality(cardinality: usize) -> Self {
        if cardinality < SMALL_CARDINALITY_LIMIT {
            SentinelBand::Small
        } else if cardinality < MEDIUM_CARDINALITY_LIMIT {
            SentinelBand::Medium
        } else {
            SentinelBand::Large
        }
    }

    /// The sentinel codes removed in this band.
    pub fn codes(self) -> Vec<f64> {
        match self {
            SentinelBand::Small => SMALL_CODES
                .iter()
                .chain(&MEDIUM_CODES)
                .chain(&LARGE_CODES)
                .copied()
                .collect(),
            SentinelBand::Medium => MEDIUM_CODES.iter().chain(&LARGE_CODES).copied().collect(),
            SentinelBand::Large => LARGE_CODES.to_vec(),
        }
    }
}

/// Number of distinct non-missing values.
pub fn cardinality(values: &[Option<f64>]) -> usize {
    values
        .iter()
        .flatten()
        .map(|v| (v + 0.0).to_bits())
        .collect::<HashSet<_>>()
        .len()
}

/// Replace sentinel codes with missing values.
///
/// `cardinality` is the column's distinct-value count measured before any
/// replacement.
pub fn scrub(values: &[Option<f64>], cardinality: usize) -> Vec<Option<f64>> {
    let codes = SentinelBand::for_cardinality(cardinality).codes();
    values
        .iter()
        .map(|v| v.filter(|x| !codes.contains(x)))
        .collect()
}

/// Per-column scrub outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrubbedColumn {
    pub name: String,
    pub cardinality: usize,
    pub band: SentinelBand,
    pub cells_replaced: usize,
}

/// Keep only numeric columns; returns the names of the dropped text columns.
pub fn retain_numeric(table: &mut SubjectTable) -> Vec<String> {
    let dropped: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| !c.data.is_numeric())
        .map(|c| c.name.clone())
        .collect();
    table.retain_columns(|c| c.data.is_numeric());
    dropped
}

/// Scrub every numeric column of the table. Text columns are left untouched.
pub fn scrub_table(table: &mut SubjectTable) -> Vec<ScrubbedColumn> {
    let mut report = Vec::new();

    for name in table.column_names() {
        let mut outcome = None;
        table.map_column(&name, |data| match data {
            ColumnData::Numeric(values) => {
                let card = cardinality(&values);
                let cleaned = scrub(&values, card);
                let cells_replaced = cleaned.iter().filter(|v| v.is_none()).count()
                    - values.iter().filter(|v| v.is_none()).count();
                outcome = Some(ScrubbedColumn {
                    name: name.clone(),
                    cardinality: card,
                    band: SentinelBand::for_cardinality(card),
                    cells_replaced,
                });
                ColumnData::Numeric(cleaned)
            }
            text => text,
        });
        if let Some(col) = outcome {
            if col.cells_replaced > 0 {
                log::debug!(
                    "{}: {} sentinel cells removed ({:?} band, {} distinct values)",
                    col.name,
                    col.cells_replaced,
                    col.band,
                    col.cardinality
                );
            }
            report.push(col);
        }
    }

    report
}
