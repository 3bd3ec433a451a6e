//! One-hot encoding of categorical survey variables

use serde::Serialize;

use super::table::{ColumnData, SubjectTable};

/// Categorical survey variables expanded by default.
pub const DEFAULT_CATEGORICAL_COLUMNS: [&str; 13] = [
    "RIDRETH1", "RIDRETH3", "DMDMARTL", "DMDHRMAZ", "DBQ229", "HOQ065", "DIQ010", "WHQ030",
    "WHQ040", "DR2DAY", "DR2TWSZ", "HUQ041", "OHQ033",
];

/// Suffix of the indicator for missing cells.
pub const MISSING_LEVEL: &str = "nan";

/// One source column replaced by indicators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedColumn {
    pub source: String,
    pub indicators: Vec<String>,
}

/// Expands categorical columns into 1.0/0.0 indicator columns.
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    columns: Vec<String>,
    encode_missing: bool,
}

impl Default for CategoricalEncoder {
    fn default() -> Self {
        Self::new(
            DEFAULT_CATEGORICAL_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            true,
        )
    }
}

impl CategoricalEncoder {
    /// `encode_missing` adds a `<col>_nan` indicator when the column has
    /// missing cells; without it, missing rows are 0.0 in every indicator.
    pub fn new(columns: Vec<String>, encode_missing: bool) -> Self {
        Self {
            columns,
            encode_missing,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Encode every configured column present in `table`. Absent columns are
    /// skipped. Indicators are appended at the end of the table.
    pub fn encode(&self, table: &mut SubjectTable) -> Vec<EncodedColumn> {
        let mut encoded = Vec::new();
        for name in &self.columns {
            let Some(data) = table.remove_column(name) else {
                continue;
            };
            let levels = level_keys(&data);
            let indicators = one_hot(name, &levels, self.encode_missing);
            let mut created = Vec::with_capacity(indicators.len());
            for (indicator, values) in indicators {
                created.push(indicator.clone());
                table.insert_column(indicator, values);
            }
            log::debug!("{} -> {} indicator column(s)", name, created.len());
            encoded.push(EncodedColumn {
                source: name.clone(),
                indicators: created,
            });
        }
        encoded
    }
}

/// Per-row level label; `None` marks a missing cell.
fn level_keys(data: &ColumnData) -> Vec<Option<String>> {
    match data {
        ColumnData::Numeric(v) => v.iter().map(|x| x.map(format_level)).collect(),
        ColumnData::Text(v) => v.clone(),
    }
}

/// Render a numeric level the way indicator names expect it (`1.0`, `2.5`).
pub fn format_level(value: f64) -> String {
    format!("{:?}", value)
}

/// Build indicator columns in first-appearance order of each level.
fn one_hot(
    name: &str,
    levels: &[Option<String>],
    encode_missing: bool,
) -> Vec<(String, ColumnData)> {
    let mut order: Vec<Option<&str>> = Vec::new();
    for level in levels {
        let key = level.as_deref();
        if key.is_none() && !encode_missing {
            continue;
        }
        if !order.contains(&key) {
            order.push(key);
        }
    }

    order
        .into_iter()
        .map(|key| {
            let label = key.unwrap_or(MISSING_LEVEL);
            let values = levels
                .iter()
                .map(|l| Some(if l.as_deref() == key { 1.0 } else { 0.0 }))
                .collect();
            (format!("{}_{}", name, label), ColumnData::Numeric(values))
        })
        .collect()
}
