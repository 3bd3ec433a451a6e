//! Subject-keyed columnar table
//!
//! Every source file is loaded into a [`SubjectTable`]: one row per subject
//! identifier, columns stored column-major with an explicit type tag that is
//! fixed when the column is created.

use std::collections::HashMap;

use thiserror::Error;

/// Values of a single column. The variant is decided once, at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Floating point values. NaN is never stored; missing cells are `None`.
    Numeric(Vec<Option<f64>>),
    /// Decoded text values. Empty strings are never stored; missing cells are `None`.
    Text(Vec<Option<String>>),
}

impl ColumnData {
    /// Build a numeric column, folding NaN into missing.
    pub fn numeric<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        ColumnData::Numeric(
            values
                .into_iter()
                .map(|v| v.filter(|x| !x.is_nan()))
                .collect(),
        )
    }

    /// Build a text column, folding empty strings into missing.
    pub fn text<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        ColumnData::Text(
            values
                .into_iter()
                .map(|v| v.map(Into::into).filter(|s: &String| !s.is_empty()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Numeric(_))
    }

    pub fn is_null(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => v[row].is_none(),
            ColumnData::Text(v) => v[row].is_none(),
        }
    }

    pub fn null_count(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Text(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            ColumnData::Numeric(v) => Some(v),
            ColumnData::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&[Option<String>]> {
        match self {
            ColumnData::Text(v) => Some(v),
            ColumnData::Numeric(_) => None,
        }
    }

    /// Gather cells by row position; `None` positions become missing cells.
    pub fn gather(&self, rows: &[Option<usize>]) -> ColumnData {
        match self {
            ColumnData::Numeric(v) => {
                ColumnData::Numeric(rows.iter().map(|r| r.and_then(|i| v[i])).collect())
            }
            ColumnData::Text(v) => ColumnData::Text(
                rows.iter()
                    .map(|r| r.and_then(|i| v[i].clone()))
                    .collect(),
            ),
        }
    }
}

/// A named column inside a [`SubjectTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub name: String,
    pub data: ColumnData,
}

/// Raised when the same subject identifier appears twice in one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("duplicate subject identifier {0}")]
pub struct DuplicateSubject(pub u64);

/// Table keyed by subject identifier.
///
/// Invariants: identifiers are unique, and every column holds exactly one
/// cell per subject.
#[derive(Debug, Clone)]
pub struct SubjectTable {
    id_name: String,
    ids: Vec<u64>,
    index: HashMap<u64, usize>,
    columns: Vec<TableColumn>,
}

impl SubjectTable {
    /// Create a table with no columns over the given identifiers.
    pub fn new(id_name: impl Into<String>, ids: Vec<u64>) -> Result<Self, DuplicateSubject> {
        let mut index = HashMap::with_capacity(ids.len());
        for (row, &id) in ids.iter().enumerate() {
            if index.insert(id, row).is_some() {
                return Err(DuplicateSubject(id));
            }
        }
        Ok(Self {
            id_name: id_name.into(),
            ids,
            index,
            columns: Vec::new(),
        })
    }

    /// A table over the same subjects with no columns.
    pub fn empty_like(&self) -> Self {
        Self {
            id_name: self.id_name.clone(),
            ids: self.ids.clone(),
            index: self.index.clone(),
            columns: Vec::new(),
        }
    }

    /// Name of the identifier column (e.g. `SEQN`).
    pub fn id_name(&self) -> &str {
        &self.id_name
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    /// Number of subjects.
    pub fn height(&self) -> usize {
        self.ids.len()
    }

    /// Number of columns, not counting the identifier.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn row_of(&self, id: u64) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.data)
    }

    /// Insert a column. An existing column with the same name is replaced in
    /// place and its previous data returned; otherwise the column is appended.
    ///
    /// # Panics
    /// If `data` does not hold exactly one cell per subject.
    pub fn insert_column(&mut self, name: impl Into<String>, data: ColumnData) -> Option<ColumnData> {
        let name = name.into();
        assert_eq!(
            data.len(),
            self.height(),
            "column '{}' has {} cells for {} subjects",
            name,
            data.len(),
            self.height()
        );
        match self.position(&name) {
            Some(pos) => Some(std::mem::replace(&mut self.columns[pos].data, data)),
            None => {
                self.columns.push(TableColumn { name, data });
                None
            }
        }
    }

    pub fn remove_column(&mut self, name: &str) -> Option<ColumnData> {
        let pos = self.position(name)?;
        Some(self.columns.remove(pos).data)
    }

    /// Drop every named column that exists; returns the names actually dropped.
    pub fn drop_columns(&mut self, names: &[String]) -> Vec<String> {
        let mut dropped = Vec::new();
        self.columns.retain(|c| {
            if names.contains(&c.name) {
                dropped.push(c.name.clone());
                false
            } else {
                true
            }
        });
        dropped
    }

    /// Keep only the columns for which `keep` returns true.
    pub fn retain_columns<F>(&mut self, mut keep: F)
    where
        F: FnMut(&TableColumn) -> bool,
    {
        self.columns.retain(|c| keep(c));
    }

    /// Map a column's data in place.
    pub fn map_column<F>(&mut self, name: &str, f: F) -> bool
    where
        F: FnOnce(ColumnData) -> ColumnData,
    {
        let Some(pos) = self.position(name) else {
            return false;
        };
        let height = self.height();
        let slot = &mut self.columns[pos].data;
        let taken = std::mem::replace(slot, ColumnData::Numeric(Vec::new()));
        *slot = f(taken);
        assert_eq!(slot.len(), height, "mapped column '{}' changed length", name);
        true
    }

    /// Keep the rows for which `keep(row)` is true, preserving row order.
    pub fn filter_rows<F>(self, keep: F) -> Self
    where
        F: Fn(usize) -> bool,
    {
        let rows: Vec<Option<usize>> = (0..self.height())
            .filter(|&r| keep(r))
            .map(Some)
            .collect();
        let ids: Vec<u64> = rows.iter().flatten().map(|&r| self.ids[r]).collect();
        let index = ids.iter().enumerate().map(|(row, &id)| (id, row)).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| TableColumn {
                name: c.name.clone(),
                data: c.data.gather(&rows),
            })
            .collect();
        Self {
            id_name: self.id_name,
            ids,
            index,
            columns,
        }
    }

    /// Project onto the given column names, in the given order.
    ///
    /// Returns the first requested name that is absent.
    pub fn select(mut self, names: &[String]) -> Result<Self, String> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let pos = self.position(name).ok_or_else(|| name.clone())?;
            selected.push(self.columns[pos].clone());
        }
        self.columns = selected;
        Ok(self)
    }

    /// Row positions in `self` for each identifier of `universe`.
    pub fn align_to(&self, universe: &[u64]) -> Vec<Option<usize>> {
        universe.iter().map(|id| self.row_of(*id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = SubjectTable::new("SEQN", vec![1, 2, 1]).unwrap_err();
        assert_eq!(err, DuplicateSubject(1));
    }

    #[test]
    fn test_constructors_normalise_missing() {
        let num = ColumnData::numeric([Some(1.0), Some(f64::NAN), None]);
        assert_eq!(num, ColumnData::Numeric(vec![Some(1.0), None, None]));

        let text = ColumnData::text([Some("a"), Some(""), None]);
        assert_eq!(text, ColumnData::Text(vec![Some("a".to_string()), None, None]));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut table = SubjectTable::new("SEQN", vec![10, 20]).unwrap();
        table.insert_column("a", ColumnData::numeric([Some(1.0), Some(2.0)]));
        table.insert_column("b", ColumnData::numeric([Some(3.0), Some(4.0)]));
        let old = table.insert_column("a", ColumnData::text([Some("x"), None::<&str>]));

        assert_eq!(old, Some(ColumnData::Numeric(vec![Some(1.0), Some(2.0)])));
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert!(!table.column("a").unwrap().is_numeric());
    }

    #[test]
    fn test_filter_rows_rebuilds_index() {
        let mut table = SubjectTable::new("SEQN", vec![5, 6, 7]).unwrap();
        table.insert_column("v", ColumnData::numeric([Some(1.0), Some(2.0), Some(3.0)]));
        let table = table.filter_rows(|r| r != 1);

        assert_eq!(table.ids(), &[5, 7]);
        assert_eq!(table.row_of(7), Some(1));
        assert_eq!(table.row_of(6), None);
        assert_eq!(
            table.column("v"),
            Some(&ColumnData::Numeric(vec![Some(1.0), Some(3.0)]))
        );
    }
}
