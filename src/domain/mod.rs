//! Typed record shapes for the three exports and the column model the
//! quality checks run against.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::constants::{BRANDS_DATASET, RECEIPTS_DATASET, TIMESTAMP_FORMAT, USERS_DATASET};
use crate::error::{QualityError, Result};

pub mod brand;
pub mod lenient;
pub mod receipt;
pub mod user;

pub use brand::Brand;
pub use receipt::{Receipt, ReceiptItem};
pub use user::User;

/// The exports a pipeline run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Receipts,
    Brands,
    Users,
}

impl Dataset {
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Receipts => RECEIPTS_DATASET,
            Dataset::Brands => BRANDS_DATASET,
            Dataset::Users => USERS_DATASET,
        }
    }

    pub fn all() -> [Dataset; 3] {
        [Dataset::Receipts, Dataset::Brands, Dataset::Users]
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The value kind a column holds once normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Text,
    Integer,
    Decimal,
    Flag,
    Timestamp,
    List,
}

impl CellKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellKind::Integer | CellKind::Decimal)
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellKind::Text => "text",
            CellKind::Integer => "integer",
            CellKind::Decimal => "decimal",
            CellKind::Flag => "boolean",
            CellKind::Timestamp => "timestamp",
            CellKind::List => "list",
        };
        f.write_str(name)
    }
}

/// A single non-null value read out of a record
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Flag(bool),
    Timestamp(NaiveDateTime),
    /// Nested lists are only inspected for presence and length
    List(usize),
}

impl Cell {
    pub fn kind(&self) -> CellKind {
        match self {
            Cell::Text(_) => CellKind::Text,
            Cell::Integer(_) => CellKind::Integer,
            Cell::Decimal(_) => CellKind::Decimal,
            Cell::Flag(_) => CellKind::Flag,
            Cell::Timestamp(_) => CellKind::Timestamp,
            Cell::List(_) => CellKind::List,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(v) => Some(*v as f64),
            Cell::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Canonical string used for key comparison across tables.
    /// Integer `9` and decimal `9.0` render identically.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Integer(v) => write!(f, "{}", v),
            Cell::Decimal(v) => write!(f, "{}", v),
            Cell::Flag(v) => write!(f, "{}", v),
            Cell::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
            Cell::List(len) => write!(f, "[{} items]", len),
        }
    }
}

/// Schema entry for one column of a record shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: CellKind,
}

impl Column {
    pub const fn new(name: &'static str, kind: CellKind) -> Self {
        Self { name, kind }
    }
}

/// A typed record with a fixed column schema, addressable by column name
pub trait Record: Clone + fmt::Debug {
    /// Which export this record shape comes from
    const DATASET: Dataset;

    /// Columns in export order
    fn columns() -> &'static [Column];

    /// Value of `column`, `None` when null, absent or not a known column
    fn cell(&self, column: &str) -> Option<Cell>;

    /// Primary identifier, used to quote offending records in reports
    fn record_id(&self) -> Option<&str>;

    fn column(name: &str) -> Option<&'static Column> {
        Self::columns().iter().find(|c| c.name == name)
    }
}

/// An ordered, in-memory collection of one record shape
#[derive(Debug, Clone, PartialEq)]
pub struct Table<T> {
    records: Vec<T>,
}

impl<T: Record> Table<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self { records }
    }

    pub fn dataset(&self) -> Dataset {
        T::DATASET
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    /// Rows × columns, the way the exports were first profiled
    pub fn shape(&self) -> (usize, usize) {
        (self.records.len(), T::columns().len())
    }

    pub(crate) fn records_mut(&mut self) -> &mut Vec<T> {
        &mut self.records
    }

    /// Resolve a column by name or fail with a precondition error
    pub fn require_column(&self, name: &str) -> Result<&'static Column> {
        T::column(name).ok_or_else(|| QualityError::MissingColumn {
            dataset: T::DATASET.to_string(),
            column: name.to_string(),
        })
    }

    /// Resolve a column and check its kind with `accepts`
    pub fn require_kind(
        &self,
        name: &str,
        expected: &str,
        accepts: impl Fn(CellKind) -> bool,
    ) -> Result<&'static Column> {
        let column = self.require_column(name)?;
        if !accepts(column.kind) {
            return Err(QualityError::ColumnKind {
                dataset: T::DATASET.to_string(),
                column: name.to_string(),
                expected: expected.to_string(),
                actual: column.kind.to_string(),
            });
        }
        Ok(column)
    }
}

impl<T: Record> FromIterator<T> for Table<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a Table<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_keys_match_across_numeric_kinds() {
        assert_eq!(Cell::Integer(9).key(), Cell::Decimal(9.0).key());
        assert_eq!(Cell::Text("9".to_string()).key(), Cell::Integer(9).key());
    }

    #[test]
    fn test_require_column_rejects_unknown_names() {
        let table: Table<User> = Table::new(Vec::new());
        let err = table.require_column("favoriteColor").unwrap_err();
        assert!(matches!(err, QualityError::MissingColumn { .. }));
        assert!(table.require_column("role").is_ok());
    }

    #[test]
    fn test_require_kind_reports_actual_kind() {
        let table: Table<User> = Table::new(Vec::new());
        let err = table
            .require_kind("role", "numeric", |k| k.is_numeric())
            .unwrap_err();
        assert!(err.to_string().contains("text"));
    }
}
