use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use super::{ExportNormalizer, NormalizeStats, Normalizer};
use crate::domain::{CellKind, Record, Table};
use crate::metrics::NormalizeMetrics;
use crate::pipeline::ingestion::{LoadedDataset, RawRecord};

/// Values of one column that were present in the export but could not be
/// read as the column's kind, and so were nulled during mapping
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMismatch {
    pub column: &'static str,
    pub expected: CellKind,
    pub count: usize,
    /// Ids of the affected records, in table order
    pub record_ids: Vec<String>,
}

/// Output of mapping flattened records onto `T`
#[derive(Debug, Clone)]
pub struct MappedTable<T> {
    pub table: Table<T>,
    /// Records dropped because they could not be mapped onto `T`
    pub unmapped: usize,
    /// Per-column type mismatches, in schema order; clean columns are absent
    pub type_mismatches: Vec<TypeMismatch>,
}

/// A typed table plus what normalization had to do to get there
#[derive(Debug, Clone)]
pub struct NormalizedDataset<T> {
    pub table: Table<T>,
    pub stats: NormalizeStats,
    pub unmapped: usize,
    pub type_mismatches: Vec<TypeMismatch>,
}

impl<T> NormalizedDataset<T> {
    /// Total values nulled across all columns because of their type
    pub fn type_mismatch_count(&self) -> usize {
        self.type_mismatches.iter().map(|m| m.count).sum()
    }
}

/// Map flattened records onto the typed shape `T`, dropping (and counting)
/// any record serde cannot read.
///
/// A column that held a non-null value in the export but reads as null on
/// the typed record was coerced away; those are counted per column.
pub fn map_records<T>(records: Vec<RawRecord>) -> MappedTable<T>
where
    T: Record + DeserializeOwned,
{
    let columns = T::columns();
    let mut unmapped = 0;
    let mut typed = Vec::with_capacity(records.len());
    let mut mismatches: Vec<Vec<String>> = vec![Vec::new(); columns.len()];

    for (position, record) in records.into_iter().enumerate() {
        let present: Vec<bool> = columns
            .iter()
            .map(|column| record.get(column.name).map_or(false, |v| !v.is_null()))
            .collect();

        match serde_json::from_value::<T>(Value::Object(record)) {
            Ok(mapped) => {
                for (index, column) in columns.iter().enumerate() {
                    if present[index] && mapped.cell(column.name).is_none() {
                        let id = mapped.record_id().unwrap_or("<no id>").to_string();
                        mismatches[index].push(id);
                    }
                }
                typed.push(mapped);
            }
            Err(e) => {
                unmapped += 1;
                warn!(
                    dataset = T::DATASET.name(),
                    position = position,
                    error = %e,
                    "Dropping record that does not fit its dataset shape"
                );
            }
        }
    }

    let type_mismatches = columns
        .iter()
        .zip(mismatches)
        .filter(|(_, ids)| !ids.is_empty())
        .map(|(column, record_ids)| TypeMismatch {
            column: column.name,
            expected: column.kind,
            count: record_ids.len(),
            record_ids,
        })
        .collect();

    MappedTable {
        table: Table::new(typed),
        unmapped,
        type_mismatches,
    }
}

/// Normalize a loaded export and build its typed table
pub fn normalize_dataset<T>(loaded: LoadedDataset) -> NormalizedDataset<T>
where
    T: Record + DeserializeOwned,
{
    let LoadedDataset { mut records, .. } = loaded;
    let stats = ExportNormalizer.normalize_all(&mut records);
    let MappedTable {
        table,
        unmapped,
        type_mismatches,
    } = map_records::<T>(records);

    let normalized = NormalizedDataset {
        table,
        stats,
        unmapped,
        type_mismatches,
    };

    NormalizeMetrics::record_batch(
        T::DATASET.name(),
        stats.ids_unwrapped + stats.refs_unwrapped,
        stats.dates_converted,
        stats.date_failures,
        unmapped,
        normalized.type_mismatch_count(),
    );
    info!(
        dataset = T::DATASET.name(),
        records = normalized.table.len(),
        dates_converted = stats.dates_converted,
        date_failures = stats.date_failures,
        unmapped = unmapped,
        type_mismatches = normalized.type_mismatch_count(),
        "Normalized export"
    );

    normalized
}
