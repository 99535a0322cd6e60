//! Flattening of export wrapper objects into plain scalars.
//!
//! The exports wrap identifiers as `{"$oid": "..."}`, dates as
//! `{"$date": <epoch ms>}` and references as `{"$ref": "...", "$id": {...}}`.
//! Normalization rewrites those fields in place; everything else passes
//! through untouched, so normalizing twice is the same as normalizing once.

use serde_json::Value;
use tracing::warn;

use crate::constants::{DATE_KEY, OID_KEY, REF_ID_KEY, REF_KEY, TIMESTAMP_FORMAT};
use crate::domain::lenient::timestamp_from_millis;
use crate::error::{QualityError, Result};
use crate::pipeline::ingestion::RawRecord;

pub mod mapper;

pub use mapper::{map_records, normalize_dataset, MappedTable, NormalizedDataset, TypeMismatch};

/// Counters gathered while normalizing a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub ids_unwrapped: usize,
    pub refs_unwrapped: usize,
    pub dates_converted: usize,
    pub date_failures: usize,
}

impl NormalizeStats {
    pub fn merge(&mut self, other: NormalizeStats) {
        self.ids_unwrapped += other.ids_unwrapped;
        self.refs_unwrapped += other.refs_unwrapped;
        self.dates_converted += other.dates_converted;
        self.date_failures += other.date_failures;
    }
}

/// Trait for rewriting raw export records into flat records
pub trait Normalizer {
    fn normalize(&self, record: &mut RawRecord, stats: &mut NormalizeStats);

    fn normalize_all(&self, records: &mut [RawRecord]) -> NormalizeStats {
        let mut stats = NormalizeStats::default();
        for record in records.iter_mut() {
            self.normalize(record, &mut stats);
        }
        stats
    }
}

/// Normalizer for the `$oid` / `$date` / `$ref` wrappers of the exports
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportNormalizer;

impl Normalizer for ExportNormalizer {
    fn normalize(&self, record: &mut RawRecord, stats: &mut NormalizeStats) {
        for (field, value) in record.iter_mut() {
            if !value.is_object() {
                continue;
            }
            let raw = value.take();
            *value = normalize_field(field, raw, stats);
        }
    }
}

/// Unwrapped values are normalized again, so nested wrappers flatten in one pass
fn normalize_field(field: &str, value: Value, stats: &mut NormalizeStats) -> Value {
    if let Some(inner) = unwrap_oid(&value) {
        stats.ids_unwrapped += 1;
        return normalize_field(field, inner.clone(), stats);
    }

    if let Some(raw_millis) = single_key(&value, DATE_KEY) {
        return match convert_date(raw_millis) {
            Ok(formatted) => {
                stats.dates_converted += 1;
                Value::String(formatted)
            }
            Err(e) => {
                stats.date_failures += 1;
                warn!(field = field, error = %e, "Error while converting datetime, nulling field");
                Value::Null
            }
        };
    }

    if let Some(id) = unwrap_db_ref(&value) {
        stats.refs_unwrapped += 1;
        return normalize_field(field, id, stats);
    }

    value
}

fn single_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get(key),
        _ => None,
    }
}

/// The inner value of a `{"$oid": v}` wrapper
pub fn unwrap_oid(value: &Value) -> Option<&Value> {
    single_key(value, OID_KEY)
}

/// The id of a `{"$ref": r, "$id": v}` reference, itself `$oid`-unwrapped
pub fn unwrap_db_ref(value: &Value) -> Option<Value> {
    let map = value.as_object()?;
    if map.len() != 2 || !map.contains_key(REF_KEY) {
        return None;
    }
    let id = map.get(REF_ID_KEY)?;
    Some(unwrap_oid(id).unwrap_or(id).clone())
}

/// Coerce the payload of a `$date` wrapper to epoch milliseconds.
/// Integers, floats (truncated) and integer strings are accepted.
pub fn millis_from_value(raw: &Value) -> Result<i64> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|v| v.is_finite() && v.abs() < i64::MAX as f64)
                    .map(|v| v.trunc() as i64)
            })
            .ok_or_else(|| QualityError::Timestamp(format!("{} is out of range", n))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| QualityError::Timestamp(format!("'{}' is not an integer", s))),
        other => Err(QualityError::Timestamp(format!(
            "{} cannot be read as epoch milliseconds",
            other
        ))),
    }
}

/// Epoch milliseconds (UTC) rendered as `YYYY-MM-DD HH:MM:SS`
pub fn format_epoch_millis(millis: i64) -> Result<String> {
    timestamp_from_millis(millis)
        .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
        .ok_or_else(|| QualityError::Timestamp(format!("{} ms is outside the calendar", millis)))
}

/// Convert the payload of a `$date` wrapper to a formatted UTC timestamp
pub fn convert_date(raw: &Value) -> Result<String> {
    format_epoch_millis(millis_from_value(raw)?)
}
