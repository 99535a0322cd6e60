//! The individual data-quality checks.
//!
//! Every check is read-only over its table(s) except `deduplicate`. Columns
//! are addressed by export name; an unknown column, or one of the wrong kind,
//! fails that check with a precondition error. Null handling is per check and
//! documented on each function.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::stats::{describe, SummaryStats};
use crate::domain::{CellKind, Record, Table};
use crate::error::{QualityError, Result};

/// Null count and fraction for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnNullRate {
    pub column: &'static str,
    pub nulls: usize,
    pub rows: usize,
    pub fraction: f64,
}

/// Null counts for every column, in schema order
pub fn null_profile<T: Record>(table: &Table<T>) -> Vec<ColumnNullRate> {
    let rows = table.len();
    T::columns()
        .iter()
        .map(|column| {
            let nulls = table
                .iter()
                .filter(|record| record.cell(column.name).is_none())
                .count();
            let fraction = if rows == 0 {
                0.0
            } else {
                nulls as f64 / rows as f64
            };
            ColumnNullRate {
                column: column.name,
                nulls,
                rows,
                fraction,
            }
        })
        .collect()
}

/// Columns whose null fraction is strictly greater than `threshold`
pub fn check_null_rate<T: Record>(table: &Table<T>, threshold: f64) -> Vec<ColumnNullRate> {
    if table.is_empty() {
        return Vec::new();
    }
    null_profile(table)
        .into_iter()
        .filter(|rate| rate.fraction > threshold)
        .collect()
}

fn require_key_columns<T: Record>(table: &Table<T>, key_columns: &[&str]) -> Result<()> {
    if key_columns.is_empty() {
        return Err(QualityError::Config(
            "duplicate detection needs at least one key column".to_string(),
        ));
    }
    for column in key_columns {
        table.require_column(column)?;
    }
    Ok(())
}

/// Composite key of a record; null parts compare equal to each other
fn record_key<T: Record>(record: &T, key_columns: &[&str]) -> Vec<Option<String>> {
    key_columns
        .iter()
        .map(|column| record.cell(column).map(|cell| cell.key()))
        .collect()
}

/// Records whose key was already seen earlier in the table
pub fn find_duplicates<'a, T: Record>(
    table: &'a Table<T>,
    key_columns: &[&str],
) -> Result<Vec<&'a T>> {
    require_key_columns(table, key_columns)?;

    let mut seen = HashSet::new();
    let duplicates: Vec<&T> = table
        .iter()
        .filter(|record| !seen.insert(record_key(*record, key_columns)))
        .collect();

    debug!(
        dataset = T::DATASET.name(),
        keys = ?key_columns,
        duplicates = duplicates.len(),
        "Duplicate key check"
    );
    Ok(duplicates)
}

/// Drop every record whose key was already seen, keeping first occurrences in
/// order. Returns how many records were removed.
pub fn deduplicate<T: Record>(table: &mut Table<T>, key_columns: &[&str]) -> Result<usize> {
    require_key_columns(table, key_columns)?;

    let before = table.len();
    let mut seen = HashSet::new();
    table
        .records_mut()
        .retain(|record| seen.insert(record_key(record, key_columns)));
    Ok(before - table.len())
}

/// Summary statistics plus the records failing the acceptance predicate
#[derive(Debug, Clone)]
pub struct RangeFinding<'a, T> {
    pub summary: Option<SummaryStats>,
    pub failing: Vec<&'a T>,
}

/// Describe a numeric column and return records whose value fails `accept`.
/// Null values are skipped.
pub fn check_range<'a, T, F>(table: &'a Table<T>, column: &str, accept: F) -> Result<RangeFinding<'a, T>>
where
    T: Record,
    F: Fn(f64) -> bool,
{
    table.require_kind(column, "numeric", |kind| kind.is_numeric())?;

    let mut values = Vec::new();
    let mut failing = Vec::new();
    for record in table {
        if let Some(value) = record.cell(column).and_then(|cell| cell.as_f64()) {
            values.push(value);
            if !accept(value) {
                failing.push(record);
            }
        }
    }

    Ok(RangeFinding {
        summary: describe(&values),
        failing,
    })
}

/// Records whose timestamp in `column` is strictly after `reference`.
/// Null values are skipped.
pub fn check_future_dates<'a, T: Record>(
    table: &'a Table<T>,
    column: &str,
    reference: NaiveDateTime,
) -> Result<Vec<&'a T>> {
    table.require_kind(column, "timestamp", |kind| kind == CellKind::Timestamp)?;

    Ok(table
        .iter()
        .filter(|record| {
            record
                .cell(column)
                .and_then(|cell| cell.as_timestamp())
                .map_or(false, |ts| ts > reference)
        })
        .collect())
}

/// `check_future_dates` against the current UTC time
pub fn check_future_dates_now<'a, T: Record>(table: &'a Table<T>, column: &str) -> Result<Vec<&'a T>> {
    check_future_dates(table, column, Utc::now().naive_utc())
}

/// Records whose value is not in `allowed`. With `case_insensitive`, both
/// sides are lower-cased first. Null never satisfies the domain.
pub fn check_domain<'a, T, S>(
    table: &'a Table<T>,
    column: &str,
    allowed: &[S],
    case_insensitive: bool,
) -> Result<Vec<&'a T>>
where
    T: Record,
    S: AsRef<str>,
{
    table.require_column(column)?;

    let fold = |value: &str| {
        if case_insensitive {
            value.to_lowercase()
        } else {
            value.to_string()
        }
    };
    let allowed: HashSet<String> = allowed.iter().map(|v| fold(v.as_ref())).collect();

    Ok(table
        .iter()
        .filter(|record| match record.cell(column) {
            Some(cell) => !allowed.contains(&fold(&cell.to_string())),
            None => true,
        })
        .collect())
}

/// Records with a non-null value that `validator` rejects. Nulls are excluded.
pub fn check_format<'a, T, F>(table: &'a Table<T>, column: &str, validator: F) -> Result<Vec<&'a T>>
where
    T: Record,
    F: Fn(&str) -> bool,
{
    table.require_column(column)?;

    Ok(table
        .iter()
        .filter(|record| {
            record
                .cell(column)
                .map_or(false, |cell| !validator(&cell.to_string()))
        })
        .collect())
}

/// Left records whose `left_key` has no match among `right.right_key`.
/// A null left key is orphaned.
pub fn check_referential_integrity<'a, L, R>(
    left: &'a Table<L>,
    right: &Table<R>,
    left_key: &str,
    right_key: &str,
) -> Result<Vec<&'a L>>
where
    L: Record,
    R: Record,
{
    left.require_column(left_key)?;
    right.require_column(right_key)?;

    let known: HashSet<String> = right
        .iter()
        .filter_map(|record| record.cell(right_key).map(|cell| cell.key()))
        .collect();

    Ok(left
        .iter()
        .filter(|record| match record.cell(left_key) {
            Some(cell) => !known.contains(&cell.key()),
            None => true,
        })
        .collect())
}

/// Distinct values of `column` with their counts, in first-seen order.
/// `None` stands for null.
pub fn distinct_values<T: Record>(table: &Table<T>, column: &str) -> Result<Vec<(Option<String>, usize)>> {
    table.require_column(column)?;

    let mut positions: HashMap<Option<String>, usize> = HashMap::new();
    let mut values: Vec<(Option<String>, usize)> = Vec::new();
    for record in table {
        let value = record.cell(column).map(|cell| cell.to_string());
        match positions.get(&value) {
            Some(&index) => values[index].1 += 1,
            None => {
                positions.insert(value.clone(), values.len());
                values.push((value, 1));
            }
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Receipt, User};
    use crate::pipeline::processing::quality_gate::validators::is_us_state_code;
    use chrono::{Duration, NaiveDate};

    fn user(id: &str, role: Option<&str>, state: Option<&str>) -> User {
        User {
            id: Some(id.to_string()),
            role: role.map(str::to_string),
            state: state.map(str::to_string),
            ..User::default()
        }
    }

    fn receipt(id: &str, user_id: Option<&str>, total_spent: Option<f64>) -> Receipt {
        Receipt {
            id: Some(id.to_string()),
            user_id: user_id.map(str::to_string),
            total_spent,
            ..Receipt::default()
        }
    }

    fn reference_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn ids<T: Record>(records: &[&T]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.record_id().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_null_rate_reports_columns_strictly_above_threshold() {
        // state null in 1 of 4 records
        let table = Table::new(vec![
            user("u1", Some("consumer"), Some("WI")),
            user("u2", Some("consumer"), None),
            user("u3", Some("consumer"), Some("IL")),
            user("u4", Some("consumer"), Some("CA")),
        ]);

        let flagged = check_null_rate(&table, 0.0);
        let state = flagged.iter().find(|r| r.column == "state").unwrap();
        assert_eq!(state.nulls, 1);
        assert!((state.fraction - 0.25).abs() < 1e-12);
        assert!(!flagged.iter().any(|r| r.column == "role" || r.column == "_id"));

        assert!(!check_null_rate(&table, 0.25).iter().any(|r| r.column == "state"));
        assert!(check_null_rate(&table, 0.24).iter().any(|r| r.column == "state"));
    }

    #[test]
    fn test_null_rate_on_empty_table_reports_nothing() {
        let table: Table<User> = Table::new(Vec::new());
        assert!(check_null_rate(&table, 0.0).is_empty());
        assert!(null_profile(&table).iter().all(|r| r.fraction == 0.0));
    }

    #[test]
    fn test_find_duplicates_returns_later_occurrences_only() {
        let table = Table::new(vec![
            user("u1", Some("consumer"), None),
            user("u2", Some("consumer"), None),
            user("u1", Some("fetch-staff"), None),
            user("u1", Some("consumer"), Some("WI")),
        ]);
        let duplicates = find_duplicates(&table, &["_id"]).unwrap();
        assert_eq!(duplicates.len(), 2);
        assert_eq!(duplicates[0].role.as_deref(), Some("fetch-staff"));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_null_keys_count_as_equal() {
        let table = Table::new(vec![User::default(), User::default()]);
        assert_eq!(find_duplicates(&table, &["_id"]).unwrap().len(), 1);
    }

    #[test]
    fn test_deduplicate_keeps_first_seen_in_order_and_is_idempotent() {
        let mut table = Table::new(vec![
            user("u2", Some("consumer"), None),
            user("u1", Some("consumer"), None),
            user("u2", Some("fetch-staff"), None),
            user("u3", Some("consumer"), None),
            user("u1", Some("consumer"), Some("WI")),
        ]);
        let original_len = table.len();

        let removed = deduplicate(&mut table, &["_id"]).unwrap();
        assert_eq!(removed, 2);
        assert!(table.len() <= original_len);
        assert_eq!(
            table.iter().map(|u| u.id.clone().unwrap()).collect::<Vec<_>>(),
            vec!["u2", "u1", "u3"]
        );
        assert_eq!(table.records()[0].role.as_deref(), Some("consumer"));

        let once = table.clone();
        assert_eq!(deduplicate(&mut table, &["_id"]).unwrap(), 0);
        assert_eq!(table, once);
    }

    #[test]
    fn test_duplicate_checks_reject_unknown_or_missing_keys() {
        let mut table = Table::new(vec![user("u1", None, None)]);
        assert!(matches!(
            find_duplicates(&table, &["email"]),
            Err(QualityError::MissingColumn { .. })
        ));
        assert!(deduplicate(&mut table, &[]).is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_range_check_describes_and_flags_negatives() {
        let table = Table::new(vec![
            receipt("r1", Some("u1"), Some(10.0)),
            receipt("r2", Some("u1"), Some(-5.0)),
            receipt("r3", Some("u1"), None),
            receipt("r4", Some("u1"), Some(20.0)),
        ]);
        let finding = check_range(&table, "totalSpent", |v| v >= 0.0).unwrap();
        let summary = finding.summary.unwrap();
        assert_eq!(summary.count, 3);
        assert!((summary.max - 20.0).abs() < 1e-12);
        assert!((summary.min + 5.0).abs() < 1e-12);
        assert_eq!(ids(&finding.failing), vec!["r2"]);
    }

    #[test]
    fn test_range_check_requires_numeric_column() {
        let table = Table::new(vec![receipt("r1", Some("u1"), Some(1.0))]);
        assert!(matches!(
            check_range(&table, "userId", |v| v >= 0.0),
            Err(QualityError::ColumnKind { .. })
        ));
    }

    #[test]
    fn test_future_dates_compare_strictly_and_skip_nulls() {
        let reference = reference_time();
        let table = Table::new(vec![
            Receipt {
                id: Some("later".to_string()),
                purchase_date: Some(reference + Duration::seconds(1)),
                ..Receipt::default()
            },
            Receipt {
                id: Some("earlier".to_string()),
                purchase_date: Some(reference - Duration::seconds(1)),
                ..Receipt::default()
            },
            Receipt {
                id: Some("exact".to_string()),
                purchase_date: Some(reference),
                ..Receipt::default()
            },
            Receipt {
                id: Some("missing".to_string()),
                ..Receipt::default()
            },
        ]);
        let future = check_future_dates(&table, "purchaseDate", reference).unwrap();
        assert_eq!(ids(&future), vec!["later"]);
    }

    #[test]
    fn test_future_dates_now_ignores_past_records() {
        let table = Table::new(vec![Receipt {
            id: Some("old".to_string()),
            purchase_date: Some(reference_time()),
            ..Receipt::default()
        }]);
        assert!(check_future_dates_now(&table, "purchaseDate").unwrap().is_empty());
        assert!(check_future_dates_now(&table, "totalSpent").is_err());
    }

    #[test]
    fn test_domain_check_is_case_insensitive_and_flags_nulls() {
        let table = Table::new(vec![
            user("u1", Some("consumer"), None),
            user("u2", Some("CONSUMER"), None),
            user("u3", Some("fetch-staff"), None),
            user("u4", None, None),
        ]);
        let flagged = check_domain(&table, "role", &["consumer"], true).unwrap();
        assert_eq!(ids(&flagged), vec!["u3", "u4"]);

        let strict = check_domain(&table, "role", &["consumer"], false).unwrap();
        assert_eq!(ids(&strict), vec!["u2", "u3", "u4"]);
    }

    #[test]
    fn test_format_check_skips_nulls() {
        let table = Table::new(vec![
            user("u1", None, Some("WI")),
            user("u2", None, Some("Wisconsin")),
            user("u3", None, None),
            user("u4", None, Some("ZZ")),
        ]);
        let flagged = check_format(&table, "state", is_us_state_code).unwrap();
        assert_eq!(ids(&flagged), vec!["u2", "u4"]);
    }

    #[test]
    fn test_referential_integrity_finds_orphans() {
        let receipts = Table::new(vec![receipt("1", Some("9"), None)]);

        let unrelated = Table::new(vec![user("5", None, None)]);
        let orphans = check_referential_integrity(&receipts, &unrelated, "userId", "_id").unwrap();
        assert_eq!(ids(&orphans), vec!["1"]);

        let owner = Table::new(vec![user("9", None, None)]);
        let orphans = check_referential_integrity(&receipts, &owner, "userId", "_id").unwrap();
        assert!(orphans.is_empty());
    }

    #[test]
    fn test_referential_integrity_treats_null_keys_as_orphans() {
        let receipts = Table::new(vec![receipt("r1", None, None)]);
        let users = Table::new(vec![user("u1", None, None)]);
        let orphans = check_referential_integrity(&receipts, &users, "userId", "_id").unwrap();
        assert_eq!(orphans.len(), 1);
        assert!(check_referential_integrity(&receipts, &users, "ownerId", "_id").is_err());
    }

    #[test]
    fn test_distinct_values_in_first_seen_order() {
        let table = Table::new(vec![
            user("u1", None, Some("WI")),
            user("u2", None, None),
            user("u3", None, Some("IL")),
            user("u4", None, Some("WI")),
        ]);
        let values = distinct_values(&table, "state").unwrap();
        assert_eq!(
            values,
            vec![
                (Some("WI".to_string()), 2),
                (None, 1),
                (Some("IL".to_string()), 1),
            ]
        );
    }
}
