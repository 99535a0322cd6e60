// Quality pipeline: ingestion, normalization, checks and reporting

pub mod ingestion;
pub mod processing;
pub mod report;

use std::time::Instant;

use chrono::{NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::constants::{
    ID_COLUMN, PURCHASED_ITEM_COUNT_COLUMN, RECEIPT_STATUS_COLUMN, ROLE_COLUMN, STATE_COLUMN,
    TOTAL_SPENT_COLUMN, USER_ID_COLUMN,
};
use crate::domain::{Brand, CellKind, Dataset, Receipt, Record, Table, User};
use crate::error::Result;
use crate::metrics::QualityGateMetrics;
use crate::pipeline::ingestion::load_dataset;
use crate::pipeline::processing::normalize::{normalize_dataset, TypeMismatch};
use crate::pipeline::processing::quality_gate::{
    check_domain, check_format, check_future_dates, check_null_rate, check_range,
    check_referential_integrity, decide, deduplicate, distinct_values, find_duplicates,
    is_us_state_code, CheckKind, Finding, Severity,
};
use crate::pipeline::report::{DatasetSummary, QualityReport};

/// The three normalized exports a run checks
#[derive(Debug, Clone)]
pub struct Tables {
    pub receipts: Table<Receipt>,
    pub brands: Table<Brand>,
    pub users: Table<User>,
}

/// Parameters of the check sequence, resolved from configuration
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub null_threshold: f64,
    pub reference_time: NaiveDateTime,
    pub sample_size: usize,
    pub allowed_receipt_statuses: Vec<String>,
    pub allowed_roles: Vec<String>,
}

impl CheckOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        let checks = &config.checks;
        Ok(Self {
            null_threshold: checks.null_threshold,
            reference_time: checks
                .reference_time()?
                .unwrap_or_else(|| Utc::now().naive_utc()),
            sample_size: checks.sample_size,
            allowed_receipt_statuses: checks.allowed_receipt_statuses.clone(),
            allowed_roles: checks.allowed_roles.clone(),
        })
    }
}

/// Loader → Normalizer → Validator over the configured exports
pub struct QualityPipeline {
    config: Config,
}

impl QualityPipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every check and build the report. Only unreadable exports or
    /// invalid configuration abort the run.
    #[instrument(skip(self))]
    pub fn run(&self) -> Result<QualityReport> {
        let started = Instant::now();
        self.config.validate()?;
        let options = CheckOptions::from_config(&self.config)?;

        info!("Step 1: loading and normalizing exports");
        let (receipts, receipts_summary, receipts_types) =
            self.load_table::<Receipt>(options.sample_size)?;
        let (brands, brands_summary, brands_types) = self.load_table::<Brand>(options.sample_size)?;
        let (users, users_summary, users_types) = self.load_table::<User>(options.sample_size)?;
        let mut tables = Tables {
            receipts,
            brands,
            users,
        };

        info!("Step 2: running quality checks");
        let mut findings = vec![receipts_types, brands_types, users_types];
        for finding in &findings {
            record_finding_metrics(finding);
        }
        findings.extend(run_checks(&mut tables, &options));

        let mut datasets = vec![receipts_summary, brands_summary, users_summary];
        for summary in &mut datasets {
            summary.rows_checked = match summary.dataset {
                Dataset::Receipts => tables.receipts.len(),
                Dataset::Brands => tables.brands.len(),
                Dataset::Users => tables.users.len(),
            };
        }

        let decision = decide(&findings, &self.config.checks.fatal);
        QualityGateMetrics::record_run_duration(started.elapsed().as_secs_f64());
        info!(
            findings = findings.len(),
            decision = ?decision,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Quality run finished"
        );

        Ok(QualityReport {
            reference_time: options.reference_time,
            datasets,
            findings,
            decision,
            fatal_checks: self.config.checks.fatal.clone(),
        })
    }

    /// Load and normalize one export. The third value is its
    /// type-conformance finding, which only mapping can observe.
    fn load_table<T>(&self, sample_size: usize) -> Result<(Table<T>, DatasetSummary, Finding)>
    where
        T: Record + DeserializeOwned,
    {
        let source = self.config.datasets.resolve(T::DATASET);
        let loaded = load_dataset(&source)?;
        let report = loaded.report.clone();
        let normalized = normalize_dataset::<T>(loaded);

        let summary = DatasetSummary {
            dataset: T::DATASET,
            path: source.path,
            records_loaded: normalized.table.len() + normalized.unmapped,
            lines_skipped: report.lines_skipped,
            malformed_lines: report.malformed_lines,
            date_failures: normalized.stats.date_failures,
            type_mismatches: normalized.type_mismatch_count(),
            unmapped_records: normalized.unmapped,
            rows_checked: normalized.table.len(),
        };
        let finding = type_conformance_finding(T::DATASET, &normalized.type_mismatches, sample_size);
        Ok((normalized.table, summary, finding))
    }
}

/// Run the full check sequence. Users are deduplicated by id part-way
/// through; every other check is read-only. A check whose precondition fails
/// becomes an error finding and the sequence carries on.
pub fn run_checks(tables: &mut Tables, options: &CheckOptions) -> Vec<Finding> {
    let mut findings = Vec::new();

    // Shape and nulls
    findings.push(shape_finding(&tables.receipts));
    findings.push(shape_finding(&tables.brands));
    findings.push(shape_finding(&tables.users));
    findings.push(null_rate_finding(&tables.receipts, options.null_threshold));
    findings.push(null_rate_finding(&tables.brands, options.null_threshold));
    findings.push(null_rate_finding(&tables.users, options.null_threshold));

    // Duplicates, then drop duplicate users
    findings.push(duplicate_finding(&tables.receipts, options.sample_size));
    findings.push(duplicate_finding(&tables.brands, options.sample_size));
    findings.push(duplicate_finding(&tables.users, options.sample_size));
    findings.push(deduplication_finding(&mut tables.users));

    // Numeric ranges
    findings.push(range_finding(&tables.receipts, TOTAL_SPENT_COLUMN, options.sample_size));
    findings.push(range_finding(
        &tables.receipts,
        PURCHASED_ITEM_COUNT_COLUMN,
        options.sample_size,
    ));

    // No timestamp may lie in the future
    findings.extend(future_date_findings(&tables.receipts, options));
    findings.extend(future_date_findings(&tables.users, options));

    // Value domains and formats
    findings.push(distinct_finding(&tables.receipts, RECEIPT_STATUS_COLUMN));
    findings.push(domain_finding(
        &tables.receipts,
        RECEIPT_STATUS_COLUMN,
        &options.allowed_receipt_statuses,
        false,
        options.sample_size,
    ));
    findings.push(distinct_finding(&tables.users, STATE_COLUMN));
    findings.push(state_format_finding(&tables.users, options.sample_size));
    findings.push(domain_finding(
        &tables.users,
        ROLE_COLUMN,
        &options.allowed_roles,
        true,
        options.sample_size,
    ));

    // Orphaned receipts
    findings.push(orphan_finding(&tables.receipts, &tables.users, options.sample_size));

    for finding in &findings {
        record_finding_metrics(finding);
    }

    findings
}

fn record_finding_metrics(finding: &Finding) {
    if finding.severity == Severity::Error {
        warn!(
            dataset = finding.dataset.name(),
            check = finding.check.name(),
            "{}",
            finding.summary
        );
        QualityGateMetrics::record_check_error(finding.dataset.name(), finding.check.name());
    } else {
        QualityGateMetrics::record_check(
            finding.dataset.name(),
            finding.check.name(),
            finding.violations,
        );
    }
}

/// One finding per dataset: values present in the export that did not match
/// their column's type and were nulled during mapping
pub fn type_conformance_finding(
    dataset: Dataset,
    mismatches: &[TypeMismatch],
    sample_size: usize,
) -> Finding {
    let total: usize = mismatches.iter().map(|m| m.count).sum();
    let details = mismatches
        .iter()
        .map(|m| format!("{}: {} values not readable as {}", m.column, m.count, m.expected))
        .collect();
    let mut samples: Vec<String> = Vec::new();
    for id in mismatches.iter().flat_map(|m| m.record_ids.iter()) {
        if samples.len() == sample_size {
            break;
        }
        if !samples.contains(id) {
            samples.push(id.clone());
        }
    }

    let mut finding = Finding::new(dataset, CheckKind::TypeConformance, None)
        .with_violations(total)
        .with_summary(format!(
            "{} values in {} columns did not match the column type and were nulled",
            total,
            mismatches.len()
        ))
        .with_details(details);
    finding.sample_ids = samples;
    finding
}

fn percent(fraction: f64) -> f64 {
    (fraction * 10_000.0).round() / 100.0
}

fn shape_finding<T: Record>(table: &Table<T>) -> Finding {
    let (rows, columns) = table.shape();
    Finding::new(T::DATASET, CheckKind::Shape, None)
        .with_summary(format!("{} has {} rows and {} columns", T::DATASET, rows, columns))
}

fn null_rate_finding<T: Record>(table: &Table<T>, threshold: f64) -> Finding {
    let flagged = check_null_rate(table, threshold);
    let details = flagged
        .iter()
        .map(|rate| {
            format!(
                "{}: {}% of this column is NULL ({} of {})",
                rate.column,
                percent(rate.fraction),
                rate.nulls,
                rate.rows
            )
        })
        .collect();
    Finding::new(T::DATASET, CheckKind::NullRate, None)
        .with_violations(flagged.len())
        .with_summary(format!(
            "{} of {} columns are null in more than {}% of records",
            flagged.len(),
            T::columns().len(),
            percent(threshold)
        ))
        .with_details(details)
}

fn duplicate_finding<T: Record>(table: &Table<T>, sample_size: usize) -> Finding {
    let finding = Finding::new(T::DATASET, CheckKind::DuplicateKeys, Some(ID_COLUMN));
    match find_duplicates(table, &[ID_COLUMN]) {
        Ok(duplicates) => finding
            .with_violations(duplicates.len())
            .with_summary(format!("{} records repeat an earlier {}", duplicates.len(), ID_COLUMN))
            .with_samples(duplicates, sample_size),
        Err(e) => finding.errored(&e),
    }
}

fn deduplication_finding<T: Record>(table: &mut Table<T>) -> Finding {
    let finding = Finding::new(T::DATASET, CheckKind::Deduplication, Some(ID_COLUMN));
    let before = table.len();
    match deduplicate(table, &[ID_COLUMN]) {
        Ok(removed) => {
            let remaining = find_duplicates(table, &[ID_COLUMN]).map(|d| d.len()).unwrap_or(0);
            debug!(dataset = T::DATASET.name(), removed, remaining, "Deduplicated");
            QualityGateMetrics::record_deduplicated(T::DATASET.name(), removed);
            finding
                .with_summary(format!(
                    "removed {} duplicate records ({} -> {} rows)",
                    removed,
                    before,
                    table.len()
                ))
                .with_details(vec![format!("{} duplicates remain after deduplication", remaining)])
        }
        Err(e) => finding.errored(&e),
    }
}

fn range_finding<T: Record>(table: &Table<T>, column: &str, sample_size: usize) -> Finding {
    let finding = Finding::new(T::DATASET, CheckKind::Range, Some(column));
    match check_range(table, column, |value| value >= 0.0) {
        Ok(range) => {
            let details = match &range.summary {
                Some(s) => vec![
                    format!("count {}  mean {:.2}  std {}", s.count, s.mean, format_std(s.std_dev)),
                    format!(
                        "min {:.2}  25% {:.2}  50% {:.2}  75% {:.2}  max {:.2}",
                        s.min, s.q1, s.median, s.q3, s.max
                    ),
                ],
                None => vec!["no non-null values".to_string()],
            };
            finding
                .with_violations(range.failing.len())
                .with_summary(format!("{} records hold a negative {}", range.failing.len(), column))
                .with_details(details)
                .with_samples(range.failing, sample_size)
        }
        Err(e) => finding.errored(&e),
    }
}

fn format_std(std_dev: Option<f64>) -> String {
    std_dev.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}

fn future_date_findings<T: Record>(table: &Table<T>, options: &CheckOptions) -> Vec<Finding> {
    T::columns()
        .iter()
        .filter(|column| column.kind == CellKind::Timestamp)
        .map(|column| {
            let finding = Finding::new(T::DATASET, CheckKind::FutureDate, Some(column.name));
            match check_future_dates(table, column.name, options.reference_time) {
                Ok(future) => finding
                    .with_violations(future.len())
                    .with_summary(format!("{} records dated in the future", future.len()))
                    .with_samples(future, options.sample_size),
                Err(e) => finding.errored(&e),
            }
        })
        .collect()
}

fn distinct_finding<T: Record>(table: &Table<T>, column: &str) -> Finding {
    let finding = Finding::new(T::DATASET, CheckKind::DistinctValues, Some(column));
    match distinct_values(table, column) {
        Ok(values) => {
            let details = values
                .iter()
                .map(|(value, count)| format!("{}: {}", value.as_deref().unwrap_or("<null>"), count))
                .collect();
            finding
                .with_summary(format!("{} distinct values", values.len()))
                .with_details(details)
        }
        Err(e) => finding.errored(&e),
    }
}

fn domain_finding<T: Record>(
    table: &Table<T>,
    column: &str,
    allowed: &[String],
    case_insensitive: bool,
    sample_size: usize,
) -> Finding {
    let finding = Finding::new(T::DATASET, CheckKind::Domain, Some(column));
    match check_domain(table, column, allowed, case_insensitive) {
        Ok(outside) => finding
            .with_violations(outside.len())
            .with_summary(format!(
                "{} records outside [{}]{}",
                outside.len(),
                allowed.join(", "),
                if case_insensitive { " (case-insensitive)" } else { "" }
            ))
            .with_samples(outside, sample_size),
        Err(e) => finding.errored(&e),
    }
}

fn state_format_finding(users: &Table<User>, sample_size: usize) -> Finding {
    let finding = Finding::new(Dataset::Users, CheckKind::Format, Some(STATE_COLUMN));
    match check_format(users, STATE_COLUMN, is_us_state_code) {
        Ok(invalid) => finding
            .with_violations(invalid.len())
            .with_summary(format!("{} records hold an invalid 2-letter state code", invalid.len()))
            .with_samples(invalid, sample_size),
        Err(e) => finding.errored(&e),
    }
}

fn orphan_finding(receipts: &Table<Receipt>, users: &Table<User>, sample_size: usize) -> Finding {
    let finding = Finding::new(
        Dataset::Receipts,
        CheckKind::ReferentialIntegrity,
        Some(USER_ID_COLUMN),
    );
    match check_referential_integrity(receipts, users, USER_ID_COLUMN, ID_COLUMN) {
        Ok(orphans) => finding
            .with_violations(orphans.len())
            .with_summary(format!(
                "{} receipts reference a {} not found in users",
                orphans.len(),
                USER_ID_COLUMN
            ))
            .with_details(
                orphans
                    .iter()
                    .take(sample_size)
                    .map(|r| {
                        format!(
                            "{} -> {}",
                            r.id.as_deref().unwrap_or("<no id>"),
                            r.user_id.as_deref().unwrap_or("<null>")
                        )
                    })
                    .collect(),
            )
            .with_samples(orphans, sample_size),
        Err(e) => finding.errored(&e),
    }
}
