use serde::{Deserialize, Serialize};

use crate::domain::{Dataset, Record};
use crate::error::QualityError;

pub mod checks;
pub mod stats;
pub mod validators;

pub use checks::{
    check_domain, check_format, check_future_dates, check_future_dates_now, check_null_rate,
    check_range, check_referential_integrity, deduplicate, distinct_values, find_duplicates,
    null_profile, ColumnNullRate, RangeFinding,
};
pub use stats::{describe, SummaryStats};
pub use validators::{is_two_letter_code, is_us_state_code};

/// The checks a pipeline run can execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Shape,
    TypeConformance,
    NullRate,
    DuplicateKeys,
    Deduplication,
    Range,
    FutureDate,
    Domain,
    Format,
    ReferentialIntegrity,
    DistinctValues,
}

impl CheckKind {
    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::Shape => "shape",
            CheckKind::TypeConformance => "type_conformance",
            CheckKind::NullRate => "null_rate",
            CheckKind::DuplicateKeys => "duplicate_keys",
            CheckKind::Deduplication => "deduplication",
            CheckKind::Range => "range",
            CheckKind::FutureDate => "future_date",
            CheckKind::Domain => "domain",
            CheckKind::Format => "format",
            CheckKind::ReferentialIntegrity => "referential_integrity",
            CheckKind::DistinctValues => "distinct_values",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|kind| kind.name() == name)
    }

    pub fn all() -> [CheckKind; 11] {
        [
            CheckKind::Shape,
            CheckKind::TypeConformance,
            CheckKind::NullRate,
            CheckKind::DuplicateKeys,
            CheckKind::Deduplication,
            CheckKind::Range,
            CheckKind::FutureDate,
            CheckKind::Domain,
            CheckKind::Format,
            CheckKind::ReferentialIntegrity,
            CheckKind::DistinctValues,
        ]
    }

    /// Whether the check ever flags anything. Profile-only checks (shape,
    /// distinct values, deduplication) cannot be made fatal.
    pub fn can_flag(&self) -> bool {
        !matches!(
            self,
            CheckKind::Shape | CheckKind::DistinctValues | CheckKind::Deduplication
        )
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// Profile output, nothing wrong
    Info,
    /// The check flagged records or columns
    Warning,
    /// The check could not run
    Error,
}

/// Outcome of a whole run once fatal checks are taken into account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityDecision {
    Pass,
    PassWithWarnings,
    Fail,
}

/// One reported outcome of one check on one dataset (and column)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub dataset: Dataset,
    pub check: CheckKind,
    pub column: Option<String>,
    pub severity: Severity,
    pub summary: String,
    /// Records (or columns, for the null-rate check) that violated the check
    pub violations: usize,
    pub details: Vec<String>,
    pub sample_ids: Vec<String>,
}

impl Finding {
    pub fn new(dataset: Dataset, check: CheckKind, column: Option<&str>) -> Self {
        Self {
            dataset,
            check,
            column: column.map(str::to_string),
            severity: Severity::Info,
            summary: String::new(),
            violations: 0,
            details: Vec::new(),
            sample_ids: Vec::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Set the violation count; any violation raises the finding to a warning
    pub fn with_violations(mut self, violations: usize) -> Self {
        self.violations = violations;
        if violations > 0 && self.severity < Severity::Warning {
            self.severity = Severity::Warning;
        }
        self
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    /// Quote up to `limit` ids of offending records
    pub fn with_samples<'a, T, I>(mut self, records: I, limit: usize) -> Self
    where
        T: Record + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        self.sample_ids = records
            .into_iter()
            .take(limit)
            .map(|r| r.record_id().unwrap_or("<no id>").to_string())
            .collect();
        self
    }

    /// Turn the finding into a record of a check that could not run
    pub fn errored(mut self, error: &QualityError) -> Self {
        self.severity = Severity::Error;
        self.summary = format!("check could not run: {}", error);
        self
    }

    pub fn is_violation(&self) -> bool {
        self.severity == Severity::Warning && self.violations > 0
    }
}

/// Pass unless something was flagged; fail when a flagged or errored check
/// is listed as fatal
pub fn decide(findings: &[Finding], fatal: &[CheckKind]) -> QualityDecision {
    let fatal_hit = findings.iter().any(|f| {
        fatal.contains(&f.check) && (f.is_violation() || f.severity == Severity::Error)
    });
    if fatal_hit {
        return QualityDecision::Fail;
    }
    if findings.iter().any(|f| f.severity >= Severity::Warning) {
        return QualityDecision::PassWithWarnings;
    }
    QualityDecision::Pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;

    #[test]
    fn test_violations_raise_severity() {
        let finding = Finding::new(Dataset::Users, CheckKind::Domain, Some("role")).with_violations(3);
        assert_eq!(finding.severity, Severity::Warning);
        assert!(finding.is_violation());

        let clean = Finding::new(Dataset::Users, CheckKind::Domain, Some("role")).with_violations(0);
        assert_eq!(clean.severity, Severity::Info);
    }

    #[test]
    fn test_samples_quote_record_ids() {
        let users = vec![
            User { id: Some("u1".to_string()), ..User::default() },
            User::default(),
            User { id: Some("u3".to_string()), ..User::default() },
        ];
        let finding = Finding::new(Dataset::Users, CheckKind::Domain, None).with_samples(&users, 2);
        assert_eq!(finding.sample_ids, vec!["u1".to_string(), "<no id>".to_string()]);
    }

    #[test]
    fn test_decision_respects_fatal_checks() {
        let flagged = Finding::new(Dataset::Receipts, CheckKind::ReferentialIntegrity, Some("userId"))
            .with_violations(2);
        let info = Finding::new(Dataset::Receipts, CheckKind::Shape, None);

        assert_eq!(decide(&[info.clone()], &[]), QualityDecision::Pass);
        assert_eq!(
            decide(&[info.clone(), flagged.clone()], &[]),
            QualityDecision::PassWithWarnings
        );
        assert_eq!(
            decide(&[info, flagged], &[CheckKind::ReferentialIntegrity]),
            QualityDecision::Fail
        );
    }

    #[test]
    fn test_errored_fatal_check_fails_the_run() {
        let err = QualityError::MissingColumn {
            dataset: "users".to_string(),
            column: "nickname".to_string(),
        };
        let finding = Finding::new(Dataset::Users, CheckKind::Format, Some("nickname")).errored(&err);
        assert_eq!(finding.severity, Severity::Error);
        assert_eq!(decide(&[finding], &[CheckKind::Format]), QualityDecision::Fail);
    }

    #[test]
    fn test_check_names_round_trip() {
        for kind in CheckKind::all() {
            assert_eq!(CheckKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(CheckKind::from_name("vibes"), None);
    }

    #[test]
    fn test_only_flagging_checks_can_be_fatal() {
        assert!(!CheckKind::Shape.can_flag());
        assert!(!CheckKind::DistinctValues.can_flag());
        assert!(!CheckKind::Deduplication.can_flag());
        assert!(CheckKind::TypeConformance.can_flag());
        assert!(CheckKind::ReferentialIntegrity.can_flag());
    }
}
