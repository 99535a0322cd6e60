use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::constants::TIMESTAMP_FORMAT;
use crate::domain::Dataset;
use crate::error::Result;
use crate::pipeline::processing::quality_gate::{CheckKind, Finding, QualityDecision, Severity};

/// Load and normalization figures for one export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub dataset: Dataset,
    pub path: PathBuf,
    pub records_loaded: usize,
    pub lines_skipped: usize,
    pub malformed_lines: Vec<usize>,
    pub date_failures: usize,
    /// Present values nulled because they did not match their column type
    pub type_mismatches: usize,
    pub unmapped_records: usize,
    /// Rows left for checking, after any deduplication
    pub rows_checked: usize,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    #[serde(serialize_with = "serialize_timestamp")]
    pub reference_time: NaiveDateTime,
    pub datasets: Vec<DatasetSummary>,
    pub findings: Vec<Finding>,
    pub decision: QualityDecision,
    /// Checks whose violations fail the run
    pub fatal_checks: Vec<CheckKind>,
}

fn serialize_timestamp<S>(ts: &NaiveDateTime, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
}

impl QualityReport {
    pub fn findings_for(&self, dataset: Dataset, check: CheckKind) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(move |f| f.dataset == dataset && f.check == check)
    }

    pub fn flagged_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_violation()).count()
    }

    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }

    pub fn is_failure(&self) -> bool {
        self.decision == QualityDecision::Fail
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text report, one section per finding
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "📋 Data quality report");
        let _ = writeln!(
            out,
            "   Reference time: {}",
            self.reference_time.format(TIMESTAMP_FORMAT)
        );

        let _ = writeln!(out, "\n📥 Datasets");
        for summary in &self.datasets {
            let _ = writeln!(
                out,
                "   {}: {} records from {} ({} skipped, {} malformed, {} date failures, {} type mismatches, {} unmapped, {} checked)",
                summary.dataset,
                summary.records_loaded,
                summary.path.display(),
                summary.lines_skipped,
                summary.malformed_lines.len(),
                summary.date_failures,
                summary.type_mismatches,
                summary.unmapped_records,
                summary.rows_checked,
            );
        }

        for finding in &self.findings {
            let marker = match finding.severity {
                Severity::Info => "INFO",
                Severity::Warning => "WARN",
                Severity::Error => "ERROR",
            };
            let scope = match &finding.column {
                Some(column) => format!("{} / {} / {}", finding.dataset, finding.check, column),
                None => format!("{} / {}", finding.dataset, finding.check),
            };
            let _ = writeln!(out, "\n── {} ──", scope);
            let _ = writeln!(out, "[{}] {}", marker, finding.summary);
            for line in &finding.details {
                let _ = writeln!(out, "   {}", line);
            }
            if !finding.sample_ids.is_empty() {
                let _ = writeln!(out, "   sample ids: {}", finding.sample_ids.join(", "));
            }
        }

        let verdict = match self.decision {
            QualityDecision::Pass => "✅ PASS",
            QualityDecision::PassWithWarnings => "⚠️  PASS WITH WARNINGS",
            QualityDecision::Fail => "❌ FAIL",
        };
        let _ = writeln!(
            out,
            "\n{} ({} findings, {} flagged, {} errors)",
            verdict,
            self.findings.len(),
            self.flagged_count(),
            self.error_count()
        );
        out
    }
}
