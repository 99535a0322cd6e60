//! Quality Gate Phase Metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct QualityGateMetrics;

impl QualityGateMetrics {
    /// Record one executed check and how many records it flagged
    pub fn record_check(dataset: &'static str, check: &'static str, violations: usize) {
        ::metrics::counter!(phase_metric!(counter, "quality_gate", "checks_run"), "dataset" => dataset, "check" => check)
            .increment(1);
        ::metrics::counter!(phase_metric!(counter, "quality_gate", "violations"), "dataset" => dataset, "check" => check)
            .increment(violations as u64);
    }

    /// A check that could not run because its precondition failed
    pub fn record_check_error(dataset: &'static str, check: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "quality_gate", "check_errors"), "dataset" => dataset, "check" => check)
            .increment(1);
    }

    pub fn record_deduplicated(dataset: &'static str, removed: usize) {
        ::metrics::counter!(phase_metric!(counter, "quality_gate", "records_deduplicated"), "dataset" => dataset)
            .increment(removed as u64);
    }

    pub fn record_run_duration(duration_secs: f64) {
        ::metrics::histogram!(phase_metric!(histogram, "quality_gate", "run_duration_seconds"))
            .record(duration_secs);
    }
}

impl PhaseMetrics for QualityGateMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "quality_gate", "checks_run"));
        let _ = counter!(phase_metric!(counter, "quality_gate", "violations"));
        let _ = counter!(phase_metric!(counter, "quality_gate", "check_errors"));
        let _ = counter!(phase_metric!(counter, "quality_gate", "records_deduplicated"));
        let _ = histogram!(phase_metric!(histogram, "quality_gate", "run_duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "quality_gate"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "quality_gate", "checks_run"),
                metric_type: MetricType::Counter,
                help: "Quality checks executed",
                labels: vec!["dataset", "check"],
            },
            MetricDoc {
                name: phase_metric!(counter, "quality_gate", "violations"),
                metric_type: MetricType::Counter,
                help: "Records or columns flagged by quality checks",
                labels: vec!["dataset", "check"],
            },
            MetricDoc {
                name: phase_metric!(counter, "quality_gate", "check_errors"),
                metric_type: MetricType::Counter,
                help: "Checks skipped because a precondition failed",
                labels: vec!["dataset", "check"],
            },
            MetricDoc {
                name: phase_metric!(counter, "quality_gate", "records_deduplicated"),
                metric_type: MetricType::Counter,
                help: "Duplicate records removed",
                labels: vec!["dataset"],
            },
            MetricDoc {
                name: phase_metric!(histogram, "quality_gate", "run_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Wall time of a full pipeline run",
                labels: vec![],
            },
        ]
    }
}
