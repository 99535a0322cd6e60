//! Ingestion Phase Metrics
//!
//! Lines read from each export and the lines the loader had to drop.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct IngestionMetrics;

impl IngestionMetrics {
    /// Record the outcome of loading one export file
    pub fn record_load(dataset: &'static str, records: usize, malformed: usize, skipped: usize) {
        ::metrics::counter!(phase_metric!(counter, "ingestion", "records_loaded"), "dataset" => dataset)
            .increment(records as u64);
        ::metrics::counter!(phase_metric!(counter, "ingestion", "malformed_lines"), "dataset" => dataset)
            .increment(malformed as u64);
        ::metrics::counter!(phase_metric!(counter, "ingestion", "skipped_lines"), "dataset" => dataset)
            .increment(skipped as u64);
    }

    pub fn record_load_failure(dataset: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "ingestion", "load_failures"), "dataset" => dataset)
            .increment(1);
    }
}

impl PhaseMetrics for IngestionMetrics {
    fn register_metrics() {
        use metrics::counter;

        let _ = counter!(phase_metric!(counter, "ingestion", "records_loaded"));
        let _ = counter!(phase_metric!(counter, "ingestion", "malformed_lines"));
        let _ = counter!(phase_metric!(counter, "ingestion", "skipped_lines"));
        let _ = counter!(phase_metric!(counter, "ingestion", "load_failures"));
    }

    fn phase_name() -> &'static str {
        "ingestion"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "ingestion", "records_loaded"),
                metric_type: MetricType::Counter,
                help: "Records parsed from export files",
                labels: vec!["dataset"],
            },
            MetricDoc {
                name: phase_metric!(counter, "ingestion", "malformed_lines"),
                metric_type: MetricType::Counter,
                help: "Lines dropped because they were not a JSON object",
                labels: vec!["dataset"],
            },
            MetricDoc {
                name: phase_metric!(counter, "ingestion", "skipped_lines"),
                metric_type: MetricType::Counter,
                help: "Leading lines skipped by configuration",
                labels: vec!["dataset"],
            },
            MetricDoc {
                name: phase_metric!(counter, "ingestion", "load_failures"),
                metric_type: MetricType::Counter,
                help: "Export files that could not be read",
                labels: vec!["dataset"],
            },
        ]
    }
}
