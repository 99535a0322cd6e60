//! Normalize Phase Metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct NormalizeMetrics;

impl NormalizeMetrics {
    pub fn record_batch(
        dataset: &'static str,
        ids_unwrapped: usize,
        dates_converted: usize,
        date_failures: usize,
        unmapped: usize,
        type_mismatches: usize,
    ) {
        ::metrics::counter!(phase_metric!(counter, "normalize", "ids_unwrapped"), "dataset" => dataset)
            .increment(ids_unwrapped as u64);
        ::metrics::counter!(phase_metric!(counter, "normalize", "dates_converted"), "dataset" => dataset)
            .increment(dates_converted as u64);
        ::metrics::counter!(phase_metric!(counter, "normalize", "date_failures"), "dataset" => dataset)
            .increment(date_failures as u64);
        ::metrics::counter!(phase_metric!(counter, "normalize", "unmapped_records"), "dataset" => dataset)
            .increment(unmapped as u64);
        ::metrics::counter!(phase_metric!(counter, "normalize", "type_mismatches"), "dataset" => dataset)
            .increment(type_mismatches as u64);
    }
}

impl PhaseMetrics for NormalizeMetrics {
    fn register_metrics() {
        use metrics::counter;

        let _ = counter!(phase_metric!(counter, "normalize", "ids_unwrapped"));
        let _ = counter!(phase_metric!(counter, "normalize", "dates_converted"));
        let _ = counter!(phase_metric!(counter, "normalize", "date_failures"));
        let _ = counter!(phase_metric!(counter, "normalize", "unmapped_records"));
        let _ = counter!(phase_metric!(counter, "normalize", "type_mismatches"));
    }

    fn phase_name() -> &'static str {
        "normalize"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "normalize", "ids_unwrapped"),
                metric_type: MetricType::Counter,
                help: "Identifier and reference wrappers flattened to scalars",
                labels: vec!["dataset"],
            },
            MetricDoc {
                name: phase_metric!(counter, "normalize", "dates_converted"),
                metric_type: MetricType::Counter,
                help: "Epoch-millisecond dates converted to timestamps",
                labels: vec!["dataset"],
            },
            MetricDoc {
                name: phase_metric!(counter, "normalize", "date_failures"),
                metric_type: MetricType::Counter,
                help: "Date wrappers that could not be converted and were nulled",
                labels: vec!["dataset"],
            },
            MetricDoc {
                name: phase_metric!(counter, "normalize", "unmapped_records"),
                metric_type: MetricType::Counter,
                help: "Records that could not be mapped onto their typed shape",
                labels: vec!["dataset"],
            },
            MetricDoc {
                name: phase_metric!(counter, "normalize", "type_mismatches"),
                metric_type: MetricType::Counter,
                help: "Present values nulled because they did not match their column type",
                labels: vec!["dataset"],
            },
        ]
    }
}
