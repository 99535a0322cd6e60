//! Run metrics for the quality pipeline
//!
//! Each pipeline phase owns its metric names in a dedicated submodule. Nothing
//! is exported unless `init_metrics` installs the Prometheus recorder; without
//! it the `metrics` macros are no-ops.

pub mod ingestion;
pub mod normalize;
pub mod quality_gate;

pub use ingestion::IngestionMetrics;
pub use normalize::NormalizeMetrics;
pub use quality_gate::QualityGateMetrics;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

use crate::error::{QualityError, Result};

/// Trait for phase-specific metrics collections
pub trait PhaseMetrics {
    /// Pre-register every metric of the phase so snapshots list them even at zero
    fn register_metrics();

    fn phase_name() -> &'static str;

    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
    pub labels: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Builds metric names as rq_{phase}_{metric_name}[_total]
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("rq_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("rq_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("rq_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;

/// Install the Prometheus recorder and register every phase's metrics.
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| QualityError::Config(format!("Failed to install metrics recorder: {}", e)))?;
    let registered = register_all_metrics();
    info!("Metrics recorder installed, {} metrics registered", registered);
    Ok(handle)
}

/// Register all phase metrics, warning on name collisions. Returns the count.
pub fn register_all_metrics() -> usize {
    let mut all_metrics: HashMap<&'static str, &'static str> = HashMap::new();
    register_phase::<IngestionMetrics>(&mut all_metrics);
    register_phase::<NormalizeMetrics>(&mut all_metrics);
    register_phase::<QualityGateMetrics>(&mut all_metrics);
    all_metrics.len()
}

fn register_phase<T: PhaseMetrics>(all_metrics: &mut HashMap<&'static str, &'static str>) {
    T::register_metrics();
    for doc in T::metrics_documentation() {
        if let Some(existing_phase) = all_metrics.insert(doc.name, T::phase_name()) {
            warn!(
                "Metric name conflict: '{}' defined by both '{}' and '{}'",
                doc.name,
                existing_phase,
                T::phase_name()
            );
        }
    }
}

/// Render the current snapshot in Prometheus text format to `path`
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    fs::write(path, handle.render()).map_err(|e| QualityError::io(path, e))?;
    info!("Metrics snapshot written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_are_unique_across_phases() {
        let mut names = HashSet::new();
        let docs = IngestionMetrics::metrics_documentation()
            .into_iter()
            .chain(NormalizeMetrics::metrics_documentation())
            .chain(QualityGateMetrics::metrics_documentation());
        for doc in docs {
            assert!(doc.name.starts_with("rq_"), "{}", doc.name);
            assert!(names.insert(doc.name), "duplicate metric {}", doc.name);
            if doc.metric_type == MetricType::Counter {
                assert!(doc.name.ends_with("_total"), "{}", doc.name);
            }
        }
    }

    #[test]
    fn test_registration_without_recorder_is_harmless() {
        assert_eq!(register_all_metrics(), {
            IngestionMetrics::metrics_documentation().len()
                + NormalizeMetrics::metrics_documentation().len()
                + QualityGateMetrics::metrics_documentation().len()
        });
    }
}
