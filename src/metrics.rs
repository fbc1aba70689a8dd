//! Prometheus metrics
//!
//! Without an installed recorder (CLI mode) every call here is a no-op.

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Setup Prometheus metrics exporter
/// Returns a handle that can be used to retrieve metrics
pub fn setup_metrics() -> Result<metrics_exporter_prometheus::PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    tracing::info!("Prometheus metrics exporter installed");

    Ok(handle)
}

/// Record a removed artifact and the bytes it freed
pub fn record_artifact_deleted(size_bytes: u64) {
    metrics::counter!("model_cache_artifacts_deleted_total").increment(1);
    metrics::counter!("model_cache_bytes_freed_total").increment(size_bytes);
}

/// Record a failed removal
pub fn record_delete_failure() {
    metrics::counter!("model_cache_delete_failures_total").increment(1);
}

/// Update total cache size gauge
pub fn update_cache_size(total_bytes: u64) {
    metrics::gauge!("model_cache_total_bytes").set(total_bytes as f64);
}
