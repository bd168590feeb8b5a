//! Observability utilities for the compliance platform.
//!
//! Provides a process-wide Prometheus metrics recorder plus descriptions for
//! the metrics the expiry scans and notification fan-out record.
//!
//! # Example
//!
//! ```rust,ignore
//! observability::init_metrics();
//! observability::counter!("expiry_scan_runs_total", "kind" => "approaching").increment(1);
//! ```

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// Call once at application startup; later calls return the existing handle.
pub fn init_metrics() -> &'static PrometheusHandle {
    METRICS_HANDLE.get_or_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("Failed to install Prometheus recorder");

        info!("Prometheus metrics recorder initialized");

        register_metric_descriptions();

        handle
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Register metric descriptions for documentation
fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_histogram;

    describe_counter!(
        "expiry_scan_runs_total",
        "Expiry scan runs by kind (approaching/expired)"
    );
    describe_counter!(
        "expiry_scan_notified_total",
        "Certifications that triggered a notification, by kind"
    );
    describe_counter!(
        "expiry_scan_skipped_total",
        "Certifications skipped during a scan (missing profile/email/date)"
    );
    describe_counter!(
        "expiry_scan_errors_total",
        "Per-certification failures tolerated during a scan"
    );
    describe_histogram!(
        "expiry_scan_duration_seconds",
        "Wall-clock duration of one expiry scan run"
    );

    describe_counter!(
        "notification_records_total",
        "Persisted notification records by event kind"
    );
    describe_counter!(
        "notification_deliveries_total",
        "Delivery gateway attempts by outcome (accepted/failed)"
    );
}
