// Metrics module for observability
// Describes the counters recorded across the workspace and installs the
// Prometheus recorder served at GET /metrics

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use cho_report::metrics::{NOTICES_FAILED, NOTICES_SENT, REPORTS_SUBMITTED, SUBMISSIONS_CREATED};

/// Installs the global Prometheus recorder. Only one recorder may be
/// installed per process.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Initialize all metric descriptions
/// Should be called once at application startup
pub fn init_metrics() {
    describe_counter!(
        "http_requests_total",
        "Total number of HTTP requests received"
    );
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    describe_counter!(
        SUBMISSIONS_CREATED,
        "Report submissions created by admin batches"
    );
    describe_counter!(
        REPORTS_SUBMITTED,
        "Reports submitted by barangays, labelled by resulting status"
    );
    describe_counter!(NOTICES_SENT, "Pending report notices delivered");
    describe_counter!(NOTICES_FAILED, "Pending report notices that failed to deliver");

    tracing::info!("Metrics initialized");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, started: Instant) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string(), "status" => status.to_string()).increment(1);
    histogram!("http_request_duration_seconds", "method" => method.to_string(), "path" => path.to_string())
        .record(started.elapsed().as_secs_f64());
}
