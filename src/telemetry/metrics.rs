//! Prometheus recorder setup and metric descriptions

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Latency buckets in seconds, with sub-millisecond resolution for cheap routes
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Install the global Prometheus recorder and return a handle for rendering.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .set_buckets(LATENCY_BUCKETS)
        .context("invalid histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register HELP/TYPE lines so every metric shows up from startup.
pub fn describe_metrics() {
    describe_counter!("cadesk_http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "cadesk_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "cadesk_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    describe_counter!("cadesk_auth_login_total", "Login attempts by result");
    describe_counter!(
        "cadesk_documents_uploaded_total",
        "Number of document files stored"
    );
    describe_counter!("cadesk_invoices_created_total", "Number of invoices issued");

    counter!("cadesk_auth_login_total", "result" => "success").absolute(0);
    counter!("cadesk_auth_login_total", "result" => "failure").absolute(0);
    counter!("cadesk_documents_uploaded_total").absolute(0);
    counter!("cadesk_invoices_created_total").absolute(0);
    gauge!("cadesk_http_requests_in_flight").set(0.0);
}
