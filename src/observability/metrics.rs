//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, upstream and auth failures)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_upstream_errors_total` (counter): failed forwards by service, kind
//! - `gateway_auth_failures_total` (counter): rejected credentials by reason
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op, so tests need no setup
//! - Status is recorded as a label, not per-status metric names

use std::net::SocketAddr;
use std::sync::Once;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

static DESCRIBE: Once = Once::new();

/// Start the Prometheus exporter on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    DESCRIBE.call_once(|| {
        describe_counter!("gateway_requests_total", "Total requests handled");
        describe_histogram!(
            "gateway_request_duration_seconds",
            "Request latency in seconds"
        );
        describe_counter!(
            "gateway_upstream_errors_total",
            "Upstream forwards that ended in 502 or 504"
        );
        describe_counter!(
            "gateway_auth_failures_total",
            "Requests rejected by authentication"
        );
    });

    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_owned(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_owned()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error(service: &str, kind: &'static str) {
    counter!(
        "gateway_upstream_errors_total",
        "service" => service.to_owned(),
        "kind" => kind
    )
    .increment(1);
}

pub fn record_auth_failure(reason: &'static str) {
    counter!("gateway_auth_failures_total", "reason" => reason).increment(1);
}
