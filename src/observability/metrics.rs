//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): requests by method, status, outcome
//!   (forwarded, redirected, upstream_error)
//! - `gate_request_duration_seconds` (histogram): latency distribution
//! - `gate_session_lookups_total` (counter): lookups by result (hit, miss,
//!   error); miss = lookup succeeded but the whitelist was empty
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Exporter failures are logged, never fatal; the gate serves without
//!   metrics if the scrape endpoint cannot bind

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled request.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    counter!(
        "gate_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        "gate_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record one session lookup.
pub fn record_session_lookup(result: &'static str) {
    counter!("gate_session_lookups_total", "result" => result).increment(1);
}
