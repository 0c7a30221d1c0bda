//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pulp_requests_total` (counter): requests by method, route, status
//! - `pulp_request_duration_seconds` (histogram): time spent in the chain
//! - `pulp_throttled_total` (counter): requests rejected by the throttle
//! - `pulp_recovered_total` (counter): faults converted to 500 by recovery
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests and
//!   embedders that skip `init_metrics` pay nothing
//! - Route label is the template, not the raw path, to bound cardinality

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics recorder"),
    }
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        "pulp_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "pulp_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_throttled(route: &str) {
    metrics::counter!("pulp_throttled_total", "route" => route.to_string()).increment(1);
}

pub fn record_recovered(kind: &'static str) {
    metrics::counter!("pulp_recovered_total", "kind" => kind).increment(1);
}
