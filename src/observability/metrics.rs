//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, status
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_rate_limited_total` (counter): quota rejections by route
//! - `gateway_upstream_errors_total` (counter): failures by category
//! - `gateway_quota_clients` (gauge): tracked quota records

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(route: &'static str) {
    metrics::counter!("gateway_rate_limited_total", "route" => route).increment(1);
}

pub fn record_upstream_error(category: &'static str) {
    metrics::counter!("gateway_upstream_errors_total", "category" => category).increment(1);
}

pub fn record_quota_clients(count: usize) {
    metrics::gauge!("gateway_quota_clients").set(count as f64);
}
