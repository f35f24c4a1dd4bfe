//! Prometheus metrics for the authentication service.
//!
//! Metrics are exposed in Prometheus text format on a standalone listener
//! (enabled via `METRICS_BIND`) for scraping by monitoring systems.

#![allow(dead_code)] // Recording helpers are called from hot paths only.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize the Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

/// Record an authentication attempt outcome.
pub fn auth_attempts_total(endpoint: &str, success: bool) {
    metrics::counter!("auth_attempts_total",
        "endpoint" => endpoint.to_string(),
        "success" => success.to_string()
    )
    .increment(1);
}

/// Increment the hasher back-pressure counter.
pub fn hasher_queue_rejections_total() {
    metrics::counter!("hasher_queue_rejections_total").increment(1);
}

/// Increment the rate-limit rejection counter.
pub fn rate_limit_hits_total() {
    metrics::counter!("rate_limit_hits_total").increment(1);
}

/// Increment the token revocation counter.
pub fn tokens_revoked_total() {
    metrics::counter!("tokens_revoked_total").increment(1);
}
