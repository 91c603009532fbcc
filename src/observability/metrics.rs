//! Metrics collection and exposition.
//!
//! # Metrics
//! - `shrink_requests_total` (counter): responses by endpoint and status
//! - `shrink_request_duration_seconds` (histogram): dispatcher latency
//! - `fetch_requests_total` (counter): remote fetch outcomes
//! - `fetch_cache_total` (counter): page cache hits and misses
//! - `fetch_rate_limited_total` (counter): fetches that had to wait for a token
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! deployments without the Prometheus endpoint pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request on one of the API endpoints.
pub fn record_request(endpoint: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "shrink_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("shrink_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of a remote fetch ("ok", "cached", or an error kind).
pub fn record_fetch(outcome: &'static str) {
    metrics::counter!("fetch_requests_total", "outcome" => outcome).increment(1);
}

/// Record a page cache lookup.
pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!("fetch_cache_total", "result" => result).increment(1);
}

/// Record a fetch that had to wait for the rate limiter.
pub fn record_rate_limited() {
    metrics::counter!("fetch_rate_limited_total").increment(1);
}
