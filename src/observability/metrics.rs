//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, throttling, extractions)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, route, status
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_rate_limited_total` (counter): requests rejected with 429
//! - `gateway_extractions_total` (counter): extraction outcomes
//! - `gateway_extraction_duration_seconds` (histogram): extractor latency
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so handlers and
//!   tests never depend on the exporter being up

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    counter!("gateway_rate_limited_total").increment(1);
}

/// Record an extraction outcome (`ok`, `no_formats`, or an error kind).
pub fn record_extraction(outcome: &'static str) {
    counter!("gateway_extractions_total", "outcome" => outcome).increment(1);
}

pub fn record_extraction_duration(elapsed: Duration) {
    histogram!("gateway_extraction_duration_seconds").record(elapsed.as_secs_f64());
}
