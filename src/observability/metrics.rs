//! Metrics collection and exposition.
//!
//! # Metrics
//! - `vision_proxy_requests_total` (counter): requests by mode, outcome, status
//! - `vision_proxy_request_duration_seconds` (histogram): end-to-end latency by mode
//! - `vision_proxy_upstream_duration_seconds` (histogram): outbound call latency by mode
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

/// Record one finished analysis request.
pub fn record_request(mode: &str, outcome: &str, status: u16, start: Instant) {
    counter!(
        "vision_proxy_requests_total",
        "mode" => mode.to_string(),
        "outcome" => outcome.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("vision_proxy_request_duration_seconds", "mode" => mode.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record the duration of one outbound call, whatever its result.
pub fn record_upstream(mode: &str, start: Instant) {
    histogram!("vision_proxy_upstream_duration_seconds", "mode" => mode.to_string())
        .record(start.elapsed().as_secs_f64());
}
