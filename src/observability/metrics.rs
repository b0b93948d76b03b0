//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by route, status
//! - `edge_request_duration_seconds` (histogram): time to response headers
//! - `edge_derivations_total` (counter): derived / declined / failed
//! - `edge_variants_oversized_total` (counter): variants not smaller than their original
//! - `edge_frames_emitted_total` (counter): frames fully written
//! - `edge_streams_truncated_total` (counter): streams aborted mid-body
//! - `edge_cache_lookups_total` (counter): lookups by cache, result
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &'static str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!("edge_requests_total", "route" => route, "status" => status).increment(1);
    histogram!("edge_request_duration_seconds", "route" => route).record(start.elapsed().as_secs_f64());
}

pub fn record_derivation(outcome: &'static str) {
    counter!("edge_derivations_total", "outcome" => outcome).increment(1);
}

pub fn record_oversized_variant() {
    counter!("edge_variants_oversized_total").increment(1);
}

pub fn record_frames(frames: usize) {
    counter!("edge_frames_emitted_total").increment(frames as u64);
}

pub fn record_truncated_stream() {
    counter!("edge_streams_truncated_total").increment(1);
}

pub fn record_cache_lookup(cache: &'static str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("edge_cache_lookups_total", "cache" => cache, "result" => result).increment(1);
}
