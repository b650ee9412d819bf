//! Metrics collection and exposition.
//!
//! # Metrics
//! - `route_requests_total` (counter): route requests by outcome
//! - `route_request_duration_seconds` (histogram): end-to-end enrichment latency
//! - `routing_engine_requests_total` (counter): upstream calls by status
//! - `route_hazards_detected_total` (counter): hazard events by category
//! - `zone_refresh_total` (counter): zone tier reads by tier and result
//! - `zones_loaded` (gauge): zones in the current snapshot by category
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are drawn from closed sets (outcome, tier, category)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::zones::ZoneCategory;

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished route request.
pub fn record_route_request(outcome: &'static str, started: Instant) {
    counter!("route_requests_total", "outcome" => outcome).increment(1);
    histogram!("route_request_duration_seconds").record(started.elapsed().as_secs_f64());
}

/// Record an upstream routing engine call by HTTP status (or failure kind).
pub fn record_routing_engine(status: String) {
    counter!("routing_engine_requests_total", "status" => status).increment(1);
}

pub fn record_hazard(category: ZoneCategory) {
    counter!("route_hazards_detected_total", "category" => category.as_str()).increment(1);
}

pub fn record_zone_tier(tier: &'static str, success: bool) {
    let result = if success { "hit" } else { "error" };
    counter!("zone_refresh_total", "tier" => tier, "result" => result).increment(1);
}

pub fn record_zones_loaded(category: ZoneCategory, count: usize) {
    gauge!("zones_loaded", "category" => category.as_str()).set(count as f64);
}
