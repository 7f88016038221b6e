//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rewrite_dispatch_total` (counter): dispatched requests by outcome
//!   (`rewrite`, `redirect`, `pass`)
//! - `rewrite_rules_loaded` (gauge): rules currently in the store
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exporter runs on its own listener

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::rules::Outcome;

pub const DISPATCH_TOTAL: &str = "rewrite_dispatch_total";
pub const RULES_LOADED: &str = "rewrite_rules_loaded";

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_outcome(outcome: &Outcome) {
    metrics::counter!(DISPATCH_TOTAL, "outcome" => outcome.kind()).increment(1);
}

pub fn set_rules_loaded(count: usize) {
    metrics::gauge!(RULES_LOADED).set(count as f64);
}
