//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define server metrics (admissions, rejections, bytes, closes)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `slot_connections_admitted_total` (counter)
//! - `slot_connections_rejected_total` (counter): closed because the slot was taken
//! - `slot_accept_errors_total` (counter)
//! - `slot_bytes_received_total` (counter)
//! - `slot_peer_closes_total` (counter)
//! - `slot_read_errors_total` (counter)
//! - `slot_occupied` (gauge): 1 while a client holds the slot
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The exporter is only installed when enabled in config

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_admitted() {
    metrics::counter!("slot_connections_admitted_total").increment(1);
}

pub fn record_rejected() {
    metrics::counter!("slot_connections_rejected_total").increment(1);
}

pub fn record_accept_error() {
    metrics::counter!("slot_accept_errors_total").increment(1);
}

pub fn record_bytes_received(bytes: usize) {
    metrics::counter!("slot_bytes_received_total").increment(bytes as u64);
}

pub fn record_peer_close() {
    metrics::counter!("slot_peer_closes_total").increment(1);
}

pub fn record_read_error() {
    metrics::counter!("slot_read_errors_total").increment(1);
}

pub fn set_slot_occupied(occupied: bool) {
    metrics::gauge!("slot_occupied").set(if occupied { 1.0 } else { 0.0 });
}
