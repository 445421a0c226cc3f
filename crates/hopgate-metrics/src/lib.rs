//! Metrics collection and Prometheus exporter for hopgate.
//!
//! Session counts, chain outcomes, relayed bytes and error rates. Recording
//! is a no-op until an exporter is installed.

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize Prometheus metrics exporter.
///
/// Starts an HTTP server on the given address to expose metrics.
/// Returns an error message if binding fails.
pub fn init_prometheus(listen: &str) -> Result<(), String> {
    let addr: SocketAddr = listen
        .parse()
        .map_err(|e| format!("invalid metrics listen address: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install prometheus exporter: {}", e))?;

    Ok(())
}

// ============================================================================
// Metric Names
// ============================================================================

/// Total number of inbound connections accepted.
pub const SESSIONS_TOTAL: &str = "hopgate_sessions_total";
/// Number of sessions currently open.
pub const SESSIONS_ACTIVE: &str = "hopgate_sessions_active";
/// Session duration histogram (seconds).
pub const SESSION_DURATION_SECONDS: &str = "hopgate_session_duration_seconds";
/// Connect requests read from the front end, by front-end kind.
pub const CONNECT_REQUESTS_TOTAL: &str = "hopgate_connect_requests_total";
/// Successful end-to-end chain connects.
pub const CHAIN_CONNECTED_TOTAL: &str = "hopgate_chain_connected_total";
/// Failed chain connects, by where they failed and why.
pub const CHAIN_FAILURES_TOTAL: &str = "hopgate_chain_failures_total";
/// Bytes relayed from the accepted client toward the destination.
pub const BYTES_UPLOADED_TOTAL: &str = "hopgate_bytes_uploaded_total";
/// Bytes relayed from the destination back to the accepted client.
pub const BYTES_DOWNLOADED_TOTAL: &str = "hopgate_bytes_downloaded_total";
/// Destinations added to the connection history.
pub const HISTORY_ENTRIES_TOTAL: &str = "hopgate_history_entries_total";
/// Total number of errors by type.
pub const ERRORS_TOTAL: &str = "hopgate_errors_total";

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a new session accepted.
#[inline]
pub fn record_session_accepted() {
    counter!(SESSIONS_TOTAL).increment(1);
    gauge!(SESSIONS_ACTIVE).increment(1.0);
}

/// Record a session closed.
#[inline]
pub fn record_session_closed(duration_secs: f64) {
    gauge!(SESSIONS_ACTIVE).decrement(1.0);
    histogram!(SESSION_DURATION_SECONDS).record(duration_secs);
}

/// Record a destination obtained from the front end ("tunnel", "socks5", "https").
#[inline]
pub fn record_connect_request(front: &'static str) {
    counter!(CONNECT_REQUESTS_TOTAL, "front" => front).increment(1);
}

#[inline]
pub fn record_chain_connected() {
    counter!(CHAIN_CONNECTED_TOTAL).increment(1);
}

/// Record a chain failure. `stage` is "direct" or "hop"; `error_type` is
/// one of the `ERROR_*` labels.
#[inline]
pub fn record_chain_failure(stage: &'static str, error_type: &'static str) {
    counter!(CHAIN_FAILURES_TOTAL, "stage" => stage, "type" => error_type).increment(1);
}

#[inline]
pub fn record_bytes_uploaded(bytes: u64) {
    counter!(BYTES_UPLOADED_TOTAL).increment(bytes);
}

#[inline]
pub fn record_bytes_downloaded(bytes: u64) {
    counter!(BYTES_DOWNLOADED_TOTAL).increment(bytes);
}

#[inline]
pub fn record_history_entry() {
    counter!(HISTORY_ENTRIES_TOTAL).increment(1);
}

/// Record an error by type.
#[inline]
pub fn record_error(error_type: &'static str) {
    counter!(ERRORS_TOTAL, "type" => error_type).increment(1);
}

// ============================================================================
// Error Type Constants (re-exported from hopgate-core)
// ============================================================================

pub use hopgate_core::{
    ERROR_CONFIG, ERROR_PROTOCOL, ERROR_REJECTED, ERROR_RESOLVE, ERROR_TRANSPORT,
};
