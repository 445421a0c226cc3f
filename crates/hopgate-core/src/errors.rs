//! Error type labels for metrics and logging.
//!
//! These constants provide consistent error classification across all crates.

/// Socket-level failure (connect, read, write).
pub const ERROR_TRANSPORT: &str = "transport";
/// Proxy protocol violation or negotiation failure.
pub const ERROR_PROTOCOL: &str = "protocol";
/// DNS/address resolution error.
pub const ERROR_RESOLVE: &str = "resolve";
/// A chain hop answered the connect request with a non-success reply.
pub const ERROR_REJECTED: &str = "rejected";
/// Configuration error.
pub const ERROR_CONFIG: &str = "config";
