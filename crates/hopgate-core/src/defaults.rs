//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Listener Defaults
// ============================================================================

/// Default local listen address.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:1080";

// ============================================================================
// Relay Defaults
// ============================================================================

/// Default relay read buffer size per direction (4 KiB).
pub const DEFAULT_RELAY_BUFFER_SIZE: usize = 4096;

// ============================================================================
// Diagnostics Defaults
// ============================================================================

/// Report per-hop proxy errors at `warn` level by default.
pub const DEFAULT_REPORT_PROXY_ERRORS: bool = true;

// ============================================================================
// DNS Defaults
// ============================================================================

/// Default DNS cache capacity (entries).
pub const DEFAULT_DNS_CACHE_SIZE: usize = 256;

// ============================================================================
// Protocol Limits
// ============================================================================

/// SOCKS5 encodes username, password and domain lengths in one octet.
pub const SOCKS5_MAX_FIELD_LEN: usize = 255;
/// Maximum HTTP CONNECT request line length, including the terminating LF.
pub const HTTP_MAX_LINE_LEN: usize = 2048;
