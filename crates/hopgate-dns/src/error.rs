//! Resolver errors.

use hopgate_core::errors::ERROR_RESOLVE;

#[derive(Debug, thiserror::Error)]
pub enum DnsError {
    /// The name exists but has no A/AAAA records.
    #[error("no addresses found for {0}")]
    NoResults(String),

    #[error("dns lookup failed: {0}")]
    Lookup(#[from] hickory_resolver::ResolveError),

    /// Malformed nameserver URL in configuration.
    #[error("invalid dns server url: {0}")]
    InvalidServer(String),
}

impl DnsError {
    /// Get the error type string for metrics.
    pub fn error_type(&self) -> &'static str {
        ERROR_RESOLVE
    }
}
