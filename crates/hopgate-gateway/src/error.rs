//! Error types for the gateway crate.

use std::fmt;
use std::io;

use hopgate_config::ConfigError;
use hopgate_core::errors::{ERROR_REJECTED, ERROR_TRANSPORT};
use hopgate_dns::DnsError;
use hopgate_proto::{ConnectOutcome, HandshakeError};
use thiserror::Error;

/// What went wrong while building the outbound path.
#[derive(Error, Debug)]
pub enum ChainFailure {
    #[error("resolve: {0}")]
    Resolve(#[from] DnsError),

    #[error("connect: {0}")]
    Connect(#[source] io::Error),

    #[error("write connect request: {0}")]
    Write(#[source] HandshakeError),

    #[error("read connect response: {0}")]
    Read(#[source] HandshakeError),

    /// The hop answered with a non-success reply.
    #[error("proxy replied {0}")]
    Rejected(ConnectOutcome),
}

/// A chain failure attributed to the hop that failed. `hop` is `None` for a
/// direct connection with an empty chain.
#[derive(Debug)]
pub struct ChainError {
    pub hop: Option<usize>,
    pub cause: ChainFailure,
}

impl ChainError {
    pub fn new(hop: Option<usize>, cause: ChainFailure) -> Self {
        Self { hop, cause }
    }

    /// Outcome reported to the front end.
    ///
    /// Transport errors map to their nearest outcome and replies pass through.
    /// Everything else is `UnknownError`.
    pub fn outcome(&self) -> ConnectOutcome {
        match &self.cause {
            ChainFailure::Connect(e) => ConnectOutcome::from_io_error(e),
            ChainFailure::Write(e) | ChainFailure::Read(e) => match e.transport() {
                Some(io) => ConnectOutcome::from_io_error(io),
                None => ConnectOutcome::UnknownError,
            },
            ChainFailure::Rejected(outcome) => *outcome,
            ChainFailure::Resolve(_) => ConnectOutcome::UnknownError,
        }
    }

    /// True when a hop broke the proxy protocol (auth failure, bad reply).
    pub fn is_protocol(&self) -> bool {
        matches!(
            &self.cause,
            ChainFailure::Write(e) | ChainFailure::Read(e) if e.protocol().is_some()
        )
    }

    /// Get the error type string for metrics.
    pub fn error_type(&self) -> &'static str {
        match &self.cause {
            ChainFailure::Resolve(e) => e.error_type(),
            ChainFailure::Connect(_) => ERROR_TRANSPORT,
            ChainFailure::Write(e) | ChainFailure::Read(e) => e.error_type(),
            ChainFailure::Rejected(_) => ERROR_REJECTED,
        }
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hop {
            Some(hop) => write!(f, "chain[{hop}]: {}", self.cause),
            None => write!(f, "direct: {}", self.cause),
        }
    }
}

impl std::error::Error for ChainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// Errors that end the gateway as a whole.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("dns: {0}")]
    Dns(#[from] DnsError),
}
