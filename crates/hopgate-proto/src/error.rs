//! Protocol error taxonomy.
//!
//! Two domains are kept apart: transport failures are `std::io::Error`
//! values passed through untouched, protocol failures are this crate's own
//! [`ProtocolError`] kinds.

use std::io;

use hopgate_core::errors::{ERROR_PROTOCOL, ERROR_TRANSPORT};

/// Protocol-level failures raised by the engines themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ProtocolError {
    #[error("protocol violation")]
    ProtocolViolation,
    #[error("unsupported command")]
    UnsupportedCommand,
    #[error("authentication failed")]
    AuthFailed,
    #[error("bad authentication method")]
    BadAuthMethod,
    #[error("credentials element too long")]
    CredsTooLong,
    #[error("hostname too long")]
    HostnameTooLong,
    #[error("line too long")]
    LineTooLong,
}

/// Error returned by every handshake operation.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("transport: {0}")]
    Transport(#[from] io::Error),
    #[error("protocol: {0}")]
    Protocol(#[from] ProtocolError),
}

impl HandshakeError {
    /// The protocol error kind, if this is a protocol-domain failure.
    pub fn protocol(&self) -> Option<ProtocolError> {
        match self {
            Self::Protocol(e) => Some(*e),
            Self::Transport(_) => None,
        }
    }

    /// The transport error, if this is a transport-domain failure.
    pub fn transport(&self) -> Option<&io::Error> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Protocol(_) => None,
        }
    }

    /// Get the error type string for metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Transport(_) => ERROR_TRANSPORT,
            Self::Protocol(_) => ERROR_PROTOCOL,
        }
    }
}
