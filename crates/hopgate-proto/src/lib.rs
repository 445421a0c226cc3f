//! Proxy protocol engines for hopgate.
//!
//! This crate holds the wire-level half of the gateway:
//!
//! - the data model shared by every component ([`Destination`],
//!   [`Credentials`], [`ConnectOutcome`], [`ChainEntry`])
//! - the protocol error taxonomy ([`ProtocolError`], [`HandshakeError`])
//! - the SOCKS5 client role used for each chain hop
//! - the SOCKS5 and HTTP CONNECT server roles used on the accepting side
//! - the `scheme://[user:pass@]host:port/path` grammar used by configuration
//!   and by the HTTP CONNECT request target
//!
//! Engines never own a socket. Every operation borrows the stream mutably for
//! its duration, which enforces the "one outstanding operation per stream"
//! rule at compile time.

pub mod engine;
pub mod error;
pub mod http;
pub mod socks5;
pub mod types;
pub mod url;

pub use engine::{ClientEngine, ServerEngine};
pub use error::{HandshakeError, ProtocolError};
pub use http::HttpConnectServer;
pub use socks5::{HostUnreachableReply, Socks5Client, Socks5Server};
pub use types::{
    ChainEntry, ClientProtocol, ConnectOutcome, Credentials, Destination, HostAddress,
    ServerProtocol, UnknownProtocol,
};
pub use url::{ProxyUrl, UrlError, parse_host_port};
