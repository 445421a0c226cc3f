//! # hopgate
//!
//! A TCP gateway that reaches destinations through a chain of SOCKS5 proxies.
//!
//! Connections are accepted as a fixed tunnel, as SOCKS5 requests or as HTTP
//! CONNECT requests, routed hop by hop through the configured chain over a
//! single outbound stream, and relayed until both sides close.
//!
//! ## Crates
//!
//! - [`hopgate_core`] - Shared defaults, error labels and the byte relay
//! - [`hopgate_proto`] - SOCKS5 client/server and HTTP CONNECT handshakes
//! - [`hopgate_dns`] - Hostname resolution
//! - [`hopgate_config`] - Configuration loading and validation
//! - [`hopgate_metrics`] - Prometheus-compatible metrics
//! - [`hopgate_gateway`] - Chain connector, sessions and accept loop

pub use hopgate_config as config;
pub use hopgate_core as core;
pub use hopgate_dns as dns;
pub use hopgate_gateway as gateway;
pub use hopgate_metrics as metrics;
pub use hopgate_proto as proto;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use hopgate_config::{Config, GatewaySettings, load_config, validate_config};
    pub use hopgate_gateway::{
        CancellationToken, ChainConnector, ChainError, Gateway, GatewayError, run, serve,
    };
    pub use hopgate_proto::{ChainEntry, ConnectOutcome, Destination};
}
