//! Gateway runtime for hopgate.
//!
//! Accepts TCP connections, learns each connection's destination from the
//! front end (fixed tunnel, SOCKS5 or HTTP CONNECT), reaches it through the
//! configured chain of SOCKS5 hops and relays bytes until both sides close.
//!
//! ```text
//! client ──▶ [front end] ──▶ hop 0 ──▶ hop 1 ──▶ ... ──▶ destination
//!                 gateway     (one outbound TCP stream)
//! ```
//!
//! # Architecture
//!
//! - [`chain::ChainConnector`] dials hop 0 and runs every hop's handshake
//!   over that single stream, attributing failures to a hop index.
//! - [`front::FrontEnd`] yields the destination and reports the outcome back.
//! - [`session::Session`] sequences the two, records the destination in the
//!   [`history::ConnectionHistory`] and runs the relay.
//! - [`server`] owns the accept loop; [`cli`] wires config, tracing, metrics
//!   and signals.

pub mod chain;
pub mod cli;
pub mod error;
pub mod front;
pub mod gateway;
pub mod history;
pub mod server;
pub mod session;
pub mod transport;

pub use chain::{ChainConnector, DefaultChainConnector};
pub use error::{ChainError, ChainFailure, GatewayError};
pub use front::FrontEnd;
pub use gateway::Gateway;
pub use history::ConnectionHistory;
pub use server::{run, serve};
pub use session::{Session, SessionState, next_session_id};
pub use tokio_util::sync::CancellationToken;
pub use transport::{Connect, Resolve, TcpConnector, TransportStream};
