//! Front-end adapter: where the destination of an accepted connection comes from.

use hopgate_config::FrontEndSettings;
use hopgate_proto::{ConnectOutcome, Destination, HandshakeError, ServerEngine};
use tokio::io::{AsyncRead, AsyncWrite};

/// Per-session front end.
#[derive(Debug, Clone)]
pub enum FrontEnd {
    /// Fixed destination; nothing is exchanged with the client.
    Tunnel(Destination),
    /// Destination negotiated by a server protocol engine.
    Proxy(ServerEngine),
}

impl FrontEnd {
    pub fn new(settings: &FrontEndSettings) -> Self {
        match settings {
            FrontEndSettings::Tunnel(dest) => Self::Tunnel(dest.clone()),
            FrontEndSettings::Proxy {
                protocol,
                host_unreachable,
            } => Self::Proxy(ServerEngine::new(*protocol, *host_unreachable)),
        }
    }

    /// Label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Tunnel(_) => "tunnel",
            Self::Proxy(engine) => engine.protocol().scheme(),
        }
    }

    pub async fn read_connect_request<S>(
        &mut self,
        stream: &mut S,
    ) -> Result<Destination, HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        match self {
            Self::Tunnel(dest) => Ok(dest.clone()),
            Self::Proxy(engine) => engine.read_connect_request(stream).await,
        }
    }

    pub async fn write_connect_response<S>(
        &mut self,
        stream: &mut S,
        outcome: ConnectOutcome,
    ) -> Result<(), HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        match self {
            Self::Tunnel(_) => Ok(()),
            Self::Proxy(engine) => engine.write_connect_response(stream, outcome).await,
        }
    }
}
