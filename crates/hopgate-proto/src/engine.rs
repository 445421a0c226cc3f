//! Closed sets of client and server engines, dispatched statically.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::HandshakeError;
use crate::http::HttpConnectServer;
use crate::socks5::{HostUnreachableReply, Socks5Client, Socks5Server};
use crate::types::{ChainEntry, ClientProtocol, ConnectOutcome, Destination, ServerProtocol};

/// Client role for one chain hop.
#[derive(Debug, Clone)]
pub enum ClientEngine {
    Socks5(Socks5Client),
}

impl ClientEngine {
    /// Fresh engine for `entry`.
    pub fn for_entry(entry: &ChainEntry) -> Self {
        match entry.protocol {
            ClientProtocol::Socks5 => Self::Socks5(Socks5Client::new(entry.credentials.clone())),
        }
    }

    pub async fn write_connect_request<S>(
        &mut self,
        stream: &mut S,
        dest: &Destination,
    ) -> Result<(), HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        match self {
            Self::Socks5(engine) => engine.write_connect_request(stream, dest).await,
        }
    }

    pub async fn read_connect_response<S>(
        &mut self,
        stream: &mut S,
    ) -> Result<ConnectOutcome, HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        match self {
            Self::Socks5(engine) => engine.read_connect_response(stream).await,
        }
    }
}

/// Server role for the accepting side.
#[derive(Debug, Clone)]
pub enum ServerEngine {
    Socks5(Socks5Server),
    Http(HttpConnectServer),
}

impl ServerEngine {
    pub fn new(protocol: ServerProtocol, host_unreachable: HostUnreachableReply) -> Self {
        match protocol {
            ServerProtocol::Socks5 => Self::Socks5(Socks5Server::new(host_unreachable)),
            ServerProtocol::Https => Self::Http(HttpConnectServer::new()),
        }
    }

    pub fn protocol(&self) -> ServerProtocol {
        match self {
            Self::Socks5(_) => ServerProtocol::Socks5,
            Self::Http(_) => ServerProtocol::Https,
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
            Self::Socks5(engine) => engine.read_connect_request(stream).await,
            Self::Http(engine) => engine.read_connect_request(stream).await,
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
            Self::Socks5(engine) => engine.write_connect_response(stream, outcome).await,
            Self::Http(engine) => engine.write_connect_response(stream, outcome).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Credentials;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    #[test]
    fn factories_pick_variant() {
        let entry = ChainEntry::new(
            ClientProtocol::Socks5,
            Destination::hostname("p", 1080),
            Credentials::default(),
        );
        assert!(matches!(ClientEngine::for_entry(&entry), ClientEngine::Socks5(_)));

        let socks = ServerEngine::new(ServerProtocol::Socks5, HostUnreachableReply::default());
        assert_eq!(socks.protocol(), ServerProtocol::Socks5);
        let http = ServerEngine::new(ServerProtocol::Https, HostUnreachableReply::default());
        assert_eq!(http.protocol(), ServerProtocol::Https);
    }

    #[tokio::test]
    async fn client_engine_talks_to_server_engine() {
        let (mut client_side, mut server_side) = duplex(1024);
        let dest = Destination::hostname("example.org", 8080);

        let server = tokio::spawn(async move {
            let mut engine =
                ServerEngine::new(ServerProtocol::Socks5, HostUnreachableReply::default());
            let got = engine.read_connect_request(&mut server_side).await.unwrap();
            engine
                .write_connect_response(&mut server_side, ConnectOutcome::ConnectionRefused)
                .await
                .unwrap();
            server_side.shutdown().await.unwrap();
            let mut rest = Vec::new();
            server_side.read_to_end(&mut rest).await.unwrap();
            got
        });

        let mut engine = ClientEngine::Socks5(Socks5Client::default());
        engine
            .write_connect_request(&mut client_side, &dest)
            .await
            .unwrap();
        let outcome = engine.read_connect_response(&mut client_side).await.unwrap();
        assert_eq!(outcome, ConnectOutcome::ConnectionRefused);
        drop(client_side);

        assert_eq!(server.await.unwrap(), dest);
    }
}
