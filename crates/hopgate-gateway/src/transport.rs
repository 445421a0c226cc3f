//! Outbound transport seams.
//!
//! The chain connector only needs two collaborators: something that turns a
//! hostname into candidate addresses and something that opens a byte stream
//! to a socket address. Production uses [`DnsResolver`] and [`TcpConnector`];
//! tests plug in static resolvers and counting connectors.

use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;

use hopgate_dns::{DnsError, DnsResolver};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Marker trait for streams the gateway can relay over.
pub trait TransportStream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + 'static> TransportStream for T {}

/// Hostname resolution, ordered by preference.
pub trait Resolve: Send + Sync + 'static {
    fn lookup<'a>(
        &'a self,
        host: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<IpAddr>, DnsError>> + Send + 'a>>;
}

impl Resolve for DnsResolver {
    fn lookup<'a>(
        &'a self,
        host: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<IpAddr>, DnsError>> + Send + 'a>> {
        Box::pin(DnsResolver::lookup(self, host))
    }
}

/// Opens outbound connections.
pub trait Connect: Send + Sync + 'static {
    /// The stream type produced by this connector.
    type Stream: TransportStream;

    fn connect(
        &self,
        addr: SocketAddr,
    ) -> Pin<Box<dyn Future<Output = io::Result<Self::Stream>> + Send + '_>>;
}

/// Plain TCP connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connect for TcpConnector {
    type Stream = TcpStream;

    fn connect(
        &self,
        addr: SocketAddr,
    ) -> Pin<Box<dyn Future<Output = io::Result<Self::Stream>> + Send + '_>> {
        Box::pin(async move {
            let stream = TcpStream::connect(addr).await?;
            stream.set_nodelay(true)?;
            Ok(stream)
        })
    }
}
