//! Chain connector: one outbound socket, N sequential hop handshakes.

use std::net::SocketAddr;
use std::sync::Arc;

use hopgate_dns::{DnsError, DnsResolver};
use hopgate_proto::{ChainEntry, ClientEngine, Destination, HostAddress};
use tracing::debug;

use crate::error::{ChainError, ChainFailure};
use crate::transport::{Connect, Resolve, TcpConnector};

/// Production connector: hickory DNS plus plain TCP.
pub type DefaultChainConnector = ChainConnector<DnsResolver, TcpConnector>;

/// Connects to destinations through a fixed chain of proxy hops.
///
/// The chain is built once and shared by every session. Client engines are
/// created fresh for each connection attempt.
pub struct ChainConnector<R, C> {
    chain: Arc<[ChainEntry]>,
    resolver: R,
    connector: C,
}

impl<R: Resolve, C: Connect> ChainConnector<R, C> {
    pub fn new(chain: impl Into<Arc<[ChainEntry]>>, resolver: R, connector: C) -> Self {
        Self {
            chain: chain.into(),
            resolver,
            connector,
        }
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &C {
        &self.connector
    }

    /// The hop a [`ChainError`] refers to, if any.
    pub fn hop(&self, index: Option<usize>) -> Option<&ChainEntry> {
        index.and_then(|i| self.chain.get(i))
    }

    /// Open a stream to `dest` through every configured hop.
    ///
    /// With an empty chain this is a direct connection and failures carry no
    /// hop index. Otherwise only hop 0 is dialed; each hop is asked to
    /// connect to the next one over the same stream, and the last one to
    /// `dest`.
    pub async fn connect_through_chain(&self, dest: &Destination) -> Result<C::Stream, ChainError> {
        let Some(first) = self.chain.first() else {
            let stream = self.open(dest, None).await?;
            debug!(%dest, "connected directly");
            return Ok(stream);
        };

        let mut stream = self.open(&first.proxy, Some(0)).await?;

        for (index, entry) in self.chain.iter().enumerate() {
            let target = self.chain.get(index + 1).map_or(dest, |next| &next.proxy);
            let hop = Some(index);

            let mut engine = ClientEngine::for_entry(entry);
            engine
                .write_connect_request(&mut stream, target)
                .await
                .map_err(|e| ChainError::new(hop, ChainFailure::Write(e)))?;
            let outcome = engine
                .read_connect_response(&mut stream)
                .await
                .map_err(|e| ChainError::new(hop, ChainFailure::Read(e)))?;

            if !outcome.is_success() {
                return Err(ChainError::new(hop, ChainFailure::Rejected(outcome)));
            }
            debug!(hop = index, %target, "hop connected");
        }

        Ok(stream)
    }

    /// Resolve (first candidate wins) and dial `addr`.
    async fn open(&self, addr: &Destination, hop: Option<usize>) -> Result<C::Stream, ChainError> {
        let ip = match &addr.host {
            HostAddress::Ip(ip) => *ip,
            HostAddress::Hostname(name) => {
                let candidates = self
                    .resolver
                    .lookup(name)
                    .await
                    .map_err(|e| ChainError::new(hop, e.into()))?;
                *candidates
                    .first()
                    .ok_or_else(|| ChainError::new(hop, DnsError::NoResults(name.clone()).into()))?
            }
        };

        self.connector
            .connect(SocketAddr::new(ip, addr.port))
            .await
            .map_err(|e| ChainError::new(hop, ChainFailure::Connect(e)))
    }
}
