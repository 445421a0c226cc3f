//! Per-connection orchestration: front-end request, chain connect, response,
//! relay.

use std::sync::atomic::{AtomicU64, Ordering};

use hopgate_config::FrontEndSettings;
use hopgate_core::io::{RelayMetrics, relay_bidirectional};
use hopgate_metrics::{
    ERROR_TRANSPORT, record_bytes_downloaded, record_bytes_uploaded, record_chain_connected,
    record_chain_failure, record_connect_request, record_error, record_history_entry,
};
use hopgate_proto::ConnectOutcome;
use tracing::{debug, info, warn};

use crate::error::ChainError;
use crate::front::FrontEnd;
use crate::gateway::Gateway;
use crate::transport::{Connect, Resolve, TransportStream};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique session id for log correlation.
pub fn next_session_id() -> u64 {
    NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Lifecycle of one session. Transitions only move forward; any failure
/// jumps straight to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    AwaitingFrontRequest,
    Connecting,
    AwaitingFrontResponseWrite,
    Relaying,
    Closed,
}

/// Relay byte counters feeding the global metrics.
struct GatewayRelayMetrics;

impl RelayMetrics for GatewayRelayMetrics {
    #[inline]
    fn record_upload(&self, bytes: u64) {
        record_bytes_uploaded(bytes);
    }
    #[inline]
    fn record_download(&self, bytes: u64) {
        record_bytes_downloaded(bytes);
    }
}

/// One accepted connection.
///
/// The session owns the inbound stream and, once the chain is up, the
/// outbound one. Every step is awaited before the next starts, and both
/// streams are dropped (closed) when [`run`](Self::run) returns.
pub struct Session {
    id: u64,
    state: SessionState,
    front: FrontEnd,
}

impl Session {
    pub fn new(id: u64, front: &FrontEndSettings) -> Self {
        Self {
            id,
            state: SessionState::Init,
            front: FrontEnd::new(front),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!(session = self.id, from = ?self.state, to = ?next, "session state");
        self.state = next;
    }

    fn close(&mut self) -> SessionState {
        self.transition(SessionState::Closed);
        self.state
    }

    /// Drive the session to completion and return its final state.
    pub async fn run<S, R, C>(mut self, mut inbound: S, gateway: &Gateway<R, C>) -> SessionState
    where
        S: TransportStream,
        R: Resolve,
        C: Connect,
    {
        self.transition(SessionState::AwaitingFrontRequest);
        let dest = match self.front.read_connect_request(&mut inbound).await {
            Ok(dest) => dest,
            Err(e) => {
                debug!(front = self.front.kind(), error = %e, "bad front-end request");
                record_error(e.error_type());
                return self.close();
            }
        };
        record_connect_request(self.front.kind());
        debug!(%dest, "connect request");

        self.transition(SessionState::Connecting);
        let (outbound, outcome) = match gateway.connector.connect_through_chain(&dest).await {
            Ok(stream) => {
                record_chain_connected();
                if gateway.history.record(&dest).await {
                    record_history_entry();
                    info!(%dest, "new destination");
                }
                (Some(stream), ConnectOutcome::Succeeded)
            }
            Err(e) => {
                report_chain_failure(&e, gateway);
                (None, e.outcome())
            }
        };

        self.transition(SessionState::AwaitingFrontResponseWrite);
        if let Err(e) = self.front.write_connect_response(&mut inbound, outcome).await {
            debug!(error = %e, "failed to write front-end response");
            record_error(e.error_type());
            return self.close();
        }
        let Some(outbound) = outbound else {
            return self.close();
        };

        self.transition(SessionState::Relaying);
        match relay_bidirectional(
            inbound,
            outbound,
            gateway.relay_buffer_size,
            &GatewayRelayMetrics,
        )
        .await
        {
            Ok(stats) => debug!(
                uploaded = stats.uploaded,
                downloaded = stats.downloaded,
                "relay finished"
            ),
            Err(e) => {
                debug!(error = %e, "relay aborted");
                record_error(ERROR_TRANSPORT);
            }
        }
        self.close()
    }
}

/// Metrics plus the optional "proxy error" diagnostic for hop handshakes.
fn report_chain_failure<R, C>(err: &ChainError, gateway: &Gateway<R, C>)
where
    R: Resolve,
    C: Connect,
{
    let stage = if err.hop.is_some() { "hop" } else { "direct" };
    record_chain_failure(stage, err.error_type());

    if !err.is_protocol() {
        debug!(error = %err, outcome = %err.outcome(), "chain connect failed");
        return;
    }

    let hop = gateway
        .connector
        .hop(err.hop)
        .map_or_else(|| "?".to_string(), ToString::to_string);
    if gateway.report_proxy_errors {
        warn!(%hop, error = %err.cause, "proxy error");
    } else {
        debug!(%hop, error = %err.cause, "proxy error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    use hopgate_config::GatewaySettings;
    use hopgate_dns::DnsConfig;
    use hopgate_proto::{
        ChainEntry, ClientProtocol, Credentials, Destination, HostUnreachableReply,
        ServerProtocol, Socks5Server,
    };
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};

    use crate::chain::tests::{ScriptedConnector, StaticResolver};
    use crate::history::ConnectionHistory;

    fn settings(front: FrontEndSettings, chain: Vec<ChainEntry>) -> GatewaySettings {
        GatewaySettings {
            listen: "127.0.0.1:0".parse().unwrap(),
            front,
            chain,
            report_proxy_errors: true,
            relay_buffer_size: 4096,
            history_file: None,
            dns: DnsConfig::default(),
        }
    }

    fn gateway(
        front: FrontEndSettings,
        chain: Vec<ChainEntry>,
        outbound: io::Result<DuplexStream>,
    ) -> Gateway<StaticResolver, ScriptedConnector> {
        Gateway::with_transport(
            &settings(front, chain),
            StaticResolver::default(),
            ScriptedConnector::with(outbound),
            Arc::new(ConnectionHistory::new()),
        )
    }

    fn socks5_front() -> FrontEndSettings {
        FrontEndSettings::Proxy {
            protocol: ServerProtocol::Socks5,
            host_unreachable: HostUnreachableReply::Rfc1928,
        }
    }

    #[tokio::test]
    async fn tunnel_session_closes_after_both_eofs() {
        let dest = Destination::ip("127.0.0.1".parse().unwrap(), 7);
        let (outbound, mut target) = duplex(1024);
        let gateway = gateway(FrontEndSettings::Tunnel(dest.clone()), Vec::new(), Ok(outbound));

        let (mut client, inbound) = duplex(1024);
        let echo = tokio::spawn(async move {
            let mut buf = Vec::new();
            target.read_to_end(&mut buf).await.unwrap();
            target.write_all(&buf).await.unwrap();
            target.shutdown().await.unwrap();
        });

        client.write_all(b"ping").await.unwrap();
        client.shutdown().await.unwrap();

        let session = Session::new(next_session_id(), &gateway.front);
        assert_eq!(session.state(), SessionState::Init);
        let state = session.run(inbound, &gateway).await;
        assert_eq!(state, SessionState::Closed);

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, b"ping");
        echo.await.unwrap();

        assert!(gateway.history().contains(&dest));
    }

    #[tokio::test]
    async fn socks5_front_reports_chain_refusal() {
        let (outbound, mut hop) = duplex(1024);
        let entry = ChainEntry::new(
            ClientProtocol::Socks5,
            Destination::ip("10.0.0.1".parse().unwrap(), 1080),
            Credentials::default(),
        );
        let gateway = gateway(socks5_front(), vec![entry], Ok(outbound));

        tokio::spawn(async move {
            let mut server = Socks5Server::new(HostUnreachableReply::Rfc1928);
            server.read_connect_request(&mut hop).await.unwrap();
            server
                .write_connect_response(&mut hop, ConnectOutcome::HostUnreachable)
                .await
                .unwrap();
        });

        let (mut client, inbound) = duplex(1024);
        // greeting, then CONNECT example.com:80
        client.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
        let mut request = vec![0x05, 0x01, 0x00, 0x03, 11];
        request.extend_from_slice(b"example.com");
        request.extend_from_slice(&80u16.to_be_bytes());
        client.write_all(&request).await.unwrap();

        let state = gateway.handle(next_session_id(), inbound).await;
        assert_eq!(state, SessionState::Closed);

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, [0x05, 0x00, 0x05, 0x04, 0x00, 0x01, 0, 0, 0, 0, 0, 0]);
        assert!(gateway.history().is_empty());
    }

    #[tokio::test]
    async fn direct_transport_failure_maps_outcome() {
        let gateway = gateway(
            socks5_front(),
            Vec::new(),
            Err(io::ErrorKind::ConnectionRefused.into()),
        );

        let (mut client, inbound) = duplex(1024);
        client.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
        client
            .write_all(&[0x05, 0x01, 0x00, 0x01, 127, 0, 0, 1, 0, 9])
            .await
            .unwrap();

        gateway.handle(next_session_id(), inbound).await;

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, [0x05, 0x00, 0x05, 0x05, 0x00, 0x01, 0, 0, 0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn bad_front_request_closes_without_connecting() {
        let (outbound, _hop) = duplex(64);
        let gateway = gateway(socks5_front(), Vec::new(), Ok(outbound));

        let (mut client, inbound) = duplex(64);
        client.write_all(&[0x04, 0x01, 0x00]).await.unwrap();

        let state = gateway.handle(next_session_id(), inbound).await;
        assert_eq!(state, SessionState::Closed);
        assert!(gateway.connector().transport().dialed.lock().is_empty());

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert!(reply.is_empty());
    }

    #[test]
    fn session_ids_are_unique() {
        let a = next_session_id();
        let b = next_session_id();
        assert_ne!(a, b);
    }
}
