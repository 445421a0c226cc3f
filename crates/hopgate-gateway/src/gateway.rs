//! Shared, immutable state every session runs against.

use std::sync::Arc;

use hopgate_config::{FrontEndSettings, GatewaySettings};
use hopgate_dns::DnsResolver;

use crate::chain::ChainConnector;
use crate::error::GatewayError;
use crate::history::ConnectionHistory;
use crate::session::{Session, SessionState};
use crate::transport::{Connect, Resolve, TcpConnector, TransportStream};

/// One configured gateway: chain, front-end kind and connection history.
pub struct Gateway<R = DnsResolver, C = TcpConnector> {
    pub(crate) connector: ChainConnector<R, C>,
    pub(crate) front: FrontEndSettings,
    pub(crate) history: Arc<ConnectionHistory>,
    pub(crate) report_proxy_errors: bool,
    pub(crate) relay_buffer_size: usize,
}

impl Gateway {
    /// Build the production gateway: hickory resolver, plain TCP and the
    /// configured history log.
    pub async fn from_settings(settings: &GatewaySettings) -> Result<Self, GatewayError> {
        let resolver = DnsResolver::new(&settings.dns)?;
        let history = match &settings.history_file {
            Some(path) => ConnectionHistory::with_log_file(path).await?,
            None => ConnectionHistory::new(),
        };
        Ok(Self::with_transport(
            settings,
            resolver,
            TcpConnector,
            Arc::new(history),
        ))
    }
}

impl<R: Resolve, C: Connect> Gateway<R, C> {
    pub fn with_transport(
        settings: &GatewaySettings,
        resolver: R,
        connector: C,
        history: Arc<ConnectionHistory>,
    ) -> Self {
        Self {
            connector: ChainConnector::new(settings.chain.clone(), resolver, connector),
            front: settings.front.clone(),
            history,
            report_proxy_errors: settings.report_proxy_errors,
            relay_buffer_size: settings.relay_buffer_size,
        }
    }

    pub fn connector(&self) -> &ChainConnector<R, C> {
        &self.connector
    }

    pub fn history(&self) -> &ConnectionHistory {
        &self.history
    }

    /// Run one accepted connection to completion.
    pub async fn handle<S: TransportStream>(&self, id: u64, inbound: S) -> SessionState {
        Session::new(id, &self.front).run(inbound, self).await
    }
}
