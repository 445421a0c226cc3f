//! Typed runtime settings built once from a validated [`Config`].

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use hopgate_dns::DnsConfig;
use hopgate_proto::{ChainEntry, Destination, HostUnreachableReply, ServerProtocol};

use crate::loader::ConfigError;
use crate::types::{Config, HostUnreachableMode, InboundMode};
use crate::validate::{parse_chain_entry, parse_listen, parse_tunnel_destination, validate_config};

/// How accepted connections name their destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontEndSettings {
    /// Every connection goes to the same destination.
    Tunnel(Destination),
    /// Each connection negotiates its destination.
    Proxy {
        protocol: ServerProtocol,
        host_unreachable: HostUnreachableReply,
    },
}

/// Everything the gateway needs at runtime. Immutable after startup.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub listen: SocketAddr,
    pub front: FrontEndSettings,
    /// Outbound hops in traversal order; empty means connect directly.
    pub chain: Vec<ChainEntry>,
    pub report_proxy_errors: bool,
    pub relay_buffer_size: usize,
    pub history_file: Option<PathBuf>,
    pub dns: DnsConfig,
}

impl Config {
    /// Validate and convert into [`GatewaySettings`].
    pub fn to_settings(&self) -> Result<GatewaySettings, ConfigError> {
        validate_config(self)?;

        let front = match self.inbound.mode {
            InboundMode::Tunnel => {
                let dest = self.inbound.destination.as_deref().ok_or_else(|| {
                    ConfigError::Validation("inbound.destination is required in tunnel mode".into())
                })?;
                FrontEndSettings::Tunnel(parse_tunnel_destination(dest)?)
            }
            InboundMode::Socks5 => FrontEndSettings::Proxy {
                protocol: ServerProtocol::Socks5,
                host_unreachable: self.inbound.socks5_host_unreachable.into(),
            },
            InboundMode::Https => FrontEndSettings::Proxy {
                protocol: ServerProtocol::Https,
                host_unreachable: HostUnreachableReply::default(),
            },
        };

        let chain = self
            .chain
            .iter()
            .enumerate()
            .map(|(index, entry)| parse_chain_entry(index, entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GatewaySettings {
            listen: parse_listen(&self.listen)?,
            front,
            chain,
            report_proxy_errors: self.report_proxy_errors,
            relay_buffer_size: self.relay_buffer_size,
            history_file: self.history.log_file.as_ref().map(PathBuf::from),
            dns: self.dns.clone(),
        })
    }
}

impl From<HostUnreachableMode> for HostUnreachableReply {
    fn from(mode: HostUnreachableMode) -> Self {
        match mode {
            HostUnreachableMode::Rfc1928 => Self::Rfc1928,
            HostUnreachableMode::Legacy => Self::Legacy,
        }
    }
}

/// Human-readable summary logged at startup. Passwords are masked.
impl fmt::Display for GatewaySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Input:")?;
        writeln!(f, " Listen address: {}", self.listen)?;
        match &self.front {
            FrontEndSettings::Tunnel(dest) => writeln!(f, " Type: Tunnel to {dest}")?,
            FrontEndSettings::Proxy { protocol, .. } => {
                writeln!(f, " Type: ProxyServer {protocol}")?
            }
        }

        if self.chain.is_empty() {
            return write!(f, "Output proxy chain is empty.");
        }
        write!(f, "Output proxy chain:")?;
        for (i, entry) in self.chain.iter().enumerate() {
            if entry.credentials.is_empty() {
                write!(f, "\n #{i}. {entry}")?;
            } else {
                write!(
                    f,
                    "\n #{i}. {}://{}:***@{}",
                    entry.protocol, entry.credentials.username, entry.proxy
                )?;
            }
        }
        Ok(())
    }
}
