//! Configuration file model: listener, inbound protocol, outbound chain,
//! history log, DNS, metrics and logging.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use hopgate_dns::{DnsConfig, DnsStrategy};

use crate::defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Local `ip:port` to accept on. Hostnames are not allowed.
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Log hop failures at `warn` with the failing proxy's identity.
    #[serde(default = "default_report_proxy_errors")]
    pub report_proxy_errors: bool,
    /// Per-direction relay buffer (bytes).
    #[serde(default = "default_relay_buffer_size")]
    pub relay_buffer_size: usize,
    /// Outbound proxies in traversal order: `socks5://[user:pass@]host:port`.
    #[serde(default)]
    pub chain: Vec<String>,
    pub inbound: InboundConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub dns: DnsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundConfig {
    pub mode: InboundMode,
    /// Fixed `host:port` target, tunnel mode only.
    #[serde(default)]
    pub destination: Option<String>,
    /// REP code used when the chain reports host unreachable (socks5 mode).
    #[serde(default)]
    pub socks5_host_unreachable: HostUnreachableMode,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InboundMode {
    Tunnel,
    Socks5,
    Https,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HostUnreachableMode {
    /// REP=4.
    #[default]
    Rfc1928,
    /// REP=1, general failure.
    Legacy,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HistoryConfig {
    /// Append each newly seen destination to this file.
    #[serde(default)]
    pub log_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MetricsConfig {
    /// Prometheus exporter address; disabled when unset.
    pub listen: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Output target: stdout or stderr. Default: stderr.
    pub output: Option<String>,
    /// Per-module log level filters (e.g., {"hopgate_proto": "trace"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}
