//! Resolver configuration.

use serde::{Deserialize, Serialize};

use hopgate_core::defaults::DEFAULT_DNS_CACHE_SIZE;

/// DNS section of the gateway config. Every field has a default, so the
/// whole section may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsConfig {
    /// `"system"` (default) reads the platform resolver configuration,
    /// `"custom"` uses `servers`.
    #[serde(default)]
    pub strategy: DnsStrategy,

    /// Nameservers for the custom strategy: `udp://ip[:port]` or
    /// `tcp://host[:port]`. Port defaults to 53.
    #[serde(default)]
    pub servers: Vec<String>,

    /// Order IPv4 candidates ahead of IPv6 ones.
    #[serde(default)]
    pub prefer_ipv4: bool,

    /// Cache capacity in entries; 0 disables caching.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            strategy: DnsStrategy::default(),
            servers: Vec::new(),
            prefer_ipv4: false,
            cache_size: default_cache_size(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DnsStrategy {
    #[default]
    System,
    Custom,
}

fn default_cache_size() -> usize {
    DEFAULT_DNS_CACHE_SIZE
}
