//! Async resolver backed by hickory-resolver.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use hickory_proto::xfer::Protocol;
use hickory_resolver::Resolver;
use hickory_resolver::config::{
    NameServerConfig, NameServerConfigGroup, ResolverConfig, ResolverOpts,
};
use hickory_resolver::name_server::TokioConnectionProvider;
use tracing::debug;

use crate::config::{DnsConfig, DnsStrategy};
use crate::error::DnsError;

const DNS_PORT: u16 = 53;

/// Shared, caching resolver.
///
/// Cheap to clone; build once at startup and hand a clone to each session.
#[derive(Clone)]
pub struct DnsResolver {
    inner: Arc<Inner>,
}

struct Inner {
    resolver: Resolver<TokioConnectionProvider>,
    prefer_ipv4: bool,
}

impl std::fmt::Debug for DnsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsResolver")
            .field("prefer_ipv4", &self.inner.prefer_ipv4)
            .finish()
    }
}

impl DnsResolver {
    pub fn new(config: &DnsConfig) -> Result<Self, DnsError> {
        let resolver = match config.strategy {
            DnsStrategy::System => {
                let mut builder = Resolver::builder_tokio()
                    .map_err(|e| DnsError::InvalidServer(format!("system config: {e}")))?;
                builder.options_mut().cache_size = config.cache_size;
                builder.build()
            }
            DnsStrategy::Custom => {
                let name_servers = parse_server_urls(&config.servers)?;
                let resolver_config = ResolverConfig::from_parts(None, vec![], name_servers);
                let mut opts = ResolverOpts::default();
                opts.cache_size = config.cache_size;
                let mut builder = Resolver::builder_with_config(
                    resolver_config,
                    TokioConnectionProvider::default(),
                );
                *builder.options_mut() = opts;
                builder.build()
            }
        };

        Ok(Self {
            inner: Arc::new(Inner {
                resolver,
                prefer_ipv4: config.prefer_ipv4,
            }),
        })
    }

    /// All candidate addresses for `host`, in preference order.
    ///
    /// An IP literal is returned as-is without a query.
    pub async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, DnsError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let response = self.inner.resolver.lookup_ip(host).await?;
        let mut candidates: Vec<IpAddr> = response.iter().collect();
        if self.inner.prefer_ipv4 {
            candidates.sort_by_key(IpAddr::is_ipv6);
        }
        if candidates.is_empty() {
            return Err(DnsError::NoResults(host.to_string()));
        }
        debug!(host, first = %candidates[0], count = candidates.len(), "dns resolved");
        Ok(candidates)
    }
}

/// Parse `udp://` / `tcp://` nameserver URLs.
fn parse_server_urls(urls: &[String]) -> Result<NameServerConfigGroup, DnsError> {
    let mut configs = Vec::with_capacity(urls.len());

    for url in urls {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| DnsError::InvalidServer(format!("missing scheme: {url}")))?;
        let protocol = match scheme {
            "udp" => Protocol::Udp,
            "tcp" => Protocol::Tcp,
            other => {
                return Err(DnsError::InvalidServer(format!(
                    "unsupported protocol: {other}"
                )));
            }
        };
        if rest.contains('/') {
            return Err(DnsError::InvalidServer(format!("unexpected path: {url}")));
        }
        configs.push(NameServerConfig::new(server_addr(rest)?, protocol));
    }

    if configs.is_empty() {
        return Err(DnsError::InvalidServer(
            "no dns servers configured".to_string(),
        ));
    }

    Ok(NameServerConfigGroup::from(configs))
}

/// `ip`, `ip:port`, `[v6]`, `[v6]:port`, `host` or `host:port`. Hostnames
/// are resolved once, here, through the system resolver.
fn server_addr(s: &str) -> Result<SocketAddr, DnsError> {
    if let Ok(sa) = s.parse::<SocketAddr>() {
        return Ok(sa);
    }
    if let Ok(ip) = s.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DNS_PORT));
    }
    if s.is_empty() || s.contains('[') {
        return Err(DnsError::InvalidServer(format!("invalid server address: {s}")));
    }

    let (host, port) = match s.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| DnsError::InvalidServer(format!("invalid port in: {s}")))?;
            (host, port)
        }
        None => (s, DNS_PORT),
    };
    (host, port)
        .to_socket_addrs()
        .map_err(|e| DnsError::InvalidServer(format!("failed to resolve '{host}': {e}")))?
        .next()
        .ok_or_else(|| DnsError::InvalidServer(format!("no addresses for: {host}")))
}
