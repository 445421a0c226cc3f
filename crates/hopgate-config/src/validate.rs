//! Configuration validation logic.
//!
//! The parse helpers here are shared with [`crate::settings`], so a config
//! that validates always converts.

use std::net::SocketAddr;

use hopgate_proto::socks5::MAX_FIELD_LEN;
use hopgate_proto::{ChainEntry, ClientProtocol, Credentials, Destination, ProxyUrl, parse_host_port};

use crate::loader::ConfigError;
use crate::types::{Config, InboundMode};

const MIN_RELAY_BUFFER: usize = 1024;
const MAX_RELAY_BUFFER: usize = 1024 * 1024;

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    parse_listen(&config.listen)?;

    match (config.inbound.mode, &config.inbound.destination) {
        (InboundMode::Tunnel, Some(dest)) => {
            parse_tunnel_destination(dest)?;
        }
        (InboundMode::Tunnel, None) => {
            return Err(ConfigError::Validation(
                "inbound.destination is required in tunnel mode".into(),
            ));
        }
        (_, Some(_)) => {
            return Err(ConfigError::Validation(
                "inbound.destination is only allowed in tunnel mode".into(),
            ));
        }
        (_, None) => {}
    }

    for (index, entry) in config.chain.iter().enumerate() {
        parse_chain_entry(index, entry)?;
    }

    if !(MIN_RELAY_BUFFER..=MAX_RELAY_BUFFER).contains(&config.relay_buffer_size) {
        return Err(ConfigError::Validation(format!(
            "relay_buffer_size must be {MIN_RELAY_BUFFER}..={MAX_RELAY_BUFFER}"
        )));
    }
    if let Some(path) = &config.history.log_file
        && path.trim().is_empty()
    {
        return Err(ConfigError::Validation("history.log_file is empty".into()));
    }
    if let Some(listen) = &config.metrics.listen
        && listen.parse::<SocketAddr>().is_err()
    {
        return Err(ConfigError::Validation(format!(
            "metrics.listen must be ip:port, got {listen}"
        )));
    }
    if let Some(format) = &config.logging.format
        && !matches!(format.as_str(), "json" | "pretty" | "compact")
    {
        return Err(ConfigError::Validation(
            "logging.format must be 'json', 'pretty' or 'compact'".into(),
        ));
    }
    if let Some(output) = &config.logging.output
        && !matches!(output.as_str(), "stdout" | "stderr")
    {
        return Err(ConfigError::Validation(
            "logging.output must be 'stdout' or 'stderr'".into(),
        ));
    }
    Ok(())
}

/// `ip:port` only; hostnames are rejected.
pub(crate) fn parse_listen(text: &str) -> Result<SocketAddr, ConfigError> {
    text.parse().map_err(|_| {
        ConfigError::Validation(format!(
            "listen must be ip:port (IPv6 in brackets, no hostnames), got {text:?}"
        ))
    })
}

pub(crate) fn parse_tunnel_destination(text: &str) -> Result<Destination, ConfigError> {
    parse_host_port(text)
        .map_err(|e| ConfigError::Validation(format!("inbound.destination {text:?}: {e}")))
}

/// One `scheme://[user:pass@]host:port` chain hop.
pub(crate) fn parse_chain_entry(index: usize, text: &str) -> Result<ChainEntry, ConfigError> {
    let fail = |msg: &str| ConfigError::Validation(format!("chain[{index}] {text:?}: {msg}"));

    let url = ProxyUrl::parse(text).map_err(|e| fail(&e.to_string()))?;
    let scheme = url.scheme.as_deref().ok_or_else(|| fail("proxy type:// is required"))?;
    let protocol: ClientProtocol = scheme.parse().map_err(|_| fail("unsupported proxy type"))?;
    if !url.path.is_empty() {
        return Err(fail("/path is not allowed"));
    }
    let port = url.port.ok_or_else(|| fail("port is required"))?;

    let credentials = match (url.username, url.password) {
        (None, None) => Credentials::default(),
        (Some(user), Some(pass)) => Credentials::new(user, pass),
        _ => return Err(fail("username and password must be given together")),
    };
    if credentials.username.len() > MAX_FIELD_LEN || credentials.password.len() > MAX_FIELD_LEN {
        return Err(fail("username and password are limited to 255 bytes"));
    }

    Ok(ChainEntry::new(
        protocol,
        Destination::new(url.host, port),
        credentials,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HistoryConfig, InboundConfig};

    fn base() -> Config {
        toml::from_str("[inbound]\nmode = \"socks5\"\n").unwrap()
    }

    fn tunnel(dest: &str) -> Config {
        Config {
            inbound: InboundConfig {
                mode: InboundMode::Tunnel,
                destination: Some(dest.to_string()),
                socks5_host_unreachable: Default::default(),
            },
            ..base()
        }
    }

    fn message(res: Result<(), ConfigError>) -> String {
        match res {
            Err(ConfigError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_validate() {
        validate_config(&base()).unwrap();
        validate_config(&tunnel("example.com:80")).unwrap();
        validate_config(&tunnel("[2001:db8::1]:443")).unwrap();
    }

    #[test]
    fn listen_must_be_ip() {
        let cfg = Config {
            listen: "localhost:1080".into(),
            ..base()
        };
        assert!(message(validate_config(&cfg)).contains("listen"));
    }

    #[test]
    fn tunnel_destination_rules() {
        let mut cfg = tunnel("example.com:80");
        cfg.inbound.destination = None;
        assert!(message(validate_config(&cfg)).contains("required"));

        for bad in [
            "example.com",
            "socks5://example.com:80",
            "u:p@example.com:80",
            "example.com:80/x",
        ] {
            message(validate_config(&tunnel(bad)));
        }

        let mut cfg = base();
        cfg.inbound.destination = Some("example.com:80".into());
        assert!(message(validate_config(&cfg)).contains("only allowed"));
    }

    #[test]
    fn chain_entry_parsing() {
        let entry = parse_chain_entry(0, "socks5://alice:pw@proxy.example:1080").unwrap();
        assert_eq!(entry.protocol, ClientProtocol::Socks5);
        assert_eq!(entry.proxy, Destination::hostname("proxy.example", 1080));
        assert_eq!(entry.credentials, Credentials::new("alice", "pw"));

        let entry = parse_chain_entry(1, "socks5://10.0.0.1:1080").unwrap();
        assert!(entry.credentials.is_empty());
    }

    #[test]
    fn chain_entry_rejections() {
        let long = "x".repeat(256);
        for bad in [
            "proxy.example:1080".to_string(),
            "https://proxy.example:1080".to_string(),
            "socks5://proxy.example".to_string(),
            "socks5://proxy.example:1080/path".to_string(),
            "socks5://alice@proxy.example:1080".to_string(),
            format!("socks5://{long}:pw@proxy.example:1080"),
        ] {
            assert!(parse_chain_entry(3, &bad).is_err(), "{bad}");
        }
        let err = parse_chain_entry(3, "socks5://p").unwrap_err();
        assert!(err.to_string().contains("chain[3]"));
    }

    #[test]
    fn ambient_sections() {
        let mut cfg = base();
        cfg.relay_buffer_size = 512;
        message(validate_config(&cfg));

        let mut cfg = base();
        cfg.history = HistoryConfig {
            log_file: Some("  ".into()),
        };
        message(validate_config(&cfg));

        let mut cfg = base();
        cfg.metrics.listen = Some("nowhere".into());
        message(validate_config(&cfg));

        let mut cfg = base();
        cfg.logging.format = Some("xml".into());
        message(validate_config(&cfg));

        let mut cfg = base();
        cfg.logging.output = Some("file".into());
        message(validate_config(&cfg));
    }
}
