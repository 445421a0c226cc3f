//! Configuration for hopgate: file model, loading, CLI overrides,
//! validation and conversion to [`GatewaySettings`].

pub mod cli;
mod defaults;
pub mod loader;
pub mod settings;
pub mod types;
pub mod validate;

pub use cli::{CliOverrides, apply_overrides, proxy_config, tunnel_config};
pub use loader::{ConfigError, load_config};
pub use settings::{FrontEndSettings, GatewaySettings};
pub use types::*;
pub use validate::validate_config;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_toml() {
        let file = write_config(
            ".toml",
            "listen = \"127.0.0.1:1081\"\n[inbound]\nmode = \"https\"\n",
        );
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.listen, "127.0.0.1:1081");
        assert_eq!(cfg.inbound.mode, InboundMode::Https);
    }

    #[test]
    fn load_jsonc_with_comments() {
        let file = write_config(
            ".jsonc",
            r#"{
  // local side
  "inbound": { "mode": "tunnel", "destination": "example.com:80" },
  /* two hops */
  "chain": ["socks5://a:1080", "socks5://b:1080"]
}"#,
        );
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.chain.len(), 2);
        validate_config(&cfg).unwrap();
    }

    #[test]
    fn load_yaml() {
        let file = write_config(
            ".yaml",
            "inbound:\n  mode: socks5\n  socks5_host_unreachable: legacy\nreport_proxy_errors: false\n",
        );
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.inbound.socks5_host_unreachable, HostUnreachableMode::Legacy);
        assert!(!cfg.report_proxy_errors);
    }

    #[test]
    fn unknown_extension() {
        let file = write_config(".ini", "mode=socks5");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::UnsupportedFormat)
        ));
    }
}
