//! Data model shared by the engines, the chain connector and configuration.

use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// A host as carried on the wire: either an IP literal or a name that still
/// needs resolving.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostAddress {
    Ip(IpAddr),
    Hostname(String),
}

impl fmt::Display for HostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(IpAddr::V6(ip)) => write!(f, "[{ip}]"),
            Self::Ip(ip) => write!(f, "{ip}"),
            Self::Hostname(name) => f.write_str(name),
        }
    }
}

impl From<IpAddr> for HostAddress {
    fn from(ip: IpAddr) -> Self {
        Self::Ip(ip)
    }
}

/// Connect target. The addressing mode is the [`HostAddress`] variant, so a
/// destination can never carry both a hostname and an IP.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    pub host: HostAddress,
    pub port: u16,
}

impl Destination {
    pub fn new(host: HostAddress, port: u16) -> Self {
        Self { host, port }
    }

    pub fn hostname(name: impl Into<String>, port: u16) -> Self {
        Self::new(HostAddress::Hostname(name.into()), port)
    }

    pub fn ip(ip: IpAddr, port: u16) -> Self {
        Self::new(HostAddress::Ip(ip), port)
    }

    #[inline]
    pub fn using_hostname(&self) -> bool {
        matches!(self.host, HostAddress::Hostname(_))
    }

    /// The socket address, when no resolution is needed.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        match self.host {
            HostAddress::Ip(ip) => Some(SocketAddr::new(ip, self.port)),
            HostAddress::Hostname(_) => None,
        }
    }
}

impl From<SocketAddr> for Destination {
    fn from(addr: SocketAddr) -> Self {
        Self::ip(addr.ip(), addr.port())
    }
}

/// `host:port` identity, also used as the connection-history key.
impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Username/password pair for SOCKS5 sub-negotiation. Anonymous when both
/// fields are empty.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Proxy-type-independent connect result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectOutcome {
    Succeeded,
    HostUnreachable,
    ConnectionRefused,
    BadAddressType,
    UnknownError,
}

#[cfg(any(target_os = "linux", target_os = "android"))]
const EAFNOSUPPORT: i32 = 97;
#[cfg(all(unix, not(any(target_os = "linux", target_os = "android"))))]
const EAFNOSUPPORT: i32 = 47;
#[cfg(windows)]
const EAFNOSUPPORT: i32 = 10047;
#[cfg(not(any(unix, windows)))]
const EAFNOSUPPORT: i32 = -1;

impl ConnectOutcome {
    /// Map a SOCKS5 `REP` byte. Values outside the table (including the
    /// ones rejected earlier as violations) land on `UnknownError`.
    pub fn from_socks5_reply(rep: u8) -> Self {
        match rep {
            0 => Self::Succeeded,
            4 => Self::HostUnreachable,
            5 => Self::ConnectionRefused,
            8 => Self::BadAddressType,
            _ => Self::UnknownError,
        }
    }

    /// Nearest outcome for a transport error.
    pub fn from_io_error(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => return Self::ConnectionRefused,
            io::ErrorKind::HostUnreachable => return Self::HostUnreachable,
            _ => {}
        }
        if err.raw_os_error() == Some(EAFNOSUPPORT) {
            return Self::BadAddressType;
        }
        Self::UnknownError
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self == Self::Succeeded
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::HostUnreachable => "host unreachable",
            Self::ConnectionRefused => "connection refused",
            Self::BadAddressType => "bad address type",
            Self::UnknownError => "unknown error",
        }
    }
}

impl fmt::Display for ConnectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown proxy protocol: {0}")]
pub struct UnknownProtocol(pub String);

/// Protocols usable for an outbound chain hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientProtocol {
    Socks5,
}

impl ClientProtocol {
    pub fn scheme(self) -> &'static str {
        match self {
            Self::Socks5 => "socks5",
        }
    }
}

impl FromStr for ClientProtocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "socks5" => Ok(Self::Socks5),
            other => Err(UnknownProtocol(other.to_string())),
        }
    }
}

impl fmt::Display for ClientProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Protocols the accepting side can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerProtocol {
    Socks5,
    Https,
}

impl ServerProtocol {
    pub fn scheme(self) -> &'static str {
        match self {
            Self::Socks5 => "socks5",
            Self::Https => "https",
        }
    }
}

impl FromStr for ServerProtocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "socks5" => Ok(Self::Socks5),
            "https" => Ok(Self::Https),
            other => Err(UnknownProtocol(other.to_string())),
        }
    }
}

impl fmt::Display for ServerProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// One configured hop of the outbound chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntry {
    pub protocol: ClientProtocol,
    pub proxy: Destination,
    pub credentials: Credentials,
}

impl ChainEntry {
    pub fn new(protocol: ClientProtocol, proxy: Destination, credentials: Credentials) -> Self {
        Self {
            protocol,
            proxy,
            credentials,
        }
    }
}

/// Proxy identity without credentials, e.g. `socks5://10.0.0.1:1080`.
impl fmt::Display for ChainEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol, self.proxy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn reply_table_is_fixed() {
        assert_eq!(ConnectOutcome::from_socks5_reply(0), ConnectOutcome::Succeeded);
        assert_eq!(ConnectOutcome::from_socks5_reply(4), ConnectOutcome::HostUnreachable);
        assert_eq!(ConnectOutcome::from_socks5_reply(5), ConnectOutcome::ConnectionRefused);
        assert_eq!(ConnectOutcome::from_socks5_reply(8), ConnectOutcome::BadAddressType);
        for rep in [1, 2, 3, 6, 7, 9, 0xff] {
            assert_eq!(ConnectOutcome::from_socks5_reply(rep), ConnectOutcome::UnknownError);
        }
    }

    #[test]
    fn io_error_mapping() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(ConnectOutcome::from_io_error(&refused), ConnectOutcome::ConnectionRefused);

        let unreachable = io::Error::from(io::ErrorKind::HostUnreachable);
        assert_eq!(ConnectOutcome::from_io_error(&unreachable), ConnectOutcome::HostUnreachable);

        let af = io::Error::from_raw_os_error(EAFNOSUPPORT);
        assert_eq!(ConnectOutcome::from_io_error(&af), ConnectOutcome::BadAddressType);

        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert_eq!(ConnectOutcome::from_io_error(&reset), ConnectOutcome::UnknownError);
    }

    #[test]
    fn destination_identity() {
        assert_eq!(Destination::hostname("example.com", 443).to_string(), "example.com:443");
        assert_eq!(
            Destination::ip(IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)), 80).to_string(),
            "93.184.216.34:80"
        );
        assert_eq!(
            Destination::ip(IpAddr::V6(Ipv6Addr::LOCALHOST), 8080).to_string(),
            "[::1]:8080"
        );
    }

    #[test]
    fn addressing_mode_is_unambiguous() {
        let named = Destination::hostname("example.com", 80);
        assert!(named.using_hostname());
        assert!(named.socket_addr().is_none());

        let literal = Destination::from(SocketAddr::from(([127, 0, 0, 1], 80)));
        assert!(!literal.using_hostname());
        assert_eq!(literal.socket_addr(), Some(SocketAddr::from(([127, 0, 0, 1], 80))));
    }

    #[test]
    fn credentials_debug_masks_password() {
        let creds = Credentials::new("alice", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
        assert!(Credentials::default().is_empty());
        assert!(!Credentials::new("", "x").is_empty());
    }

    #[test]
    fn protocol_names() {
        assert_eq!("socks5".parse::<ClientProtocol>(), Ok(ClientProtocol::Socks5));
        assert!("https".parse::<ClientProtocol>().is_err());
        assert_eq!("https".parse::<ServerProtocol>(), Ok(ServerProtocol::Https));
        assert_eq!("socks5".parse::<ServerProtocol>(), Ok(ServerProtocol::Socks5));
        assert!("http".parse::<ServerProtocol>().is_err());
    }

    #[test]
    fn chain_entry_display_hides_credentials() {
        let entry = ChainEntry::new(
            ClientProtocol::Socks5,
            Destination::hostname("proxy.local", 1080),
            Credentials::new("u", "p"),
        );
        assert_eq!(entry.to_string(), "socks5://proxy.local:1080");
    }
}
