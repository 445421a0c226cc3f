//! `scheme://[user[:pass]@]host[:port][/path]` and bare `host:port` grammar.
//!
//! Used by configuration for chain hops and tunnel destinations, and by the
//! HTTP CONNECT server for the request target.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::types::{Destination, HostAddress};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("empty scheme")]
    EmptyScheme,
    #[error("empty host")]
    EmptyHost,
    #[error("invalid IPv6 literal")]
    InvalidIpv6,
    #[error("unexpected character after host")]
    TrailingGarbage,
    #[error("invalid port")]
    InvalidPort,
    #[error("scheme not allowed here")]
    UnexpectedScheme,
    #[error("credentials not allowed here")]
    UnexpectedCredentials,
    #[error("path not allowed here")]
    UnexpectedPath,
    #[error("missing port")]
    MissingPort,
}

/// Parsed form of a proxy URL or `host:port` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyUrl {
    pub scheme: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub host: HostAddress,
    pub port: Option<u16>,
    /// Everything from the first `/` after the authority, verbatim.
    pub path: String,
}

impl ProxyUrl {
    pub fn parse(text: &str) -> Result<Self, UrlError> {
        let (scheme, rest) = match text.find("://") {
            Some(0) => return Err(UrlError::EmptyScheme),
            Some(idx) => (Some(text[..idx].to_string()), &text[idx + 3..]),
            None => (None, text),
        };

        let authority_end = rest.find('/').unwrap_or(rest.len());
        let (authority, path) = rest.split_at(authority_end);

        let (userinfo, hostport) = match authority.find('@') {
            Some(idx) => (Some(&authority[..idx]), &authority[idx + 1..]),
            None => (None, authority),
        };
        let (username, password) = match userinfo {
            Some(info) => match info.split_once(':') {
                Some((user, pass)) => (Some(user.to_string()), Some(pass.to_string())),
                None => (Some(info.to_string()), None),
            },
            None => (None, None),
        };

        let (host, after_host) = parse_host(hostport)?;
        let port = match after_host {
            "" => None,
            p => match p.strip_prefix(':') {
                Some(digits) => Some(parse_port(digits)?),
                None => return Err(UrlError::TrailingGarbage),
            },
        };

        Ok(Self {
            scheme,
            username,
            password,
            host,
            port,
            path: path.to_string(),
        })
    }

    #[inline]
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }
}

/// Parse a bare `host:port`: no scheme, no credentials, no path, port
/// required.
pub fn parse_host_port(text: &str) -> Result<Destination, UrlError> {
    let url = ProxyUrl::parse(text)?;
    if url.scheme.is_some() {
        return Err(UrlError::UnexpectedScheme);
    }
    if url.has_credentials() {
        return Err(UrlError::UnexpectedCredentials);
    }
    if !url.path.is_empty() {
        return Err(UrlError::UnexpectedPath);
    }
    let port = url.port.ok_or(UrlError::MissingPort)?;
    Ok(Destination::new(url.host, port))
}

/// Split the host off the front of `text`, returning the remainder.
fn parse_host(text: &str) -> Result<(HostAddress, &str), UrlError> {
    if let Some(bracketed) = text.strip_prefix('[') {
        let close = bracketed.find(']').ok_or(UrlError::InvalidIpv6)?;
        let ip: Ipv6Addr = bracketed[..close]
            .parse()
            .map_err(|_| UrlError::InvalidIpv6)?;
        return Ok((HostAddress::Ip(IpAddr::V6(ip)), &bracketed[close + 1..]));
    }

    let end = text.find(':').unwrap_or(text.len());
    let name = &text[..end];
    if name.is_empty() {
        return Err(UrlError::EmptyHost);
    }
    if name.contains(['[', ']']) {
        return Err(UrlError::TrailingGarbage);
    }
    let host = match name.parse::<Ipv4Addr>() {
        Ok(ip) => HostAddress::Ip(IpAddr::V4(ip)),
        Err(_) => HostAddress::Hostname(name.to_string()),
    };
    Ok((host, &text[end..]))
}

fn parse_port(digits: &str) -> Result<u16, UrlError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UrlError::InvalidPort);
    }
    digits.parse().map_err(|_| UrlError::InvalidPort)
}
