//! SOCKS5 framing (RFC 1928, RFC 1929) shared by the client and server roles.

mod client;
mod server;

pub use client::Socks5Client;
pub use server::{HostUnreachableReply, Socks5Server};

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{HandshakeError, ProtocolError};
use crate::types::{Destination, HostAddress};

pub const SOCKS_VERSION: u8 = 0x05;
pub const AUTH_VERSION: u8 = 0x01;

pub const METHOD_NO_AUTH: u8 = 0x00;
pub const METHOD_USER_PASS: u8 = 0x02;
pub const METHOD_NO_ACCEPTABLE: u8 = 0xff;

pub const CMD_CONNECT: u8 = 0x01;

pub const ATYP_IPV4: u8 = 0x01;
pub const ATYP_DOMAIN: u8 = 0x03;
pub const ATYP_IPV6: u8 = 0x04;

/// Highest `REP` value defined by RFC 1928.
pub const MAX_REPLY_CODE: u8 = 0x08;

/// Maximum length of a hostname, username or password field.
pub use hopgate_core::defaults::SOCKS5_MAX_FIELD_LEN as MAX_FIELD_LEN;

/// Address field exactly as received, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawHost {
    V4([u8; 4]),
    V6([u8; 16]),
    Domain(Vec<u8>),
}

/// Append `ATYP, DST.ADDR, DST.PORT` for `dest`.
///
/// Caller must have checked that a hostname fits in one length byte.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn encode_address(buf: &mut BytesMut, dest: &Destination) {
    match &dest.host {
        HostAddress::Ip(IpAddr::V4(ip)) => {
            buf.put_u8(ATYP_IPV4);
            buf.put_slice(&ip.octets());
        }
        HostAddress::Ip(IpAddr::V6(ip)) => {
            buf.put_u8(ATYP_IPV6);
            buf.put_slice(&ip.octets());
        }
        HostAddress::Hostname(name) => {
            debug_assert!(name.len() <= MAX_FIELD_LEN);
            buf.put_u8(ATYP_DOMAIN);
            buf.put_u8(name.len() as u8);
            buf.put_slice(name.as_bytes());
        }
    }
    buf.put_u16(dest.port);
}

/// Read `DST.ADDR, DST.PORT` for an already-read `atyp`, consuming exactly
/// the bytes the address type calls for.
pub(crate) async fn read_raw_address<S>(
    stream: &mut S,
    atyp: u8,
) -> Result<(RawHost, u16), HandshakeError>
where
    S: AsyncRead + Unpin + ?Sized,
{
    let host = match atyp {
        ATYP_IPV4 => {
            let mut ip = [0u8; 4];
            stream.read_exact(&mut ip).await?;
            RawHost::V4(ip)
        }
        ATYP_IPV6 => {
            let mut ip = [0u8; 16];
            stream.read_exact(&mut ip).await?;
            RawHost::V6(ip)
        }
        ATYP_DOMAIN => {
            let len = stream.read_u8().await? as usize;
            let mut name = vec![0u8; len];
            stream.read_exact(&mut name).await?;
            RawHost::Domain(name)
        }
        _ => return Err(ProtocolError::ProtocolViolation.into()),
    };
    let port = stream.read_u16().await?;
    Ok((host, port))
}

impl RawHost {
    /// Interpret as a connect target. Empty or non-UTF-8 names are
    /// violations.
    pub(crate) fn into_host(self) -> Result<HostAddress, ProtocolError> {
        match self {
            Self::V4(ip) => Ok(HostAddress::Ip(IpAddr::V4(Ipv4Addr::from(ip)))),
            Self::V6(ip) => Ok(HostAddress::Ip(IpAddr::V6(Ipv6Addr::from(ip)))),
            Self::Domain(name) if name.is_empty() => Err(ProtocolError::ProtocolViolation),
            Self::Domain(name) => String::from_utf8(name)
                .map(HostAddress::Hostname)
                .map_err(|_| ProtocolError::ProtocolViolation),
        }
    }
}
