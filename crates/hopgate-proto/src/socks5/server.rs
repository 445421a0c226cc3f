//! SOCKS5 server role: accept one CONNECT request.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use super::{ATYP_IPV4, CMD_CONNECT, METHOD_NO_AUTH, SOCKS_VERSION, read_raw_address};
use crate::error::{HandshakeError, ProtocolError};
use crate::types::{ConnectOutcome, Destination};

/// Which `REP` code a `HostUnreachable` outcome is reported with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HostUnreachableReply {
    /// `REP=4`, "Host unreachable" per RFC 1928.
    #[default]
    Rfc1928,
    /// `REP=1`, general failure, as older releases sent.
    Legacy,
}

impl HostUnreachableReply {
    /// `REP` byte for `outcome`.
    pub fn reply_code(self, outcome: ConnectOutcome) -> u8 {
        match outcome {
            ConnectOutcome::Succeeded => 0x00,
            ConnectOutcome::ConnectionRefused => 0x05,
            ConnectOutcome::BadAddressType => 0x07,
            ConnectOutcome::HostUnreachable => match self {
                Self::Rfc1928 => 0x04,
                Self::Legacy => 0x01,
            },
            ConnectOutcome::UnknownError => 0x01,
        }
    }
}

/// Accepts a no-auth SOCKS5 CONNECT.
#[derive(Debug, Clone, Default)]
pub struct Socks5Server {
    host_unreachable: HostUnreachableReply,
}

impl Socks5Server {
    pub fn new(host_unreachable: HostUnreachableReply) -> Self {
        Self { host_unreachable }
    }

    /// Run method negotiation and read the CONNECT request.
    pub async fn read_connect_request<S>(
        &mut self,
        stream: &mut S,
    ) -> Result<Destination, HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        let mut greeting = [0u8; 2];
        stream.read_exact(&mut greeting).await?;
        let [version, nmethods] = greeting;
        if version != SOCKS_VERSION || nmethods == 0 {
            return Err(ProtocolError::ProtocolViolation.into());
        }
        let mut methods = vec![0u8; nmethods as usize];
        stream.read_exact(&mut methods).await?;
        if !methods.contains(&METHOD_NO_AUTH) {
            return Err(ProtocolError::ProtocolViolation.into());
        }
        stream.write_all(&[SOCKS_VERSION, METHOD_NO_AUTH]).await?;
        stream.flush().await?;

        let mut header = [0u8; 4];
        stream.read_exact(&mut header).await?;
        let [version, cmd, _rsv, atyp] = header;
        if version != SOCKS_VERSION {
            return Err(ProtocolError::ProtocolViolation.into());
        }
        if cmd != CMD_CONNECT {
            return Err(ProtocolError::UnsupportedCommand.into());
        }
        let (host, port) = read_raw_address(stream, atyp).await?;
        let dest = Destination::new(host.into_host()?, port);
        trace!(%dest, "socks5 connect request");
        Ok(dest)
    }

    /// Send the 10-byte reply. The bound address and port are always zero.
    pub async fn write_connect_response<S>(
        &mut self,
        stream: &mut S,
        outcome: ConnectOutcome,
    ) -> Result<(), HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        let rep = self.host_unreachable.reply_code(outcome);
        stream
            .write_all(&[SOCKS_VERSION, rep, 0x00, ATYP_IPV4, 0, 0, 0, 0, 0, 0])
            .await?;
        stream.flush().await?;
        Ok(())
    }
}
