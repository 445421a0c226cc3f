//! SOCKS5 client role: dial one hop.

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use super::{
    AUTH_VERSION, CMD_CONNECT, MAX_FIELD_LEN, MAX_REPLY_CODE, METHOD_NO_ACCEPTABLE,
    METHOD_NO_AUTH, METHOD_USER_PASS, SOCKS_VERSION, encode_address, read_raw_address,
};
use crate::error::{HandshakeError, ProtocolError};
use crate::types::{ConnectOutcome, Credentials, Destination, HostAddress};

/// Negotiates a CONNECT through one SOCKS5 proxy.
///
/// Call [`write_connect_request`](Self::write_connect_request), then
/// [`read_connect_response`](Self::read_connect_response), on a stream that
/// is already connected to the proxy.
#[derive(Debug, Clone, Default)]
pub struct Socks5Client {
    credentials: Credentials,
}

impl Socks5Client {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Validate, negotiate the auth method, authenticate if configured and
    /// send the CONNECT request for `dest`.
    ///
    /// Length checks run before anything is written, so a rejected request
    /// leaves the stream untouched.
    pub async fn write_connect_request<S>(
        &mut self,
        stream: &mut S,
        dest: &Destination,
    ) -> Result<(), HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        if self.credentials.username.len() > MAX_FIELD_LEN
            || self.credentials.password.len() > MAX_FIELD_LEN
        {
            return Err(ProtocolError::CredsTooLong.into());
        }
        if let HostAddress::Hostname(name) = &dest.host
            && name.len() > MAX_FIELD_LEN
        {
            return Err(ProtocolError::HostnameTooLong.into());
        }

        let anonymous = self.credentials.is_empty();
        let method = if anonymous {
            METHOD_NO_AUTH
        } else {
            METHOD_USER_PASS
        };
        stream.write_all(&[SOCKS_VERSION, 1, method]).await?;
        stream.flush().await?;

        let mut reply = [0u8; 2];
        stream.read_exact(&mut reply).await?;
        if reply[0] != SOCKS_VERSION {
            return Err(ProtocolError::ProtocolViolation.into());
        }
        if reply[1] == METHOD_NO_ACCEPTABLE {
            return Err(ProtocolError::BadAuthMethod.into());
        }
        if reply[1] != method {
            return Err(ProtocolError::ProtocolViolation.into());
        }
        trace!(method = reply[1], "socks5 method selected");

        if !anonymous {
            self.authenticate(stream).await?;
        }

        let mut buf = BytesMut::with_capacity(6 + 1 + MAX_FIELD_LEN);
        buf.put_slice(&[SOCKS_VERSION, CMD_CONNECT, 0x00]);
        encode_address(&mut buf, dest);
        stream.write_all(&buf).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Read the CONNECT reply and map its `REP` field.
    ///
    /// The bound address is consumed and discarded.
    pub async fn read_connect_response<S>(
        &mut self,
        stream: &mut S,
    ) -> Result<ConnectOutcome, HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        let mut header = [0u8; 4];
        stream.read_exact(&mut header).await?;
        let [version, rep, _rsv, atyp] = header;
        if version != SOCKS_VERSION || rep > MAX_REPLY_CODE {
            return Err(ProtocolError::ProtocolViolation.into());
        }
        let (_bound, _port) = read_raw_address(stream, atyp).await?;
        Ok(ConnectOutcome::from_socks5_reply(rep))
    }

    #[allow(clippy::cast_possible_truncation)]
    async fn authenticate<S>(&self, stream: &mut S) -> Result<(), HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        let user = self.credentials.username.as_bytes();
        let pass = self.credentials.password.as_bytes();
        let mut buf = BytesMut::with_capacity(3 + user.len() + pass.len());
        buf.put_u8(AUTH_VERSION);
        buf.put_u8(user.len() as u8);
        buf.put_slice(user);
        buf.put_u8(pass.len() as u8);
        buf.put_slice(pass);
        stream.write_all(&buf).await?;
        stream.flush().await?;

        let mut reply = [0u8; 2];
        stream.read_exact(&mut reply).await?;
        if reply[0] != AUTH_VERSION {
            return Err(ProtocolError::ProtocolViolation.into());
        }
        if reply[1] != 0 {
            return Err(ProtocolError::AuthFailed.into());
        }
        Ok(())
    }
}
