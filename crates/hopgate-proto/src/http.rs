//! HTTP CONNECT server role.
//!
//! Only `CONNECT host:port HTTP/1.x` is understood. Header lines are checked
//! for shape and otherwise ignored.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use hopgate_core::defaults::HTTP_MAX_LINE_LEN;

use crate::error::{HandshakeError, ProtocolError};
use crate::types::{ConnectOutcome, Destination};
use crate::url::parse_host_port;

const DEFAULT_VERSION: &str = "HTTP/1.1";

/// Accepts one HTTP CONNECT request.
#[derive(Debug, Clone, Default)]
pub struct HttpConnectServer {
    /// Version token of the request, echoed in the response.
    version: Option<String>,
}

impl HttpConnectServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the request line and header block.
    pub async fn read_connect_request<S>(
        &mut self,
        stream: &mut S,
    ) -> Result<Destination, HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        let line = read_line(stream).await?;
        let mut parts = line.split(' ');
        let (Some(method), Some(target), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(ProtocolError::ProtocolViolation.into());
        };
        if method != "CONNECT" || !matches!(version, "HTTP/1.0" | "HTTP/1.1") {
            return Err(ProtocolError::ProtocolViolation.into());
        }
        let dest = parse_host_port(target).map_err(|_| ProtocolError::ProtocolViolation)?;
        self.version = Some(version.to_string());

        loop {
            let line = read_line(stream).await?;
            if line.is_empty() {
                break;
            }
            if !is_header_line(&line) {
                return Err(ProtocolError::ProtocolViolation.into());
            }
        }
        trace!(%dest, "http connect request");
        Ok(dest)
    }

    /// Send `200 Connection established` on success, `502 Bad Gateway` for
    /// every other outcome.
    pub async fn write_connect_response<S>(
        &mut self,
        stream: &mut S,
        outcome: ConnectOutcome,
    ) -> Result<(), HandshakeError>
    where
        S: AsyncRead + AsyncWrite + Unpin + ?Sized,
    {
        let (code, reason) = if outcome.is_success() {
            (200, "Connection established")
        } else {
            (502, "Bad Gateway")
        };
        let version = self.version.as_deref().unwrap_or(DEFAULT_VERSION);
        let response = format!("{version} {code} {reason}\r\nContent-Length: 0\r\n\r\n");
        stream.write_all(response.as_bytes()).await?;
        stream.flush().await?;
        Ok(())
    }
}

/// `Key: value` with exactly one separator and both sides non-empty.
fn is_header_line(line: &str) -> bool {
    let mut parts = line.split(": ");
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(key), Some(value), None) if !key.is_empty() && !value.is_empty()
    )
}

/// Read one LF-terminated line, dropping the LF and an optional CR.
///
/// Reads a byte at a time so nothing past the header block is consumed.
async fn read_line<S>(stream: &mut S) -> Result<String, HandshakeError>
where
    S: AsyncRead + Unpin + ?Sized,
{
    let mut line = Vec::with_capacity(128);
    loop {
        if line.len() >= HTTP_MAX_LINE_LEN {
            return Err(ProtocolError::LineTooLong.into());
        }
        match stream.read_u8().await? {
            b'\n' => break,
            byte => line.push(byte),
        }
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    String::from_utf8(line).map_err(|_| ProtocolError::ProtocolViolation.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    async fn serve(input: &[u8]) -> (Result<Destination, HandshakeError>, Vec<u8>) {
        let (mut server_side, mut peer) = duplex(8192);
        peer.write_all(input).await.unwrap();
        peer.shutdown().await.unwrap();
        let res = HttpConnectServer::new()
            .read_connect_request(&mut server_side)
            .await;
        let mut rest = Vec::new();
        server_side.read_to_end(&mut rest).await.unwrap();
        (res, rest)
    }

    fn violation(res: Result<Destination, HandshakeError>) -> bool {
        res.unwrap_err().protocol() == Some(ProtocolError::ProtocolViolation)
    }

    #[tokio::test]
    async fn connect_with_host_header() {
        let (res, rest) =
            serve(b"CONNECT example.com:443 HTTP/1.1\r\nHost: example.com\r\n\r\nPAYLOAD").await;
        assert_eq!(res.unwrap(), Destination::hostname("example.com", 443));
        assert_eq!(rest, b"PAYLOAD");
    }

    #[tokio::test]
    async fn bare_lf_lines_and_ipv6_target() {
        let (res, _) = serve(b"CONNECT [::1]:22 HTTP/1.0\n\n").await;
        let dest = res.unwrap();
        assert_eq!(dest, Destination::ip("::1".parse().unwrap(), 22));
    }

    #[tokio::test]
    async fn overlong_first_line() {
        let input = vec![b'A'; HTTP_MAX_LINE_LEN + 10];
        let (res, _) = serve(&input).await;
        assert_eq!(res.unwrap_err().protocol(), Some(ProtocolError::LineTooLong));
    }

    #[tokio::test]
    async fn longest_accepted_line() {
        let mut input = b"CONNECT h:1 HTTP/1.1\r\nX: ".to_vec();
        let header_len = HTTP_MAX_LINE_LEN - 1;
        input.resize(input.len() + header_len - 3, b'v');
        input.extend_from_slice(b"\n\r\n");
        let (res, _) = serve(&input).await;
        assert_eq!(res.unwrap(), Destination::hostname("h", 1));
    }

    #[tokio::test]
    async fn request_line_violations() {
        assert!(violation(serve(b"GET example.com:443 HTTP/1.1\r\n\r\n").await.0));
        assert!(violation(serve(b"CONNECT example.com:443 HTTP/2\r\n\r\n").await.0));
        assert!(violation(serve(b"CONNECT example.com:443\r\n\r\n").await.0));
        assert!(violation(serve(b"CONNECT  example.com:443 HTTP/1.1\r\n\r\n").await.0));
        assert!(violation(serve(b"CONNECT example.com HTTP/1.1\r\n\r\n").await.0));
        assert!(violation(
            serve(b"CONNECT http://example.com:80 HTTP/1.1\r\n\r\n").await.0
        ));
        assert!(violation(serve(b"CONNECT u:p@example.com:80 HTTP/1.1\r\n\r\n").await.0));
    }

    #[tokio::test]
    async fn header_line_violations() {
        assert!(violation(serve(b"CONNECT h:1 HTTP/1.1\r\nNoSeparator\r\n\r\n").await.0));
        assert!(violation(serve(b"CONNECT h:1 HTTP/1.1\r\nKey: \r\n\r\n").await.0));
        assert!(violation(serve(b"CONNECT h:1 HTTP/1.1\r\n: value\r\n\r\n").await.0));
        assert!(violation(serve(b"CONNECT h:1 HTTP/1.1\r\nA: b: c\r\n\r\n").await.0));
    }

    #[tokio::test]
    async fn eof_before_blank_line() {
        let (res, _) = serve(b"CONNECT h:1 HTTP/1.1\r\nHost: h\r\n").await;
        assert!(res.unwrap_err().transport().is_some());
    }

    async fn respond(request: &[u8], outcome: ConnectOutcome) -> String {
        let (mut server_side, mut peer) = duplex(8192);
        peer.write_all(request).await.unwrap();
        let mut engine = HttpConnectServer::new();
        engine.read_connect_request(&mut server_side).await.unwrap();
        engine
            .write_connect_response(&mut server_side, outcome)
            .await
            .unwrap();
        drop(server_side);
        let mut written = Vec::new();
        peer.read_to_end(&mut written).await.unwrap();
        String::from_utf8(written).unwrap()
    }

    #[tokio::test]
    async fn success_response_echoes_version() {
        let response = respond(b"CONNECT h:1 HTTP/1.0\r\n\r\n", ConnectOutcome::Succeeded).await;
        assert_eq!(
            response,
            "HTTP/1.0 200 Connection established\r\nContent-Length: 0\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn every_failure_collapses_to_bad_gateway() {
        for outcome in [
            ConnectOutcome::HostUnreachable,
            ConnectOutcome::ConnectionRefused,
            ConnectOutcome::BadAddressType,
            ConnectOutcome::UnknownError,
        ] {
            let response = respond(b"CONNECT h:1 HTTP/1.1\r\n\r\n", outcome).await;
            assert_eq!(response, "HTTP/1.1 502 Bad Gateway\r\nContent-Length: 0\r\n\r\n");
        }
    }
}
