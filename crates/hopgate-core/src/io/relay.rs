//! Bidirectional byte relay with half-close propagation.
//!
//! Each direction is driven as an independent poll-based state machine within
//! a single future, so back-pressure on one direction never stalls the other.
//!
//! A clean end-of-stream on one side shuts down the send side of the opposite
//! socket and leaves the other direction running. Any other I/O error ends
//! the whole relay; the caller drops both streams, which closes the sockets.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Trait for recording relay metrics.
///
/// "Upload" is the front → back direction (bytes the accepted client sends
/// toward the destination), "download" the reverse.
pub trait RelayMetrics {
    /// Record bytes forwarded from the front socket to the back socket.
    fn record_upload(&self, bytes: u64);
    /// Record bytes forwarded from the back socket to the front socket.
    fn record_download(&self, bytes: u64);
}

/// No-op metrics implementation for cases where metrics aren't needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl RelayMetrics for NoOpMetrics {
    #[inline]
    fn record_upload(&self, _bytes: u64) {}
    #[inline]
    fn record_download(&self, _bytes: u64) {}
}

/// Byte totals of a finished relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Bytes forwarded front → back.
    pub uploaded: u64,
    /// Bytes forwarded back → front.
    pub downloaded: u64,
}

/// State machine for one-directional copy with flush.
enum CopyState {
    Reading,
    Writing(usize, usize), // (pos, len)
    Flushing(usize),       // bytes flushing
    ShuttingDown,
    Done,
}

/// Result of polling one copy direction.
enum CopyPoll {
    /// Data was flushed, contains byte count for metrics.
    Flushed(usize),
    /// Direction finished (EOF + half-close).
    Finished,
}

/// Poll-driven one-directional copy: read → write → flush.
fn poll_copy_direction<R, W>(
    cx: &mut Context<'_>,
    reader: &mut R,
    writer: &mut W,
    buf: &mut [u8],
    state: &mut CopyState,
) -> Poll<io::Result<CopyPoll>>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    loop {
        match state {
            CopyState::Reading => {
                let mut read_buf = ReadBuf::new(buf);
                match Pin::new(&mut *reader).poll_read(cx, &mut read_buf) {
                    Poll::Ready(Ok(())) => {
                        let n = read_buf.filled().len();
                        if n == 0 {
                            *state = CopyState::ShuttingDown;
                        } else {
                            *state = CopyState::Writing(0, n);
                        }
                    }
                    Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                    Poll::Pending => return Poll::Pending,
                }
            }
            CopyState::Writing(pos, len) => {
                match Pin::new(&mut *writer).poll_write(cx, &buf[*pos..*len]) {
                    Poll::Ready(Ok(0)) => {
                        return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
                    }
                    Poll::Ready(Ok(n)) => {
                        *pos += n;
                        if *pos >= *len {
                            let total = *len;
                            *state = CopyState::Flushing(total);
                        }
                    }
                    Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                    Poll::Pending => return Poll::Pending,
                }
            }
            CopyState::Flushing(bytes) => {
                let bytes = *bytes;
                match Pin::new(&mut *writer).poll_flush(cx) {
                    Poll::Ready(Ok(())) => {
                        *state = CopyState::Reading;
                        return Poll::Ready(Ok(CopyPoll::Flushed(bytes)));
                    }
                    Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                    Poll::Pending => return Poll::Pending,
                }
            }
            // Half-close failures are ignored: the peer may already be gone,
            // and the opposite direction still decides when the relay ends.
            CopyState::ShuttingDown => match Pin::new(&mut *writer).poll_shutdown(cx) {
                Poll::Ready(_) => {
                    *state = CopyState::Done;
                    return Poll::Ready(Ok(CopyPoll::Finished));
                }
                Poll::Pending => return Poll::Pending,
            },
            CopyState::Done => return Poll::Ready(Ok(CopyPoll::Finished)),
        }
    }
}

/// Relay bytes between `front` and `back` until both directions end.
///
/// Bytes within one direction are forwarded in receipt order, in whatever
/// chunk size the underlying read returns. The two directions carry no
/// relative ordering guarantee.
///
/// # Arguments
///
/// * `front` - The accepted (client-side) stream
/// * `back` - The stream connected through the proxy chain
/// * `buffer_size` - Size of each direction's read buffer
/// * `metrics` - Metrics recorder for tracking bytes transferred
///
/// # Errors
///
/// Returns the first hard I/O error seen on either direction. Clean
/// end-of-stream is not an error.
pub async fn relay_bidirectional<A, B, M>(
    front: A,
    back: B,
    buffer_size: usize,
    metrics: &M,
) -> io::Result<RelayStats>
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
    M: RelayMetrics + ?Sized,
{
    let (mut front_r, mut front_w) = tokio::io::split(front);
    let (mut back_r, mut back_w) = tokio::io::split(back);

    let mut up_buf = vec![0u8; buffer_size];
    let mut down_buf = vec![0u8; buffer_size];
    let mut up_state = CopyState::Reading;
    let mut down_state = CopyState::Reading;
    let mut stats = RelayStats::default();

    std::future::poll_fn(|cx| {
        loop {
            let mut progressed = false;

            if !matches!(up_state, CopyState::Done) {
                match poll_copy_direction(cx, &mut front_r, &mut back_w, &mut up_buf, &mut up_state)
                {
                    Poll::Ready(Ok(CopyPoll::Flushed(n))) => {
                        stats.uploaded += n as u64;
                        metrics.record_upload(n as u64);
                        progressed = true;
                    }
                    Poll::Ready(Ok(CopyPoll::Finished)) => {}
                    Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                    Poll::Pending => {}
                }
            }

            if !matches!(down_state, CopyState::Done) {
                match poll_copy_direction(
                    cx,
                    &mut back_r,
                    &mut front_w,
                    &mut down_buf,
                    &mut down_state,
                ) {
                    Poll::Ready(Ok(CopyPoll::Flushed(n))) => {
                        stats.downloaded += n as u64;
                        metrics.record_download(n as u64);
                        progressed = true;
                    }
                    Poll::Ready(Ok(CopyPoll::Finished)) => {}
                    Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                    Poll::Pending => {}
                }
            }

            if matches!(up_state, CopyState::Done) && matches!(down_state, CopyState::Done) {
                return Poll::Ready(Ok(stats));
            }
            if !progressed {
                return Poll::Pending;
            }
        }
    })
    .await
}
