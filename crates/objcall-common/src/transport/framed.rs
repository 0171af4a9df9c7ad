use crate::protocol::error::{Error, Result};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum message size (100 MB)
pub const MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

/// A duplex channel carrying whole messages, reliably and in order.
///
/// This is the boundary between the call protocol and whatever moves the
/// bytes. The connection driver only ever talks to this trait, so tests
/// can run two peers over an in-memory pipe and production code over TCP
/// with the same machinery.
#[async_trait]
pub trait MessageChannel: Send {
    /// Sends one message.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receives the next message. `Ok(None)` means the peer closed the
    /// channel in an orderly way.
    async fn recv(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Length-prefixed framing over any duplex byte stream.
///
/// Wire format: `[4-byte length as u32 big-endian] + [data]`.
///
/// # Example
///
/// ```no_run
/// use objcall_common::transport::{FramedChannel, MessageChannel};
///
/// # async fn demo() -> objcall_common::Result<()> {
/// let stream = tokio::net::TcpStream::connect("127.0.0.1:8080").await?;
/// let mut channel = FramedChannel::new(stream);
/// channel.send(b"hello").await?;
/// let reply = channel.recv().await?;
/// # Ok(())
/// # }
/// ```
pub struct FramedChannel<S> {
    stream: S,
}

impl<S> FramedChannel<S> {
    pub fn new(stream: S) -> Self {
        FramedChannel { stream }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[async_trait]
impl<S> MessageChannel for FramedChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let len = data.len() as u32;

        self.stream
            .write_all(&len.to_be_bytes())
            .await
            .map_err(|e| map_io_error(e, "writing length prefix"))?;

        self.stream
            .write_all(data)
            .await
            .map_err(|e| map_io_error(e, "writing data"))?;

        self.stream
            .flush()
            .await
            .map_err(|e| map_io_error(e, "flushing stream"))?;

        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Vec<u8>>> {
        let mut len_buf = [0u8; 4];
        match self.stream.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // Connection closed by peer between messages
                return Ok(None);
            }
            Err(e) => return Err(map_io_error(e, "reading length prefix")),
        }

        let len = u32::from_be_bytes(len_buf) as usize;

        // Validate length to prevent allocation of excessively large buffers
        if len > MAX_MESSAGE_SIZE {
            return Err(Error::Transport(format!(
                "Message too large: {} bytes (max {} bytes)",
                len, MAX_MESSAGE_SIZE
            )));
        }

        let mut buf = vec![0u8; len];
        self.stream
            .read_exact(&mut buf)
            .await
            .map_err(|e| map_io_error(e, "reading data"))?;

        Ok(Some(buf))
    }
}

/// Map IO errors to appropriate Error variants
fn map_io_error(err: std::io::Error, context: &str) -> Error {
    match err.kind() {
        std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::ConnectionAborted
        | std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::NotConnected => {
            Error::ConnectionLost(format!("{}: connection lost", context))
        }
        _ => Error::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_recv_over_duplex() {
        let (a, b) = tokio::io::duplex(4096);
        let mut left = FramedChannel::new(a);
        let mut right = FramedChannel::new(b);

        left.send(b"hello").await.unwrap();
        left.send(b"").await.unwrap();

        assert_eq!(right.recv().await.unwrap(), Some(b"hello".to_vec()));
        assert_eq!(right.recv().await.unwrap(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_recv_reports_orderly_close() {
        let (a, b) = tokio::io::duplex(4096);
        let mut right = FramedChannel::new(b);
        drop(a);

        assert_eq!(right.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_recv_rejects_oversized_frame() {
        let (mut a, b) = tokio::io::duplex(4096);
        let mut right = FramedChannel::new(b);

        // Claim a frame just past the limit without sending a body.
        let len = (MAX_MESSAGE_SIZE as u32) + 1;
        a.write_all(&len.to_be_bytes()).await.unwrap();

        assert!(matches!(right.recv().await, Err(Error::Transport(_))));
    }
}
