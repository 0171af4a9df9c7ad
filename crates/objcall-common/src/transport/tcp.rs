use crate::protocol::error::{Error, Result};
use crate::transport::framed::FramedChannel;
use std::net::ToSocketAddrs;
use tokio::net::TcpStream;

/// Connects to a remote endpoint and wraps the stream in message framing.
///
/// The address may resolve to multiple socket addresses; each is tried
/// until one succeeds.
///
/// # Arguments
///
/// * `addr` - The address to connect to (e.g., "127.0.0.1:8080")
pub async fn connect(addr: &str) -> Result<FramedChannel<TcpStream>> {
    let socket_addrs = addr
        .to_socket_addrs()
        .map_err(|e| Error::Transport(format!("Invalid address '{}': {}", addr, e)))?;

    let mut last_err = None;
    for socket_addr in socket_addrs {
        match TcpStream::connect(&socket_addr).await {
            Ok(stream) => return Ok(FramedChannel::new(stream)),
            Err(e) => last_err = Some(e),
        }
    }

    Err(Error::Transport(format!(
        "Failed to connect to {}: {}",
        addr,
        last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no addresses resolved".to_string())
    )))
}
