//! TCP accept loop.
//!
//! Each accepted connection gets its own [`MethodCallPeer`], built from
//! whatever the [`PeerFactory`] hands back: the factory owns the exposed
//! object (sharing one instance across connections or building one per
//! connection is its choice), the server only wires connections up.

use crate::connection::MethodCallPeer;
use crate::context::CallContext;
use crate::dispatch::Dispatcher;
use objcall_common::protocol::{Error, Result};
use objcall_common::transport::FramedChannel;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builds the exposing-side configuration for one inbound connection.
///
/// Blanket-implemented for closures, so a server can be run as
/// `server.run(move |addr| (dispatcher.clone(), context.clone()))`.
pub trait PeerFactory: Send + Sync + 'static {
    type Context: CallContext;

    fn build(&self, peer_addr: SocketAddr) -> (Dispatcher, Arc<Self::Context>);
}

impl<F, P> PeerFactory for F
where
    F: Fn(SocketAddr) -> (Dispatcher, Arc<P>) + Send + Sync + 'static,
    P: CallContext,
{
    type Context = P;

    fn build(&self, peer_addr: SocketAddr) -> (Dispatcher, Arc<P>) {
        self(peer_addr)
    }
}

/// Listens for connections and spawns a [`MethodCallPeer`] per accepted
/// stream.
pub struct MethodCallServer {
    listener: TcpListener,
}

impl MethodCallServer {
    /// Binds to the specified address.
    ///
    /// # Arguments
    /// * `bind_addr` - The address to bind to (e.g., "0.0.0.0:8080")
    pub async fn bind(bind_addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| Error::Transport(format!("Failed to bind to {}: {}", bind_addr, e)))?;

        Ok(MethodCallServer { listener })
    }

    /// Gets the actual bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| Error::Transport(format!("Failed to get local addr: {}", e)))
    }

    /// Accepts connections forever, building a peer for each.
    ///
    /// A connection whose whitelist fails extras validation is logged and
    /// dropped; the loop keeps serving.
    pub async fn run<F>(&self, factory: F) -> Result<()>
    where
        F: PeerFactory,
    {
        loop {
            let (stream, peer_addr) = self
                .listener
                .accept()
                .await
                .map_err(|e| Error::Transport(format!("Failed to accept connection: {}", e)))?;

            tracing::info!(%peer_addr, "connection established");

            let (dispatcher, context) = factory.build(peer_addr);
            match MethodCallPeer::spawn(FramedChannel::new(stream), dispatcher, context) {
                Ok(_peer) => {
                    // The driver task keeps the connection alive until the
                    // peer disconnects.
                }
                Err(e) => {
                    tracing::error!(%peer_addr, error = %e, "dropping connection: invalid extras configuration");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_binds_to_ephemeral_port() {
        let server = MethodCallServer::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_rejects_bad_address() {
        assert!(MethodCallServer::bind("300.0.0.1:0").await.is_err());
    }
}
