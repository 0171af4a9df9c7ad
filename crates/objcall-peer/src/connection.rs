//! The per-connection peer object.
//!
//! A [`MethodCallPeer`] ties one dispatcher and one remote proxy to one
//! transport channel. A single driver task owns the channel and
//! multiplexes, with no locks:
//!
//! - outbound calls from any [`RemoteObject`] clone, registered in a
//!   pending table keyed by request id before the envelope is written;
//! - inbound frames: an incoming call is dispatched synchronously and
//!   answered; an incoming response completes the matching pending call.
//!
//! When the channel closes, errors out, or delivers a malformed envelope,
//! the driver stops and every pending call fails with a connection-lost
//! error: each call resolves exactly once, one way or the other. Nothing
//! about a connection survives it.

use crate::context::{validate_extras, CallContext, PathError};
use crate::dispatch::Dispatcher;
use crate::remote::{CallResult, OutboundCall, RemoteObject};
use objcall_common::protocol::{Error, Message, RequestId, Result};
use objcall_common::transport::{MessageChannel, WireCodec};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const OUTBOUND_QUEUE_DEPTH: usize = 32;

/// One side of an established connection: exposes a local object through
/// its [`Dispatcher`] (possibly nothing, via an empty whitelist) and
/// reaches the remote object through its [`RemoteObject`].
pub struct MethodCallPeer {
    remote: RemoteObject,
    driver: JoinHandle<()>,
}

impl MethodCallPeer {
    /// Starts a peer over an established message channel.
    ///
    /// Every extras path declared in the dispatcher's whitelist is
    /// resolved against `context` up front, so a misdeclared path fails
    /// here instead of during a later call.
    pub fn spawn<C, P>(
        channel: C,
        dispatcher: Dispatcher,
        context: Arc<P>,
    ) -> std::result::Result<Self, PathError>
    where
        C: MessageChannel + 'static,
        P: CallContext,
    {
        validate_extras(dispatcher.whitelist(), &context)?;

        let (calls_tx, calls_rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);
        let remote = RemoteObject::new(calls_tx);
        let driver = tokio::spawn(drive(channel, dispatcher, context, calls_rx));

        Ok(MethodCallPeer { remote, driver })
    }

    /// Connects over TCP and starts a peer on the resulting channel.
    pub async fn connect<P>(
        addr: &str,
        dispatcher: Dispatcher,
        context: Arc<P>,
    ) -> Result<Self>
    where
        P: CallContext,
    {
        let channel = objcall_common::transport::tcp::connect(addr).await?;
        Self::spawn(channel, dispatcher, context).map_err(|e| Error::Config(e.to_string()))
    }

    /// A proxy handle for the object exposed by the remote peer.
    pub fn remote(&self) -> RemoteObject {
        self.remote.clone()
    }

    /// Waits until the connection has shut down.
    pub async fn closed(self) {
        let _ = self.driver.await;
    }

    /// Tears the connection down. Pending calls fail with a
    /// connection-lost error through their dropped reply slots.
    pub fn close(&self) {
        self.driver.abort();
    }
}

/// The connection driver: single logical thread of control per
/// connection, suspending only while waiting on the channel or the
/// outbound queue.
async fn drive<C, P>(
    mut channel: C,
    dispatcher: Dispatcher,
    context: Arc<P>,
    mut calls: mpsc::Receiver<OutboundCall>,
) where
    C: MessageChannel,
    P: CallContext,
{
    let mut pending: HashMap<RequestId, tokio::sync::oneshot::Sender<CallResult>> = HashMap::new();
    let mut calls_closed = false;

    loop {
        tokio::select! {
            outbound = calls.recv(), if !calls_closed => {
                match outbound {
                    // All proxy handles dropped; keep serving the remote caller.
                    None => calls_closed = true,
                    Some(OutboundCall { call, reply }) => {
                        let id = call.id;
                        let frame = match WireCodec::encode_message(&Message::Call(call)) {
                            Ok(frame) => frame,
                            Err(e) => {
                                let _ = reply.send(Err(e));
                                continue;
                            }
                        };
                        pending.insert(id, reply);
                        if let Err(e) = channel.send(&frame).await {
                            tracing::debug!(error = %e, "outbound send failed, closing connection");
                            break;
                        }
                    }
                }
            }
            inbound = channel.recv() => {
                match inbound {
                    Ok(Some(frame)) => match WireCodec::decode_message(&frame) {
                        Ok(Message::Call(call)) => {
                            tracing::debug!(method = %call.name, id = call.id, "dispatching incoming call");
                            let response = dispatcher.dispatch(&context, call);
                            let frame = match WireCodec::encode_message(&Message::Response(response)) {
                                Ok(frame) => frame,
                                Err(e) => {
                                    // Results are validated before this point
                                    tracing::warn!(error = %e, "failed to encode response");
                                    continue;
                                }
                            };
                            if let Err(e) = channel.send(&frame).await {
                                tracing::debug!(error = %e, "response send failed, closing connection");
                                break;
                            }
                        }
                        Ok(Message::Response(response)) => {
                            match pending.remove(&response.id) {
                                Some(reply) => {
                                    let _ = reply.send(response.into_result());
                                }
                                None => {
                                    tracing::warn!(id = response.id, "response for unknown call");
                                }
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "malformed envelope, closing connection");
                            break;
                        }
                    },
                    Ok(None) => {
                        tracing::debug!("connection closed by peer");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "transport error, closing connection");
                        break;
                    }
                }
            }
        }
    }

    // Every call still in flight resolves exactly once, with a
    // connection-lost failure.
    for (_, reply) in pending.drain() {
        let _ = reply.send(Err(Error::ConnectionLost(
            "connection closed while the call was outstanding".to_string(),
        )));
    }
}
