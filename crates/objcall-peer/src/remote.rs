//! Caller-side proxy.
//!
//! A [`RemoteObject`] stands in for the object exposed by the peer on the
//! other end of the connection: each invocation sends exactly one call
//! envelope and resolves exactly once — with the remote result, with the
//! remote rejection (message preserved), or with a transport failure if
//! the connection dies before an answer arrives. No retries, no caching.

use objcall_common::protocol::{Args, Error, Kwargs, MethodCall, Result};
use objcall_common::value::CodecError;
use objcall_common::Value;
use tokio::sync::{mpsc, oneshot};

pub(crate) type CallResult = Result<Value>;

/// An outbound call on its way to the connection driver.
pub(crate) struct OutboundCall {
    pub call: MethodCall,
    pub reply: oneshot::Sender<CallResult>,
}

/// Proxy for the object exposed by the remote peer.
///
/// Cheap to clone; every clone issues calls over the same connection.
/// The proxy knows nothing about the remote whitelist — calling a
/// forbidden or non-existent method simply resolves to the rejection the
/// remote dispatcher produces.
#[derive(Clone)]
pub struct RemoteObject {
    calls: mpsc::Sender<OutboundCall>,
}

impl RemoteObject {
    pub(crate) fn new(calls: mpsc::Sender<OutboundCall>) -> Self {
        RemoteObject { calls }
    }

    /// Invokes the named remote method with positional and keyword
    /// arguments, awaiting its result.
    pub async fn call(
        &self,
        name: impl Into<String>,
        args: Args,
        kwargs: Kwargs,
    ) -> Result<Value> {
        self.send_call(MethodCall::new(name).with_args(args).with_kwargs(kwargs))
            .await
    }

    /// Sends a pre-built call envelope, allowing the argument slots to be
    /// omitted independently.
    ///
    /// Every argument value is validated against the serializable-value
    /// contract before transmission; a violation fails locally with an
    /// encoding error rather than a remote rejection.
    pub async fn send_call(&self, call: MethodCall) -> Result<Value> {
        let argument_values = call
            .args
            .iter()
            .flatten()
            .chain(call.kwargs.iter().flat_map(|kwargs| kwargs.values()));
        for value in argument_values {
            if let Some(type_name) = value.unencodable_type() {
                return Err(Error::Codec(CodecError::Unsupported(type_name)));
            }
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.calls
            .send(OutboundCall {
                call,
                reply: reply_tx,
            })
            .await
            .map_err(|_| Error::ConnectionLost("connection driver is gone".to_string()))?;

        reply_rx
            .await
            .map_err(|_| Error::ConnectionLost("call dropped without a response".to_string()))?
    }
}
