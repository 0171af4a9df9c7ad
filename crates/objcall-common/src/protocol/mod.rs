pub mod error;
pub mod requests;
pub mod responses;


pub use error::{Error, MethodCallError, Result};
pub use requests::{Args, Kwargs, MethodCall, MethodName, RequestId};
pub use responses::{Response, METHOD_CALL_ERROR};

use serde::{Deserialize, Serialize};

/// A frame payload exchanged between two connected peers.
///
/// The protocol is symmetric: either peer may send a [`MethodCall`] and
/// must answer the ones it receives, so every frame is one of these two
/// variants regardless of which side opened the connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Message {
    Call(MethodCall),
    Response(Response),
}
