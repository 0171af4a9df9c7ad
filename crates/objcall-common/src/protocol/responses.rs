//! Response envelope.
//!
//! A [`Response`] answers exactly one [`MethodCall`](super::MethodCall),
//! matched by request id. Successful responses carry the method's result
//! value; failed ones carry a human-readable message and the fixed
//! [`METHOD_CALL_ERROR`] code, the single failure kind declared at this
//! layer. Transport-level failures are not responses at all and are
//! reported separately.

use super::error::{Error, MethodCallError, Result};
use super::RequestId;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// The fixed code identifying "method call failed" on the wire.
pub const METHOD_CALL_ERROR: &str = "METHOD_CALL_ERROR";

/// An answer to a method call, returned by the peer that dispatched it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    /// Request identifier this response corresponds to
    pub id: RequestId,
    /// Result value (present on success)
    pub result: Option<Value>,
    /// Error message (present on failure)
    pub error: Option<String>,
    /// Error code (always [`METHOD_CALL_ERROR`] on failure)
    pub code: Option<String>,
}

impl Response {
    /// Creates a successful response.
    pub fn success(id: RequestId, result: Value) -> Self {
        Response {
            id,
            result: Some(result),
            error: None,
            code: None,
        }
    }

    /// Creates a failed response from a declared call rejection.
    pub fn failure(id: RequestId, error: MethodCallError) -> Self {
        Response {
            id,
            result: None,
            error: Some(error.message().to_string()),
            code: Some(METHOD_CALL_ERROR.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Unwraps the response into the caller-visible outcome, preserving
    /// the remote rejection message verbatim.
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(message) => Err(Error::MethodCall(MethodCallError::new(message))),
            None => self
                .result
                .ok_or_else(|| Error::InvalidResponse("missing result in success response".to_string())),
        }
    }
}
