use crate::value::CodecError;
use thiserror::Error;

/// A declared remote-side rejection of a method call.
///
/// This is the only error kind defined by the call protocol itself: it
/// carries a human-readable message and nothing else, so internal error
/// types never cross the connection boundary. On the wire it travels as a
/// failed [`Response`](crate::protocol::Response) tagged with the
/// [`METHOD_CALL_ERROR`](crate::protocol::METHOD_CALL_ERROR) code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct MethodCallError {
    message: String,
}

impl MethodCallError {
    pub fn new(message: impl Into<String>) -> Self {
        MethodCallError {
            message: message.into(),
        }
    }

    /// The rejection used when a call names a method outside the whitelist.
    pub fn forbidden(name: &str) -> Self {
        MethodCallError::new(format!("Forbidden method '{}'", name))
    }

    /// The rejection used when a method returns a non-encodable value.
    pub fn non_serializable_result() -> Self {
        MethodCallError::new("Non-serializable result")
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// The remote dispatcher rejected the call. The outcome is known: the
    /// method did not produce a result.
    #[error("{0}")]
    MethodCall(#[from] MethodCallError),

    /// A value violated the serializable-value contract on this side of
    /// the connection.
    #[error("Encoding error: {0}")]
    Codec(#[from] CodecError),

    /// An envelope could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] postcard::Error),

    /// The connection failed while a call was outstanding; the call's
    /// outcome is unknown.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
