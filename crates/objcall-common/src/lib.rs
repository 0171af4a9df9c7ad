//! objcall Common Types and Transport
//!
//! This crate provides the protocol definitions, the serializable-value
//! contract and the framed transport layer shared by both sides of an
//! objcall connection.
//!
//! # Overview
//!
//! objcall lets one peer expose a whitelisted subset of a local object's
//! methods while the other peer calls them through a transparent proxy.
//! The protocol is symmetric: a single connection carries method calls in
//! both directions, and a peer may act as caller and callee at the same
//! time. This crate contains the pieces both roles share:
//!
//! - **Value Layer**: the restricted set of value types that may cross the
//!   wire, with its encode/decode contract
//! - **Protocol Layer**: `MethodCall`/`Response` envelopes, error handling
//!   and type definitions
//! - **Transport Layer**: length-prefixed framing over any duplex byte
//!   stream, with postcard serialization
//!
//! # Wire format
//!
//! - **Framing**: `[4-byte length prefix as u32 big-endian] + [payload]`
//! - **Serialization**: postcard (binary, byte-string capable)
//! - **Max Message Size**: 100 MB
//!
//! # Example
//!
//! ```
//! use objcall_common::{MethodCall, Response, Value};
//!
//! let call = MethodCall::new("add").with_args(vec![Value::Int(2), Value::Int(3)]);
//! let response = Response::success(call.id, Value::Int(5));
//! assert_eq!(response.into_result().unwrap(), Value::Int(5));
//! ```

pub mod protocol;
pub mod transport;
pub mod value;

pub use protocol::*;
pub use value::{CodecError, Opaque, Value};
