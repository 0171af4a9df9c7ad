//! objcall Peer
//!
//! The per-connection half of objcall: expose a whitelisted subset of a
//! local object's methods, and call the methods the remote peer exposes,
//! over one symmetric connection.
//!
//! # Architecture
//!
//! - **[`Whitelist`] / [`MethodSpec`]**: the pre-declared set of callable
//!   method names, with optional connection-scoped extra arguments
//! - **[`Dispatcher`]**: answers incoming calls against an
//!   [`ExposedObject`], enforcing the whitelist and the value contract
//! - **[`RemoteObject`]**: the caller-side proxy; each invocation sends
//!   one envelope and resolves exactly once
//! - **[`MethodCallPeer`]**: owns the connection driver tying a
//!   dispatcher and a proxy to one transport channel
//! - **[`MethodCallServer`]**: accept loop building a peer per inbound
//!   connection through a [`PeerFactory`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use objcall_common::{Value, Result};
//! use objcall_common::protocol::{Args, Kwargs};
//! use objcall_peer::{
//!     Dispatcher, ExposedObject, MethodCallPeer, MethodSpec, PeerContext, Whitelist,
//! };
//!
//! struct Calculator;
//!
//! impl ExposedObject for Calculator {
//!     fn invoke(&self, name: &str, args: Args, _kwargs: Kwargs) -> anyhow::Result<Value> {
//!         match name {
//!             "add" => {
//!                 let a = args[0].as_int().unwrap_or(0);
//!                 let b = args[1].as_int().unwrap_or(0);
//!                 Ok(Value::Int(a + b))
//!             }
//!             other => anyhow::bail!("no such method: {other}"),
//!         }
//!     }
//! }
//!
//! # async fn demo() -> Result<()> {
//! let whitelist = Arc::new(Whitelist::new([MethodSpec::new("add")]));
//! let dispatcher = Dispatcher::new(whitelist, Arc::new(Calculator));
//! let peer = MethodCallPeer::connect("127.0.0.1:8080", dispatcher, Arc::new(PeerContext::new())).await?;
//!
//! let sum = peer.remote().call("add", vec![Value::Int(2), Value::Int(3)], Default::default()).await?;
//! assert_eq!(sum, Value::Int(5));
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod context;
pub mod dispatch;
pub mod remote;
pub mod server;
pub mod whitelist;

pub use connection::MethodCallPeer;
pub use context::{resolve_path, CallContext, PathError, PeerContext};
pub use dispatch::{Dispatcher, ExposedObject};
pub use remote::RemoteObject;
pub use server::{MethodCallServer, PeerFactory};
pub use whitelist::{MethodSpec, Whitelist};
