//! Transport layer.
//!
//! The call protocol assumes an underlying duplex channel that delivers
//! discrete messages reliably and in order; everything here exists to
//! provide that channel:
//!
//! - **[`MessageChannel`]**: the trait boundary the connection driver
//!   programs against
//! - **[`FramedChannel`]**: length-prefixed framing over any duplex byte
//!   stream (`[4-byte length prefix as u32 big-endian] + [payload]`)
//! - **[`WireCodec`]**: envelope serialization with postcard
//! - **[`tcp`]**: TCP connection helpers
//!
//! All framing enforces a maximum message size of 100 MB to prevent
//! memory exhaustion from a hostile or broken peer.

pub mod codec;
pub mod framed;
pub mod tcp;

pub use codec::WireCodec;
pub use framed::{FramedChannel, MessageChannel, MAX_MESSAGE_SIZE};
