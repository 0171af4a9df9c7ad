use crate::protocol::error::Result;
use crate::protocol::{Message, MethodCall, Response};

/// Codec for encoding/decoding protocol envelopes.
///
/// Postcard is the wire format: binary, compact, and able to carry the
/// full value contract including byte-strings, which rules out textual
/// formats like JSON.
///
/// # Example
///
/// ```
/// use objcall_common::transport::WireCodec;
/// use objcall_common::protocol::{Message, MethodCall};
/// use objcall_common::Value;
///
/// let call = MethodCall::new("add").with_args(vec![Value::Int(2), Value::Int(3)]);
/// let encoded = WireCodec::encode_message(&Message::Call(call.clone())).unwrap();
/// let decoded = WireCodec::decode_message(&encoded).unwrap();
/// assert_eq!(decoded, Message::Call(call));
/// ```
pub struct WireCodec;

impl WireCodec {
    /// Encode a message to bytes.
    pub fn encode_message(message: &Message) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(message)?)
    }

    /// Decode a message from bytes.
    pub fn decode_message(data: &[u8]) -> Result<Message> {
        Ok(postcard::from_bytes(data)?)
    }

    /// Encode a bare call envelope to bytes.
    pub fn encode_call(call: &MethodCall) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(call)?)
    }

    /// Decode a bare call envelope from bytes.
    pub fn decode_call(data: &[u8]) -> Result<MethodCall> {
        Ok(postcard::from_bytes(data)?)
    }

    /// Encode a bare response envelope to bytes.
    pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(response)?)
    }

    /// Decode a bare response envelope from bytes.
    pub fn decode_response(data: &[u8]) -> Result<Response> {
        Ok(postcard::from_bytes(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MethodCallError;
    use crate::value::Value;
    use std::collections::BTreeMap;

    #[test]
    fn test_call_round_trip() {
        let mut kwargs = BTreeMap::new();
        kwargs.insert("unit".to_string(), Value::Str("ms".to_string()));
        let call = MethodCall::new("measure")
            .with_args(vec![Value::Int(10), Value::Bytes(vec![1, 2, 3])])
            .with_kwargs(kwargs);

        let encoded = WireCodec::encode_call(&call).unwrap();
        assert_eq!(WireCodec::decode_call(&encoded).unwrap(), call);
    }

    #[test]
    fn test_absent_slots_survive_the_codec() {
        let bare = MethodCall::new("ping");
        let empty = MethodCall::new("ping")
            .with_args(Vec::new())
            .with_kwargs(BTreeMap::new());

        let bare_decoded = WireCodec::decode_call(&WireCodec::encode_call(&bare).unwrap()).unwrap();
        let empty_decoded =
            WireCodec::decode_call(&WireCodec::encode_call(&empty).unwrap()).unwrap();

        assert!(bare_decoded.args.is_none());
        assert!(bare_decoded.kwargs.is_none());
        assert_eq!(empty_decoded.args, Some(Vec::new()));
        assert_eq!(empty_decoded.kwargs, Some(BTreeMap::new()));
    }

    #[test]
    fn test_response_round_trip() {
        let success = Response::success(9, Value::Float(2.5));
        let encoded = WireCodec::encode_response(&success).unwrap();
        assert_eq!(WireCodec::decode_response(&encoded).unwrap(), success);

        let failure = Response::failure(9, MethodCallError::new("boom"));
        let encoded = WireCodec::encode_response(&failure).unwrap();
        assert_eq!(WireCodec::decode_response(&encoded).unwrap(), failure);
    }

    #[test]
    fn test_message_round_trip() {
        let call = Message::Call(MethodCall::new("ping"));
        let encoded = WireCodec::encode_message(&call).unwrap();
        assert_eq!(WireCodec::decode_message(&encoded).unwrap(), call);

        let response = Message::Response(Response::success(1, Value::Null));
        let encoded = WireCodec::encode_message(&response).unwrap();
        assert_eq!(WireCodec::decode_message(&encoded).unwrap(), response);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(WireCodec::decode_message(&[0xde, 0xad, 0xbe, 0xef]).is_err());
    }

    #[test]
    fn test_opaque_value_fails_envelope_encoding() {
        let call = MethodCall::new("bad").with_args(vec![Value::opaque(1u8)]);
        assert!(WireCodec::encode_call(&call).is_err());
    }
}
