//! Serializable-value contract.
//!
//! [`Value`] is the closed set of types allowed in any envelope field:
//! null, booleans, integers, floats, strings, byte-strings, lists and
//! string-keyed maps. One extra variant, [`Value::Opaque`], holds live
//! in-process objects that must never cross the wire: it is how a
//! connection-scoped context object gets injected into a method's keyword
//! arguments, and how "the method returned something non-serializable" is
//! representable at all.
//!
//! [`encode`]/[`decode`] are the byte contract used at the transport
//! boundary; [`Value::is_encodable`] is the pure predicate callers use to
//! pre-validate values so contract violations surface as typed failures
//! instead of serializer errors.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors produced by the value codec.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The value contains something outside the wire-encodable set.
    #[error("Non-serializable value: {0}")]
    Unsupported(&'static str),

    /// Malformed or truncated byte input, or a serializer failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] postcard::Error),
}

/// A value that can appear in a call's arguments, keyword arguments or
/// result.
///
/// All variants except [`Value::Opaque`] are wire-encodable. `Opaque`
/// values may only live inside one process; placing one in an envelope
/// field is rejected by [`encode`] and by the dispatch layer's result
/// validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// A live in-process object. Never crosses the connection.
    Opaque(Opaque),
}

impl Value {
    /// Wraps an arbitrary object as an opaque, non-encodable value.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Opaque::new(value))
    }

    /// Wraps an already-shared object as an opaque value without copying it.
    pub fn opaque_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Value::Opaque(Opaque::from_arc(value))
    }

    /// Pure predicate: true iff no opaque value is reachable from `self`.
    ///
    /// Used to pre-validate results and arguments before they are handed
    /// to the encoder.
    pub fn is_encodable(&self) -> bool {
        self.unencodable_type().is_none()
    }

    /// The runtime type name of the first non-encodable value reachable
    /// from `self`, if any.
    pub fn unencodable_type(&self) -> Option<&'static str> {
        match self {
            Value::Opaque(opaque) => Some(opaque.type_name()),
            Value::List(items) => items.iter().find_map(Value::unencodable_type),
            Value::Map(entries) => entries.values().find_map(Value::unencodable_type),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            Value::Opaque(opaque) => Some(opaque),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Value::Map(value)
    }
}

/// A shared handle to a live in-process object.
///
/// Compares by pointer identity: two `Opaque`s are equal iff they wrap the
/// same allocation. The concrete type can be recovered with
/// [`Opaque::downcast`].
#[derive(Clone)]
pub struct Opaque {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Opaque {
            inner: value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The type name captured when the value was wrapped.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Recovers the wrapped object if it is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.clone().downcast::<T>().ok()
    }

    /// Pointer-identity comparison against a known shared object.
    pub fn is_same<T: Any + Send + Sync>(&self, other: &Arc<T>) -> bool {
        self.downcast::<T>()
            .map(|inner| Arc::ptr_eq(&inner, other))
            .unwrap_or(false)
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Opaque").field(&self.type_name).finish()
    }
}

/// Encodes a value to bytes.
///
/// Fails with [`CodecError::Unsupported`] if the value contains anything
/// outside the wire-encodable set; the offending runtime type is named in
/// the error and the value is never handed to the serializer.
pub fn encode(value: &Value) -> Result<Vec<u8>, CodecError> {
    let wire = Wire::try_from(value)?;
    Ok(postcard::to_allocvec(&wire)?)
}

/// Decodes a value from bytes. Never produces an opaque value.
pub fn decode(data: &[u8]) -> Result<Value, CodecError> {
    let wire: Wire = postcard::from_bytes(data)?;
    Ok(wire.into_value())
}

/// Wire mirror of [`Value`], covering only the encodable variants.
///
/// Keeping the serde derive on this private enum (rather than on `Value`
/// itself) makes "opaque values cannot be serialized" a structural fact
/// instead of a runtime convention.
#[derive(Serialize, Deserialize)]
enum Wire {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Wire>),
    Map(BTreeMap<String, Wire>),
}

impl Wire {
    fn into_value(self) -> Value {
        match self {
            Wire::Null => Value::Null,
            Wire::Bool(b) => Value::Bool(b),
            Wire::Int(i) => Value::Int(i),
            Wire::Float(f) => Value::Float(f),
            Wire::Str(s) => Value::Str(s),
            Wire::Bytes(b) => Value::Bytes(b),
            Wire::List(items) => Value::List(items.into_iter().map(Wire::into_value).collect()),
            Wire::Map(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, value.into_value()))
                    .collect(),
            ),
        }
    }
}

impl TryFrom<&Value> for Wire {
    type Error = CodecError;

    fn try_from(value: &Value) -> Result<Self, CodecError> {
        Ok(match value {
            Value::Null => Wire::Null,
            Value::Bool(b) => Wire::Bool(*b),
            Value::Int(i) => Wire::Int(*i),
            Value::Float(f) => Wire::Float(*f),
            Value::Str(s) => Wire::Str(s.clone()),
            Value::Bytes(b) => Wire::Bytes(b.clone()),
            Value::List(items) => Wire::List(
                items
                    .iter()
                    .map(Wire::try_from)
                    .collect::<Result<_, CodecError>>()?,
            ),
            Value::Map(entries) => Wire::Map(
                entries
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), Wire::try_from(value)?)))
                    .collect::<Result<_, CodecError>>()?,
            ),
            Value::Opaque(opaque) => return Err(CodecError::Unsupported(opaque.type_name())),
        })
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let wire = Wire::try_from(self).map_err(serde::ser::Error::custom)?;
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(Wire::deserialize(deserializer)?.into_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> BTreeMap<String, Value> {
        let mut map = BTreeMap::new();
        map.insert("flag".to_string(), Value::Bool(true));
        map.insert("name".to_string(), Value::Str("worker-3".to_string()));
        map.insert(
            "load".to_string(),
            Value::List(vec![Value::Float(0.5), Value::Float(1.25)]),
        );
        map
    }

    #[test]
    fn test_round_trip_scalars() {
        for value in [
            Value::Null,
            Value::Bool(false),
            Value::Int(-42),
            Value::Float(3.5),
            Value::Str("hello".to_string()),
            Value::Bytes(vec![0, 1, 2, 255]),
        ] {
            let encoded = encode(&value).unwrap();
            assert_eq!(decode(&encoded).unwrap(), value);
        }
    }

    #[test]
    fn test_round_trip_nested() {
        let value = Value::List(vec![
            Value::Map(sample_map()),
            Value::List(vec![Value::Null, Value::Int(7)]),
            Value::Bytes(vec![9, 9, 9]),
        ]);
        let encoded = encode(&value).unwrap();
        assert_eq!(decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_opaque_is_not_encodable() {
        let value = Value::opaque("a live handle".to_string());
        assert!(!value.is_encodable());
        assert!(matches!(
            encode(&value),
            Err(CodecError::Unsupported(name)) if name.contains("String")
        ));
    }

    #[test]
    fn test_nested_opaque_is_not_encodable() {
        let list = Value::List(vec![Value::Int(1), Value::opaque(7u32)]);
        assert!(!list.is_encodable());

        let mut entries = BTreeMap::new();
        entries.insert("handle".to_string(), Value::opaque(7u32));
        let map = Value::Map(entries);
        assert!(!map.is_encodable());
        assert!(encode(&map).is_err());
    }

    #[test]
    fn test_plain_values_are_encodable() {
        assert!(Value::Null.is_encodable());
        assert!(Value::Map(sample_map()).is_encodable());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode(&[0xff, 0xff, 0xff, 0xff]),
            Err(CodecError::Serialization(_))
        ));
    }

    #[test]
    fn test_opaque_identity() {
        let shared = Arc::new(42u64);
        let a = Value::opaque_arc(shared.clone());
        let b = Value::opaque_arc(shared.clone());
        assert_eq!(a, b);

        let other = Value::opaque(42u64);
        assert_ne!(a, other);

        let opaque = a.as_opaque().unwrap();
        assert!(opaque.is_same(&shared));
        assert_eq!(*opaque.downcast::<u64>().unwrap(), 42);
        assert!(opaque.downcast::<String>().is_none());
    }

    #[test]
    fn test_from_impls() {
        assert_eq!(Value::from(5i32), Value::Int(5));
        assert_eq!(Value::from("x"), Value::Str("x".to_string()));
        assert_eq!(Value::from(vec![1u8, 2]), Value::Bytes(vec![1, 2]));
    }
}
