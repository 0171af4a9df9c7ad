//! Connection-scoped context and extras path resolution.
//!
//! Extras paths are resolved against the connection's context object: the
//! empty path denotes the context object itself (injected as an opaque
//! value, so an exposed method can identify which connection is calling
//! it), the first segment is a named field of the context, and any
//! further segments index into nested map values.
//!
//! Resolvability is a configuration property, not a runtime one: every
//! path declared in a whitelist is checked when the peer is built, so a
//! typo fails construction instead of a later call.

use crate::whitelist::Whitelist;
use objcall_common::Value;
use std::sync::Arc;
use thiserror::Error;

/// An extras path that cannot be resolved against the connection context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unresolvable extras path '{path}' at segment '{segment}'")]
pub struct PathError {
    path: String,
    segment: String,
}

impl PathError {
    fn new(path: &str, segment: &str) -> Self {
        PathError {
            path: path.to_string(),
            segment: segment.to_string(),
        }
    }
}

/// Named-field lookup capability for extras resolution.
///
/// Implementors decide which top-level field names are resolvable; deeper
/// path segments are handled by [`resolve_path`] through nested map
/// values.
pub trait CallContext: Send + Sync + 'static {
    fn field(&self, name: &str) -> Option<Value>;
}

/// A ready-made map-backed [`CallContext`].
///
/// Holds the connection-scoped values an integrator wants reachable from
/// extras paths. The context object itself is what an empty path injects,
/// so identity comparisons against it (through [`objcall_common::Opaque`])
/// answer "which connection is calling me".
#[derive(Debug, Default)]
pub struct PeerContext {
    fields: std::collections::BTreeMap<String, Value>,
}

impl PeerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

impl CallContext for PeerContext {
    fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }
}

/// Resolves a dotted extras path against a connection context.
///
/// An empty path yields the context object itself as an opaque value.
/// Otherwise the first segment is looked up on the context and each
/// following segment indexes into a map value.
pub fn resolve_path<P: CallContext>(context: &Arc<P>, path: &str) -> Result<Value, PathError> {
    if path.is_empty() {
        return Ok(Value::opaque_arc(context.clone()));
    }

    let mut segments = path.split('.');
    let first = segments.next().unwrap_or(path);
    let mut current = context
        .field(first)
        .ok_or_else(|| PathError::new(path, first))?;

    for segment in segments {
        current = match current {
            Value::Map(ref entries) => entries
                .get(segment)
                .cloned()
                .ok_or_else(|| PathError::new(path, segment))?,
            _ => return Err(PathError::new(path, segment)),
        };
    }

    Ok(current)
}

/// Checks every extras path in a whitelist against a context.
///
/// Called at peer construction so unresolvable paths surface as
/// configuration errors.
pub fn validate_extras<P: CallContext>(
    whitelist: &Whitelist,
    context: &Arc<P>,
) -> Result<(), PathError> {
    for spec in whitelist.specs() {
        for path in spec.extras().values() {
            resolve_path(context, path)?;
        }
    }
    Ok(())
}
