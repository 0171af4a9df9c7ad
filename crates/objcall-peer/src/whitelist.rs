//! Exposed-method declarations.
//!
//! A connection can only invoke methods that were declared up front: the
//! whitelist is the hard security boundary, checked before anything else
//! touches the exposed object. Whatever the object actually implements is
//! irrelevant — an undeclared name is unreachable.

use std::collections::{BTreeMap, HashMap};

/// Declares one callable method on an exposed object.
///
/// `extras` maps an extra keyword-argument name to a dotted attribute
/// path, resolved against the connection peer's context at call time and
/// injected into the invocation's keyword arguments. This lets a method
/// receive connection-scoped values (for example, the identity of the
/// calling connection) the remote caller cannot forge or supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    name: String,
    extras: BTreeMap<String, String>,
}

impl MethodSpec {
    pub fn new(name: impl Into<String>) -> Self {
        MethodSpec {
            name: name.into(),
            extras: BTreeMap::new(),
        }
    }

    /// Declares an extra keyword argument filled in from the given dotted
    /// path. An empty path injects the context object itself.
    pub fn with_extra(mut self, kwarg: impl Into<String>, path: impl Into<String>) -> Self {
        self.extras.insert(kwarg.into(), path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extras(&self) -> &BTreeMap<String, String> {
        &self.extras
    }
}

/// The set of methods a connection is permitted to invoke, keyed by name.
///
/// Built once from a list of [`MethodSpec`]s and immutable afterwards;
/// shared across calls (and, if desired, across connections) behind an
/// `Arc`. An empty whitelist means the connection exposes nothing.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    methods: HashMap<String, MethodSpec>,
}

impl Whitelist {
    /// Builds the lookup table. A spec declared twice under the same name
    /// keeps the last declaration.
    pub fn new(specs: impl IntoIterator<Item = MethodSpec>) -> Self {
        let methods = specs
            .into_iter()
            .map(|spec| (spec.name.clone(), spec))
            .collect();
        Whitelist { methods }
    }

    pub fn get(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Iterates over the declared specs, in no particular order.
    pub fn specs(&self) -> impl Iterator<Item = &MethodSpec> {
        self.methods.values()
    }
}
