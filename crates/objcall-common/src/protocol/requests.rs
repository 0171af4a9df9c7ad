use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

pub type RequestId = u64;
pub type MethodName = String;
/// Positional arguments of a call.
pub type Args = Vec<Value>;
/// Keyword arguments of a call.
pub type Kwargs = BTreeMap<String, Value>;

static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A request to invoke a named method on the object exposed by the remote
/// peer.
///
/// `args` and `kwargs` are independently omittable: `None` and
/// `Some(empty)` are distinct envelopes, and both are preserved by the
/// codec. The receiving dispatcher treats an absent slot as empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MethodCall {
    pub id: RequestId,
    pub name: MethodName,
    pub args: Option<Args>,
    pub kwargs: Option<Kwargs>,
}

impl MethodCall {
    pub fn new(name: impl Into<MethodName>) -> Self {
        MethodCall {
            id: generate_request_id(),
            name: name.into(),
            args: None,
            kwargs: None,
        }
    }

    pub fn with_args(mut self, args: Args) -> Self {
        self.args = Some(args);
        self
    }

    pub fn with_kwargs(mut self, kwargs: Kwargs) -> Self {
        self.kwargs = Some(kwargs);
        self
    }
}

fn generate_request_id() -> RequestId {
    // Use system time as the base
    let timestamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    // Always increment the counter to ensure uniqueness
    let counter = REQUEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst);

    // Upper 32 bits from the timestamp, lower 32 bits from the counter
    (timestamp & 0xFFFFFFFF00000000) | (counter & 0xFFFFFFFF)
}
