//! Server-side call dispatch.
//!
//! The [`Dispatcher`] answers an incoming [`MethodCall`] for the object
//! bound to this connection:
//!
//! 1. whitelist lookup — an undeclared name is rejected before the object
//!    is touched;
//! 2. argument assembly — absent `args`/`kwargs` become empty, then every
//!    extras entry of the matched [`MethodSpec`](crate::MethodSpec) is
//!    resolved against the connection context and inserted into the
//!    keyword arguments, overriding any caller-supplied value at that key;
//! 3. invocation — failures from the method body are wrapped into a
//!    [`MethodCallError`] carrying only the failure's display text, so
//!    internal error types never cross the connection;
//! 4. result validation — a non-encodable result is rejected without ever
//!    reaching the encoder.

use crate::context::{resolve_path, CallContext};
use crate::whitelist::Whitelist;
use objcall_common::protocol::{Args, Kwargs, MethodCall, MethodCallError, Response};
use objcall_common::Value;
use std::sync::Arc;

/// The local object whose methods a connection exposes.
///
/// One generic operation replaces per-method dynamic lookup: implementors
/// match on the method name and unpack the arguments themselves. The
/// dispatcher only ever invokes names present in the whitelist, so an
/// implementation may also carry methods it never declares.
///
/// The object is externally owned; the RPC layer neither constructs nor
/// destroys it, and invokes it synchronously with no locking of its own —
/// thread safety of any interior state is the implementor's business.
pub trait ExposedObject: Send + Sync {
    fn invoke(&self, name: &str, args: Args, kwargs: Kwargs) -> anyhow::Result<Value>;
}

/// Placeholder object for connections that expose nothing.
struct NoObject;

impl ExposedObject for NoObject {
    fn invoke(&self, name: &str, _args: Args, _kwargs: Kwargs) -> anyhow::Result<Value> {
        // Unreachable behind an empty whitelist
        anyhow::bail!("no object exposed on this connection (method '{name}')")
    }
}

/// Answers incoming call envelopes for one exposed object.
///
/// Holds nothing but the immutable whitelist and the object reference;
/// all per-call state is local to the call, so a dispatcher can be cloned
/// freely.
#[derive(Clone)]
pub struct Dispatcher {
    whitelist: Arc<Whitelist>,
    object: Arc<dyn ExposedObject>,
}

impl Dispatcher {
    pub fn new(whitelist: Arc<Whitelist>, object: Arc<dyn ExposedObject>) -> Self {
        Dispatcher { whitelist, object }
    }

    /// A dispatcher with an empty whitelist: every call is forbidden.
    pub fn exposing_nothing() -> Self {
        Dispatcher {
            whitelist: Arc::new(Whitelist::default()),
            object: Arc::new(NoObject),
        }
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    /// Handles one incoming call, producing the response to send back.
    pub fn dispatch<P: CallContext>(&self, context: &Arc<P>, call: MethodCall) -> Response {
        let id = call.id;
        match self.dispatch_inner(context, call) {
            Ok(result) => Response::success(id, result),
            Err(error) => Response::failure(id, error),
        }
    }

    fn dispatch_inner<P: CallContext>(
        &self,
        context: &Arc<P>,
        call: MethodCall,
    ) -> Result<Value, MethodCallError> {
        let spec = self
            .whitelist
            .get(&call.name)
            .ok_or_else(|| MethodCallError::forbidden(&call.name))?;

        let args = call.args.unwrap_or_default();
        let mut kwargs = call.kwargs.unwrap_or_default();
        for (key, path) in spec.extras() {
            let value = resolve_path(context, path)
                .map_err(|e| MethodCallError::new(e.to_string()))?;
            kwargs.insert(key.clone(), value);
        }

        let result = self
            .object
            .invoke(spec.name(), args, kwargs)
            .map_err(|e| MethodCallError::new(e.to_string()))?;

        if !result.is_encodable() {
            return Err(MethodCallError::non_serializable_result());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PeerContext;
    use crate::whitelist::MethodSpec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts invocations so tests can assert the object was never touched.
    struct Recorder {
        invocations: AtomicUsize,
        last_kwargs: std::sync::Mutex<Option<Kwargs>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Recorder {
                invocations: AtomicUsize::new(0),
                last_kwargs: std::sync::Mutex::new(None),
            })
        }
    }

    impl ExposedObject for Recorder {
        fn invoke(&self, name: &str, args: Args, kwargs: Kwargs) -> anyhow::Result<Value> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            *self.last_kwargs.lock().unwrap() = Some(kwargs.clone());
            match name {
                "add" => {
                    let a = args[0].as_int().unwrap_or(0);
                    let b = args[1].as_int().unwrap_or(0);
                    Ok(Value::Int(a + b))
                }
                "echo_label" => Ok(kwargs.get("label").cloned().unwrap_or(Value::Null)),
                "bad" => Ok(Value::opaque("a socket, say".to_string())),
                "fails" => anyhow::bail!("division by zero"),
                other => anyhow::bail!("no such method: {other}"),
            }
        }
    }

    fn context() -> Arc<PeerContext> {
        Arc::new(PeerContext::new().with_field("label", Value::Str("conn-7".to_string())))
    }

    #[test]
    fn test_whitelisted_call_succeeds() {
        let recorder = Recorder::new();
        let dispatcher = Dispatcher::new(
            Arc::new(Whitelist::new([MethodSpec::new("add")])),
            recorder.clone(),
        );

        let call = MethodCall::new("add").with_args(vec![Value::Int(2), Value::Int(3)]);
        let response = dispatcher.dispatch(&context(), call);
        assert_eq!(response.into_result().unwrap(), Value::Int(5));
        assert_eq!(recorder.invocations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_forbidden_method_never_touches_the_object() {
        let recorder = Recorder::new();
        let dispatcher = Dispatcher::new(Arc::new(Whitelist::default()), recorder.clone());

        let response = dispatcher.dispatch(&context(), MethodCall::new("anything"));
        assert_eq!(
            response.error.as_deref(),
            Some("Forbidden method 'anything'")
        );
        assert_eq!(recorder.invocations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_absent_slots_are_treated_as_empty() {
        let recorder = Recorder::new();
        let dispatcher = Dispatcher::new(
            Arc::new(Whitelist::new([MethodSpec::new("echo_label")])),
            recorder.clone(),
        );

        let response = dispatcher.dispatch(&context(), MethodCall::new("echo_label"));
        assert_eq!(response.into_result().unwrap(), Value::Null);
        let kwargs = recorder.last_kwargs.lock().unwrap().clone().unwrap();
        assert!(kwargs.is_empty());
    }

    #[test]
    fn test_extras_are_injected_and_override_the_caller() {
        let recorder = Recorder::new();
        let dispatcher = Dispatcher::new(
            Arc::new(Whitelist::new([
                MethodSpec::new("echo_label").with_extra("label", "label")
            ])),
            recorder.clone(),
        );

        // The caller tries to supply its own value for the extras key.
        let mut kwargs = Kwargs::new();
        kwargs.insert("label".to_string(), Value::Str("forged".to_string()));
        let call = MethodCall::new("echo_label").with_kwargs(kwargs);

        let response = dispatcher.dispatch(&context(), call);
        assert_eq!(
            response.into_result().unwrap(),
            Value::Str("conn-7".to_string())
        );
    }

    #[test]
    fn test_empty_extras_path_injects_the_context() {
        let recorder = Recorder::new();
        let ctx = context();
        let dispatcher = Dispatcher::new(
            Arc::new(Whitelist::new([
                MethodSpec::new("echo_label").with_extra("caller_id", "")
            ])),
            recorder.clone(),
        );

        dispatcher.dispatch(&ctx, MethodCall::new("echo_label"));
        let kwargs = recorder.last_kwargs.lock().unwrap().clone().unwrap();
        let injected = kwargs.get("caller_id").unwrap();
        assert!(injected.as_opaque().unwrap().is_same(&ctx));
    }

    #[test]
    fn test_non_serializable_result_is_rejected() {
        let recorder = Recorder::new();
        let dispatcher = Dispatcher::new(
            Arc::new(Whitelist::new([MethodSpec::new("bad")])),
            recorder.clone(),
        );

        let response = dispatcher.dispatch(&context(), MethodCall::new("bad"));
        assert_eq!(response.error.as_deref(), Some("Non-serializable result"));
    }

    #[test]
    fn test_method_failure_is_wrapped_with_its_message() {
        let recorder = Recorder::new();
        let dispatcher = Dispatcher::new(
            Arc::new(Whitelist::new([MethodSpec::new("fails")])),
            recorder.clone(),
        );

        let response = dispatcher.dispatch(&context(), MethodCall::new("fails"));
        assert_eq!(response.error.as_deref(), Some("division by zero"));
    }

    #[test]
    fn test_exposing_nothing_forbids_everything() {
        let dispatcher = Dispatcher::exposing_nothing();
        let response = dispatcher.dispatch(&context(), MethodCall::new("ping"));
        assert_eq!(response.error.as_deref(), Some("Forbidden method 'ping'"));
    }
}
