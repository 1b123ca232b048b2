//! Capabilities a host exposes so its callables can be subscribed.

use crate::error::{PubSubError, Result};
use crate::types::Value;
use std::sync::Arc;

/// Anything that can be called with positional arguments and produce a value.
///
/// Implemented for plain closures and for every resolved form a
/// [`Handle`](crate::Handle) can produce.
pub trait Invocable: Send + Sync {
    /// Call with `args` applied positionally.
    fn invoke(&self, args: &[Value]) -> Result<Value>;
}

impl<F> Invocable for F
where
    F: Fn(&[Value]) -> Result<Value> + Send + Sync,
{
    fn invoke(&self, args: &[Value]) -> Result<Value> {
        self(args)
    }
}

/// An instance whose methods can be subscribed.
///
/// Method lookup is by name. An object may also be callable on its own, or
/// accept any method name through a catch-all dispatcher.
pub trait Object: Send + Sync {
    /// Name used in diagnostics.
    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether `method` is declared on this instance.
    fn has_method(&self, _method: &str) -> bool {
        false
    }

    /// Call a method by name.
    ///
    /// Only reached when [`has_method`](Self::has_method) or
    /// [`dispatches_any`](Self::dispatches_any) returned true.
    fn call_method(&self, method: &str, _args: &[Value]) -> Result<Value> {
        Err(PubSubError::InvalidCallback(format!(
            "{}::{}",
            self.type_name(),
            method
        )))
    }

    /// Whether undeclared method names are routed to
    /// [`call_method`](Self::call_method) anyway.
    fn dispatches_any(&self) -> bool {
        false
    }

    /// Whether the instance itself can be invoked.
    fn is_callable(&self) -> bool {
        false
    }

    /// Invoke the instance itself.
    fn call(&self, _args: &[Value]) -> Result<Value> {
        Err(PubSubError::InvalidCallback(format!(
            "{} is not callable",
            self.type_name()
        )))
    }
}

/// A class reference: something that can construct [`Object`]s and may
/// declare static methods.
pub trait Class: Send + Sync {
    /// Class name. Two class references with the same name are the same class.
    fn name(&self) -> &str;

    /// Construct a fresh instance.
    fn instantiate(&self) -> Result<Arc<dyn Object>>;

    /// Whether `method` is declared static on this class.
    fn is_static(&self, _method: &str) -> bool {
        false
    }

    /// Call a static method. Only reached when [`is_static`](Self::is_static)
    /// returned true.
    fn call_static(&self, method: &str, _args: &[Value]) -> Result<Value> {
        Err(PubSubError::InvalidCallback(format!(
            "{}::{} is not static",
            self.name(),
            method
        )))
    }
}
