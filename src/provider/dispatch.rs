//! Dispatch protocols: publish, publish-until and filter.
//!
//! Every call takes a snapshot of the topic's handles before invoking
//! anything. Handlers that subscribe or unsubscribe while running only
//! affect later calls. The first error returned by a handler aborts the
//! call and is passed back unchanged.

use crate::error::{PubSubError, Result};
use crate::handle::Handle;
use crate::target::{Invocable, Target};
use crate::types::{is_truthy, HandleId, Value};
use tracing::{debug, debug_span};

use super::manager::Provider;

/// Id given to predicate targets, which are never registered.
const DETACHED: HandleId = HandleId(0);

impl Provider {
    /// Invoke every handler on `topic` with `args`, in order.
    ///
    /// Returns the last handler's result, or `None` when the topic has no
    /// handlers.
    pub fn publish(&self, topic: &str, args: &[Value]) -> Result<Option<Value>> {
        let handles = self.subscribed_handles(topic);
        if handles.is_empty() {
            return Ok(None);
        }

        let span = debug_span!("publish", provider = self.label(), topic, handlers = handles.len());
        let _enter = span.enter();

        let mut last = None;
        for handle in &handles {
            last = Some(handle.invoke(args)?);
        }
        Ok(last)
    }

    /// Invoke handlers on `topic` until `predicate` holds for a result.
    ///
    /// `predicate` is any target taking the result as its single argument;
    /// its return value is judged by [`is_truthy`]. Returns the first
    /// satisfying result, else the last result, else `None` when the topic
    /// has no handlers. A predicate that is not invocable fails with
    /// [`PubSubError::InvalidCallback`] before any handler runs.
    pub fn publish_until(
        &self,
        predicate: impl Into<Target>,
        topic: &str,
        args: &[Value],
    ) -> Result<Option<Value>> {
        let predicate = Handle::new(DETACHED, topic, predicate.into()).resolve()?;
        if !predicate.is_invocable() {
            return Err(PubSubError::InvalidCallback(format!(
                "invalid publish_until predicate: {:?}",
                predicate
            )));
        }

        self.dispatch_until(topic, args, |result| {
            let verdict = predicate.invoke(std::slice::from_ref(result))?;
            Ok(is_truthy(&verdict))
        })
    }

    /// [`publish_until`](Self::publish_until) with a plain Rust predicate.
    pub fn publish_until_with<P>(
        &self,
        predicate: P,
        topic: &str,
        args: &[Value],
    ) -> Result<Option<Value>>
    where
        P: Fn(&Value) -> bool,
    {
        self.dispatch_until(topic, args, |result| Ok(predicate(result)))
    }

    fn dispatch_until<P>(&self, topic: &str, args: &[Value], predicate: P) -> Result<Option<Value>>
    where
        P: Fn(&Value) -> Result<bool>,
    {
        let handles = self.subscribed_handles(topic);
        if handles.is_empty() {
            return Ok(None);
        }

        let span = debug_span!(
            "publish_until",
            provider = self.label(),
            topic,
            handlers = handles.len()
        );
        let _enter = span.enter();

        let mut last = None;
        for (i, handle) in handles.iter().enumerate() {
            let result = handle.invoke(args)?;
            if predicate(&result)? {
                debug!(handle = %handle.id(), skipped = handles.len() - i - 1, "short-circuited");
                return Ok(Some(result));
            }
            last = Some(result);
        }
        Ok(last)
    }

    /// Pass `value` through every handler on `topic`.
    ///
    /// Each handler is called with the current value followed by `extra`, and
    /// its result becomes the value the next handler sees. Returns `value`
    /// untouched when the topic has no handlers.
    pub fn filter(&self, topic: &str, value: Value, extra: &[Value]) -> Result<Value> {
        let handles = self.subscribed_handles(topic);
        if handles.is_empty() {
            return Ok(value);
        }

        let span = debug_span!("filter", provider = self.label(), topic, handlers = handles.len());
        let _enter = span.enter();

        let mut current = value;
        let mut call_args = Vec::with_capacity(extra.len() + 1);
        for handle in &handles {
            call_args.clear();
            call_args.push(current);
            call_args.extend_from_slice(extra);
            current = handle.invoke(&call_args)?;
        }
        Ok(current)
    }
}
