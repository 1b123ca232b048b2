//! Topic registry: subscribe, unsubscribe and enumeration.

use crate::handle::Handle;
use crate::target::Target;
use crate::types::HandleId;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::types::{EmptyTopicPolicy, ProviderConfig};

/// Per-instance publish/subscribe registry.
///
/// Owns, per topic, the ordered list of subscribed [`Handle`]s. Insertion
/// order is dispatch order. All methods take `&self`; the topic map sits
/// behind a lock that is never held while a subscriber runs.
pub struct Provider {
    config: ProviderConfig,
    /// Topic name -> handles in subscription order.
    topics: RwLock<IndexMap<String, Vec<Handle>>>,
    /// Counter for generating handle IDs.
    next_id: AtomicU64,
}

impl Provider {
    /// Create a provider with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ProviderConfig::default())
    }

    /// Create a provider with an explicit configuration.
    pub fn with_config(config: ProviderConfig) -> Self {
        Self {
            config,
            topics: RwLock::new(IndexMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Configuration this provider was built with.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub(crate) fn label(&self) -> &str {
        self.config.label.as_deref().unwrap_or("provider")
    }

    /// Subscribe `target` to `topic`.
    ///
    /// If an equal subscription already exists the existing handle is
    /// returned and nothing is added. The target is not validated here.
    pub fn subscribe(&self, topic: &str, target: Target) -> Handle {
        let key = target.key();
        let mut topics = self.topics.write();
        let handles = topics.entry(topic.to_string()).or_default();

        if let Some(existing) = handles.iter().find(|h| *h.key() == key) {
            debug!(
                provider = self.label(),
                topic,
                handle = %existing.id(),
                "already subscribed"
            );
            return existing.clone();
        }

        let id = HandleId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let handle = Handle::new(id, topic, target);
        handles.push(handle.clone());

        debug!(
            provider = self.label(),
            topic,
            handle = %id,
            target = %handle.target().describe(),
            "subscribed"
        );
        handle
    }

    /// Remove a subscription.
    ///
    /// Returns false, changing nothing, if the handle's topic has no entries
    /// or no equal handle is subscribed.
    pub fn unsubscribe(&self, handle: &Handle) -> bool {
        let topic = handle.topic();
        let mut topics = self.topics.write();

        let Some(handles) = topics.get_mut(topic) else {
            return false;
        };
        let Some(pos) = handles.iter().position(|h| h == handle) else {
            return false;
        };

        let removed = handles.remove(pos);
        if handles.is_empty() && self.config.empty_topics == EmptyTopicPolicy::Prune {
            topics.shift_remove(topic);
        }

        debug!(
            provider = self.label(),
            topic,
            handle = %removed.id(),
            "unsubscribed"
        );
        true
    }

    /// Topic names currently tracked, in first-subscription order.
    pub fn topics(&self) -> Vec<String> {
        self.topics.read().keys().cloned().collect()
    }

    /// Snapshot of the handles on `topic`, in dispatch order.
    pub fn subscribed_handles(&self, topic: &str) -> Vec<Handle> {
        self.topics.read().get(topic).cloned().unwrap_or_default()
    }

    /// Number of handles on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.read().get(topic).map_or(0, Vec::len)
    }

    /// Whether `topic` has at least one handle.
    pub fn has_subscribers(&self, topic: &str) -> bool {
        self.subscriber_count(topic) > 0
    }

    /// Remove every handle on `topic`. No-op if there are none.
    pub fn clear_handles(&self, topic: &str) {
        let mut topics = self.topics.write();
        let cleared = match self.config.empty_topics {
            EmptyTopicPolicy::Prune => topics.shift_remove(topic).map_or(0, |h| h.len()),
            EmptyTopicPolicy::Retain => topics.get_mut(topic).map_or(0, |h| {
                let n = h.len();
                h.clear();
                n
            }),
        };

        if cleared > 0 {
            debug!(provider = self.label(), topic, cleared, "cleared handles");
        }
    }

    /// Remove every handle on every topic.
    pub fn clear(&self) {
        let mut topics = self.topics.write();
        match self.config.empty_topics {
            EmptyTopicPolicy::Prune => topics.clear(),
            EmptyTopicPolicy::Retain => topics.values_mut().for_each(Vec::clear),
        }
        debug!(provider = self.label(), "cleared all topics");
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::target::Invocable;
    use crate::types::Value;
    use std::sync::Arc;

    /// A fresh, distinct subscriber on every call.
    fn noop() -> Target {
        let f: Arc<dyn Invocable> = Arc::new(|_: &[Value]| -> Result<Value> { Ok(Value::Null) });
        Target::invocable(f)
    }

    fn on_save(_args: &[Value]) -> Result<Value> {
        Ok(Value::Bool(true))
    }

    #[test]
    fn test_subscribe_unsubscribe() {
        let provider = Provider::new();

        let handle = provider.subscribe("saved", noop());
        assert_eq!(provider.subscriber_count("saved"), 1);

        assert!(provider.unsubscribe(&handle));
        assert_eq!(provider.subscriber_count("saved"), 0);
        assert!(!provider.unsubscribe(&handle));
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let provider = Provider::new();
        let target = noop();

        let first = provider.subscribe("saved", target.clone());
        let second = provider.subscribe("saved", target.clone());

        assert!(first.ptr_eq(&second));
        assert_eq!(first.id(), second.id());
        assert_eq!(provider.subscriber_count("saved"), 1);

        // Same target on another topic is a separate subscription.
        let other = provider.subscribe("loaded", target);
        assert_ne!(other.id(), first.id());
    }

    #[test]
    fn test_same_fn_subscribes_once() {
        let provider = Provider::new();

        let first = provider.subscribe("saved", Target::function(on_save));
        let second = provider.subscribe("saved", Target::function(on_save));

        assert!(first.ptr_eq(&second));
        assert_eq!(provider.subscriber_count("saved"), 1);

        let rebuilt = Handle::new(HandleId(99), "saved", Target::function(on_save));
        assert!(provider.unsubscribe(&rebuilt));
        assert!(!provider.has_subscribers("saved"));
    }

    #[test]
    fn test_unsubscribe_keeps_order_of_others() {
        let provider = Provider::new();
        let a = provider.subscribe("t", noop());
        let b = provider.subscribe("t", noop());
        let c = provider.subscribe("t", noop());

        assert!(provider.unsubscribe(&b));

        let ids: Vec<_> = provider.subscribed_handles("t").iter().map(Handle::id).collect();
        assert_eq!(ids, vec![a.id(), c.id()]);

        // Remaining handles are still valid tokens.
        assert!(provider.unsubscribe(&c));
        assert!(provider.unsubscribe(&a));
    }

    #[test]
    fn test_handle_ids_are_unique() {
        let provider = Provider::new();
        let a = provider.subscribe("t", noop());
        provider.unsubscribe(&a);
        let b = provider.subscribe("t", noop());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_prune_policy() {
        let provider = Provider::new();
        let x = provider.subscribe("x", noop());
        provider.subscribe("y", noop());
        provider.subscribe("z", noop());

        provider.unsubscribe(&x);
        provider.clear_handles("y");
        assert_eq!(provider.topics(), vec!["z".to_string()]);
    }

    #[test]
    fn test_retain_policy() {
        let provider = Provider::with_config(ProviderConfig {
            empty_topics: EmptyTopicPolicy::Retain,
            ..Default::default()
        });
        let x = provider.subscribe("x", noop());
        provider.subscribe("y", noop());

        provider.unsubscribe(&x);
        provider.clear_handles("y");
        provider.clear_handles("never");

        assert_eq!(provider.topics(), vec!["x".to_string(), "y".to_string()]);
        assert!(provider.subscribed_handles("x").is_empty());
        assert!(!provider.has_subscribers("y"));
    }

    #[test]
    fn test_clear() {
        let provider = Provider::new();
        provider.subscribe("x", noop());
        provider.subscribe("y", noop());

        provider.clear();
        assert!(provider.topics().is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let provider = Provider::new();
        provider.subscribe("t", noop());

        let mut snapshot = provider.subscribed_handles("t");
        snapshot.clear();
        assert_eq!(provider.subscriber_count("t"), 1);
    }
}
