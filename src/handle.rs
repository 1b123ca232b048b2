//! Subscription handles.
//!
//! A [`Handle`] binds one [`Target`] to one topic. It is created by
//! [`Provider::subscribe`](crate::Provider::subscribe), stored in the
//! provider's topic list, and handed back to the caller as the token for
//! [`Provider::unsubscribe`](crate::Provider::unsubscribe). Clones share the
//! same underlying subscription.
//!
//! Resolution is lazy: the target becomes a [`Resolved`] form on first use
//! and is memoized, so a class target builds its instance at most once per
//! handle. Concurrent first uses wait for the one in progress. A class
//! constructor that calls back into its own handle gets
//! [`PubSubError::ReentrantResolution`] instead of a deadlock.

use crate::error::{PubSubError, Result};
use crate::target::{Class, Invocable, Object, Target, TargetKey};
use crate::types::{HandleId, Value};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{trace, warn};

/// The invocable form of a target.
#[derive(Clone)]
pub enum Resolved {
    Function(Arc<dyn Invocable>),
    /// An instance invoked as a callable.
    Object(Arc<dyn Object>),
    BoundMethod {
        receiver: Arc<dyn Object>,
        method: String,
    },
    StaticMethod {
        class: Arc<dyn Class>,
        method: String,
    },
}

impl Resolved {
    /// Whether calling this form can succeed at all.
    pub fn is_invocable(&self) -> bool {
        match self {
            Resolved::Function(_) => true,
            Resolved::Object(o) => o.is_callable(),
            Resolved::BoundMethod { receiver, method } => {
                receiver.has_method(method) || receiver.dispatches_any()
            }
            Resolved::StaticMethod { class, method } => class.is_static(method),
        }
    }

    fn describe(&self) -> String {
        match self {
            Resolved::Function(_) => "<function>".to_string(),
            Resolved::Object(o) => o.type_name().to_string(),
            Resolved::BoundMethod { receiver, method } => {
                format!("{}->{}", receiver.type_name(), method)
            }
            Resolved::StaticMethod { class, method } => format!("{}::{}", class.name(), method),
        }
    }
}

impl Invocable for Resolved {
    fn invoke(&self, args: &[Value]) -> Result<Value> {
        if !self.is_invocable() {
            return Err(PubSubError::InvalidCallback(self.describe()));
        }
        match self {
            Resolved::Function(f) => f.invoke(args),
            Resolved::Object(o) => o.call(args),
            Resolved::BoundMethod { receiver, method } => receiver.call_method(method, args),
            Resolved::StaticMethod { class, method } => class.call_static(method, args),
        }
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resolved({})", self.describe())
    }
}

/// Per-handle resolution state.
enum Resolution {
    Unresolved,
    /// A constructor is running on the thread holding the lock.
    Resolving,
    Resolved(Resolved),
}

struct Subscription {
    id: HandleId,
    topic: String,
    target: Target,
    key: TargetKey,
    /// Re-entrant so a constructor calling back in sees `Resolving`.
    resolution: ReentrantMutex<RefCell<Resolution>>,
}

/// One subscriber bound to one topic.
#[derive(Clone)]
pub struct Handle {
    inner: Arc<Subscription>,
}

impl Handle {
    pub(crate) fn new(id: HandleId, topic: impl Into<String>, target: Target) -> Self {
        let key = target.key();
        Self {
            inner: Arc::new(Subscription {
                id,
                topic: topic.into(),
                target,
                key,
                resolution: ReentrantMutex::new(RefCell::new(Resolution::Unresolved)),
            }),
        }
    }

    /// Creation identity, unique within the provider.
    pub fn id(&self) -> HandleId {
        self.inner.id
    }

    /// Topic this handle is subscribed to.
    pub fn topic(&self) -> &str {
        &self.inner.topic
    }

    /// The target as subscribed, before resolution.
    pub fn target(&self) -> &Target {
        &self.inner.target
    }

    /// Target identity used for equality.
    pub fn key(&self) -> &TargetKey {
        &self.inner.key
    }

    /// Whether the target has been resolved and memoized.
    pub fn is_resolved(&self) -> bool {
        let guard = self.inner.resolution.lock();
        let state = guard.borrow();
        matches!(*state, Resolution::Resolved(_))
    }

    /// Whether two values refer to the very same subscription record.
    pub fn ptr_eq(&self, other: &Handle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Resolve the target to its invocable form.
    ///
    /// Class targets are instantiated on the first call and the instance is
    /// reused afterwards. A class method declared static resolves to class
    /// level dispatch and never instantiates, even if an instance was
    /// memoized earlier. A failed construction is not memoized.
    pub fn resolve(&self) -> Result<Resolved> {
        if let Some(resolved) = self.static_form() {
            return Ok(resolved);
        }

        let guard = self.inner.resolution.lock();
        match &*guard.borrow() {
            Resolution::Resolved(resolved) => return Ok(resolved.clone()),
            Resolution::Resolving => {
                return Err(PubSubError::ReentrantResolution(self.inner.target.describe()));
            }
            Resolution::Unresolved => {}
        }

        guard.replace(Resolution::Resolving);
        let built = self.build();
        guard.replace(match &built {
            Ok(resolved) => Resolution::Resolved(resolved.clone()),
            Err(_) => Resolution::Unresolved,
        });
        built
    }

    fn build(&self) -> Result<Resolved> {
        let resolved = match &self.inner.target {
            Target::Function { function, .. } => Resolved::Function(function.clone()),
            Target::Named { function, .. } => Resolved::Function(function.clone()),
            Target::Object(o) => Resolved::Object(o.clone()),
            Target::Method { receiver, method } => Resolved::BoundMethod {
                receiver: receiver.clone(),
                method: method.clone(),
            },
            Target::Class(class) => Resolved::Object(self.instantiate(class.as_ref())?),
            Target::ClassMethod { class, method } => Resolved::BoundMethod {
                receiver: self.instantiate(class.as_ref())?,
                method: method.clone(),
            },
        };
        Ok(resolved)
    }

    /// Invoke the target with `args`.
    ///
    /// Fails with [`PubSubError::InvalidCallback`] if the resolved target is
    /// not invocable. Errors raised by the target are returned unchanged.
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        trace!(handle = %self.inner.id, topic = %self.inner.topic, "invoking handler");
        let resolved = self.resolve()?;
        resolved.invoke(args)
    }

    fn static_form(&self) -> Option<Resolved> {
        match &self.inner.target {
            Target::ClassMethod { class, method } if class.is_static(method) => {
                Some(Resolved::StaticMethod {
                    class: class.clone(),
                    method: method.clone(),
                })
            }
            _ => None,
        }
    }

    fn instantiate(&self, class: &dyn Class) -> Result<Arc<dyn Object>> {
        trace!(handle = %self.inner.id, class = class.name(), "instantiating target class");
        class.instantiate().map_err(|e| {
            warn!(
                handle = %self.inner.id,
                topic = %self.inner.topic,
                class = class.name(),
                error = %e,
                "failed to resolve target"
            );
            e
        })
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.topic == other.inner.topic && self.inner.key == other.inner.key
    }
}

impl Eq for Handle {}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.topic.hash(state);
        self.inner.key.hash(state);
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.inner.id)
            .field("topic", &self.inner.topic)
            .field("target", &self.inner.target)
            .finish()
    }
}
