//! Subscriber targets and their identities.
//!
//! A [`Target`] describes *what* to call without resolving it. Resolution
//! happens lazily inside a [`Handle`](crate::Handle), so a target may name a
//! class whose instance is only built on first dispatch.
//!
//! Targets compare by [`TargetKey`], never structurally:
//! - function items and non-capturing closures by their type, capturing
//!   closures by the shared allocation, named functions by name
//! - instances by pointer, paired with the method name
//! - classes by [`Class::name`], paired with the method name

mod traits;

pub use traits::{Class, Invocable, Object};

use crate::error::Result;
use crate::types::Value;
use std::any::TypeId;
use std::fmt;
use std::mem;
use std::sync::Arc;

/// Stable identity of a target, used for de-duplication and unsubscription.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetKey {
    /// A function item or closure without captures, keyed by its type.
    Code(TypeId),
    /// A capturing closure or shared invocable, keyed by allocation.
    Function(usize),
    Named(Arc<str>),
    Object(usize),
    Method(usize, String),
    Class(String),
    ClassMethod(String, String),
}

/// What a subscriber is.
#[derive(Clone)]
pub enum Target {
    /// A free function or closure.
    Function {
        function: Arc<dyn Invocable>,
        /// Set when the function carries no state, so every wrapping of it
        /// is the same function.
        code: Option<TypeId>,
    },
    /// A function known under a stable name.
    Named {
        name: Arc<str>,
        function: Arc<dyn Invocable>,
    },
    /// An instance that is itself callable.
    Object(Arc<dyn Object>),
    /// An instance plus a method name.
    Method {
        receiver: Arc<dyn Object>,
        method: String,
    },
    /// A class reference; its lazily built instance is called.
    Class(Arc<dyn Class>),
    /// A class reference plus a method name.
    ClassMethod {
        class: Arc<dyn Class>,
        method: String,
    },
}

fn addr<T: ?Sized>(ptr: &Arc<T>) -> usize {
    Arc::as_ptr(ptr) as *const () as usize
}

impl Target {
    /// Wrap a function or closure.
    ///
    /// Function items and closures that capture nothing are identified by
    /// their code, so wrapping the same `fn` twice yields equal targets.
    /// Capturing closures are identified by this wrapping; clones of the
    /// returned target share it.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let code = (mem::size_of::<F>() == 0).then(TypeId::of::<F>);
        Target::Function {
            function: Arc::new(f),
            code,
        }
    }

    /// Wrap an already shared invocable, identified by its allocation.
    pub fn invocable(f: Arc<dyn Invocable>) -> Self {
        Target::Function {
            function: f,
            code: None,
        }
    }

    /// A function identified by `name` rather than by allocation.
    pub fn named<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Target::Named {
            name: name.into(),
            function: Arc::new(f),
        }
    }

    /// An instance invoked as a callable.
    pub fn object(instance: Arc<dyn Object>) -> Self {
        Target::Object(instance)
    }

    /// A method on an existing instance.
    pub fn method(receiver: Arc<dyn Object>, method: impl Into<String>) -> Self {
        Target::Method {
            receiver,
            method: method.into(),
        }
    }

    /// A class whose instance, built on first use, is invoked as a callable.
    pub fn class(class: Arc<dyn Class>) -> Self {
        Target::Class(class)
    }

    /// A method on a class, static or on a lazily built instance.
    pub fn class_method(class: Arc<dyn Class>, method: impl Into<String>) -> Self {
        Target::ClassMethod {
            class,
            method: method.into(),
        }
    }

    /// Identity of this target.
    pub fn key(&self) -> TargetKey {
        match self {
            Target::Function { code: Some(t), .. } => TargetKey::Code(*t),
            Target::Function { function, .. } => TargetKey::Function(addr(function)),
            Target::Named { name, .. } => TargetKey::Named(name.clone()),
            Target::Object(o) => TargetKey::Object(addr(o)),
            Target::Method { receiver, method } => TargetKey::Method(addr(receiver), method.clone()),
            Target::Class(c) => TargetKey::Class(c.name().to_string()),
            Target::ClassMethod { class, method } => {
                TargetKey::ClassMethod(class.name().to_string(), method.clone())
            }
        }
    }

    /// Human-readable description for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            Target::Function { .. } => "<function>".to_string(),
            Target::Named { name, .. } => name.to_string(),
            Target::Object(o) => o.type_name().to_string(),
            Target::Method { receiver, method } => format!("{}->{}", receiver.type_name(), method),
            Target::Class(c) => c.name().to_string(),
            Target::ClassMethod { class, method } => format!("{}::{}", class.name(), method),
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({})", self.describe())
    }
}
