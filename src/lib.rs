//! # Topic Hub
//!
//! A per-instance publish/subscribe dispatcher for plugin and extension
//! points. Everything runs synchronously on the caller's thread.
//!
//! ## Core Concepts
//!
//! - **Provider**: registry mapping topic names to ordered subscriptions
//! - **Handle**: one target bound to one topic; also the unsubscribe token
//! - **Target**: a function, an instance method, or a lazily built class
//! - **Dispatch**: publish (fan-out), publish-until (short-circuit), filter (pipeline)
//!
//! ## Example
//!
//! ```ignore
//! use topichub::{Provider, Target};
//! use serde_json::json;
//!
//! let provider = Provider::new();
//! provider.subscribe("greet", Target::function(|args| Ok(json!(format!("hi {}", args[0])))));
//!
//! let reply = provider.publish("greet", &[json!("ada")])?;
//! ```

pub mod error;
pub mod handle;
pub mod provider;
pub mod target;
pub mod types;

// Re-exports
pub use error::{BoxError, PubSubError, Result};
pub use handle::{Handle, Resolved};
pub use provider::{EmptyTopicPolicy, Provider, ProviderConfig};
pub use target::{Class, Invocable, Object, Target, TargetKey};
pub use types::{is_truthy, HandleId, Value};
