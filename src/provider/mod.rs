//! Per-instance publish/subscribe provider.
//!
//! A [`Provider`] is typically owned by one pluggable object. Callers
//! subscribe targets to named topics and the object publishes to them:
//! - [`Provider::publish`]: call every handler, last result wins
//! - [`Provider::publish_until`]: stop at the first result a predicate accepts
//! - [`Provider::filter`]: thread a value through every handler in turn
//!
//! # Example
//!
//! ```ignore
//! let provider = Provider::new();
//!
//! let handle = provider.subscribe("render", Target::function(|args| {
//!     Ok(json!(format!("<b>{}</b>", args[0].as_str().unwrap_or_default())))
//! }));
//!
//! let html = provider.filter("render", json!("hi"), &[])?;
//! assert_eq!(html, json!("<b>hi</b>"));
//!
//! provider.unsubscribe(&handle);
//! ```

mod dispatch;
mod manager;
mod types;

pub use manager::Provider;
pub use types::{EmptyTopicPolicy, ProviderConfig};
