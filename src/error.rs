//! Error types for the dispatcher.

use thiserror::Error;

/// Boxed error raised from subscriber code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for subscription and dispatch operations.
#[derive(Debug, Error)]
pub enum PubSubError {
    #[error("Invalid callback: {0}")]
    InvalidCallback(String),

    #[error("Failed to instantiate {class}: {reason}")]
    Instantiation { class: String, reason: String },

    #[error("Target resolved itself re-entrantly: {0}")]
    ReentrantResolution(String),

    #[error("Handler failed: {0}")]
    Handler(String),

    #[error("{0}")]
    Subscriber(#[source] BoxError),
}

impl PubSubError {
    /// Wrap an arbitrary error raised by subscriber code.
    pub fn subscriber<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        PubSubError::Subscriber(err.into())
    }

    /// True if this is the dispatcher's own "not invocable" error.
    pub fn is_invalid_callback(&self) -> bool {
        matches!(self, PubSubError::InvalidCallback(_))
    }
}

/// Result type for dispatcher operations.
pub type Result<T> = std::result::Result<T, PubSubError>;
