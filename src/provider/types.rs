//! Provider configuration.

use serde::{Deserialize, Serialize};

/// What happens to a topic key once its last handle is gone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyTopicPolicy {
    /// Drop the key, whether emptied by unsubscribe or by clear.
    #[default]
    Prune,
    /// Keep the key, whether emptied by unsubscribe or by clear.
    Retain,
}

/// Configuration for a provider.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Name of the owning pluggable object, attached to log events.
    pub label: Option<String>,

    /// Handling of topics left without handles.
    /// Default: prune
    pub empty_topics: EmptyTopicPolicy,
}

impl ProviderConfig {
    /// Default configuration with a label.
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }
}
