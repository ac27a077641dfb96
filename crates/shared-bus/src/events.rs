//! # Bus Messages
//!
//! Topics and the message wrapper that flows through the in-memory bus.

use serde::{Deserialize, Serialize};
use shared_types::Event;
use std::fmt;
use std::sync::Arc;

use crate::DEFAULT_EVENT_TOPIC;

/// A named bus topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    name: String,
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for Topic {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_TOPIC)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An event as delivered to subscribers.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub topic: Topic,
    pub event: Arc<Event>,
}

/// Filter for subscribing to specific topics.
#[derive(Debug, Clone, Default)]
pub struct TopicFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<Topic>,
}

impl TopicFilter {
    /// Create a filter that accepts all messages.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<Topic>) -> Self {
        Self { topics }
    }

    /// Check if a message matches this filter.
    #[must_use]
    pub fn matches(&self, message: &BusMessage) -> bool {
        self.topics.is_empty() || self.topics.contains(&message.topic)
    }
}
