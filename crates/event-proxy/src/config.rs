//! Event proxy configuration from environment variables.

use std::env;

use serde::{Deserialize, Serialize};
use shared_bus::DEFAULT_EVENT_TOPIC;
use shared_types::EventFilter;

use crate::domain::filter::{CONFIG_EVENT_KEY, DEVICE_EVENT_KEY, FILTER_ALL_KEY, KPI_EVENT_KEY};
use crate::domain::header::DEFAULT_NAMESPACE;
use crate::error::ProxyError;

/// Configuration for an [`crate::EventProxy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Bus topic every event is published on
    pub topic: String,

    /// First component of every event id
    pub namespace: String,

    /// Filters registered when the proxy is built
    #[serde(default)]
    pub filters: Vec<EventFilter>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_EVENT_TOPIC.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            filters: Vec::new(),
        }
    }
}

impl ProxyConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `EP_EVENT_TOPIC`: Bus topic (default: voltha.events)
    /// - `EP_EVENT_NAMESPACE`: Event id namespace (default: Voltha.openolt)
    pub fn from_env() -> Self {
        Self {
            topic: env::var("EP_EVENT_TOPIC").unwrap_or_else(|_| DEFAULT_EVENT_TOPIC.to_string()),
            namespace: env::var("EP_EVENT_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string()),
            filters: Vec::new(),
        }
    }

    /// Replace the filter list with a JSON array of filters.
    pub fn with_filters_json(mut self, json: &str) -> Result<Self, ProxyError> {
        self.filters = serde_json::from_str(json)
            .map_err(|e| ProxyError::Config(format!("invalid filter list: {e}")))?;
        Ok(self)
    }

    /// Check that the configuration can build a proxy.
    pub fn validate(&self) -> Result<(), ProxyError> {
        if self.topic.trim().is_empty() {
            return Err(ProxyError::Config("topic must not be empty".to_string()));
        }
        if self.namespace.trim().is_empty() {
            return Err(ProxyError::Config("namespace must not be empty".to_string()));
        }
        for filter in &self.filters {
            let key = filter.event_type.as_str();
            if ![FILTER_ALL_KEY, DEVICE_EVENT_KEY, KPI_EVENT_KEY, CONFIG_EVENT_KEY].contains(&key) {
                return Err(ProxyError::Config(format!(
                    "unknown filter key '{key}'"
                )));
            }
        }
        Ok(())
    }
}
