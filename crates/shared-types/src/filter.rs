//! Event filter definitions.
//!
//! A filter is registered per event-type key (`device_event`, `kpi_event`,
//! `config_event`, or the wildcard `all`). Filters are plain data;
//! evaluation lives in the event proxy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute a filter rule compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventFilterRuleKey {
    /// Sentinel: `"true"` in the first rule lets every event through.
    FilterAll,
    Category,
    SubCategory,
    KpiEventType,
    ConfigEventType,
    DeviceEventType,
}

impl EventFilterRuleKey {
    #[must_use]
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::FilterAll => "filter_all",
            Self::Category => "category",
            Self::SubCategory => "sub_category",
            Self::KpiEventType => "kpi_event_type",
            Self::ConfigEventType => "config_event_type",
            Self::DeviceEventType => "device_event_type",
        }
    }
}

impl fmt::Display for EventFilterRuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str_name())
    }
}

/// One `(key, expected value)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilterRule {
    pub key: EventFilterRuleKey,
    pub value: String,
}

impl EventFilterRule {
    pub fn new(key: EventFilterRuleKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// Filter registered for one event-type key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Device the filter was requested for; informational only.
    #[serde(default)]
    pub device_id: String,
    /// Registration key: `device_event`, `kpi_event`, `config_event` or `all`.
    pub event_type: String,
    pub enable: bool,
    /// Evaluated in order; all must match for an event to pass.
    #[serde(default)]
    pub rules: Vec<EventFilterRule>,
}

impl EventFilter {
    pub fn new(event_type: impl Into<String>, enable: bool) -> Self {
        Self {
            device_id: String::new(),
            event_type: event_type.into(),
            enable,
            rules: Vec::new(),
        }
    }

    /// Append a rule.
    #[must_use]
    pub fn with_rule(mut self, key: EventFilterRuleKey, value: impl Into<String>) -> Self {
        self.rules.push(EventFilterRule::new(key, value));
        self
    }

    #[must_use]
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    /// True when the first rule is the `filter_all = "true"` sentinel.
    #[must_use]
    pub fn passes_everything(&self) -> bool {
        self.rules
            .first()
            .is_some_and(|r| r.key == EventFilterRuleKey::FilterAll && r.value == "true")
    }
}
