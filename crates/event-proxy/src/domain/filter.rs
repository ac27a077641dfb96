//! # Event Filter Engine
//!
//! Decides whether an event is suppressed before it reaches the bus.
//!
//! ## Evaluation
//!
//! 1. A filter registered under `all` takes precedence over every other key.
//! 2. Otherwise the filter registered for the event's type key is used. An
//!    event whose type key has no filter is excluded. RPC events have no
//!    type key and are never excluded here.
//! 3. A disabled filter, or one whose first rule is `filter_all = "true"`,
//!    lets everything through. Otherwise every rule must equal the
//!    attribute derived from the event.

use std::collections::HashMap;

use shared_types::{Event, EventFilter, EventFilterRuleKey, EventPayload, EventType};

use super::header::strip_event_suffix;

/// Wildcard registration key.
pub const FILTER_ALL_KEY: &str = "all";
pub const DEVICE_EVENT_KEY: &str = "device_event";
pub const KPI_EVENT_KEY: &str = "kpi_event";
pub const CONFIG_EVENT_KEY: &str = "config_event";

/// Registration key for events of `event_type`.
#[must_use]
pub fn filter_key(event_type: EventType) -> Option<&'static str> {
    match event_type {
        EventType::Device => Some(DEVICE_EVENT_KEY),
        EventType::Kpi => Some(KPI_EVENT_KEY),
        EventType::Config => Some(CONFIG_EVENT_KEY),
        EventType::Rpc => None,
    }
}

/// Why an event was let through or excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// No filter applies to this event type.
    NoTypeKey,
    Disabled,
    PassAll,
    /// All rules matched (or there were none).
    RulesMatched,
    /// No filter registered for the key.
    NoFilter { key: String },
    /// A rule's expected value differed from the event.
    RuleMismatch {
        key: EventFilterRuleKey,
        expected: String,
        actual: Option<String>,
    },
}

impl FilterDecision {
    #[must_use]
    pub fn is_excluded(&self) -> bool {
        matches!(self, Self::NoFilter { .. } | Self::RuleMismatch { .. })
    }
}

/// Attributes of `event` that filter rules compare against.
///
/// Category and sub-category are lower-cased wire names. Device events
/// contribute their name without the raise/clear suffix, KPI events their
/// sample shape and config events their change kind.
#[must_use]
pub fn event_attributes(event: &Event) -> HashMap<EventFilterRuleKey, String> {
    let header = event.header();
    let mut attrs = HashMap::new();
    attrs.insert(
        EventFilterRuleKey::Category,
        header.category.as_str_name().to_lowercase(),
    );
    attrs.insert(
        EventFilterRuleKey::SubCategory,
        header.sub_category.as_str_name().to_lowercase(),
    );

    match event.payload() {
        EventPayload::Device(device) => {
            let name = strip_event_suffix(&device.device_event_name)
                .unwrap_or_else(|| device.device_event_name.clone());
            attrs.insert(EventFilterRuleKey::DeviceEventType, name);
        }
        EventPayload::Kpi(kpi) => {
            let kind = serde_kind(&kpi.kpi_type);
            attrs.insert(EventFilterRuleKey::KpiEventType, kind);
        }
        EventPayload::Config(config) => {
            let kind = serde_kind(&config.config_type);
            attrs.insert(EventFilterRuleKey::ConfigEventType, kind);
        }
        EventPayload::Rpc(_) => {}
    }
    attrs
}

// Unit enums serialize to their lower-case wire names
fn serde_kind<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

/// Evaluate one filter against `event`.
#[must_use]
pub fn evaluate(filter: &EventFilter, event: &Event) -> FilterDecision {
    if !filter.enable {
        return FilterDecision::Disabled;
    }
    if filter.passes_everything() {
        return FilterDecision::PassAll;
    }

    let attrs = event_attributes(event);
    for rule in &filter.rules {
        let actual = attrs.get(&rule.key);
        if actual != Some(&rule.value) {
            return FilterDecision::RuleMismatch {
                key: rule.key,
                expected: rule.value.clone(),
                actual: actual.cloned(),
            };
        }
    }
    FilterDecision::RulesMatched
}

/// Filters keyed by registration key.
#[derive(Debug, Clone, Default)]
pub struct FilterTable {
    filters: HashMap<String, EventFilter>,
}

impl FilterTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `filter`, replacing any filter under the same key.
    ///
    /// Returns the replaced filter.
    pub fn add(&mut self, filter: EventFilter) -> Option<EventFilter> {
        self.filters.insert(filter.event_type.clone(), filter)
    }

    pub fn remove(&mut self, key: &str) -> Option<EventFilter> {
        self.filters.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&EventFilter> {
        self.filters.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Decide whether `event` passes the registered filters.
    #[must_use]
    pub fn decide(&self, event: &Event) -> FilterDecision {
        if let Some(filter) = self.filters.get(FILTER_ALL_KEY) {
            return evaluate(filter, event);
        }

        let Some(key) = filter_key(event.event_type()) else {
            return FilterDecision::NoTypeKey;
        };
        match self.filters.get(key) {
            Some(filter) => evaluate(filter, event),
            None => FilterDecision::NoFilter {
                key: key.to_string(),
            },
        }
    }

    /// `true` when `event` must not be published.
    #[must_use]
    pub fn check_event(&self, event: &Event) -> bool {
        self.decide(event).is_excluded()
    }
}
