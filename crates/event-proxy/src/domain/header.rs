//! Header construction for outgoing events.
//!
//! The id of every event is `<namespace>.<name>.<nanos>` where `name` is the
//! caller supplied event name with its two trailing `_` tokens removed, and
//! `nanos` is the instant the header was built.

use std::sync::Arc;

use shared_types::{
    EventCategory, EventHeader, EventSubCategory, EventType, TimestampConversionError,
    WireTimestamp, EVENT_TYPE_VERSION,
};

use crate::ports::outbound::{Clock, SystemClock};

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "Voltha.openolt";

/// Name used in the id when the event name carries no `_` separator.
pub const UNKNOWN_EVENT_NAME: &str = "UNKNOWN_EVENT";

/// Drop the last two `_`-delimited tokens of `name`.
///
/// Returns `None` when `name` has no `_` at all. Names with only one
/// separator collapse to the empty string.
#[must_use]
pub fn strip_event_suffix(name: &str) -> Option<String> {
    if !name.contains('_') {
        return None;
    }
    let tokens: Vec<&str> = name.split('_').collect();
    let keep = tokens.len().saturating_sub(2);
    Some(tokens[..keep].join("_"))
}

/// Builds [`EventHeader`]s stamped with the configured namespace.
#[derive(Clone)]
pub struct HeaderBuilder {
    namespace: String,
    clock: Arc<dyn Clock>,
}

impl HeaderBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::with_clock(namespace, Arc::new(SystemClock))
    }

    pub fn with_clock(namespace: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            namespace: namespace.into(),
            clock,
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Build a header for an event raised at `raised_ts` (nanoseconds since
    /// the Unix epoch).
    ///
    /// # Errors
    ///
    /// Returns [`TimestampConversionError`] if either the raised instant or
    /// the clock's current instant falls outside the wire timestamp range.
    pub fn build(
        &self,
        name: &str,
        category: EventCategory,
        sub_category: Option<EventSubCategory>,
        event_type: EventType,
        raised_ts: i64,
    ) -> Result<EventHeader, TimestampConversionError> {
        let raised_ts = WireTimestamp::from_unix_nanos(raised_ts)?;
        let reported_ts = WireTimestamp::from_system_time(self.clock.now())?;

        let short_name =
            strip_event_suffix(name).unwrap_or_else(|| UNKNOWN_EVENT_NAME.to_string());
        // Out-of-i64 instants only occur past year 2262; fall back to seconds
        let stamp = reported_ts
            .as_unix_nanos()
            .unwrap_or(reported_ts.seconds.saturating_mul(1_000_000_000));

        Ok(EventHeader {
            id: format!("{}.{}.{}", self.namespace, short_name, stamp),
            category,
            sub_category: sub_category.unwrap_or_default(),
            event_type,
            type_version: EVENT_TYPE_VERSION.to_string(),
            raised_ts,
            reported_ts,
        })
    }
}

impl Default for HeaderBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

impl std::fmt::Debug for HeaderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderBuilder")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
