//! # Event Envelope
//!
//! The wrapper for every notification handed to the bus.
//!
//! ## Properties
//!
//! - **Normalized Header**: identity, classification and timestamps are
//!   carried in [`EventHeader`], independent of the payload.
//! - **Single Payload**: exactly one [`EventPayload`] variant, and its tag
//!   always matches `header.event_type`.
//! - **Immutable**: fields are private; an event never changes after
//!   [`Event::new`] succeeds.

use serde::{Deserialize, Serialize};

use crate::entities::{EventCategory, EventPayload, EventSubCategory, EventType};
use crate::errors::EventError;
use crate::timestamp::WireTimestamp;

/// Version of the event type schema stamped into every header.
pub const EVENT_TYPE_VERSION: &str = "0.1";

/// Normalized header common to all events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHeader {
    /// `<namespace>.<name>.<nanos>`
    pub id: String,
    pub category: EventCategory,
    pub sub_category: EventSubCategory,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub type_version: String,
    /// When the condition occurred.
    pub raised_ts: WireTimestamp,
    /// When the header was built for publishing.
    pub reported_ts: WireTimestamp,
}

/// An event ready for publishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    header: EventHeader,
    payload: EventPayload,
}

impl Event {
    /// Pair a header with its payload.
    ///
    /// Fails when the payload variant does not belong to `header.event_type`.
    pub fn new(header: EventHeader, payload: EventPayload) -> Result<Self, EventError> {
        let payload_type = payload.event_type();
        if payload_type != header.event_type {
            return Err(EventError::PayloadMismatch {
                header: header.event_type,
                payload: payload_type,
            });
        }
        Ok(Self { header, payload })
    }

    #[must_use]
    pub fn header(&self) -> &EventHeader {
        &self.header
    }

    #[must_use]
    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Shorthand for `header().id`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.header.id
    }

    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.header.event_type
    }
}
