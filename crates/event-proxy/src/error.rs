//! Error types for the Event Proxy

use shared_types::{EventError, EventType, TimestampConversionError};
use thiserror::Error;

/// Errors returned to callers of the event proxy.
///
/// Only validation and lifecycle failures are reported here. Bus send
/// failures happen after an event is accepted and are logged, never
/// returned.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Missing payload: received empty {kind} payload")]
    MissingPayload { kind: EventType },

    #[error("Timestamp conversion failed: {0}")]
    Timestamp(#[from] TimestampConversionError),

    #[error("Invalid event: {0}")]
    Event(#[from] EventError),

    #[error("Event proxy stopped: new events are rejected")]
    Stopped,

    #[error("Publisher loop already started")]
    AlreadyStarted,

    #[error("Stop already requested")]
    AlreadyStopping,

    #[error("No async runtime available to schedule delivery")]
    NoRuntime,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Errors from the device-event catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Device event not found: class_id={class_id} alarm_no={alarm_no}")]
    NotFound { class_id: u16, alarm_no: u8 },
}
