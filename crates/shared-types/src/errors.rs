//! # Error Types
//!
//! Validation errors raised while building events.

use thiserror::Error;

use crate::entities::EventType;

/// An instant could not be represented as a wire timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampConversionError {
    /// Seconds outside 0001-01-01 ..= 9999-12-31.
    #[error("Timestamp out of range: {seconds}s is outside the wire timestamp range")]
    OutOfRange { seconds: i64 },

    /// Sub-second part outside `0..1_000_000_000`.
    #[error("Invalid nanos: {nanos} is outside 0..1000000000")]
    InvalidNanos { nanos: i32 },
}

/// Errors raised when constructing an [`crate::Event`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// Payload variant does not match the header type.
    #[error("Payload mismatch: header type {header} but payload is {payload}")]
    PayloadMismatch { header: EventType, payload: EventType },
}
