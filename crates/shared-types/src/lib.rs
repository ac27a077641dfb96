//! # Shared Types Crate
//!
//! This crate contains the event envelope, the typed payload variants, the
//! wire timestamp and the filter definitions used by the event proxy and
//! the bus client.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every type that crosses the proxy/bus
//!   boundary is defined here.
//! - **Immutable Envelope**: An [`Event`] is validated at construction
//!   (payload variant must match the header type) and is read-only afterwards.
//! - **Wire Compatibility**: Enum string names match the control-plane wire
//!   names (`EQUIPMENT`, `ONU`, `DEVICE_EVENT`, ...).

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod filter;
pub mod timestamp;

pub use entities::*;
pub use envelope::{Event, EventHeader, EVENT_TYPE_VERSION};
pub use errors::*;
pub use filter::{EventFilter, EventFilterRule, EventFilterRuleKey};
pub use timestamp::WireTimestamp;
