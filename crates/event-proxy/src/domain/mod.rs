//! Domain Layer - ordering, headers and filtering
//!
//! This layer contains:
//! - Header builder (event ids and timestamps)
//! - Ordering queue (baton-passing FIFO)
//! - Filter engine
//! - ONU device-event catalog
//! - Lifecycle states
//!
//! RULES:
//! - No bus access
//! - No spawning; the service layer drives the queue

pub mod catalog;
pub mod filter;
pub mod header;
pub mod lifecycle;
pub mod queue;

pub use catalog::{lookup, DeviceEventDescriptor};
pub use filter::{
    event_attributes, filter_key, FilterDecision, FilterTable, CONFIG_EVENT_KEY,
    DEVICE_EVENT_KEY, FILTER_ALL_KEY, KPI_EVENT_KEY,
};
pub use header::{strip_event_suffix, HeaderBuilder, DEFAULT_NAMESPACE, UNKNOWN_EVENT_NAME};
pub use lifecycle::ProxyState;
pub use queue::{EventQueue, QueueSnapshot, StopRequest, Ticket};
