//! Service Layer - orchestration
//!
//! - `EventProxy`: implements `EventProxyApi` on top of a `BusClient`

pub mod event_proxy;

pub use event_proxy::{EventProxy, ProxySnapshot};
