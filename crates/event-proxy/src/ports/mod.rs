//! Ports Layer - trait definitions
//!
//! - `inbound`: what producers call
//! - `outbound`: what the proxy needs (bus client, clock)

pub mod inbound;
pub mod outbound;

pub use inbound::EventProxyApi;
pub use outbound::{BusClient, BusError, Clock, SystemClock, Topic};
