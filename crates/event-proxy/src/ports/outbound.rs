//! Outbound Ports (Driven Ports)
//!
//! Dependencies the proxy needs from its environment: the bus client
//! (defined in `shared-bus`) and a wall clock.

use std::time::SystemTime;

pub use shared_bus::{BusClient, BusError, Topic};

/// Source of the current instant for reported timestamps and event ids.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall clock backed by `SystemTime::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
