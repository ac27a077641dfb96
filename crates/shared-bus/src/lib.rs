//! # Shared Bus - Bus Client Port
//!
//! Defines the interface the event proxy uses to hand events to the message
//! bus, plus an in-memory implementation for single-process deployments and
//! tests.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Event Proxy  │                    │  Consumer    │
//! │ (publisher   │    send()          │              │
//! │  loop)       │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  BusClient   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Contract
//!
//! - `send` is called by exactly one task at a time (the proxy's publisher
//!   loop); implementations need not order concurrent callers.
//! - Liveness is reported on a watch channel obtained from
//!   `enable_liveness_channel`.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{BusMessage, Topic, TopicFilter};
pub use publisher::{BusClient, BusError, InMemoryBusClient};
pub use subscriber::{BusStream, Subscription, SubscriptionError};

/// Maximum messages to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Topic events are published on unless configured otherwise.
pub const DEFAULT_EVENT_TOPIC: &str = "voltha.events";
