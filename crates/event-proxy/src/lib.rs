//! # Event Proxy
//!
//! Ordered event publishing and rule-based event filtering in front of the
//! control-plane message bus.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): No bus access
//!   - `HeaderBuilder`: Event ids and timestamps
//!   - `EventQueue`: Baton-passing FIFO of queued events
//!   - `FilterTable`: Filter registration and evaluation
//!   - `catalog`: ONU alarm to device-event lookup
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `EventProxyApi`: Driving port (inbound API)
//!   - `BusClient`, `Clock`: Driven ports
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `EventProxy`: Implements `EventProxyApi`, owns the publisher loop
//!
//! ## Guarantees
//!
//! - Events reach `BusClient::send` in the order their `send_*` call linked
//!   them into the queue.
//! - At most one send is in progress at any time.
//! - `stop()` drains: every event accepted before it is attempted.
//! - Bus failures are logged and counted, never retried.
//!
//! ## Usage Example
//!
//! ```ignore
//! use event_proxy::{EventProxy, EventProxyApi, ProxyConfig};
//! use shared_bus::InMemoryBusClient;
//! use std::sync::Arc;
//!
//! let bus = Arc::new(InMemoryBusClient::new());
//! let proxy = Arc::new(EventProxy::with_config(bus, ProxyConfig::from_env())?);
//!
//! let runner = tokio::spawn({
//!     let proxy = Arc::clone(&proxy);
//!     async move { proxy.start().await }
//! });
//!
//! proxy.send_rpc_event("dummy-1", Some(RpcEvent::default()), EventCategory::Communication, None, now)?;
//!
//! proxy.stop()?;
//! proxy.stopped().await;
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use config::ProxyConfig;
pub use domain::catalog::{self, DeviceEventDescriptor};
pub use domain::{FilterDecision, FilterTable, HeaderBuilder, ProxyState, QueueSnapshot};
pub use error::{CatalogError, ProxyError};
pub use metrics::{MetricsSnapshot, ProxyMetrics};
pub use ports::{Clock, EventProxyApi, SystemClock};
pub use service::{EventProxy, ProxySnapshot};
