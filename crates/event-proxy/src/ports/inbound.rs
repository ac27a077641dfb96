//! Inbound Ports (Driving Ports)
//!
//! The API producers use to publish events and manage filters.

use async_trait::async_trait;
use shared_types::{
    DeviceEvent, Event, EventCategory, EventFilter, EventSubCategory, KpiEvent, RpcEvent,
};

use crate::error::ProxyError;

/// Primary event proxy API (Driving Port)
///
/// The `send_*` operations return once the event is linked into the
/// ordering queue. Delivery happens later, in submission order, and its
/// failures are not reported back.
#[async_trait]
pub trait EventProxyApi: Send + Sync {
    /// Publish the outcome of an RPC.
    ///
    /// # Arguments
    /// * `id` - Event name used to build the event id
    /// * `rpc_event` - Payload; `None` is rejected
    /// * `raised_ts` - Nanoseconds since the Unix epoch
    fn send_rpc_event(
        &self,
        id: &str,
        rpc_event: Option<RpcEvent>,
        category: EventCategory,
        sub_category: Option<EventSubCategory>,
        raised_ts: i64,
    ) -> Result<(), ProxyError>;

    /// Publish a device alarm. The event id is derived from the payload's
    /// `device_event_name`.
    fn send_device_event(
        &self,
        device_event: Option<DeviceEvent>,
        category: EventCategory,
        sub_category: EventSubCategory,
        raised_ts: i64,
    ) -> Result<(), ProxyError>;

    /// Publish a KPI sample.
    fn send_kpi_event(
        &self,
        id: &str,
        kpi_event: Option<KpiEvent>,
        category: EventCategory,
        sub_category: EventSubCategory,
        raised_ts: i64,
    ) -> Result<(), ProxyError>;

    /// Run the publisher loop until the proxy has stopped.
    async fn start(&self) -> Result<(), ProxyError>;

    /// Refuse new events and shut down once everything queued is delivered.
    fn stop(&self) -> Result<(), ProxyError>;

    /// Register `filter` under its key, replacing any existing one.
    fn add_filter(&self, filter: EventFilter);

    /// Remove the filter registered under `key`.
    fn remove_filter(&self, key: &str) -> Option<EventFilter>;

    /// `true` when `event` must not be published.
    fn filter_event(&self, event: &Event) -> bool;
}
