//! # Bus Client
//!
//! Defines the sending side of the bus and the in-memory implementation.

use crate::events::{BusMessage, Topic, TopicFilter};
use crate::subscriber::{BusStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use shared_types::Event;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

/// Errors returned by a bus client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The transport is not connected.
    #[error("Bus not connected")]
    NotConnected,

    /// The transport rejected the message.
    #[error("Send failed on topic {topic}: {reason}")]
    SendFailed { topic: String, reason: String },

    /// The client has been shut down.
    #[error("Bus client closed")]
    Closed,
}

/// Trait for handing events to the message bus.
///
/// The event proxy's publisher loop is the only caller of `send`, so
/// implementations see at most one send at a time from a given proxy.
#[async_trait]
pub trait BusClient: Send + Sync {
    /// Publish one event on `topic`.
    async fn send(&self, event: Arc<Event>, topic: &Topic) -> Result<(), BusError>;

    /// Turn liveness reporting on or off and return the channel it is
    /// reported on. `true` means the transport is alive.
    fn enable_liveness_channel(&self, enable: bool) -> watch::Receiver<bool>;

    /// Probe the transport and report the result on the liveness channel.
    async fn send_liveness(&self) -> Result<(), BusError>;
}

/// In-memory implementation of the bus client.
///
/// Uses `tokio::sync::broadcast` to fan messages out to subscribers.
/// Supports failure injection and an artificial send delay so that callers
/// can exercise slow or failing transports.
pub struct InMemoryBusClient {
    /// Broadcast sender for messages.
    sender: broadcast::Sender<BusMessage>,

    /// Channel capacity.
    capacity: usize,

    /// When false every send fails with `NotConnected`.
    connected: AtomicBool,

    /// Number of upcoming sends that fail with `SendFailed`.
    fail_next: AtomicU64,

    /// Artificial latency applied to each send.
    send_delay: Option<Duration>,

    /// Total events accepted.
    events_sent: AtomicU64,

    /// Total sends that returned an error.
    send_failures: AtomicU64,

    /// Sends currently in progress.
    in_flight: AtomicUsize,

    /// Highest `in_flight` ever observed.
    max_in_flight: AtomicUsize,

    liveness_enabled: AtomicBool,
    liveness: watch::Sender<bool>,
}

impl InMemoryBusClient {
    /// Create a new in-memory bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        let (liveness, _) = watch::channel(true);
        Self {
            sender,
            capacity,
            connected: AtomicBool::new(true),
            fail_next: AtomicU64::new(0),
            send_delay: None,
            events_sent: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            liveness_enabled: AtomicBool::new(false),
            liveness,
        }
    }

    /// Delay every send by `delay`.
    #[must_use]
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    /// Subscribe to messages matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: TopicFilter) -> Subscription {
        debug!(topics = ?filter.topics, "New bus subscription created");
        Subscription::new(self.sender.subscribe(), filter)
    }

    /// Get a stream of messages matching a filter.
    #[must_use]
    pub fn stream(&self, filter: TopicFilter) -> BusStream {
        BusStream::new(self.sender.subscribe(), filter)
    }

    /// Simulate the transport going up or down.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Make the next `count` sends fail.
    pub fn fail_next_sends(&self, count: u64) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total events accepted by the bus.
    #[must_use]
    pub fn events_sent(&self) -> u64 {
        self.events_sent.load(Ordering::SeqCst)
    }

    /// Total sends that failed.
    #[must_use]
    pub fn send_failures(&self) -> u64 {
        self.send_failures.load(Ordering::SeqCst)
    }

    /// Highest number of overlapping sends seen so far.
    #[must_use]
    pub fn max_concurrent_sends(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn take_injected_failure(&self) -> bool {
        self.fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn report_liveness(&self, alive: bool) {
        if self.liveness_enabled.load(Ordering::SeqCst) {
            self.liveness.send_replace(alive);
        }
    }
}

impl Default for InMemoryBusClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusClient for InMemoryBusClient {
    async fn send(&self, event: Arc<Event>, topic: &Topic) -> Result<(), BusError> {
        if !self.connected.load(Ordering::SeqCst) {
            self.send_failures.fetch_add(1, Ordering::SeqCst);
            self.report_liveness(false);
            return Err(BusError::NotConnected);
        }

        if self.take_injected_failure() {
            self.send_failures.fetch_add(1, Ordering::SeqCst);
            return Err(BusError::SendFailed {
                topic: topic.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        let overlapping = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(overlapping, Ordering::SeqCst);

        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }

        let id = event.id().to_string();
        let message = BusMessage {
            topic: topic.clone(),
            event,
        };
        match self.sender.send(message) {
            Ok(receivers) => {
                debug!(topic = %topic, id = %id, receivers, "Event published");
            }
            Err(_) => {
                // No subscribers; the bus still accepted the event
                debug!(topic = %topic, id = %id, "Event published with no subscribers");
            }
        }

        self.events_sent.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.report_liveness(true);
        Ok(())
    }

    fn enable_liveness_channel(&self, enable: bool) -> watch::Receiver<bool> {
        self.liveness_enabled.store(enable, Ordering::SeqCst);
        debug!(enable, "Liveness channel toggled");
        self.liveness.subscribe()
    }

    async fn send_liveness(&self) -> Result<(), BusError> {
        if !self.connected.load(Ordering::SeqCst) {
            warn!("Liveness probe failed: bus not connected");
            self.report_liveness(false);
            return Err(BusError::NotConnected);
        }
        self.report_liveness(true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{
        EventCategory, EventHeader, EventPayload, EventSubCategory, EventType, RpcEvent,
        WireTimestamp, EVENT_TYPE_VERSION,
    };

    fn event(id: &str) -> Arc<Event> {
        let header = EventHeader {
            id: id.to_string(),
            category: EventCategory::Communication,
            sub_category: EventSubCategory::None,
            event_type: EventType::Rpc,
            type_version: EVENT_TYPE_VERSION.to_string(),
            raised_ts: WireTimestamp::from_unix_nanos(0).unwrap(),
            reported_ts: WireTimestamp::from_unix_nanos(0).unwrap(),
        };
        Arc::new(Event::new(header, EventPayload::Rpc(RpcEvent::default())).unwrap())
    }

    #[tokio::test]
    async fn test_send_no_subscribers() {
        let bus = InMemoryBusClient::new();
        bus.send(event("a"), &Topic::default()).await.unwrap();
        assert_eq!(bus.events_sent(), 1);
        assert_eq!(bus.send_failures(), 0);
    }

    #[tokio::test]
    async fn test_send_with_subscriber() {
        let bus = InMemoryBusClient::new();
        let mut sub = bus.subscribe(TopicFilter::all());

        bus.send(event("a"), &Topic::new("t")).await.unwrap();

        let received = sub.try_recv().unwrap().unwrap();
        assert_eq!(received.event.id(), "a");
        assert_eq!(received.topic.name(), "t");
    }

    #[tokio::test]
    async fn test_disconnected_send_fails() {
        let bus = InMemoryBusClient::new();
        bus.set_connected(false);

        let result = bus.send(event("a"), &Topic::default()).await;
        assert_eq!(result, Err(BusError::NotConnected));
        assert_eq!(bus.send_failures(), 1);
        assert_eq!(bus.events_sent(), 0);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let bus = InMemoryBusClient::new();
        bus.fail_next_sends(2);

        assert!(bus.send(event("a"), &Topic::default()).await.is_err());
        assert!(bus.send(event("b"), &Topic::default()).await.is_err());
        assert!(bus.send(event("c"), &Topic::default()).await.is_ok());
        assert_eq!(bus.send_failures(), 2);
        assert_eq!(bus.events_sent(), 1);
    }

    #[tokio::test]
    async fn test_liveness_reports_state() {
        let bus = InMemoryBusClient::new();
        let mut alive = bus.enable_liveness_channel(true);

        bus.set_connected(false);
        assert!(bus.send_liveness().await.is_err());
        alive.changed().await.unwrap();
        assert!(!*alive.borrow());

        bus.set_connected(true);
        bus.send_liveness().await.unwrap();
        alive.changed().await.unwrap();
        assert!(*alive.borrow());
    }

    #[tokio::test]
    async fn test_sequential_sends_never_overlap() {
        let bus = InMemoryBusClient::new().with_send_delay(Duration::from_millis(1));
        for i in 0..3 {
            bus.send(event(&i.to_string()), &Topic::default()).await.unwrap();
        }
        assert_eq!(bus.max_concurrent_sends(), 1);
    }

    #[test]
    fn test_default_bus() {
        let bus = InMemoryBusClient::default();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.events_sent(), 0);
    }
}
