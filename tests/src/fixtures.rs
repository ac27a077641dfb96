//! Shared test fixtures.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use async_trait::async_trait;
use event_proxy::EventProxy;
use parking_lot::Mutex;
use shared_bus::{BusClient, BusError, Topic};
use shared_types::{Event, EventPayload};
use tokio::sync::watch;

type CurrentProbe = Box<dyn Fn() -> Option<String> + Send + Sync>;

/// One `send` seen by [`ObservingBus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// RPC `operation_id`, or the event id for other payloads
    pub label: String,
    pub event_id: String,
    /// Queue's current event id at the moment of the send
    pub current: Option<String>,
}

/// Bus client that records every send together with the proxy's view of
/// the current event, and tracks overlapping sends.
pub struct ObservingBus {
    deliveries: Mutex<Vec<Delivery>>,
    probe: OnceLock<CurrentProbe>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    liveness: watch::Sender<bool>,
}

impl ObservingBus {
    pub fn new() -> Self {
        let (liveness, _) = watch::channel(true);
        Self {
            deliveries: Mutex::new(Vec::new()),
            probe: OnceLock::new(),
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            liveness,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Let the bus query `proxy` for its current event on every send.
    pub fn observe(&self, proxy: &Arc<EventProxy<ObservingBus>>) {
        let weak: Weak<EventProxy<ObservingBus>> = Arc::downgrade(proxy);
        let _ = self.probe.set(Box::new(move || {
            weak.upgrade().and_then(|p| p.snapshot().current)
        }));
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.deliveries.lock().iter().map(|d| d.label.clone()).collect()
    }

    pub fn max_concurrent_sends(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for ObservingBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusClient for ObservingBus {
    async fn send(&self, event: Arc<Event>, _topic: &Topic) -> Result<(), BusError> {
        let overlapping = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(overlapping, Ordering::SeqCst);

        let current = self.probe.get().and_then(|probe| probe());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let label = match event.payload() {
            EventPayload::Rpc(rpc) => rpc.operation_id.clone(),
            _ => event.id().to_string(),
        };
        self.deliveries.lock().push(Delivery {
            label,
            event_id: event.id().to_string(),
            current,
        });

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    fn enable_liveness_channel(&self, _enable: bool) -> watch::Receiver<bool> {
        self.liveness.subscribe()
    }

    async fn send_liveness(&self) -> Result<(), BusError> {
        Ok(())
    }
}

/// RPC payload labelled with `operation_id`.
pub fn labelled_rpc(label: &str) -> shared_types::RpcEvent {
    shared_types::RpcEvent {
        rpc: "test".to_string(),
        operation_id: label.to_string(),
        ..Default::default()
    }
}
