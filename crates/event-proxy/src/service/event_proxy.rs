//! Event Proxy Service
//!
//! Orchestrates header construction, the ordering queue, the publisher loop
//! and the filter engine.
//!
//! ## Tasks
//!
//! - **Producers** call `send_*`. Each accepted event spawns a short-lived
//!   waiter that blocks on its predecessor's completion signal and then
//!   hands the event to the loop over a single-slot channel.
//! - **Publisher loop** (`start`) is the only caller of `BusClient::send`.
//! - **Stop coordinator** is spawned by `stop` when events are still queued;
//!   it closes the delivery channel once the loop reports the tail done.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{
    DeviceEvent, Event, EventCategory, EventFilter, EventPayload, EventSubCategory, EventType,
    KpiEvent, RpcEvent,
};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch, Notify};
use tracing::{debug, error, info, warn};

use crate::config::ProxyConfig;
use crate::domain::{
    EventQueue, FilterDecision, FilterTable, HeaderBuilder, ProxyState, QueueSnapshot,
    StopRequest, Ticket,
};
use crate::error::ProxyError;
use crate::metrics::{MetricsSnapshot, ProxyMetrics};
use crate::ports::{BusClient, BusError, Clock, EventProxyApi, SystemClock, Topic};

/// An event released to the publisher loop.
struct Handoff {
    seq: u64,
    event: Arc<Event>,
}

/// Queue view plus lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySnapshot {
    pub state: ProxyState,
    pub pending: usize,
    pub current: Option<String>,
    pub last: Option<String>,
    pub processed: u64,
}

impl ProxySnapshot {
    fn new(state: ProxyState, queue: QueueSnapshot) -> Self {
        Self {
            state,
            pending: queue.pending,
            current: queue.current,
            last: queue.last,
            processed: queue.processed,
        }
    }
}

/// Publishes events on a bus in submission order.
pub struct EventProxy<B: BusClient> {
    bus: Arc<B>,
    topic: Topic,
    headers: HeaderBuilder,
    queue: Arc<EventQueue>,
    filters: RwLock<FilterTable>,
    /// Dropping the proxy's sender closes the channel once every waiter
    /// has handed off.
    delivery_tx: Arc<Mutex<Option<mpsc::Sender<Handoff>>>>,
    /// Taken by the publisher loop.
    delivery_rx: Mutex<Option<mpsc::Receiver<Handoff>>>,
    shutdown: Arc<Notify>,
    state: watch::Sender<ProxyState>,
    metrics: Arc<ProxyMetrics>,
}

impl<B: BusClient + 'static> EventProxy<B> {
    /// Create a proxy publishing on `topic` with the default namespace.
    pub fn new(bus: Arc<B>, topic: Topic) -> Self {
        Self::build(bus, topic, HeaderBuilder::default())
    }

    /// Create a proxy from configuration, registering its filters.
    pub fn with_config(bus: Arc<B>, config: ProxyConfig) -> Result<Self, ProxyError> {
        Self::with_clock(bus, config, Arc::new(SystemClock))
    }

    /// Like [`EventProxy::with_config`] with an explicit clock for reported
    /// timestamps.
    pub fn with_clock(
        bus: Arc<B>,
        config: ProxyConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ProxyError> {
        config.validate()?;
        let headers = HeaderBuilder::with_clock(config.namespace, clock);
        let proxy = Self::build(bus, Topic::new(config.topic), headers);
        for filter in config.filters {
            proxy.add_filter(filter);
        }
        Ok(proxy)
    }

    fn build(bus: Arc<B>, topic: Topic, headers: HeaderBuilder) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let (state, _) = watch::channel(ProxyState::Created);
        Self {
            bus,
            topic,
            headers,
            queue: Arc::new(EventQueue::new()),
            filters: RwLock::new(FilterTable::new()),
            delivery_tx: Arc::new(Mutex::new(Some(tx))),
            delivery_rx: Mutex::new(Some(rx)),
            shutdown: Arc::new(Notify::new()),
            state,
            metrics: Arc::new(ProxyMetrics::new()),
        }
    }

    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    #[must_use]
    pub fn state(&self) -> ProxyState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ProxyState> {
        self.state.subscribe()
    }

    /// Resolves once the proxy reached [`ProxyState::Stopped`].
    pub async fn stopped(&self) {
        let mut state = self.state.subscribe();
        // The sender lives as long as `self`
        let _ = state.wait_for(|s| *s == ProxyState::Stopped).await;
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    #[must_use]
    pub fn snapshot(&self) -> ProxySnapshot {
        ProxySnapshot::new(self.state(), self.queue.snapshot())
    }

    /// Turn liveness reporting on the bus client on or off.
    pub fn enable_liveness_channel(&self, enable: bool) -> watch::Receiver<bool> {
        self.bus.enable_liveness_channel(enable)
    }

    /// Probe the bus and report on the liveness channel.
    pub async fn send_liveness(&self) -> Result<(), BusError> {
        self.bus.send_liveness().await
    }

    fn submit(
        &self,
        name: &str,
        category: EventCategory,
        sub_category: Option<EventSubCategory>,
        payload: EventPayload,
        raised_ts: i64,
    ) -> Result<(), ProxyError> {
        let event_type = payload.event_type();
        let result = self
            .headers
            .build(name, category, sub_category, event_type, raised_ts)
            .map_err(ProxyError::from)
            .and_then(|header| Event::new(header, payload).map_err(ProxyError::from))
            .and_then(|event| self.enqueue(event));

        if let Err(e) = &result {
            self.metrics.record_rejected();
            warn!(event_name = name, event_type = %event_type, error = %e, "Event rejected");
        }
        result
    }

    fn reject_missing(&self, kind: EventType) -> ProxyError {
        self.metrics.record_rejected();
        warn!(event_type = %kind, "Event rejected: missing payload");
        ProxyError::MissingPayload { kind }
    }

    fn enqueue(&self, event: Event) -> Result<(), ProxyError> {
        let handle = Handle::try_current().map_err(|_| ProxyError::NoRuntime)?;
        let tx = self.delivery_tx.lock().clone().ok_or(ProxyError::Stopped)?;

        let event = Arc::new(event);
        let ticket = self.queue.link(Arc::clone(&event))?;
        self.metrics.record_enqueued();
        debug!(id = %event.id(), seq = ticket.seq, "Event enqueued");

        handle.spawn(wait_turn(
            ticket,
            Arc::clone(&self.queue),
            tx,
            Arc::clone(&self.shutdown),
            Arc::clone(&self.metrics),
        ));
        Ok(())
    }

    async fn deliver(&self, handoff: Handoff) {
        let Handoff { seq, event } = handoff;
        let id = event.id().to_string();

        match self.bus.send(event, &self.topic).await {
            Ok(()) => {
                self.metrics.record_delivery(true);
                debug!(id = %id, seq, "Event delivered");
            }
            Err(e) => {
                self.metrics.record_delivery(false);
                error!(id = %id, seq, topic = %self.topic, error = %e, "Failed to send event to bus");
            }
        }

        if self.queue.complete(seq) {
            debug!(seq, "Last queued event processed");
            self.shutdown.notify_one();
        }
    }

    fn begin_stopping(&self) {
        self.state.send_if_modified(|s| match s {
            ProxyState::Created | ProxyState::Running => {
                *s = ProxyState::Stopping;
                true
            }
            _ => false,
        });
    }

    fn close_delivery(&self) {
        self.begin_stopping();
        self.delivery_tx.lock().take();
        // Loop never started: nobody else will mark the proxy stopped
        if self.delivery_rx.lock().take().is_some() {
            self.state.send_replace(ProxyState::Stopped);
            info!("Event proxy stopped");
        }
    }
}

/// Wait for the predecessor's delivery, then hand the event to the loop.
async fn wait_turn(
    ticket: Ticket,
    queue: Arc<EventQueue>,
    tx: mpsc::Sender<Handoff>,
    shutdown: Arc<Notify>,
    metrics: Arc<ProxyMetrics>,
) {
    let Ticket { seq, waiting_on } = ticket;
    if let Some(predecessor) = waiting_on {
        // A dropped sender also means the predecessor is done
        let _ = predecessor.await;
    }

    let Some(event) = queue.activate(seq) else {
        return;
    };
    debug!(id = %event.id(), seq, "Handing event to publisher loop");

    if tx.send(Handoff { seq, event }).await.is_err() {
        metrics.record_delivery(false);
        warn!(seq, "Publisher loop gone, event dropped");
        if queue.complete(seq) {
            shutdown.notify_one();
        }
    }
}

#[async_trait]
impl<B: BusClient + 'static> EventProxyApi for EventProxy<B> {
    fn send_rpc_event(
        &self,
        id: &str,
        rpc_event: Option<RpcEvent>,
        category: EventCategory,
        sub_category: Option<EventSubCategory>,
        raised_ts: i64,
    ) -> Result<(), ProxyError> {
        let rpc_event = rpc_event.ok_or_else(|| self.reject_missing(EventType::Rpc))?;
        self.submit(
            id,
            category,
            sub_category,
            EventPayload::Rpc(rpc_event),
            raised_ts,
        )
    }

    fn send_device_event(
        &self,
        device_event: Option<DeviceEvent>,
        category: EventCategory,
        sub_category: EventSubCategory,
        raised_ts: i64,
    ) -> Result<(), ProxyError> {
        let device_event = device_event.ok_or_else(|| self.reject_missing(EventType::Device))?;
        let name = device_event.device_event_name.clone();
        self.submit(
            &name,
            category,
            Some(sub_category),
            EventPayload::Device(device_event),
            raised_ts,
        )
    }

    fn send_kpi_event(
        &self,
        id: &str,
        kpi_event: Option<KpiEvent>,
        category: EventCategory,
        sub_category: EventSubCategory,
        raised_ts: i64,
    ) -> Result<(), ProxyError> {
        let kpi_event = kpi_event.ok_or_else(|| self.reject_missing(EventType::Kpi))?;
        self.submit(
            id,
            category,
            Some(sub_category),
            EventPayload::Kpi(kpi_event),
            raised_ts,
        )
    }

    async fn start(&self) -> Result<(), ProxyError> {
        let mut rx = {
            let mut slot = self.delivery_rx.lock();
            if self.state() == ProxyState::Stopped {
                warn!("Start requested on a stopped proxy");
                return Err(ProxyError::Stopped);
            }
            slot.take().ok_or_else(|| {
                warn!("Publisher loop already running");
                ProxyError::AlreadyStarted
            })?
        };

        self.state.send_if_modified(|s| {
            if *s == ProxyState::Created {
                *s = ProxyState::Running;
                true
            } else {
                false
            }
        });
        info!(topic = %self.topic, "Event proxy publisher loop started");

        while let Some(handoff) = rx.recv().await {
            self.deliver(handoff).await;
        }

        self.state.send_replace(ProxyState::Stopped);
        info!(
            processed = self.queue.snapshot().processed,
            "Event proxy stopped"
        );
        Ok(())
    }

    fn stop(&self) -> Result<(), ProxyError> {
        let handle = Handle::try_current().map_err(|_| ProxyError::NoRuntime)?;

        match self.queue.request_stop() {
            StopRequest::AlreadyRequested => {
                warn!("Stop already requested");
                Err(ProxyError::AlreadyStopping)
            }
            StopRequest::Drained => {
                info!("Stop requested, queue drained");
                self.close_delivery();
                Ok(())
            }
            StopRequest::Pending(pending) => {
                self.begin_stopping();
                info!(pending, "Stop requested, draining queued events");

                let tx = Arc::clone(&self.delivery_tx);
                let shutdown = Arc::clone(&self.shutdown);
                handle.spawn(async move {
                    shutdown.notified().await;
                    tx.lock().take();
                    debug!("Delivery channel closed");
                });
                Ok(())
            }
        }
    }

    fn add_filter(&self, filter: EventFilter) {
        let key = filter.event_type.clone();
        let replaced = self.filters.write().add(filter).is_some();
        info!(key = %key, replaced, "Event filter registered");
    }

    fn remove_filter(&self, key: &str) -> Option<EventFilter> {
        let removed = self.filters.write().remove(key);
        info!(key, found = removed.is_some(), "Event filter removed");
        removed
    }

    fn filter_event(&self, event: &Event) -> bool {
        let decision = self.filters.read().decide(event);
        let excluded = decision.is_excluded();
        self.metrics.record_filter(excluded);

        match &decision {
            FilterDecision::NoTypeKey => {
                debug!(id = %event.id(), event_type = %event.event_type(), "No filter key for event type");
            }
            other => {
                debug!(id = %event.id(), excluded, decision = ?other, "Event filter decision");
            }
        }
        excluded
    }
}
