//! # Event Proxy Runtime
//!
//! Wires the event proxy to an in-memory bus client and keeps it running.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (env, optional filter file)
//! 2. Build the bus client and the proxy, registering configured filters
//! 3. Spawn the publisher loop, the delivery logger and the liveness ticker
//! 4. Publish a startup RPC event
//!
//! ## Shutdown Sequence
//!
//! 1. Signal background tasks
//! 2. Stop the proxy and wait for the queue to drain (with timeout)
//! 3. Log final counters

use std::env;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use event_proxy::{EventProxy, EventProxyApi, MetricsSnapshot, ProxyConfig, ProxyError};
use shared_bus::{InMemoryBusClient, TopicFilter};
use shared_types::{EventCategory, EventSubCategory, OperationStatus, RpcEvent};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

/// Runtime settings on top of [`ProxyConfig`].
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub proxy: ProxyConfig,
    /// Period of bus liveness probes
    pub liveness_interval: Duration,
    /// Upper bound on waiting for the queue to drain at shutdown
    pub drain_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            proxy: ProxyConfig::default(),
            liveness_interval: Duration::from_secs(10),
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl RuntimeConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - see [`ProxyConfig::from_env`]
    /// - `EP_LIVENESS_INTERVAL_SECS`: Liveness probe period (default: 10)
    /// - `EP_DRAIN_TIMEOUT_SECS`: Shutdown drain timeout (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            proxy: ProxyConfig::from_env(),
            liveness_interval: secs_from_env("EP_LIVENESS_INTERVAL_SECS")
                .unwrap_or(defaults.liveness_interval),
            drain_timeout: secs_from_env("EP_DRAIN_TIMEOUT_SECS")
                .unwrap_or(defaults.drain_timeout),
        }
    }
}

fn secs_from_env(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Nanoseconds since the Unix epoch, saturating.
#[must_use]
pub fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// The running proxy and its background tasks.
pub struct ProxyRuntime {
    bus: Arc<InMemoryBusClient>,
    proxy: Arc<EventProxy<InMemoryBusClient>>,
    config: RuntimeConfig,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    publisher: Option<JoinHandle<Result<(), ProxyError>>>,
}

impl ProxyRuntime {
    /// Build the bus client and proxy.
    pub fn new(config: RuntimeConfig) -> Result<Self, ProxyError> {
        info!(topic = %config.proxy.topic, namespace = %config.proxy.namespace, "Creating event proxy runtime");

        let bus = Arc::new(InMemoryBusClient::new());
        let proxy = Arc::new(EventProxy::with_config(
            Arc::clone(&bus),
            config.proxy.clone(),
        )?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            bus,
            proxy,
            config,
            shutdown_tx,
            shutdown_rx,
            publisher: None,
        })
    }

    #[must_use]
    pub fn proxy(&self) -> Arc<EventProxy<InMemoryBusClient>> {
        Arc::clone(&self.proxy)
    }

    #[must_use]
    pub fn bus(&self) -> Arc<InMemoryBusClient> {
        Arc::clone(&self.bus)
    }

    /// Spawn background tasks and announce the start on the bus.
    pub fn start(&mut self) -> Result<(), ProxyError> {
        if self.publisher.is_some() {
            return Err(ProxyError::AlreadyStarted);
        }

        let proxy = Arc::clone(&self.proxy);
        self.publisher = Some(tokio::spawn(async move { proxy.start().await }));

        self.spawn_delivery_logger();
        self.spawn_liveness_ticker();

        let announce = RpcEvent {
            rpc: "start".to_string(),
            service: "event-proxy".to_string(),
            status: OperationStatus::default(),
            description: "Event proxy runtime started".to_string(),
            ..Default::default()
        };
        self.proxy.send_rpc_event(
            "EVENT_PROXY_START_EVENT",
            Some(announce),
            EventCategory::Communication,
            Some(EventSubCategory::None),
            now_nanos(),
        )?;

        info!("Event proxy runtime started");
        Ok(())
    }

    fn spawn_delivery_logger(&self) {
        let mut stream = self.bus.stream(TopicFilter::all());
        let mut shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    message = stream.next() => match message {
                        Some(message) => {
                            let header = message.event.header();
                            debug!(
                                topic = %message.topic,
                                id = %header.id,
                                event_type = %header.event_type,
                                category = %header.category,
                                "Event on bus"
                            );
                        }
                        None => break,
                    },
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    fn spawn_liveness_ticker(&self) {
        let proxy = Arc::clone(&self.proxy);
        let mut alive = proxy.enable_liveness_channel(true);
        let mut shutdown = self.shutdown_rx.clone();
        let period = self.config.liveness_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = proxy.send_liveness().await {
                            warn!(error = %e, "Bus liveness probe failed");
                        }
                    }
                    changed = alive.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let up = *alive.borrow();
                        info!(alive = up, "Bus liveness changed");
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });
    }

    /// Stop the proxy, wait for the queue to drain and return the final
    /// counters.
    pub async fn shutdown(&mut self) -> MetricsSnapshot {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.proxy.stop() {
            warn!(error = %e, "Stop request refused");
        }

        if tokio::time::timeout(self.config.drain_timeout, self.proxy.stopped())
            .await
            .is_err()
        {
            let snapshot = self.proxy.snapshot();
            warn!(pending = snapshot.pending, "Queue did not drain before timeout");
        }

        if let Some(mut publisher) = self.publisher.take() {
            match tokio::time::timeout(Duration::from_secs(1), &mut publisher).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => error!(error = %e, "Publisher loop failed"),
                Ok(Err(e)) => error!(error = %e, "Publisher task panicked"),
                Err(_) => {
                    warn!("Publisher loop still running, aborting");
                    publisher.abort();
                }
            }
        }

        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }

        let metrics = self.proxy.metrics();
        info!(
            enqueued = metrics.enqueued,
            delivered = metrics.delivered,
            delivery_failures = metrics.delivery_failures,
            rejected = metrics.rejected,
            "Shutdown complete"
        );
        metrics
    }
}
