//! # Ordering Scenarios
//!
//! Events submitted by concurrent callers reach the bus in submission order,
//! one at a time, and `stop()` drains before the proxy reports stopped.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use event_proxy::{EventProxy, EventProxyApi, ProxyError, ProxyState};
    use proptest::prelude::*;
    use shared_bus::{InMemoryBusClient, Topic, TopicFilter};
    use shared_types::EventCategory;
    use tokio::sync::oneshot;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    use crate::fixtures::{labelled_rpc, ObservingBus};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn observed_proxy(bus: ObservingBus) -> (Arc<ObservingBus>, Arc<EventProxy<ObservingBus>>) {
        let bus = Arc::new(bus);
        let proxy = Arc::new(EventProxy::new(Arc::clone(&bus), Topic::default()));
        bus.observe(&proxy);
        (bus, proxy)
    }

    fn send(proxy: &EventProxy<impl shared_bus::BusClient + 'static>, label: &str) {
        proxy
            .send_rpc_event(
                label,
                Some(labelled_rpc(label)),
                EventCategory::Communication,
                None,
                0,
            )
            .unwrap();
    }

    async fn stop_and_wait<B: shared_bus::BusClient + 'static>(
        proxy: &Arc<EventProxy<B>>,
        runner: tokio::task::JoinHandle<Result<(), ProxyError>>,
    ) {
        proxy.stop().unwrap();
        timeout(Duration::from_secs(5), proxy.stopped())
            .await
            .expect("proxy did not stop");
        runner.await.unwrap().unwrap();
    }

    fn spawn_loop<B: shared_bus::BusClient + 'static>(
        proxy: &Arc<EventProxy<B>>,
    ) -> tokio::task::JoinHandle<Result<(), ProxyError>> {
        let proxy = Arc::clone(proxy);
        tokio::spawn(async move { proxy.start().await })
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    /// dummy-1..3 submitted from three separate tasks arrive in that order,
    /// and the queue's current event is the one being sent each time.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_three_callers_arrive_in_submission_order() {
        let (bus, proxy) = observed_proxy(ObservingBus::new().with_delay(Duration::from_millis(5)));
        let runner = spawn_loop(&proxy);

        let mut previous: Option<oneshot::Receiver<()>> = None;
        let mut callers = Vec::new();
        for label in ["dummy-1", "dummy-2", "dummy-3"] {
            let (submitted_tx, submitted_rx) = oneshot::channel();
            let turn = previous.replace(submitted_rx);
            let proxy = Arc::clone(&proxy);
            callers.push(tokio::spawn(async move {
                if let Some(turn) = turn {
                    turn.await.unwrap();
                }
                send(&proxy, label);
                submitted_tx.send(()).unwrap();
            }));
        }
        for caller in callers {
            caller.await.unwrap();
        }

        stop_and_wait(&proxy, runner).await;

        let deliveries = bus.deliveries();
        let labels: Vec<&str> = deliveries.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["dummy-1", "dummy-2", "dummy-3"]);
        for delivery in &deliveries {
            assert_eq!(delivery.current.as_deref(), Some(delivery.event_id.as_str()));
        }
        assert_eq!(bus.max_concurrent_sends(), 1);
        assert_eq!(proxy.state(), ProxyState::Stopped);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_producers_no_loss_no_duplication() {
        const PRODUCERS: usize = 8;
        const PER_PRODUCER: usize = 25;

        let (bus, proxy) = observed_proxy(ObservingBus::new());
        let runner = spawn_loop(&proxy);

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let proxy = Arc::clone(&proxy);
                tokio::spawn(async move {
                    for i in 0..PER_PRODUCER {
                        send(&proxy, &format!("p{p}-{i}"));
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.await.unwrap();
        }

        stop_and_wait(&proxy, runner).await;

        let labels = bus.labels();
        assert_eq!(labels.len(), PRODUCERS * PER_PRODUCER);

        // Each producer's own events keep their relative order
        let mut next_expected: HashMap<String, usize> = HashMap::new();
        for label in &labels {
            let (producer, index) = label.split_once('-').unwrap();
            let index: usize = index.parse().unwrap();
            let expected = next_expected.entry(producer.to_string()).or_insert(0);
            assert_eq!(index, *expected, "out of order for {producer}");
            *expected += 1;
        }
        assert!(next_expected.values().all(|n| *n == PER_PRODUCER));
        assert_eq!(bus.max_concurrent_sends(), 1);
        assert_eq!(proxy.metrics().delivered, (PRODUCERS * PER_PRODUCER) as u64);
    }

    #[tokio::test]
    async fn test_stop_closes_only_after_pending_events() {
        const PENDING: usize = 6;
        let bus = Arc::new(InMemoryBusClient::new().with_send_delay(Duration::from_millis(10)));
        let mut stream = bus.stream(TopicFilter::all());
        let proxy = Arc::new(EventProxy::new(Arc::clone(&bus), Topic::default()));
        let runner = spawn_loop(&proxy);

        for i in 0..PENDING {
            send(&proxy, &format!("e-{i}"));
        }
        proxy.stop().unwrap();

        let snapshot = proxy.snapshot();
        assert_eq!(snapshot.state, ProxyState::Stopping);
        assert_eq!(snapshot.pending, PENDING);
        assert!(matches!(
            proxy.send_rpc_event("late", Some(labelled_rpc("late")), EventCategory::Communication, None, 0),
            Err(ProxyError::Stopped)
        ));

        timeout(Duration::from_secs(5), proxy.stopped())
            .await
            .expect("proxy did not stop");
        runner.await.unwrap().unwrap();

        let snapshot = proxy.snapshot();
        assert_eq!(snapshot.pending, 0);
        assert_eq!(snapshot.processed, PENDING as u64);
        assert_eq!(bus.events_sent(), PENDING as u64);

        let mut received = Vec::new();
        while received.len() < PENDING {
            match timeout(Duration::from_millis(200), stream.next()).await {
                Ok(Some(message)) => received.push(message.event.id().to_string()),
                _ => break,
            }
        }
        assert_eq!(received.len(), PENDING);
    }

    #[tokio::test]
    async fn test_stop_on_idle_proxy_is_prompt() {
        let (_bus, proxy) = observed_proxy(ObservingBus::new());
        let runner = spawn_loop(&proxy);
        let mut state = proxy.subscribe_state();
        timeout(Duration::from_secs(5), state.wait_for(|s| *s == ProxyState::Running))
            .await
            .expect("loop did not start")
            .unwrap();

        let started = tokio::time::Instant::now();
        stop_and_wait(&proxy, runner).await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_send_order_equals_enqueue_order(count in 1usize..40, delay_us in 0u64..200) {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap();

            let labels = rt.block_on(async move {
                let (bus, proxy) = observed_proxy(
                    ObservingBus::new().with_delay(Duration::from_micros(delay_us)),
                );
                let runner = spawn_loop(&proxy);
                for i in 0..count {
                    send(&proxy, &format!("n-{i}"));
                }
                stop_and_wait(&proxy, runner).await;
                bus.labels()
            });

            let expected: Vec<String> = (0..count).map(|i| format!("n-{i}")).collect();
            prop_assert_eq!(labels, expected);
        }
    }
}
