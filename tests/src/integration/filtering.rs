//! # Filtering Scenarios
//!
//! The filter engine applied to device events built from the ONU alarm
//! catalog, and to KPI/config events, through the proxy API.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use event_proxy::catalog::{self, ANI_G_CLASS_ID, CIRCUIT_PACK_CLASS_ID, ONU_G_CLASS_ID};
    use event_proxy::{EventProxy, EventProxyApi, HeaderBuilder, ProxyConfig};
    use shared_bus::{InMemoryBusClient, Topic, TopicFilter};
    use shared_types::{
        ConfigEvent, ConfigEventType, DeviceEvent, Event, EventCategory, EventFilter,
        EventFilterRuleKey, EventPayload, EventSubCategory, EventType, KpiEvent, KpiEventType,
    };
    use tokio::time::timeout;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn device_event(class_id: u16, alarm_no: u8, raised: bool) -> Event {
        let descriptor = catalog::lookup(class_id, alarm_no).unwrap();
        let payload = descriptor.to_device_event("onu-1", raised, HashMap::new());
        let header = HeaderBuilder::default()
            .build(
                &payload.device_event_name,
                descriptor.category,
                Some(descriptor.sub_category),
                EventType::Device,
                0,
            )
            .unwrap();
        Event::new(header, EventPayload::Device(payload)).unwrap()
    }

    fn kpi_event(kpi_type: KpiEventType) -> Event {
        let header = HeaderBuilder::default()
            .build("PON_PORT_KPI_EVENT", EventCategory::Equipment, Some(EventSubCategory::Pon), EventType::Kpi, 0)
            .unwrap();
        let payload = KpiEvent {
            kpi_type,
            ..Default::default()
        };
        Event::new(header, EventPayload::Kpi(payload)).unwrap()
    }

    fn config_event(config_type: ConfigEventType) -> Event {
        let header = HeaderBuilder::default()
            .build("FLOW_CONFIG_EVENT", EventCategory::Service, None, EventType::Config, 0)
            .unwrap();
        let payload = ConfigEvent {
            config_type,
            id: "flow-1".to_string(),
            data: "{}".to_string(),
        };
        Event::new(header, EventPayload::Config(payload)).unwrap()
    }

    fn proxy() -> EventProxy<InMemoryBusClient> {
        EventProxy::new(Arc::new(InMemoryBusClient::new()), Topic::default())
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    /// Device filter `category=equipment`: an environment alarm is
    /// excluded, an equipment alarm with matching sub-category passes.
    #[test]
    fn test_device_filter_by_category() {
        let proxy = proxy();
        proxy.add_filter(
            EventFilter::new("device_event", true)
                .with_device_id("olt-1")
                .with_rule(EventFilterRuleKey::Category, "equipment")
                .with_rule(EventFilterRuleKey::SubCategory, "onu"),
        );

        let temperature = device_event(CIRCUIT_PACK_CLASS_ID, 4, true);
        assert_eq!(temperature.header().category, EventCategory::Environment);
        assert!(proxy.filter_event(&temperature));

        let dying_gasp = device_event(ONU_G_CLASS_ID, 7, true);
        assert!(!proxy.filter_event(&dying_gasp));

        let metrics = proxy.metrics();
        assert_eq!(metrics.excluded, 1);
        assert_eq!(metrics.allowed, 1);
    }

    #[test]
    fn test_device_event_type_matches_raise_and_clear() {
        let proxy = proxy();
        proxy.add_filter(
            EventFilter::new("device_event", true)
                .with_rule(EventFilterRuleKey::DeviceEventType, "ONU_LOW_RX_OPTICAL"),
        );

        assert!(!proxy.filter_event(&device_event(ANI_G_CLASS_ID, 0, true)));
        assert!(!proxy.filter_event(&device_event(ANI_G_CLASS_ID, 0, false)));
        assert!(proxy.filter_event(&device_event(ANI_G_CLASS_ID, 1, true)));
    }

    #[test]
    fn test_default_deny_without_filters() {
        let proxy = proxy();
        assert!(proxy.filter_event(&device_event(ONU_G_CLASS_ID, 7, true)));
        assert!(proxy.filter_event(&kpi_event(KpiEventType::Slice)));
        assert!(proxy.filter_event(&config_event(ConfigEventType::Add)));
    }

    #[test]
    fn test_disabled_and_filter_all_allow() {
        let proxy = proxy();
        proxy.add_filter(
            EventFilter::new("kpi_event", false).with_rule(EventFilterRuleKey::KpiEventType, "ts"),
        );
        assert!(!proxy.filter_event(&kpi_event(KpiEventType::Slice)));

        proxy.add_filter(
            EventFilter::new("all", true)
                .with_rule(EventFilterRuleKey::FilterAll, "true")
                .with_rule(EventFilterRuleKey::Category, "security"),
        );
        assert!(!proxy.filter_event(&device_event(CIRCUIT_PACK_CLASS_ID, 5, true)));
        assert!(!proxy.filter_event(&config_event(ConfigEventType::Remove)));
    }

    #[test]
    fn test_replacing_filter_changes_decision() {
        let proxy = proxy();
        proxy.add_filter(
            EventFilter::new("config_event", true)
                .with_rule(EventFilterRuleKey::ConfigEventType, "add"),
        );
        assert!(!proxy.filter_event(&config_event(ConfigEventType::Add)));
        assert!(proxy.filter_event(&config_event(ConfigEventType::Update)));

        proxy.add_filter(
            EventFilter::new("config_event", true)
                .with_rule(EventFilterRuleKey::ConfigEventType, "update"),
        );
        assert!(proxy.filter_event(&config_event(ConfigEventType::Add)));
        assert!(!proxy.filter_event(&config_event(ConfigEventType::Update)));
    }

    /// Filters loaded from JSON configuration gate what a producer publishes.
    #[tokio::test]
    async fn test_configured_filter_gates_publishing() {
        let config = ProxyConfig::default()
            .with_filters_json(
                r#"[{"device_id": "olt-1", "event_type": "device_event", "enable": true,
                     "rules": [{"key": "category", "value": "equipment"}]}]"#,
            )
            .unwrap();
        let bus = Arc::new(InMemoryBusClient::new());
        let mut sub = bus.subscribe(TopicFilter::all());
        let proxy = Arc::new(EventProxy::with_config(Arc::clone(&bus), config).unwrap());
        let runner = {
            let proxy = Arc::clone(&proxy);
            tokio::spawn(async move { proxy.start().await })
        };

        for (class_id, alarm_no) in [(CIRCUIT_PACK_CLASS_ID, 5), (ONU_G_CLASS_ID, 7), (ONU_G_CLASS_ID, 10)] {
            let event = device_event(class_id, alarm_no, true);
            if proxy.filter_event(&event) {
                continue;
            }
            let descriptor = catalog::lookup(class_id, alarm_no).unwrap();
            let payload: DeviceEvent = match event.payload() {
                EventPayload::Device(device) => device.clone(),
                _ => unreachable!(),
            };
            proxy
                .send_device_event(Some(payload), descriptor.category, descriptor.sub_category, 0)
                .unwrap();
        }

        proxy.stop().unwrap();
        timeout(Duration::from_secs(5), proxy.stopped())
            .await
            .expect("proxy did not stop");
        runner.await.unwrap().unwrap();

        let message = sub.try_recv().unwrap().expect("dying gasp published");
        assert!(message.event.id().starts_with("Voltha.openolt.ONU_DYING_GASP."));
        assert!(sub.try_recv().unwrap().is_none());
        assert_eq!(bus.events_sent(), 1);
    }
}
