//! # Event Proxy
//!
//! Entry point: telemetry, configuration, runtime, Ctrl-C, drain.

use anyhow::{Context, Result};
use tracing::info;

use event_proxy::ProxyConfig;
use proxy_runtime::{ProxyRuntime, RuntimeConfig};
use proxy_telemetry::{init_telemetry, log_event, TelemetryConfig};

/// Load configuration from environment and the optional filter file.
fn load_config() -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::from_env();

    if let Ok(path) = std::env::var("EP_FILTERS_FILE") {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("reading filter file {path}"))?;
        config.proxy = ProxyConfig::with_filters_json(config.proxy, &json)
            .with_context(|| format!("parsing filter file {path}"))?;
        info!(path = %path, filters = config.proxy.filters.len(), "Loaded event filters");
    }

    config.proxy.validate().context("invalid proxy configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("initializing logging")?;

    let config = load_config()?;
    let mut runtime = ProxyRuntime::new(config).context("building event proxy")?;
    runtime.start().context("starting event proxy")?;

    log_event!(info, "runtime", "Event proxy is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    let metrics = runtime.shutdown().await;
    log_event!(
        info,
        "runtime",
        "Exiting",
        delivered = metrics.delivered,
        failures = metrics.delivery_failures
    );
    Ok(())
}
