//! # Proxy Telemetry
//!
//! Logging setup for the event proxy runtime.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use proxy_telemetry::{init_telemetry, TelemetryConfig};
//!
//! init_telemetry(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EP_SERVICE_NAME` | `event-proxy` | Service name in logs |
//! | `EP_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `EP_JSON_LOGS` | `false` | JSON output |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Global subscriber already set: {0}")]
    AlreadyInitialized(String),
}

/// Initialize logging from `config`.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    logging::init_logging(config)
}
