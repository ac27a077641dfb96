//! # Core Event Entities
//!
//! Classification enums and the typed payloads carried by an [`crate::Event`].
//!
//! ## Clusters
//!
//! - **Classification**: `EventCategory`, `EventSubCategory`, `EventType`
//! - **Payloads**: `RpcEvent`, `DeviceEvent`, `KpiEvent`, `ConfigEvent`

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// CLUSTER A: CLASSIFICATION
// =============================================================================

/// Broad category of the condition an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    Communication,
    Environment,
    Equipment,
    Service,
    Processing,
    Security,
}

impl EventCategory {
    /// Wire name of the category.
    #[must_use]
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Communication => "COMMUNICATION",
            Self::Environment => "ENVIRONMENT",
            Self::Equipment => "EQUIPMENT",
            Self::Service => "SERVICE",
            Self::Processing => "PROCESSING",
            Self::Security => "SECURITY",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str_name())
    }
}

/// Network element the event originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventSubCategory {
    Pon,
    Olt,
    Ont,
    Onu,
    Nni,
    #[default]
    None,
}

impl EventSubCategory {
    /// Wire name of the sub-category.
    #[must_use]
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Pon => "PON",
            Self::Olt => "OLT",
            Self::Ont => "ONT",
            Self::Onu => "ONU",
            Self::Nni => "NNI",
            Self::None => "NONE",
        }
    }
}

impl fmt::Display for EventSubCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str_name())
    }
}

/// Kind of event, determines which payload variant is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "CONFIG_EVENT")]
    Config,
    #[serde(rename = "KPI_EVENT2")]
    Kpi,
    #[serde(rename = "DEVICE_EVENT")]
    Device,
    #[serde(rename = "RPC_EVENT")]
    Rpc,
}

impl EventType {
    /// Wire name of the event type.
    #[must_use]
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Config => "CONFIG_EVENT",
            Self::Kpi => "KPI_EVENT2",
            Self::Device => "DEVICE_EVENT",
            Self::Rpc => "RPC_EVENT",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str_name())
    }
}

// =============================================================================
// CLUSTER B: PAYLOADS
// =============================================================================

/// Result code of an RPC operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationCode {
    #[default]
    OperationSuccess,
    OperationFailure,
    OperationUnsupported,
    OperationInProgress,
}

/// Outcome of an RPC operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperationStatus {
    pub code: OperationCode,
    pub additional_info: String,
}

/// Outcome of an RPC invoked somewhere in the control plane.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RpcEvent {
    pub rpc: String,
    pub operation_id: String,
    pub resource_id: String,
    pub service: String,
    pub stack_id: String,
    pub status: OperationStatus,
    pub description: String,
    pub context: HashMap<String, String>,
}

/// Alarm or state change raised by a device.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub resource_id: String,
    /// Name such as `ONU_DYING_GASP_RAISE_EVENT`; the two trailing tokens
    /// carry the raise/clear state.
    pub device_event_name: String,
    pub description: String,
    pub context: HashMap<String, String>,
}

/// Shape of a KPI sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiEventType {
    #[default]
    Slice,
    Ts,
}

/// Metadata describing one group of metrics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricMetadata {
    pub title: String,
    pub device_id: String,
    pub logical_device_id: String,
    pub serial_no: String,
    pub context: HashMap<String, String>,
}

/// A group of named metric values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricInformation {
    pub metadata: MetricMetadata,
    pub metrics: HashMap<String, f32>,
}

/// Periodic KPI sample.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KpiEvent {
    pub kpi_type: KpiEventType,
    /// Sample time in fractional seconds since epoch.
    pub ts: f64,
    pub slice_data: Vec<MetricInformation>,
}

/// Kind of configuration change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigEventType {
    #[default]
    Add,
    Remove,
    Update,
}

/// Configuration change notification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfigEvent {
    pub config_type: ConfigEventType,
    pub id: String,
    pub data: String,
}

/// The single payload carried by an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPayload {
    Rpc(RpcEvent),
    Device(DeviceEvent),
    Kpi(KpiEvent),
    Config(ConfigEvent),
}

impl EventPayload {
    /// The event type this payload variant belongs to.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Rpc(_) => EventType::Rpc,
            Self::Device(_) => EventType::Device,
            Self::Kpi(_) => EventType::Kpi,
            Self::Config(_) => EventType::Config,
        }
    }
}
