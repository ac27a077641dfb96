//! ONU device-event catalog.
//!
//! Maps an OMCI alarm, identified by managed-entity class and alarm number,
//! to the device event reported for it.

use std::collections::HashMap;

use shared_types::{DeviceEvent, EventCategory, EventSubCategory};

use crate::error::CatalogError;

pub const CIRCUIT_PACK_CLASS_ID: u16 = 6;
pub const PPTP_ETHERNET_UNI_CLASS_ID: u16 = 11;
pub const ONU_G_CLASS_ID: u16 = 256;
pub const ANI_G_CLASS_ID: u16 = 263;

const RAISE_SUFFIX: &str = "_RAISE_EVENT";
const CLEAR_SUFFIX: &str = "_CLEAR_EVENT";

/// Static description of one ONU alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceEventDescriptor {
    pub name: &'static str,
    pub category: EventCategory,
    pub sub_category: EventSubCategory,
    pub description: &'static str,
}

impl DeviceEventDescriptor {
    const fn onu(name: &'static str, category: EventCategory, description: &'static str) -> Self {
        Self {
            name,
            category,
            sub_category: EventSubCategory::Onu,
            description,
        }
    }

    /// Name with the raise/clear suffix appended.
    #[must_use]
    pub fn event_name(&self, raised: bool) -> String {
        let suffix = if raised { RAISE_SUFFIX } else { CLEAR_SUFFIX };
        format!("{}{}", self.name, suffix)
    }

    /// Device event payload for this alarm on `resource_id`.
    #[must_use]
    pub fn to_device_event(
        &self,
        resource_id: impl Into<String>,
        raised: bool,
        context: HashMap<String, String>,
    ) -> DeviceEvent {
        DeviceEvent {
            resource_id: resource_id.into(),
            device_event_name: self.event_name(raised),
            description: self.description.to_string(),
            context,
        }
    }
}

/// Look up the descriptor for an alarm.
///
/// # Errors
///
/// [`CatalogError::NotFound`] for pairs not in the catalog.
pub fn lookup(class_id: u16, alarm_no: u8) -> Result<DeviceEventDescriptor, CatalogError> {
    use EventCategory::{Communication, Environment, Equipment};
    let onu = DeviceEventDescriptor::onu;

    let descriptor = match (class_id, alarm_no) {
        (CIRCUIT_PACK_CLASS_ID, 0) => onu("ONU_EQUIPMENT", Equipment, "Equipment alarm"),
        (CIRCUIT_PACK_CLASS_ID, 2) => onu("ONU_SELF_TEST_FAIL", Equipment, "Self-test failure"),
        (CIRCUIT_PACK_CLASS_ID, 3) => onu("ONU_LASER_EOL", Equipment, "Laser end of life"),
        (CIRCUIT_PACK_CLASS_ID, 4) => onu("ONU_TEMP_YELLOW", Environment, "Temperature yellow"),
        (CIRCUIT_PACK_CLASS_ID, 5) => onu("ONU_TEMP_RED", Environment, "Temperature red"),

        (PPTP_ETHERNET_UNI_CLASS_ID, 0) => onu("ONU_Ethernet_UNI", Equipment, "LAN Loss Of Signal"),

        (ONU_G_CLASS_ID, 0) => onu("ONU_EQUIPMENT", Equipment, "Equipment alarm"),
        (ONU_G_CLASS_ID, 6) => onu("ONU_SELF_TEST_FAIL", Equipment, "Self-test failure"),
        (ONU_G_CLASS_ID, 7) => onu("ONU_DYING_GASP", Equipment, "Dying gasp"),
        (ONU_G_CLASS_ID, 8) => onu("ONU_TEMP_YELLOW", Environment, "Temperature yellow"),
        (ONU_G_CLASS_ID, 9) => onu("ONU_TEMP_RED", Environment, "Temperature red"),
        (ONU_G_CLASS_ID, 10) => onu("ONU_VOLTAGE_YELLOW", Environment, "Voltage yellow"),
        (ONU_G_CLASS_ID, 11) => onu("ONU_VOLTAGE_RED", Environment, "Voltage red"),

        (ANI_G_CLASS_ID, 0) => onu("ONU_LOW_RX_OPTICAL", Communication, "Low received optical power"),
        (ANI_G_CLASS_ID, 1) => onu("ONU_HIGH_RX_OPTICAL", Communication, "High received optical power"),
        (ANI_G_CLASS_ID, 4) => onu("ONU_LOW_TX_OPTICAL", Communication, "Low transmit optical power"),
        (ANI_G_CLASS_ID, 5) => onu("ONU_HIGH_TX_OPTICAL", Communication, "High transmit optical power"),
        (ANI_G_CLASS_ID, 6) => onu("ONU_LASER_BIAS_CURRENT", Equipment, "Laser bias current"),

        _ => return Err(CatalogError::NotFound { class_id, alarm_no }),
    };
    Ok(descriptor)
}
