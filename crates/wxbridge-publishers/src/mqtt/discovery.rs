//! Home Assistant MQTT discovery payloads.
//!
//! Each sensor lives under `<prefix>/sensor/<device>_<slug>/` with three
//! retained topics:
//!
//! ```text
//! homeassistant/sensor/weather_station_temperature/config      discovery descriptor
//! homeassistant/sensor/weather_station_temperature/state       "21.4"
//! homeassistant/sensor/weather_station_temperature/attributes  {"measured_on": "..."}
//! ```

use serde::Serialize;
use wxbridge_core::{DeviceInfo, SensorEntry};

/// Topics of one sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorTopics {
    /// `<device>_<slug>`, also the discovery unique id.
    pub object_id: String,
    pub config: String,
    pub state: String,
    pub attributes: String,
}

impl SensorTopics {
    pub fn new(prefix: &str, device_id: &str, slug: &str) -> Self {
        let object_id = format!("{}_{}", device_id, slug);
        let base = format!("{}/sensor/{}", prefix.trim_end_matches('/'), object_id);
        Self {
            config: format!("{}/config", base),
            state: format!("{}/state", base),
            attributes: format!("{}/attributes", base),
            object_id,
        }
    }
}

/// Device block of a discovery descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryDevice<'a> {
    pub identifiers: [&'a str; 1],
    pub name: &'a str,
    pub manufacturer: &'a str,
    pub model: &'a str,
}

impl<'a> From<&'a DeviceInfo> for DiscoveryDevice<'a> {
    fn from(device: &'a DeviceInfo) -> Self {
        Self {
            identifiers: [device.id.as_str()],
            name: &device.name,
            manufacturer: &device.manufacturer,
            model: &device.model,
        }
    }
}

/// Discovery descriptor published to the `config` topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryConfig<'a> {
    pub name: String,
    pub state_topic: &'a str,
    pub unit_of_measurement: &'a str,
    /// Serialized as `null` when the sensor has no class.
    pub device_class: Option<&'a str>,
    pub unique_id: &'a str,
    pub json_attributes_topic: &'a str,
    pub device: DiscoveryDevice<'a>,
}

impl<'a> DiscoveryConfig<'a> {
    pub fn new(entry: &'a SensorEntry, topics: &'a SensorTopics, device: &'a DeviceInfo) -> Self {
        Self {
            name: format!("{} {}", device.name, entry.name),
            state_topic: &topics.state,
            unit_of_measurement: entry.unit,
            device_class: entry.device_class,
            unique_id: &topics.object_id,
            json_attributes_topic: &topics.attributes,
            device: device.into(),
        }
    }
}

/// Payload of the `attributes` topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorAttributes<'a> {
    pub measured_on: &'a str,
}
