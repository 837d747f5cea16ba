//! Bridge configuration.
//!
//! Values come from built-in defaults, an optional TOML file and finally
//! environment variables, in that order of precedence (lowest first).
//!
//! ```toml
//! backend = "mqtt"
//! units = "metric"
//! timezone = "Europe/Berlin"
//!
//! [mqtt]
//! host = "broker.lan"
//! username = "bridge"
//! password = "secret"
//!
//! [device]
//! id = "weather_station"
//! name = "Weather Station"
//!
//! [forward]
//! enabled = true
//! station_id = "KBERLIN123"
//! station_key = "abcdef"
//! ```

use std::path::Path;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Environment variable names.
pub mod env_vars {
    pub const BRIDGE_HOST: &str = "BRIDGE_HOST";
    pub const BRIDGE_PORT: &str = "BRIDGE_PORT";
    pub const BRIDGE_BACKEND: &str = "BRIDGE_BACKEND";
    pub const UNITS: &str = "UNITS";
    pub const TIMEZONE: &str = "TIMEZONE";
    pub const MQTT_HOST: &str = "MQTT_HOST";
    pub const MQTT_PORT: &str = "MQTT_PORT";
    pub const MQTT_USER: &str = "MQTT_USER";
    pub const MQTT_PASSWORD: &str = "MQTT_PASSWORD";
    pub const MQTT_PREFIX: &str = "MQTT_PREFIX";
    pub const DEVICE_ID: &str = "DEVICE_ID";
    pub const DEVICE_NAME: &str = "DEVICE_NAME";
    pub const DEVICE_MANUFACTURER: &str = "DEVICE_MANUFACTURER";
    pub const DEVICE_MODEL: &str = "DEVICE_MODEL";
    pub const HASS_URL: &str = "HASS_URL";
    pub const HASS_TOKEN: &str = "HASS_TOKEN";
    pub const HASS_ENTITY_PREFIX: &str = "HASS_ENTITY_PREFIX";
    pub const WU_FORWARD: &str = "WU_FORWARD";
    pub const WU_USERNAME: &str = "WU_USERNAME";
    pub const WU_PASSWORD: &str = "WU_PASSWORD";
}

/// Default values.
pub mod defaults {
    pub const HOST: &str = "0.0.0.0";
    /// Station firmware only talks plain HTTP on port 80.
    pub const PORT: u16 = 80;
    pub const TIMEZONE: &str = "Europe/Berlin";
    pub const MQTT_HOST: &str = "localhost";
    pub const MQTT_PORT: u16 = 1883;
    pub const DISCOVERY_PREFIX: &str = "homeassistant";
    pub const KEEP_ALIVE_SECS: u64 = 60;
    pub const RECONNECT_INTERVAL_MS: u64 = 5000;
    pub const DEVICE_ID: &str = "weather_station";
    pub const DEVICE_NAME: &str = "Weather Station";
    pub const DEVICE_MANUFACTURER: &str = "VEVOR";
    pub const DEVICE_MODEL: &str = "7-in-1 Weather Station";
    pub const HASS_URL: &str = "http://homeassistant.local:8123/api/states/";
    pub const HASS_ENTITY_PREFIX: &str = "sensor.weather_station_";
    pub const HASS_TIMEOUT_SECS: u64 = 2;
    pub const WU_HOST: &str = "rtupdate.wunderground.com";
    pub const WU_NAMESERVERS: [&str; 2] = ["8.8.8.8", "8.8.4.4"];
    pub const WU_TIMEOUT_SECS: u64 = 5;
}

/// Unit system of published values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    /// Values are rounded but not converted.
    Imperial,
}

impl FromStr for UnitSystem {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(()),
        }
    }
}

/// Publisher backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// MQTT with Home Assistant auto-discovery.
    #[default]
    Mqtt,
    /// Home Assistant REST state API.
    Hass,
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mqtt" => Ok(Backend::Mqtt),
            "hass" | "homeassistant" | "rest" => Ok(Backend::Hass),
            _ => Err(()),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// MQTT broker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Topic prefix Home Assistant watches for discovery.
    pub discovery_prefix: String,
    /// Defaults to a random `wxbridge_<uuid>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub keep_alive_secs: u64,
    /// Pause after a broker error before polling again.
    pub reconnect_interval_ms: u64,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            host: defaults::MQTT_HOST.to_string(),
            port: defaults::MQTT_PORT,
            username: None,
            password: None,
            discovery_prefix: defaults::DISCOVERY_PREFIX.to_string(),
            client_id: None,
            keep_alive_secs: defaults::KEEP_ALIVE_SECS,
            reconnect_interval_ms: defaults::RECONNECT_INTERVAL_MS,
        }
    }
}

impl MqttSettings {
    /// Credentials, when a username is configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let user = self.username.as_deref().filter(|u| !u.is_empty())?;
        Some((user, self.password.as_deref().unwrap_or_default()))
    }
}

/// Static device descriptor shared by all sensors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            id: defaults::DEVICE_ID.to_string(),
            name: defaults::DEVICE_NAME.to_string(),
            manufacturer: defaults::DEVICE_MANUFACTURER.to_string(),
            model: defaults::DEVICE_MODEL.to_string(),
        }
    }
}

/// Home Assistant REST settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HassSettings {
    /// Entity ids are appended verbatim, so this normally ends in `/api/states/`.
    pub base_url: String,
    /// Long-lived access token.
    pub token: String,
    pub entity_prefix: String,
    pub timeout_secs: u64,
}

impl Default for HassSettings {
    fn default() -> Self {
        Self {
            base_url: defaults::HASS_URL.to_string(),
            token: String::new(),
            entity_prefix: defaults::HASS_ENTITY_PREFIX.to_string(),
            timeout_secs: defaults::HASS_TIMEOUT_SECS,
        }
    }
}

/// Weather Underground forwarding settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardSettings {
    pub enabled: bool,
    /// Replaces the `ID` query parameter when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<String>,
    /// Replaces the `PASSWORD` query parameter when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_key: Option<String>,
    pub host: String,
    /// Resolvers used instead of the system resolver.
    pub nameservers: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ForwardSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            station_id: None,
            station_key: None,
            host: defaults::WU_HOST.to_string(),
            nameservers: defaults::WU_NAMESERVERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout_secs: defaults::WU_TIMEOUT_SECS,
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub server: ServerConfig,
    pub backend: Backend,
    pub units: UnitSystem,
    /// IANA zone name used for `measured_on`.
    pub timezone: String,
    pub mqtt: MqttSettings,
    pub device: DeviceInfo,
    pub hass: HassSettings,
    pub forward: ForwardSettings,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            backend: Backend::default(),
            units: UnitSystem::default(),
            timezone: defaults::TIMEZONE.to_string(),
            mqtt: MqttSettings::default(),
            device: DeviceInfo::default(),
            hass: HassSettings::default(),
            forward: ForwardSettings::default(),
        }
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

impl BridgeConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay the process environment.
    pub fn apply_env(self) -> ConfigResult<Self> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlay variables provided by `lookup`.
    pub fn apply_env_with<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        use env_vars::*;

        if let Some(v) = lookup(BRIDGE_HOST) {
            self.server.host = v;
        }
        if let Some(v) = lookup(BRIDGE_PORT) {
            self.server.port = v.trim().parse().map_err(|_| invalid(BRIDGE_PORT, &v))?;
        }
        if let Some(v) = lookup(BRIDGE_BACKEND) {
            self.backend = v.parse().map_err(|_| invalid(BRIDGE_BACKEND, &v))?;
        }
        if let Some(v) = lookup(UNITS) {
            self.units = v.parse().map_err(|_| invalid(UNITS, &v))?;
        }
        if let Some(v) = lookup(TIMEZONE) {
            self.timezone = v;
        }

        if let Some(v) = lookup(MQTT_HOST) {
            self.mqtt.host = v;
        }
        if let Some(v) = lookup(MQTT_PORT) {
            self.mqtt.port = v.trim().parse().map_err(|_| invalid(MQTT_PORT, &v))?;
        }
        if let Some(v) = lookup(MQTT_USER) {
            self.mqtt.username = non_empty(v);
        }
        if let Some(v) = lookup(MQTT_PASSWORD) {
            self.mqtt.password = non_empty(v);
        }
        if let Some(v) = lookup(MQTT_PREFIX) {
            self.mqtt.discovery_prefix = v;
        }

        if let Some(v) = lookup(DEVICE_ID) {
            self.device.id = v;
        }
        if let Some(v) = lookup(DEVICE_NAME) {
            self.device.name = v;
        }
        if let Some(v) = lookup(DEVICE_MANUFACTURER) {
            self.device.manufacturer = v;
        }
        if let Some(v) = lookup(DEVICE_MODEL) {
            self.device.model = v;
        }

        if let Some(v) = lookup(HASS_URL) {
            self.hass.base_url = v;
        }
        if let Some(v) = lookup(HASS_TOKEN) {
            self.hass.token = v;
        }
        if let Some(v) = lookup(HASS_ENTITY_PREFIX) {
            self.hass.entity_prefix = v;
        }

        if let Some(v) = lookup(WU_FORWARD) {
            self.forward.enabled = parse_bool(WU_FORWARD, &v)?;
        }
        if let Some(v) = lookup(WU_USERNAME) {
            self.forward.station_id = non_empty(v);
        }
        if let Some(v) = lookup(WU_PASSWORD) {
            self.forward.station_key = non_empty(v);
        }

        Ok(self)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> ConfigResult<()> {
        self.time_zone()?;
        if self.server.port == 0 {
            return Err(invalid("server.port", "0"));
        }
        if self.device.id.trim().is_empty() {
            return Err(ConfigError::Missing("device.id"));
        }
        match self.backend {
            Backend::Mqtt => {
                if self.mqtt.host.trim().is_empty() {
                    return Err(ConfigError::Missing("mqtt.host"));
                }
            }
            Backend::Hass => {
                if self.hass.base_url.trim().is_empty() {
                    return Err(ConfigError::Missing("hass.base_url"));
                }
            }
        }
        if self.forward.enabled && self.forward.nameservers.is_empty() {
            return Err(ConfigError::Missing("forward.nameservers"));
        }
        Ok(())
    }

    /// The configured zone.
    pub fn time_zone(&self) -> ConfigResult<Tz> {
        self.timezone
            .parse()
            .map_err(|_| ConfigError::UnknownTimeZone(self.timezone.clone()))
    }

    /// Copy with secrets replaced, for printing.
    pub fn redacted(&self) -> Self {
        const MASK: &str = "********";
        let mut out = self.clone();
        if out.mqtt.password.is_some() {
            out.mqtt.password = Some(MASK.to_string());
        }
        if !out.hass.token.is_empty() {
            out.hass.token = MASK.to_string();
        }
        if out.forward.station_key.is_some() {
            out.forward.station_key = Some(MASK.to_string());
        }
        out
    }
}
