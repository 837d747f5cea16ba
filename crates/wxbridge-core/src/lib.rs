//! Core types for the weather station bridge.
//!
//! This crate turns a PWS upload (the legacy Weather Underground query-string
//! format) into a [`Reading`]: a fixed table of sensors with converted values,
//! units and Home Assistant device classes, plus a localized timestamp.
//!
//! ## Modules
//!
//! - `convert`: imperial to metric helpers
//! - `sensors`: the static sensor schema and table builder
//! - `timestamp`: UTC to local time rendering
//! - `params`: ordered query parameters
//! - `config`: bridge configuration (TOML + environment)
//!
//! Nothing here performs I/O; publishing lives in `wxbridge-publishers`.

pub mod config;
pub mod convert;
pub mod error;
pub mod params;
pub mod reading;
pub mod sensors;
pub mod timestamp;

pub use config::{
    Backend, BridgeConfig, DeviceInfo, ForwardSettings, HassSettings, MqttSettings, ServerConfig,
    UnitSystem,
};
pub use error::{ConfigError, ConfigResult, ConvertError, TimestampError};
pub use params::StationParams;
pub use reading::{slugify, Reading, SensorEntry, SensorValue};
pub use sensors::{build_attributes, build_reading, Quantity, SensorSpec, SENSORS};

/// Re-exported so downstream crates agree on the zone type.
pub use chrono_tz::Tz;
