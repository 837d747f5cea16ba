//! Sensor schema and attribute table builder.
//!
//! The schema is a static table. Adding a sensor means adding a row to
//! [`SENSORS`]; the builder and both publisher backends pick it up.
//!
//! ```text
//! query param      sensor                 metric    imperial
//! ├─ baromin     ──→ Barometric Pressure   hPa       inHg
//! ├─ tempf       ──→ Temperature           °C        °F
//! ├─ humidity    ──→ Humidity              %         %
//! ├─ dewptf      ──→ Dew Point             °C        °F
//! ├─ rainin      ──→ Rainfall              mm        in
//! ├─ dailyrainin ──→ Daily Rainfall        mm        in
//! ├─ winddir     ──→ Wind Direction        °         °
//! ├─ windspeedmph──→ Wind Speed            km/h      mph
//! ├─ windgustmph ──→ Wind Gust Speed       km/h      mph
//! ├─ UV          ──→ UV Index              index     index
//! └─ solarRadiation → Solar Radiation      W/m²      W/m²
//! ```

use chrono_tz::Tz;

use crate::config::UnitSystem;
use crate::convert;
use crate::error::ConvertError;
use crate::params::{StationParams, DATEUTC};
use crate::reading::{Reading, SensorEntry, SensorValue};
use crate::timestamp;

/// Physical quantity of a sensor, which fixes its units and conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Temperature,
    Pressure,
    Speed,
    /// Rainfall; kept at 2 decimals in the imperial system.
    Precipitation,
    /// Reported text is used as-is.
    PassThrough { unit: &'static str },
}

impl Quantity {
    /// Unit label for the given unit system.
    pub fn unit(self, units: UnitSystem) -> &'static str {
        match (self, units) {
            (Quantity::Temperature, UnitSystem::Metric) => "°C",
            (Quantity::Temperature, UnitSystem::Imperial) => "°F",
            (Quantity::Pressure, UnitSystem::Metric) => "hPa",
            (Quantity::Pressure, UnitSystem::Imperial) => "inHg",
            (Quantity::Speed, UnitSystem::Metric) => "km/h",
            (Quantity::Speed, UnitSystem::Imperial) => "mph",
            (Quantity::Precipitation, UnitSystem::Metric) => "mm",
            (Quantity::Precipitation, UnitSystem::Imperial) => "in",
            (Quantity::PassThrough { unit }, _) => unit,
        }
    }

    /// Convert a present raw value.
    pub fn convert(self, raw: &str, units: UnitSystem) -> Result<SensorValue, ConvertError> {
        let number = match (self, units) {
            (Quantity::PassThrough { .. }, _) => return Ok(SensorValue::Text(raw.to_string())),
            (Quantity::Temperature, UnitSystem::Metric) => convert::fahrenheit_to_celsius(raw)?,
            (Quantity::Pressure, UnitSystem::Metric) => convert::inhg_to_hpa(raw)?,
            (Quantity::Speed, UnitSystem::Metric) => convert::mph_to_kmh(raw)?,
            (Quantity::Precipitation, UnitSystem::Metric) => convert::inch_to_mm(raw)?,
            (Quantity::Precipitation, UnitSystem::Imperial) => convert::round_raw(raw, 2)?,
            (_, UnitSystem::Imperial) => convert::round_raw(raw, 1)?,
        };
        Ok(SensorValue::Number(number))
    }
}

/// One row of the sensor schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSpec {
    pub name: &'static str,
    /// Query parameter carrying the raw value.
    pub param: &'static str,
    pub quantity: Quantity,
    /// Home Assistant device class.
    pub device_class: Option<&'static str>,
}

/// The fixed sensor schema, in publish order.
pub const SENSORS: [SensorSpec; 11] = [
    SensorSpec {
        name: "Barometric Pressure",
        param: "baromin",
        quantity: Quantity::Pressure,
        device_class: Some("atmospheric_pressure"),
    },
    SensorSpec {
        name: "Temperature",
        param: "tempf",
        quantity: Quantity::Temperature,
        device_class: Some("temperature"),
    },
    SensorSpec {
        name: "Humidity",
        param: "humidity",
        quantity: Quantity::PassThrough { unit: "%" },
        device_class: Some("humidity"),
    },
    SensorSpec {
        name: "Dew Point",
        param: "dewptf",
        quantity: Quantity::Temperature,
        device_class: Some("temperature"),
    },
    SensorSpec {
        name: "Rainfall",
        param: "rainin",
        quantity: Quantity::Precipitation,
        device_class: Some("precipitation"),
    },
    SensorSpec {
        name: "Daily Rainfall",
        param: "dailyrainin",
        quantity: Quantity::Precipitation,
        device_class: Some("precipitation"),
    },
    SensorSpec {
        name: "Wind Direction",
        param: "winddir",
        quantity: Quantity::PassThrough { unit: "°" },
        device_class: None,
    },
    SensorSpec {
        name: "Wind Speed",
        param: "windspeedmph",
        quantity: Quantity::Speed,
        device_class: Some("wind_speed"),
    },
    SensorSpec {
        name: "Wind Gust Speed",
        param: "windgustmph",
        quantity: Quantity::Speed,
        device_class: Some("wind_speed"),
    },
    SensorSpec {
        name: "UV Index",
        param: "UV",
        quantity: Quantity::PassThrough { unit: "index" },
        device_class: None,
    },
    SensorSpec {
        name: "Solar Radiation",
        param: "solarRadiation",
        quantity: Quantity::PassThrough { unit: "W/m²" },
        device_class: Some("irradiance"),
    },
];

impl SensorSpec {
    /// Build the table entry for this sensor from the request.
    ///
    /// A malformed number is logged and reported as "no value".
    pub fn entry(&self, params: &StationParams, units: UnitSystem) -> SensorEntry {
        let value = params
            .get(self.param)
            .and_then(|raw| match self.quantity.convert(raw, units) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(
                        sensor = self.name,
                        param = self.param,
                        error = %e,
                        "Dropping unconvertible value"
                    );
                    None
                }
            });

        SensorEntry {
            name: self.name,
            value,
            unit: self.quantity.unit(units),
            device_class: self.device_class,
        }
    }
}

/// Build the ordered attribute table, one entry per schema row.
pub fn build_attributes(params: &StationParams, units: UnitSystem) -> Vec<SensorEntry> {
    SENSORS
        .iter()
        .map(|spec| spec.entry(params, units))
        .collect()
}

/// Parse, convert and localize one upload.
pub fn build_reading(params: &StationParams, units: UnitSystem, tz: Tz) -> Reading {
    Reading {
        entries: build_attributes(params, units),
        measured_on: timestamp::localize(params.get(DATEUTC), tz),
    }
}
