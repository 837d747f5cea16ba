//! The per-request reading model.

use serde::Serialize;
use std::fmt;

/// A sensor value, either converted or passed through from the query string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    /// Parsed and rounded number.
    Number(f64),
    /// Raw query text, forwarded unconverted.
    Text(String),
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Debug keeps the trailing ".0" on integral values ("100.0").
            SensorValue::Number(n) => write!(f, "{:?}", n),
            SensorValue::Text(s) => f.write_str(s),
        }
    }
}

/// One row of the attribute table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorEntry {
    /// Human-readable name, e.g. "Wind Gust Speed".
    pub name: &'static str,
    /// `None` when the station did not report the field.
    pub value: Option<SensorValue>,
    pub unit: &'static str,
    /// Home Assistant device class, metadata only.
    pub device_class: Option<&'static str>,
}

impl SensorEntry {
    /// Lowercase, underscore-joined identifier.
    pub fn slug(&self) -> String {
        slugify(self.name)
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

/// One station upload after conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Entries in schema order, absent ones included.
    pub entries: Vec<SensorEntry>,
    /// Localized timestamp; opaque display text, empty when not reported.
    pub measured_on: String,
}

impl Reading {
    /// Entries that carry a value.
    pub fn present(&self) -> impl Iterator<Item = &SensorEntry> {
        self.entries.iter().filter(|e| e.is_present())
    }

    pub fn get(&self, name: &str) -> Option<&SensorEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Derive a slug from a display name.
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}
