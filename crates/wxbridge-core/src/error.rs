//! Error types for the core crate.

use thiserror::Error;

/// Errors from unit conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// The raw query value is not a finite float.
    #[error("invalid number: {0:?}")]
    InvalidNumber(String),
}

/// Errors from parsing the station timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("invalid timestamp {value:?}: {reason}")]
    Parse { value: String, reason: String },
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found or unreadable
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment variable or field holds a value of the wrong shape
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("Unknown time zone: {0}")]
    UnknownTimeZone(String),

    /// A setting required by the selected backend is empty
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
