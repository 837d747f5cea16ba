//! Publisher error types.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while publishing a reading or forwarding an upload.
///
/// These never reach the station: callers log them and carry on.
#[derive(Debug, Error)]
pub enum PublishError {
    /// MQTT client rejected the publish (queue full or event loop gone)
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// JSON payload could not be built
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Name resolution failed or returned no address
    #[error("DNS error: {0}")]
    Dns(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The message sink no longer accepts messages
    #[error("Sink closed: {0}")]
    Closed(String),
}

/// Result type for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;
