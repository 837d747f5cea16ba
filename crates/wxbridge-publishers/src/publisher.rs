//! The "publish a reading" capability.

use async_trait::async_trait;
use serde::Serialize;
use wxbridge_core::Reading;

/// Per-reading outcome, counted in sensors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishSummary {
    /// Sensors delivered completely.
    pub published: usize,
    /// Sensors with at least one failed message or request.
    pub failed: usize,
    /// Sensors left out because they had no value.
    pub skipped: usize,
}

/// A destination for converted readings.
///
/// Implementations handle their own failures: errors are logged per sensor
/// and reflected in the summary, never returned to the HTTP caller.
#[async_trait]
pub trait ReadingPublisher: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Publish every sensor of `reading` the backend accepts.
    async fn publish(&self, reading: &Reading) -> PublishSummary;
}
