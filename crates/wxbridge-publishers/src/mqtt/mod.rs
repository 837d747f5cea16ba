//! MQTT auto-discovery publisher.
//!
//! For every sensor with a value, three retained messages are sent in a
//! fixed order: discovery config, state, attributes. Home Assistant must
//! see the config before the first state arrives.

mod discovery;
mod sink;

pub use discovery::{DiscoveryConfig, DiscoveryDevice, SensorAttributes, SensorTopics};
pub use sink::{BrokerConnection, MemorySink, MessageSink, OutgoingMessage};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use wxbridge_core::{DeviceInfo, Reading, SensorEntry, SensorValue};

use crate::error::PublishResult;
use crate::publisher::{PublishSummary, ReadingPublisher};

/// Publishes readings as Home Assistant discovery triplets.
pub struct DiscoveryPublisher {
    sink: Arc<dyn MessageSink>,
    prefix: String,
    device: DeviceInfo,
}

impl DiscoveryPublisher {
    pub fn new(sink: Arc<dyn MessageSink>, prefix: impl Into<String>, device: DeviceInfo) -> Self {
        Self {
            sink,
            prefix: prefix.into(),
            device,
        }
    }

    /// Topics of a sensor under this publisher's prefix and device.
    pub fn topics_for(&self, entry: &SensorEntry) -> SensorTopics {
        SensorTopics::new(&self.prefix, &self.device.id, &entry.slug())
    }

    /// The three messages of one sensor, in publish order.
    pub fn messages_for(
        &self,
        entry: &SensorEntry,
        value: &SensorValue,
        measured_on: &str,
    ) -> PublishResult<[OutgoingMessage; 3]> {
        let topics = self.topics_for(entry);
        let config = serde_json::to_vec(&DiscoveryConfig::new(entry, &topics, &self.device))?;
        let attributes = serde_json::to_vec(&SensorAttributes { measured_on })?;

        Ok([
            OutgoingMessage::retained(topics.config.clone(), config),
            OutgoingMessage::retained(topics.state.clone(), value.to_string()),
            OutgoingMessage::retained(topics.attributes.clone(), attributes),
        ])
    }

    async fn publish_sensor(
        &self,
        entry: &SensorEntry,
        value: &SensorValue,
        measured_on: &str,
    ) -> PublishResult<()> {
        for message in self.messages_for(entry, value, measured_on)? {
            debug!(topic = %message.topic, "Publishing");
            self.sink.send(message).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ReadingPublisher for DiscoveryPublisher {
    fn name(&self) -> &'static str {
        "mqtt"
    }

    async fn publish(&self, reading: &Reading) -> PublishSummary {
        let mut summary = PublishSummary::default();

        for entry in &reading.entries {
            let Some(value) = &entry.value else {
                summary.skipped += 1;
                continue;
            };

            // A failed message aborts the rest of this sensor's triplet only.
            let measured_on = &reading.measured_on;
            match self.publish_sensor(entry, value, measured_on).await {
                Ok(()) => summary.published += 1,
                Err(e) => {
                    warn!(sensor = entry.name, error = %e, "Failed to publish sensor to MQTT");
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
