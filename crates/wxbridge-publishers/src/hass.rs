//! Home Assistant REST state publisher.
//!
//! POSTs one state object per sensor to `<base_url><entity_prefix><slug>`:
//!
//! ```json
//! {
//!   "state": 21.5,
//!   "attributes": {
//!     "friendly_name": "Weather Station Temperature",
//!     "unit_of_measurement": "°C",
//!     "device_class": "temperature",
//!     "measured_on": "2024-06-01 14:00:00"
//!   }
//! }
//! ```
//!
//! Unlike the MQTT backend, sensors without a value are still posted
//! (with a `null` state).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};
use wxbridge_core::{HassSettings, Reading, SensorEntry, SensorValue};

use crate::error::{PublishError, PublishResult};
use crate::publisher::{PublishSummary, ReadingPublisher};

/// Attributes of a posted state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateAttributes<'a> {
    pub friendly_name: String,
    pub unit_of_measurement: &'a str,
    pub device_class: Option<&'a str>,
    pub measured_on: &'a str,
}

/// Body of `POST /api/states/<entity_id>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateUpdate<'a> {
    pub state: Option<&'a SensorValue>,
    pub attributes: StateAttributes<'a>,
}

/// Posts readings to the Home Assistant REST API.
pub struct HassRestPublisher {
    client: Client,
    settings: HassSettings,
    device_name: String,
}

impl HassRestPublisher {
    /// Create a publisher with the configured request timeout.
    pub fn new(settings: HassSettings, device_name: impl Into<String>) -> PublishResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            settings,
            device_name: device_name.into(),
        })
    }

    /// Entity id of a sensor, e.g. `sensor.weather_station_temperature`.
    pub fn entity_id(&self, entry: &SensorEntry) -> String {
        format!("{}{}", self.settings.entity_prefix, entry.slug())
    }

    pub fn state_url(&self, entry: &SensorEntry) -> String {
        format!("{}{}", self.settings.base_url, self.entity_id(entry))
    }

    pub fn state_update<'a>(
        &self,
        entry: &'a SensorEntry,
        measured_on: &'a str,
    ) -> StateUpdate<'a> {
        StateUpdate {
            state: entry.value.as_ref(),
            attributes: StateAttributes {
                friendly_name: format!("{} {}", self.device_name, entry.name),
                unit_of_measurement: entry.unit,
                device_class: entry.device_class,
                measured_on,
            },
        }
    }

    async fn post_state(&self, entry: &SensorEntry, measured_on: &str) -> PublishResult<()> {
        let url = self.state_url(entry);
        let body = self.state_update(entry, measured_on);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.settings.token))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PublishError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        debug!(url = %url, "State posted");
        Ok(())
    }
}

#[async_trait]
impl ReadingPublisher for HassRestPublisher {
    fn name(&self) -> &'static str {
        "hass"
    }

    async fn publish(&self, reading: &Reading) -> PublishSummary {
        let mut summary = PublishSummary::default();

        for entry in &reading.entries {
            match self.post_state(entry, &reading.measured_on).await {
                Ok(()) => summary.published += 1,
                Err(e) => {
                    warn!(
                        sensor = entry.name,
                        error = %e,
                        "Failed to post state to Home Assistant"
                    );
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
