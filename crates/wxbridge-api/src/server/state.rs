//! Shared server state.

use std::sync::Arc;

use tracing::{info, warn};
use wxbridge_core::{Backend, BridgeConfig, Tz, UnitSystem};
use wxbridge_publishers::{
    BrokerConnection, DiscoveryPublisher, HassRestPublisher, ReadingPublisher, UpstreamForwarder,
};

/// State handed to every request.
///
/// The publisher is injected, so tests can swap in a recording backend.
#[derive(Clone)]
pub struct BridgeState {
    pub publisher: Arc<dyn ReadingPublisher>,
    /// Present only when forwarding is enabled.
    pub forwarder: Option<Arc<UpstreamForwarder>>,
    pub units: UnitSystem,
    pub tz: Tz,
    /// Live broker connection for the MQTT backend, kept for shutdown.
    pub broker: Option<Arc<BrokerConnection>>,
}

impl BridgeState {
    pub fn new(publisher: Arc<dyn ReadingPublisher>, units: UnitSystem, tz: Tz) -> Self {
        Self {
            publisher,
            forwarder: None,
            units,
            tz,
            broker: None,
        }
    }

    pub fn with_forwarder(mut self, forwarder: Arc<UpstreamForwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    /// Build the configured backend. Must run inside a tokio runtime.
    pub fn from_config(config: &BridgeConfig) -> anyhow::Result<Self> {
        let tz = config.time_zone()?;

        let (publisher, broker): (Arc<dyn ReadingPublisher>, _) = match config.backend {
            Backend::Mqtt => {
                let broker = Arc::new(BrokerConnection::connect(&config.mqtt));
                info!(
                    broker = %format!("{}:{}", config.mqtt.host, config.mqtt.port),
                    prefix = %config.mqtt.discovery_prefix,
                    "MQTT discovery backend"
                );
                let publisher = DiscoveryPublisher::new(
                    broker.clone(),
                    config.mqtt.discovery_prefix.clone(),
                    config.device.clone(),
                );
                (Arc::new(publisher), Some(broker))
            }
            Backend::Hass => {
                if config.hass.token.is_empty() {
                    warn!("HASS token is empty; state updates will be rejected");
                }
                info!(url = %config.hass.base_url, "Home Assistant REST backend");
                let publisher =
                    HassRestPublisher::new(config.hass.clone(), config.device.name.clone())?;
                (Arc::new(publisher), None)
            }
        };

        let mut state = Self::new(publisher, config.units, tz);
        state.broker = broker;

        if config.forward.enabled {
            match config.backend {
                Backend::Mqtt => {
                    let forwarder = UpstreamForwarder::new(config.forward.clone())?;
                    info!(host = %config.forward.host, "Weather Underground forwarding enabled");
                    state = state.with_forwarder(Arc::new(forwarder));
                }
                Backend::Hass => {
                    warn!("Forwarding requires the MQTT backend; ignoring");
                }
            }
        }

        Ok(state)
    }

    /// Release long-lived connections.
    pub fn shutdown(&self) {
        if let Some(broker) = &self.broker {
            broker.disconnect();
        }
    }
}
