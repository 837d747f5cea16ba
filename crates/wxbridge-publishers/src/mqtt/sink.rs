//! MQTT message sinks.
//!
//! [`BrokerConnection`] owns the long-lived `rumqttc` client. [`MemorySink`]
//! records messages in order and stands in for a broker in tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use wxbridge_core::MqttSettings;

use crate::error::{PublishError, PublishResult};

/// Capacity of the client request queue. Publishes beyond it fail fast.
const REQUEST_QUEUE_CAPACITY: usize = 256;

/// State and discovery messages are retained, so at-most-once is enough.
const QOS: QoS = QoS::AtMostOnce;

/// Errors logged in full before the event loop goes quiet.
const MAX_LOGGED_ERRORS: u32 = 3;

/// One outgoing MQTT message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retain: bool,
}

impl OutgoingMessage {
    /// A retained message.
    pub fn retained(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retain: true,
        }
    }

    /// Payload as UTF-8 text, lossy.
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Anything that accepts MQTT publishes.
///
/// Must be safe to share between concurrent requests.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(&self, message: OutgoingMessage) -> PublishResult<()>;
}

/// In-memory sink that records every message.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    messages: Arc<Mutex<Vec<OutgoingMessage>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded messages in send order.
    pub fn messages(&self) -> Vec<OutgoingMessage> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn topics(&self) -> Vec<String> {
        self.messages().into_iter().map(|m| m.topic).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut m) = self.messages.lock() {
            m.clear();
        }
    }
}

#[async_trait]
impl MessageSink for MemorySink {
    async fn send(&self, message: OutgoingMessage) -> PublishResult<()> {
        self.messages
            .lock()
            .map_err(|e| PublishError::Closed(e.to_string()))?
            .push(message);
        Ok(())
    }
}

/// Long-lived broker connection shared by all requests.
///
/// The event loop runs in a background task for the lifetime of the
/// connection; rumqttc reconnects on the next poll after an error.
pub struct BrokerConnection {
    client: AsyncClient,
    event_loop: JoinHandle<()>,
}

impl BrokerConnection {
    /// Create the client and spawn its event loop. Must run inside a tokio runtime.
    pub fn connect(settings: &MqttSettings) -> Self {
        let client_id = settings
            .client_id
            .clone()
            .unwrap_or_else(|| format!("wxbridge_{}", Uuid::new_v4().simple()));

        let mut mqttoptions = MqttOptions::new(client_id, &settings.host, settings.port);
        mqttoptions.set_keep_alive(Duration::from_secs(settings.keep_alive_secs.max(5)));
        if let Some((user, password)) = settings.credentials() {
            mqttoptions.set_credentials(user, password);
        }

        let (client, eventloop) = AsyncClient::new(mqttoptions, REQUEST_QUEUE_CAPACITY);
        let broker = format!("{}:{}", settings.host, settings.port);
        let reconnect = Duration::from_millis(settings.reconnect_interval_ms);
        let event_loop = tokio::spawn(run_event_loop(eventloop, broker, reconnect));

        Self { client, event_loop }
    }

    /// Ask the broker for a clean disconnect and stop the event loop.
    pub fn disconnect(&self) {
        if let Err(e) = self.client.try_disconnect() {
            debug!(error = %e, "MQTT disconnect request failed");
        }
        self.event_loop.abort();
    }
}

impl Drop for BrokerConnection {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}

#[async_trait]
impl MessageSink for BrokerConnection {
    async fn send(&self, message: OutgoingMessage) -> PublishResult<()> {
        // try_publish never waits on the event loop, so a dead broker
        // cannot stall the request handler.
        self.client
            .try_publish(message.topic, QOS, message.retain, message.payload)?;
        Ok(())
    }
}

async fn run_event_loop(mut eventloop: EventLoop, broker: String, reconnect: Duration) {
    let mut error_count: u32 = 0;

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                if error_count > 0 {
                    info!(broker = %broker, errors = error_count, "Reconnected to MQTT broker");
                } else {
                    info!(broker = %broker, "Connected to MQTT broker");
                }
                error_count = 0;
            }
            Ok(_) => {}
            Err(e) => {
                error_count = error_count.saturating_add(1);
                if error_count <= MAX_LOGGED_ERRORS {
                    error!(broker = %broker, error = %e, "MQTT connection error");
                } else if error_count == MAX_LOGGED_ERRORS + 1 {
                    warn!(broker = %broker, "MQTT broker still unreachable, retrying quietly");
                }
                tokio::time::sleep(reconnect).await;
            }
        }
    }
}
