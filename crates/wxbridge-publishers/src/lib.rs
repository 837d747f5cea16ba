//! Publisher backends for the weather station bridge.
//!
//! ## Architecture
//!
//! - **ReadingPublisher**: the "publish a reading" capability
//! - **DiscoveryPublisher**: MQTT with Home Assistant auto-discovery, sent
//!   through a **MessageSink** (a live `BrokerConnection` or a `MemorySink`)
//! - **HassRestPublisher**: Home Assistant REST state API
//! - **UpstreamForwarder**: optional re-send of the raw upload to Weather Underground
//!
//! The backend is picked once at startup; request handlers only see
//! `Arc<dyn ReadingPublisher>`.

pub mod error;
pub mod forward;
pub mod hass;
pub mod mqtt;
pub mod publisher;

pub use error::{PublishError, PublishResult};
pub use forward::{HostResolver, PublicDnsResolver, StaticResolver, UpstreamForwarder, UPDATE_PATH};
pub use hass::{HassRestPublisher, StateAttributes, StateUpdate};
pub use mqtt::{
    BrokerConnection, DiscoveryConfig, DiscoveryPublisher, MemorySink, MessageSink,
    OutgoingMessage, SensorTopics,
};
pub use publisher::{PublishSummary, ReadingPublisher};
