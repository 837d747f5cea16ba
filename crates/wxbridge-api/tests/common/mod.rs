//! Common test utilities for API tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;
use wxbridge_api::{create_router, BridgeState};
use wxbridge_core::{DeviceInfo, Tz, UnitSystem};
use wxbridge_publishers::{DiscoveryPublisher, MemorySink, MessageSink};

pub const DISCOVERY_PREFIX: &str = "homeassistant";

/// A full upload with every schema field.
pub const FULL_QUERY: &str = "ID=local&PASSWORD=secret&tempf=70.5&humidity=45&dewptf=50\
&windchillf=70.5&winddir=180&windspeedmph=10&windgustmph=15&rainin=0.01&dailyrainin=0.1\
&weeklyrainin=0.5&monthlyrainin=1.2&solarRadiation=450.5&UV=3&indoortempf=72&indoorhumidity=40\
&baromin=29.92&lowbatt=0&dateutc=2024-06-01%2012:00:00&softwaretype=EasyWeather&action=updateraw\
&realtime=1&rtfreq=5";

/// Router backed by a MQTT discovery publisher writing to `sink`.
pub fn mqtt_router(sink: Arc<dyn MessageSink>, units: UnitSystem) -> Router {
    let publisher = DiscoveryPublisher::new(sink, DISCOVERY_PREFIX, DeviceInfo::default());
    let tz: Tz = "Europe/Berlin".parse().unwrap();
    create_router(BridgeState::new(Arc::new(publisher), units, tz))
}

pub fn memory_router() -> (MemorySink, Router) {
    let sink = MemorySink::new();
    let router = mqtt_router(Arc::new(sink.clone()), UnitSystem::Metric);
    (sink, router)
}

/// Send a GET and return status and body text.
pub async fn get(router: Router, uri: &str) -> (StatusCode, String) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub fn upload_uri(query: &str) -> String {
    format!("{}?{}", wxbridge_publishers::UPDATE_PATH, query)
}
