//! End-to-end tests of the upload endpoint with an in-memory MQTT sink.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use wxbridge_core::UnitSystem;
use wxbridge_publishers::{MemorySink, MessageSink, OutgoingMessage, PublishError, PublishResult};

use common::*;

fn topic(slug: &str, kind: &str) -> String {
    format!("homeassistant/sensor/weather_station_{}/{}", slug, kind)
}

fn payload_of(sink: &MemorySink, topic: &str) -> String {
    sink.messages()
        .into_iter()
        .find(|m| m.topic == topic)
        .map(|m| m.payload_str().into_owned())
        .unwrap_or_else(|| panic!("no message on {}", topic))
}

#[tokio::test]
async fn test_full_upload_publishes_every_sensor() {
    let (sink, router) = memory_router();

    let (status, body) = get(router, &upload_uri(FULL_QUERY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "success");

    let messages = sink.messages();
    assert_eq!(messages.len(), 33);
    assert!(messages.iter().all(|m| m.retain));

    // Schema order, and config/state/attributes within each sensor.
    let topics = sink.topics();
    assert_eq!(
        &topics[..3],
        &[
            topic("barometric_pressure", "config"),
            topic("barometric_pressure", "state"),
            topic("barometric_pressure", "attributes"),
        ]
    );
    assert_eq!(topics[3], topic("temperature", "config"));
    assert_eq!(topics[32], topic("solar_radiation", "attributes"));

    assert_eq!(
        payload_of(&sink, &topic("barometric_pressure", "state")),
        "1013.2"
    );
    assert_eq!(payload_of(&sink, &topic("temperature", "state")), "21.4");
    assert_eq!(payload_of(&sink, &topic("wind_speed", "state")), "16.1");
    assert_eq!(payload_of(&sink, &topic("humidity", "state")), "45");

    let attributes: Value =
        serde_json::from_str(&payload_of(&sink, &topic("temperature", "attributes"))).unwrap();
    assert_eq!(attributes["measured_on"], "2024-06-01 14:00:00");

    let config: Value =
        serde_json::from_str(&payload_of(&sink, &topic("temperature", "config"))).unwrap();
    assert_eq!(config["unit_of_measurement"], "°C");
    assert_eq!(config["state_topic"], topic("temperature", "state"));
}

#[tokio::test]
async fn test_missing_field_skips_that_sensor() {
    let (sink, router) = memory_router();
    let query = FULL_QUERY.replace("tempf=70.5&", "");

    let (status, body) = get(router, &upload_uri(&query)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "success");

    assert_eq!(sink.messages().len(), 30);
    assert!(!sink
        .topics()
        .iter()
        .any(|t| t.contains("weather_station_temperature/")));
}

#[tokio::test]
async fn test_unparseable_dateutc_is_passed_through() {
    let (sink, router) = memory_router();

    let (status, _) = get(router, &upload_uri("tempf=50&dateutc=garbage")).await;
    assert_eq!(status, StatusCode::OK);

    let attributes: Value =
        serde_json::from_str(&payload_of(&sink, &topic("temperature", "attributes"))).unwrap();
    assert_eq!(attributes["measured_on"], "garbage");
    assert_eq!(payload_of(&sink, &topic("temperature", "state")), "10.0");
}

#[tokio::test]
async fn test_empty_upload_still_succeeds() {
    let (sink, router) = memory_router();

    let (status, body) = get(router, wxbridge_publishers::UPDATE_PATH).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "success");
    assert!(sink.messages().is_empty());
}

#[tokio::test]
async fn test_imperial_units_are_rounded_not_converted() {
    let sink = MemorySink::new();
    let router = mqtt_router(Arc::new(sink.clone()), UnitSystem::Imperial);

    let (status, _) = get(router, &upload_uri(FULL_QUERY)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        payload_of(&sink, &topic("barometric_pressure", "state")),
        "29.9"
    );
    assert_eq!(payload_of(&sink, &topic("temperature", "state")), "70.5");
    assert_eq!(payload_of(&sink, &topic("rainfall", "state")), "0.01");

    let config: Value =
        serde_json::from_str(&payload_of(&sink, &topic("barometric_pressure", "config"))).unwrap();
    assert_eq!(config["unit_of_measurement"], "inHg");
}

/// Sink whose broker is gone.
struct ClosedSink;

#[async_trait]
impl MessageSink for ClosedSink {
    async fn send(&self, _message: OutgoingMessage) -> PublishResult<()> {
        Err(PublishError::Closed("broker unavailable".to_string()))
    }
}

#[tokio::test]
async fn test_publish_failure_still_returns_success() {
    let router = mqtt_router(Arc::new(ClosedSink), UnitSystem::Metric);

    let (status, body) = get(router, &upload_uri(FULL_QUERY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "success");
}

#[tokio::test]
async fn test_post_with_query_is_accepted() {
    let (sink, router) = memory_router();

    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(upload_uri("baromin=29.92"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(sink.messages().len(), 3);
}
