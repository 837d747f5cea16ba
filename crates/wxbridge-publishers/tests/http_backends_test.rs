//! HA REST publisher and upstream forwarder against a local HTTP server.

use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde_json::Value;
use wxbridge_core::{
    build_reading, ForwardSettings, HassSettings, StationParams, Tz, UnitSystem, SENSORS,
};
use wxbridge_publishers::{
    HassRestPublisher, ReadingPublisher, StaticResolver, UpstreamForwarder, UPDATE_PATH,
};

/// One request seen by the test server.
#[derive(Debug, Clone)]
struct Recorded {
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// JSON body posted for `entity_id`.
fn state_body(requests: &[Recorded], entity_id: &str) -> Value {
    let path = format!("/api/states/{}", entity_id);
    let request = requests.iter().find(|r| r.path == path).unwrap();
    serde_json::from_slice(&request.body).unwrap()
}

#[derive(Clone, Default)]
struct Recorder {
    requests: Arc<Mutex<Vec<Recorded>>>,
    /// Entity ids answered with 500.
    fail_entities: Arc<Vec<String>>,
}

impl Recorder {
    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn state_handler(
    State(rec): State<Recorder>,
    Path(entity_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    rec.requests.lock().unwrap().push(Recorded {
        path: format!("/api/states/{}", entity_id),
        query: None,
        headers,
        body,
    });
    if rec.fail_entities.contains(&entity_id) {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn upload_handler(
    State(rec): State<Recorder>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> &'static str {
    rec.requests.lock().unwrap().push(Recorded {
        path: UPDATE_PATH.to_string(),
        query,
        headers,
        body: Bytes::new(),
    });
    "success"
}

async fn spawn_server(rec: Recorder) -> SocketAddr {
    let app = Router::new()
        .route("/api/states/:entity_id", post(state_handler))
        .route(UPDATE_PATH, get(upload_handler))
        .with_state(rec);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn hass_publisher(addr: SocketAddr) -> HassRestPublisher {
    let settings = HassSettings {
        base_url: format!("http://{}/api/states/", addr),
        token: "secret-token".to_string(),
        ..HassSettings::default()
    };
    HassRestPublisher::new(settings, "Weather Station").unwrap()
}

#[tokio::test]
async fn test_hass_posts_every_sensor_including_absent() {
    let rec = Recorder::default();
    let addr = spawn_server(rec.clone()).await;
    let publisher = hass_publisher(addr);

    // No tempf: Temperature is still posted, with a null state.
    let params: StationParams = [
        ("baromin", "29.92"),
        ("humidity", "45"),
        ("dateutc", "2024-06-01 12:00:00"),
    ]
    .into_iter()
    .collect();
    let tz: Tz = "Europe/Berlin".parse().unwrap();
    let reading = build_reading(&params, UnitSystem::Metric, tz);

    let summary = publisher.publish(&reading).await;
    assert_eq!(summary.published, SENSORS.len());
    assert_eq!(summary.failed, 0);

    let requests = rec.requests();
    assert_eq!(requests.len(), 11);
    assert!(requests
        .iter()
        .all(|r| r.header("authorization") == Some("Bearer secret-token")));

    let body = state_body(&requests, "sensor.weather_station_temperature");
    let attributes = &body["attributes"];
    assert_eq!(body["state"], Value::Null);
    assert_eq!(attributes["friendly_name"], "Weather Station Temperature");
    assert_eq!(attributes["measured_on"], "2024-06-01 14:00:00");

    let body = state_body(&requests, "sensor.weather_station_barometric_pressure");
    assert_eq!(body["state"], 1013.2);
    assert_eq!(body["attributes"]["unit_of_measurement"], "hPa");
}

#[tokio::test]
async fn test_hass_failure_does_not_stop_remaining_sensors() {
    let failing = "sensor.weather_station_barometric_pressure".to_string();
    let rec = Recorder {
        fail_entities: Arc::new(vec![failing]),
        ..Recorder::default()
    };
    let addr = spawn_server(rec.clone()).await;
    let publisher = hass_publisher(addr);

    let params: StationParams = [("baromin", "29.92"), ("tempf", "50")]
        .into_iter()
        .collect();
    let reading = build_reading(&params, UnitSystem::Metric, Tz::UTC);

    let summary = publisher.publish(&reading).await;
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.published, 10);
    assert_eq!(rec.requests().len(), 11);
}

#[tokio::test]
async fn test_hass_unreachable_is_reported_per_sensor() {
    // Nothing listens on this port once the listener is dropped.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let publisher = hass_publisher(addr);
    let reading = build_reading(&StationParams::default(), UnitSystem::Metric, Tz::UTC);

    let summary = publisher.publish(&reading).await;
    assert_eq!(summary.failed, 11);
    assert_eq!(summary.published, 0);
}

#[tokio::test]
async fn test_forwarder_sends_params_with_host_override() {
    let rec = Recorder::default();
    let addr = spawn_server(rec.clone()).await;

    let settings = ForwardSettings {
        enabled: true,
        station_id: Some("KBER123".to_string()),
        station_key: Some("upstream-key".to_string()),
        ..ForwardSettings::default()
    };
    let forwarder = UpstreamForwarder::with_resolver(
        settings,
        Arc::new(StaticResolver(IpAddr::from([127, 0, 0, 1]))),
    )
    .unwrap()
    .with_port(addr.port());

    let params: StationParams = [
        ("ID", "local"),
        ("PASSWORD", "local-pw"),
        ("tempf", "70.5"),
        ("dateutc", "2024-06-01 12:00:00"),
        ("softwaretype", "EasyWeather"),
    ]
    .into_iter()
    .collect();

    forwarder.forward(&params).await.unwrap();

    let requests = rec.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.header("host"), Some("rtupdate.wunderground.com"));

    let forwarded: Vec<(String, String)> =
        serde_urlencoded_pairs(request.query.as_deref().unwrap_or_default());
    assert_eq!(
        forwarded,
        vec![
            ("ID".to_string(), "KBER123".to_string()),
            ("PASSWORD".to_string(), "upstream-key".to_string()),
            ("tempf".to_string(), "70.5".to_string()),
            ("dateutc".to_string(), "2024-06-01 12:00:00".to_string()),
            ("softwaretype".to_string(), "EasyWeather".to_string()),
        ]
    );
}

/// Decode a query string with the same rules axum's `Query` uses.
fn serde_urlencoded_pairs(query: &str) -> Vec<(String, String)> {
    let uri = format!("/?{}", query).parse().unwrap();
    let params: axum::extract::Query<Vec<(String, String)>> =
        axum::extract::Query::try_from_uri(&uri).unwrap();
    params.0
}
