//! HTTP-level tests of `YoLinkConnection` against a local axum fixture.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use axum::{
  Form, Json, Router,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  routing::post,
};
use sensorsync_core::{
  Classify, Device, ErrorKind, RecordId, Stored, Timestamp,
  sensor::{ConnectionStatus, SensorConnection},
};
use serde_json::{Value, json};

use crate::{BRAND, Error, YoLinkConfig, YoLinkConnection};

// ─── Fixture server ──────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Fixture {
  issued:    Arc<AtomicUsize>,
  refreshed: Arc<AtomicUsize>,
  bearers:   Arc<Mutex<Vec<String>>>,
}

async fn token(
  State(fixture): State<Fixture>,
  Form(form): Form<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
  if form.get("client_id").map(String::as_str) != Some("client") {
    return Err(StatusCode::UNAUTHORIZED);
  }
  match form.get("grant_type").map(String::as_str) {
    Some("client_credentials") if form.get("client_secret").map(String::as_str) == Some("secret") => {
      let n = fixture.issued.fetch_add(1, Ordering::SeqCst);
      Ok(Json(json!({
        "access_token": format!("access-{n}"),
        "refresh_token": format!("refresh-{n}"),
        "expires_in": 7200,
      })))
    }
    Some("refresh_token") if form.contains_key("refresh_token") => {
      let n = fixture.refreshed.fetch_add(1, Ordering::SeqCst);
      Ok(Json(json!({
        "access_token": format!("refreshed-{n}"),
        "refresh_token": format!("refresh-r{n}"),
        "expires_in": 7200,
      })))
    }
    _ => Err(StatusCode::BAD_REQUEST),
  }
}

fn packet(method: &Value, code: &str, data: Option<Value>) -> Json<Value> {
  let mut body = json!({
    "time": 1_700_000_100_250_i64,
    "method": method,
    "msgid": "1700000100250",
    "code": code,
  });
  match data {
    Some(data) => body["data"] = data,
    None => body["desc"] = json!("Cannot connect to Device"),
  }
  Json(body)
}

async fn api(
  State(fixture): State<Fixture>,
  headers: HeaderMap,
  Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
  let bearer = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .ok_or(StatusCode::UNAUTHORIZED)?;
  fixture.bearers.lock().unwrap().push(bearer.to_owned());

  let method = &body["method"];
  let reply = match (method.as_str(), body["targetDevice"].as_str()) {
    (Some("Home.getDeviceList"), None) => packet(
      method,
      "000000",
      Some(json!({ "devices": [
        { "deviceId": "d1", "name": "Garage", "token": "t1", "type": "THSensor" },
        { "deviceId": "d2", "name": "Attic", "token": "t2", "type": "THSensor" },
      ]})),
    ),
    (Some("THSensor.getState"), Some("d1")) if body["token"] == "t1" => packet(
      method,
      "000000",
      Some(json!({
        "online": true,
        "reportAt": "2023-11-14T22:13:20.000Z",
        "state": { "battery": 4, "temperature": 21.5 },
      })),
    ),
    (Some("THSensor.getState"), Some("d2")) => {
      packet(method, "000000", Some(json!({ "state": { "battery": 4 } })))
    }
    _ => packet(method, "000201", None),
  };
  Ok(reply)
}

async fn serve() -> (String, Fixture) {
  let fixture = Fixture::default();
  let app = Router::new()
    .route("/token", post(token))
    .route("/api", post(api))
    .with_state(fixture.clone());
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let address = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
  (format!("http://{address}"), fixture)
}

fn config(base: &str) -> YoLinkConfig {
  YoLinkConfig {
    token_url: format!("{base}/token"),
    api_url: format!("{base}/api"),
    ..YoLinkConfig::new("client", "secret")
  }
}

fn stored_device(brand_device_id: &str, token: &str) -> Stored<Device> {
  Stored::new(RecordId::from("0190-local"), Device {
    brand_device_id: brand_device_id.into(),
    brand:           BRAND.into(),
    kind:            "THSensor".into(),
    name:            "Garage".into(),
    token:           token.into(),
    timestamp:       Timestamp::from_secs(1_700_000_000),
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_issues_then_probes_with_refresh() {
  let (base, fixture) = serve().await;
  let connection = YoLinkConnection::connect(config(&base)).await.unwrap();
  assert_eq!(fixture.issued.load(Ordering::SeqCst), 1);
  assert_eq!(fixture.refreshed.load(Ordering::SeqCst), 1);
  assert_eq!(connection.brand(), "yolink");
}

#[tokio::test]
async fn list_devices_reuses_one_token() {
  let (base, fixture) = serve().await;
  let connection = YoLinkConnection::new(config(&base)).unwrap();

  let devices = connection.list_devices().await.unwrap();
  connection.list_devices().await.unwrap();

  let ids: Vec<&str> = devices.iter().map(|d| d.brand_device_id.as_str()).collect();
  assert_eq!(ids, ["d1", "d2"]);
  assert_eq!(devices[0].kind, "THSensor");
  assert_eq!(devices[0].token, "t1");
  assert_eq!(fixture.issued.load(Ordering::SeqCst), 1);
  assert_eq!(*fixture.bearers.lock().unwrap(), ["access-0", "access-0"]);
}

#[tokio::test]
async fn device_state_yields_one_event_per_leaf() {
  let (base, _) = serve().await;
  let connection = YoLinkConnection::new(config(&base)).unwrap();
  let device = stored_device("d1", "t1");

  let events = connection.device_state(&device).await.unwrap();

  let fields: Vec<(&str, &str)> = events
    .iter()
    .map(|e| (e.field_name.as_str(), e.field_value.as_str()))
    .collect();
  assert_eq!(fields, [
    ("online", "true"),
    ("reportAt", "2023-11-14T22:13:20.000Z"),
    ("state.battery", "4"),
    ("state.temperature", "21.5"),
  ]);
  for event in &events {
    assert_eq!(event.request_device_id, "d1");
    assert_eq!(event.event_source_device_id, device.id);
    assert_eq!(event.event_timestamp, Timestamp::from_secs(1_700_000_000));
    assert_eq!(event.response_timestamp, Timestamp::from_secs(1_700_000_100));
  }
}

#[tokio::test]
async fn state_without_report_time_is_rejected() {
  let (base, _) = serve().await;
  let connection = YoLinkConnection::new(config(&base)).unwrap();

  let err = connection.device_state(&stored_device("d2", "t2")).await.unwrap_err();
  assert!(matches!(err, Error::MissingReportTimestamp { ref device } if device == "d2"));
  assert_eq!(err.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn business_code_is_not_a_transport_error() {
  let (base, _) = serve().await;
  let connection = YoLinkConnection::new(config(&base)).unwrap();

  let err = connection.device_state(&stored_device("d9", "t9")).await.unwrap_err();
  assert!(matches!(err, Error::VendorBusiness { ref code, .. } if code == "000201"));
  assert_eq!(err.kind(), ErrorKind::VendorBusiness);
}

#[tokio::test]
async fn foreign_brand_is_refused_without_a_request() {
  let (base, fixture) = serve().await;
  let connection = YoLinkConnection::new(config(&base)).unwrap();
  let mut device = stored_device("d1", "t1");
  device.record.brand = "acme".into();

  let err = connection.device_state(&device).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Config);
  assert!(fixture.bearers.lock().unwrap().is_empty());
}

#[tokio::test]
async fn status_reports_token_endpoint_failure() {
  let (base, _) = serve().await;
  let connection = YoLinkConnection::new(YoLinkConfig {
    client_secret: "wrong".into(),
    ..config(&base)
  })
  .unwrap();

  match connection.status().await {
    ConnectionStatus::Bad(reason) => assert!(reason.contains("400"), "{reason}"),
    ConnectionStatus::Good => panic!("status should be bad"),
  }
  assert!(YoLinkConnection::connect(YoLinkConfig {
    client_secret: "wrong".into(),
    ..config(&base)
  })
  .await
  .is_err());
}
