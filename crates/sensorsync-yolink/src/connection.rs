//! [`YoLinkConnection`]: the YoLink implementation of [`SensorConnection`].

use std::time::Duration;

use chrono::DateTime;
use reqwest::Client;
use sensorsync_core::{
  Device, Event, Stored, Timestamp,
  sensor::{ConnectionStatus, SensorConnection, VendorDevice},
};
use tokio::sync::Mutex;

use crate::{
  Error, Result,
  flatten::flatten,
  packet::{self, DeviceList, Request, Response},
  token::{DEFAULT_REFRESH_BUFFER, HttpTokenEndpoint, TokenManager},
};

/// Brand stored on every device managed through YoLink.
pub const BRAND: &str = "yolink";

pub const DEFAULT_TOKEN_URL: &str = "https://api.yosmart.com/open/yolink/token";
pub const DEFAULT_API_URL: &str = "https://api.yosmart.com/open/yolink/v2/api";

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials and endpoints for one YoLink account.
#[derive(Debug, Clone)]
pub struct YoLinkConfig {
  pub client_id:      String,
  pub client_secret:  String,
  pub token_url:      String,
  pub api_url:        String,
  pub refresh_buffer: Duration,
}

impl YoLinkConfig {
  /// Production endpoints with the default refresh buffer.
  pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
    Self {
      client_id:      client_id.into(),
      client_secret:  client_secret.into(),
      token_url:      DEFAULT_TOKEN_URL.to_owned(),
      api_url:        DEFAULT_API_URL.to_owned(),
      refresh_buffer: DEFAULT_REFRESH_BUFFER,
    }
  }
}

/// A YoLink account.
///
/// Requests from concurrent callers share one token; the token manager sits
/// behind an async mutex so at most one refresh or reissue is in flight.
pub struct YoLinkConnection {
  client:  Client,
  api_url: String,
  tokens:  Mutex<TokenManager<HttpTokenEndpoint>>,
}

impl YoLinkConnection {
  /// Build a connection without touching the network.
  pub fn new(config: YoLinkConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(HTTP_TIMEOUT)
      .build()
      .map_err(Error::Client)?;
    let endpoint = HttpTokenEndpoint::new(
      client.clone(),
      config.token_url,
      config.client_id,
      config.client_secret,
    );
    Ok(Self {
      client,
      api_url: config.api_url,
      tokens: Mutex::new(TokenManager::new(endpoint, config.refresh_buffer)),
    })
  }

  /// Build a connection, obtain a token, and check it can be refreshed.
  pub async fn connect(config: YoLinkConfig) -> Result<Self> {
    let connection = Self::new(config)?;
    connection.tokens.lock().await.ensure_valid().await?;
    match connection.status().await {
      ConnectionStatus::Good => Ok(connection),
      ConnectionStatus::Bad(reason) => Err(Error::Unhealthy(reason)),
    }
  }

  /// POST `request` to the data endpoint with a current bearer token.
  pub async fn request(&self, request: &Request) -> Result<Response> {
    let token = self.tokens.lock().await.ensure_valid().await?.to_owned();
    tracing::debug!(method = %request.method, target = ?request.target_device, "yolink request");

    let resp = self
      .client
      .post(&self.api_url)
      .bearer_auth(token)
      .json(request)
      .send()
      .await
      .map_err(|source| Error::Http { url: self.api_url.clone(), source })?;

    if !resp.status().is_success() {
      return Err(Error::Status { url: self.api_url.clone(), status: resp.status() });
    }
    let body = resp
      .bytes()
      .await
      .map_err(|source| Error::Http { url: self.api_url.clone(), source })?;
    serde_json::from_slice(&body).map_err(|source| Error::Decode { what: "response", source })
  }
}

/// One event per leaf of a device state response.
///
/// `reportAt` must be present and RFC 3339; it becomes the event time of
/// every pair, the response time becomes the response timestamp.
pub fn parse_state(device: &Stored<Device>, response: Response) -> Result<Vec<Event>> {
  let response_timestamp = response.timestamp();
  let data = response.into_data()?;

  let report_at = data
    .get("reportAt")
    .ok_or_else(|| Error::MissingReportTimestamp { device: device.brand_device_id.clone() })?;
  let event_timestamp = report_at
    .as_str()
    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    .map(|dt| Timestamp::from_secs(dt.timestamp()))
    .ok_or_else(|| Error::InvalidReportTimestamp {
      device: device.brand_device_id.clone(),
      value:  report_at.to_string(),
    })?;

  Ok(
    flatten(&data)
      .into_iter()
      .map(|(field_name, field_value)| Event {
        request_device_id: device.brand_device_id.clone(),
        event_source_device_id: device.id.clone(),
        response_timestamp,
        event_timestamp,
        field_name,
        field_value,
      })
      .collect(),
  )
}

impl SensorConnection for YoLinkConnection {
  type Error = Error;

  fn brand(&self) -> &str { BRAND }

  async fn list_devices(&self) -> Result<Vec<VendorDevice>> {
    let response = self.request(&Request::new(packet::GET_DEVICE_LIST)).await?;
    let list: DeviceList = response.decode_data("device list")?;
    Ok(
      list
        .devices
        .into_iter()
        .map(|d| VendorDevice {
          brand_device_id: d.device_id,
          kind:            d.kind,
          name:            d.name,
          token:           d.token,
        })
        .collect(),
    )
  }

  async fn device_state(&self, device: &Stored<Device>) -> Result<Vec<Event>> {
    if device.brand != BRAND {
      return Err(Error::WrongBrand {
        device: device.brand_device_id.clone(),
        brand:  device.brand.clone(),
      });
    }
    let request = Request::new(packet::get_state_method(&device.kind))
      .targeting(&device.brand_device_id, &device.token);
    let response = self.request(&request).await?;
    parse_state(device, response)
  }

  /// Obtains a token first if none is held, then probes with a refresh.
  async fn status(&self) -> ConnectionStatus {
    let mut tokens = self.tokens.lock().await;
    if tokens.access_token().is_none() {
      if let Err(error) = tokens.ensure_valid().await {
        return ConnectionStatus::Bad(error.to_string());
      }
    }
    tokens.status().await
  }
}
