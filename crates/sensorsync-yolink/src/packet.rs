//! Wire packets of the YoLink data endpoint.
//!
//! Every call is a JSON POST of a [`Request`]; the body of the answer is a
//! [`Response`] whose `code` says whether the call succeeded at the
//! application level, independently of the HTTP status.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value as Json;
use sensorsync_core::Timestamp;

use crate::{Error, Result};

/// Application code of a successful call.
pub const SUCCESS_CODE: &str = "000000";

pub const GET_DEVICE_LIST: &str = "Home.getDeviceList";

/// `<device type>.getState`.
pub fn get_state_method(kind: &str) -> String { format!("{kind}.getState") }

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
  /// Epoch seconds, sent as a string.
  pub time:          String,
  pub method:        String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub msgid:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub target_device: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub token:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub params:        Option<Json>,
}

impl Request {
  pub fn new(method: impl Into<String>) -> Self {
    Self {
      time:          Timestamp::now().as_secs().to_string(),
      method:        method.into(),
      msgid:         None,
      target_device: None,
      token:         None,
      params:        None,
    }
  }

  /// Address the request to one device.
  pub fn targeting(mut self, device_id: &str, device_token: &str) -> Self {
    self.target_device = Some(device_id.to_owned());
    self.token = Some(device_token.to_owned());
    self
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Response {
  /// Epoch milliseconds.
  pub time:   i64,
  pub method: String,
  #[serde(default)]
  pub msgid:  Option<Json>,
  pub code:   String,
  #[serde(default)]
  pub desc:   Option<String>,
  #[serde(default)]
  pub data:   Option<Json>,
}

impl Response {
  pub fn is_success(&self) -> bool { self.code == SUCCESS_CODE }

  /// Response time in whole seconds.
  pub fn timestamp(&self) -> Timestamp { Timestamp::from_secs(self.time / 1000) }

  /// The `data` payload of a successful call.
  pub fn into_data(self) -> Result<Json> {
    if !self.is_success() {
      return Err(Error::VendorBusiness {
        method: self.method,
        code:   self.code,
        desc:   self.desc.unwrap_or_default(),
      });
    }
    self.data.ok_or(Error::MissingData { method: self.method })
  }

  /// The `data` payload decoded as `T`.
  pub fn decode_data<T: DeserializeOwned>(self, what: &'static str) -> Result<T> {
    serde_json::from_value(self.into_data()?).map_err(|source| Error::Decode { what, source })
  }
}

// ─── Payloads ────────────────────────────────────────────────────────────────

/// `data` of [`GET_DEVICE_LIST`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceList {
  pub devices: Vec<ListedDevice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedDevice {
  pub device_id: String,
  pub name:      String,
  pub token:     String,
  #[serde(rename = "type")]
  pub kind:      String,
}
