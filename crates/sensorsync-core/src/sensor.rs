//! The vendor-facing side: sensor connections and connection health.

use std::{fmt, future::Future};

use crate::{
  Device, Event,
  error::Classify,
  record::Stored,
  value::Timestamp,
};

/// Result of probing a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
  Good,
  Bad(String),
}

impl fmt::Display for ConnectionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConnectionStatus::Good => f.write_str("Connected"),
      ConnectionStatus::Bad(reason) => write!(f, "Disconnected: {reason}"),
    }
  }
}

/// A device as listed by the vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorDevice {
  pub brand_device_id: String,
  pub kind:            String,
  pub name:            String,
  pub token:           String,
}

impl VendorDevice {
  /// The local record for a newly observed vendor device.
  pub fn into_device(self, brand: &str, observed_at: Timestamp) -> Device {
    Device {
      brand_device_id: self.brand_device_id,
      brand:           brand.to_owned(),
      kind:            self.kind,
      name:            self.name,
      token:           self.token,
      timestamp:       observed_at,
    }
  }
}

/// A connection to one vendor's sensor API.
pub trait SensorConnection: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  /// Brand stored on devices managed by this connection.
  fn brand(&self) -> &str;

  /// All devices the vendor account can see.
  fn list_devices(&self)
  -> impl Future<Output = Result<Vec<VendorDevice>, Self::Error>> + Send + '_;

  /// Current state of `device`, as one event per reported leaf value.
  fn device_state<'a>(
    &'a self,
    device: &'a Stored<Device>,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + 'a;

  /// Probe the connection.
  fn status(&self) -> impl Future<Output = ConnectionStatus> + Send + '_;
}
