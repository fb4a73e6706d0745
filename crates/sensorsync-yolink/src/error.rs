//! Error type for `sensorsync-yolink`.

use reqwest::StatusCode;
use sensorsync_core::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  #[error("request to {url} failed: {source}")]
  Http {
    url:    String,
    #[source]
    source: reqwest::Error,
  },

  #[error("{url} answered {status}")]
  Status { url: String, status: StatusCode },

  /// A well-formed response carrying a non-success code. Never worth
  /// retrying.
  #[error("{method} returned code {code}: {desc}")]
  VendorBusiness {
    method: String,
    code:   String,
    desc:   String,
  },

  #[error("{method} response carried no data")]
  MissingData { method: String },

  #[error("failed to decode {what}: {source}")]
  Decode {
    what:   &'static str,
    #[source]
    source: serde_json::Error,
  },

  #[error("state of device {device} has no reportAt")]
  MissingReportTimestamp { device: String },

  #[error("state of device {device} has unreadable reportAt {value}")]
  InvalidReportTimestamp { device: String, value: String },

  #[error("device {device} is a {brand} device")]
  WrongBrand { device: String, brand: String },

  #[error("no token to refresh")]
  NoToken,

  #[error("connection unhealthy: {0}")]
  Unhealthy(String),
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Client(_) | Error::WrongBrand { .. } => ErrorKind::Config,
      Error::Http { source, .. } if source.is_timeout() => ErrorKind::Timeout,
      Error::Http { source, .. } if source.is_decode() => ErrorKind::Decode,
      Error::Http { .. } | Error::Status { .. } | Error::NoToken | Error::Unhealthy(_) => {
        ErrorKind::Connection
      }
      Error::VendorBusiness { .. } => ErrorKind::VendorBusiness,
      Error::MissingData { .. }
      | Error::Decode { .. }
      | Error::MissingReportTimestamp { .. }
      | Error::InvalidReportTimestamp { .. } => ErrorKind::Decode,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
