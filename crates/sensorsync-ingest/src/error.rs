//! Error type for `sensorsync-ingest`.

use sensorsync_core::{Classify, ErrorKind};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error while trying to {operation}: {source}")]
  Store {
    operation: &'static str,
    kind:      ErrorKind,
    #[source]
    source:    BoxError,
  },

  #[error("sensor error while trying to {operation}: {source}")]
  Sensor {
    operation: &'static str,
    kind:      ErrorKind,
    #[source]
    source:    BoxError,
  },

  #[error("scheduler interval must be non-zero")]
  ZeroInterval,

  #[error("scheduled task panicked: {0}")]
  Join(#[from] tokio::task::JoinError),
}

impl Error {
  /// Wrap a store error, keeping its classification.
  pub fn store<E>(operation: &'static str) -> impl FnOnce(E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    move |source| Error::Store {
      operation,
      kind: source.kind(),
      source: Box::new(source),
    }
  }

  /// Wrap a vendor connection error, keeping its classification.
  pub fn sensor<E>(operation: &'static str) -> impl FnOnce(E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    move |source| Error::Sensor {
      operation,
      kind: source.kind(),
      source: Box::new(source),
    }
  }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Store { kind, .. } | Error::Sensor { kind, .. } => *kind,
      Error::ZeroInterval => ErrorKind::Config,
      Error::Join(_) => ErrorKind::Io,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
