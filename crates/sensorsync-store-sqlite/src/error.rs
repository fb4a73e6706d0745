//! Error type for `sensorsync-store-sqlite`.

use std::time::Duration;

use sensorsync_core::{Classify, ErrorKind, RecordId, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to open database: {0}")]
  Connection(#[source] tokio_rusqlite::Error),

  #[error("database error on {table}: {source}")]
  Database {
    table:  &'static str,
    #[source]
    source: tokio_rusqlite::Error,
  },

  #[error("{operation} on {table} timed out after {timeout:?}")]
  Timeout {
    table:     &'static str,
    operation: &'static str,
    timeout:   Duration,
  },

  #[error("failed to write {table} with values {values:?}: {source}")]
  Write {
    table:  &'static str,
    values: Vec<Value>,
    #[source]
    source: tokio_rusqlite::Error,
  },

  /// An update, delete or close matched no row.
  #[error("no row in {table} with {primary_key} = {id}")]
  NotFound {
    table:       &'static str,
    primary_key: &'static str,
    id:          RecordId,
  },

  #[error("failed to scan row from {table}: {source}")]
  Scan {
    table:  &'static str,
    #[source]
    source: sensorsync_core::Error,
  },

  #[error("failed to fetch {table} page after {cursor:?}: {source}")]
  Fetch {
    table:  &'static str,
    cursor: Option<RecordId>,
    #[source]
    source: Box<Error>,
  },

  #[error("export io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("export task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Connection(_) | Error::Database { .. } => ErrorKind::Connection,
      Error::Timeout { .. } => ErrorKind::Timeout,
      Error::Write { .. } => ErrorKind::Write,
      Error::NotFound { .. } => ErrorKind::NotFound,
      Error::Scan { .. } => ErrorKind::Scan,
      Error::Fetch { source, .. } => source.kind(),
      Error::Io(_) | Error::Csv(_) | Error::Join(_) => ErrorKind::Io,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
