//! Logs: persisted log lines attributed to a job.

use std::fmt;

use crate::{
  entity,
  record::Timestamped,
  value::{Field, RecordId, Timestamp, Value},
};

/// Severity, stored as an integer where lower is more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
  Error = 1,
  Warn  = 2,
  Info  = 3,
  Debug = 4,
}

impl LogLevel {
  pub fn from_code(code: i64) -> Option<Self> {
    match code {
      1 => Some(LogLevel::Error),
      2 => Some(LogLevel::Warn),
      3 => Some(LogLevel::Info),
      4 => Some(LogLevel::Debug),
      _ => None,
    }
  }

  pub fn code(self) -> i64 { self as i64 }
}

impl fmt::Display for LogLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      LogLevel::Error => "ERROR",
      LogLevel::Warn => "WARN",
      LogLevel::Info => "INFO",
      LogLevel::Debug => "DEBUG",
    })
  }
}

impl Field for LogLevel {
  const TYPE_NAME: &'static str = "log level";

  fn to_value(&self) -> Value { Value::Integer(self.code()) }

  fn from_value(value: Value) -> Option<Self> {
    match value {
      Value::Integer(code) => Self::from_code(code),
      _ => None,
    }
  }

  fn export(&self) -> String { self.code().to_string() }
}

entity! {
  table = "logs", key = "log_id";

  /// One log line.
  pub struct Log / LogFilter {
    pub job_id:      RecordId => "job_id",
    pub level:       LogLevel => "log_level",
    pub stack_trace: String => "log_stack_trace",
    pub description: String => "log_description",
    pub timestamp:   Timestamp => "log_timestamp",
  }
}

impl Timestamped for Log {
  const TIMESTAMP_COLUMN: &'static str = "log_timestamp";
}
