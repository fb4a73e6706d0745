//! Column values and the [`Field`] contract between record fields and the
//! store.
//!
//! Every field type that can appear in an entity knows how to turn itself into
//! a [`Value`] (for inserts and filters), how to read itself back from one
//! (for row scans), and how to render itself for CSV export.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Value ───────────────────────────────────────────────────────────────────

/// A single driver-independent column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  Null,
  Integer(i64),
  Text(String),
}

impl Value {
  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Null => "null",
      Value::Integer(_) => "integer",
      Value::Text(_) => "text",
    }
  }
}

// ─── Field ───────────────────────────────────────────────────────────────────

/// A type that can be stored in a single column.
pub trait Field: Sized {
  /// Human-readable name used in scan errors.
  const TYPE_NAME: &'static str;

  fn to_value(&self) -> Value;

  /// Returns `None` when `value` does not hold this type.
  fn from_value(value: Value) -> Option<Self>;

  /// Text written to CSV exports.
  fn export(&self) -> String;
}

impl Field for String {
  const TYPE_NAME: &'static str = "text";

  fn to_value(&self) -> Value { Value::Text(self.clone()) }

  fn from_value(value: Value) -> Option<Self> {
    match value {
      Value::Text(s) => Some(s),
      _ => None,
    }
  }

  fn export(&self) -> String { self.clone() }
}

impl Field for i64 {
  const TYPE_NAME: &'static str = "integer";

  fn to_value(&self) -> Value { Value::Integer(*self) }

  fn from_value(value: Value) -> Option<Self> {
    match value {
      Value::Integer(i) => Some(i),
      _ => None,
    }
  }

  fn export(&self) -> String { self.to_string() }
}

impl<T: Field> Field for Option<T> {
  const TYPE_NAME: &'static str = T::TYPE_NAME;

  fn to_value(&self) -> Value {
    match self {
      Some(inner) => inner.to_value(),
      None => Value::Null,
    }
  }

  fn from_value(value: Value) -> Option<Self> {
    match value {
      Value::Null => Some(None),
      other => T::from_value(other).map(Some),
    }
  }

  fn export(&self) -> String {
    self.as_ref().map(Field::export).unwrap_or_default()
  }
}

// ─── RecordId ────────────────────────────────────────────────────────────────

/// The identity of a stored record.
///
/// Identities are UUIDv7 strings: unique, and lexically ordered by creation
/// time, which makes them usable as a "greater than last seen" pagination
/// cursor.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
  /// Allocate a fresh, time-ordered identity.
  pub fn generate() -> Self { Self(Uuid::now_v7().hyphenated().to_string()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<String> for RecordId {
  fn from(s: String) -> Self { Self(s) }
}

impl From<&str> for RecordId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl Field for RecordId {
  const TYPE_NAME: &'static str = "record id";

  fn to_value(&self) -> Value { Value::Text(self.0.clone()) }

  fn from_value(value: Value) -> Option<Self> { String::from_value(value).map(Self) }

  fn export(&self) -> String { self.0.clone() }
}

// ─── Timestamp ───────────────────────────────────────────────────────────────

/// Export format for timestamps, readable by spreadsheet tools.
pub const EXPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Whole seconds since the Unix epoch, UTC.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
  pub fn now() -> Self { Self(Utc::now().timestamp()) }

  pub const fn from_secs(secs: i64) -> Self { Self(secs) }

  pub const fn as_secs(self) -> i64 { self.0 }

  pub fn to_datetime(self) -> Option<DateTime<Utc>> { DateTime::from_timestamp(self.0, 0) }
}

impl From<DateTime<Utc>> for Timestamp {
  fn from(dt: DateTime<Utc>) -> Self { Self(dt.timestamp()) }
}

impl fmt::Display for Timestamp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.to_datetime() {
      Some(dt) => write!(f, "{}", dt.format(EXPORT_TIME_FORMAT)),
      None => write!(f, "{}", self.0),
    }
  }
}

impl Field for Timestamp {
  const TYPE_NAME: &'static str = "timestamp";

  fn to_value(&self) -> Value { Value::Integer(self.0) }

  fn from_value(value: Value) -> Option<Self> { i64::from_value(value).map(Self) }

  fn export(&self) -> String { self.to_string() }
}
