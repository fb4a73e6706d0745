//! Conversions between driver-independent [`Value`]s and SQLite values.

use rusqlite::types::Value as SqlValue;
use sensorsync_core::Value;

pub fn encode_value(value: &Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Integer(i) => SqlValue::Integer(*i),
    Value::Text(s) => SqlValue::Text(s.clone()),
  }
}

pub fn encode_values(values: &[Value]) -> Vec<SqlValue> {
  values.iter().map(encode_value).collect()
}

/// SQLite affinity can hand back reals or blobs for columns declared as
/// something else; those are carried as text so the field decoder reports the
/// mismatch.
pub fn decode_value(value: SqlValue) -> Value {
  match value {
    SqlValue::Null => Value::Null,
    SqlValue::Integer(i) => Value::Integer(i),
    SqlValue::Text(s) => Value::Text(s),
    SqlValue::Real(f) => Value::Text(f.to_string()),
    SqlValue::Blob(b) => Value::Text(String::from_utf8_lossy(&b).into_owned()),
  }
}
