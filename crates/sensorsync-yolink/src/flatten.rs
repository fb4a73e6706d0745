//! Flattening of nested state payloads into dotted-path leaf pairs.

use serde_json::Value as Json;

/// Every leaf of `value` as a `(dotted.path, text)` pair, sorted by path.
///
/// Strings are taken verbatim, `null` becomes the empty string, and any other
/// leaf (numbers, booleans, arrays) is rendered as JSON text. A non-object
/// root has no named leaves and yields nothing.
pub fn flatten(value: &Json) -> Vec<(String, String)> {
  let mut pairs = Vec::new();
  if let Json::Object(map) = value {
    for (key, child) in map {
      collect(key.clone(), child, &mut pairs);
    }
  }
  pairs.sort_by(|a, b| a.0.cmp(&b.0));
  pairs
}

fn collect(path: String, value: &Json, pairs: &mut Vec<(String, String)>) {
  match value {
    Json::Object(map) => {
      for (key, child) in map {
        collect(format!("{path}.{key}"), child, pairs);
      }
    }
    Json::String(s) => pairs.push((path, s.clone())),
    Json::Null => pairs.push((path, String::new())),
    other => pairs.push((path, other.to_string())),
  }
}
