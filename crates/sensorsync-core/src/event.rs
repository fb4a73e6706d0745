//! Events: one observed field value of one device at one point in time.

use crate::{
  entity,
  record::Timestamped,
  value::{RecordId, Timestamp},
};

entity! {
  table = "events", key = "event_id";

  /// A single leaf value from a device state report.
  pub struct Event / EventFilter {
    /// Vendor identity the state request was addressed to.
    pub request_device_id:      String => "request_device_id",
    /// Local device that produced the value.
    pub event_source_device_id: RecordId => "event_source_device_id",
    /// Vendor-side time the response was generated.
    pub response_timestamp:     Timestamp => "response_timestamp",
    /// Time the device reported the value.
    pub event_timestamp:        Timestamp => "event_timestamp",
    /// Dotted path of the value within the report, e.g. `state.temperature`.
    pub field_name:             String => "field_name",
    pub field_value:            String => "field_value",
  }
}

impl Timestamped for Event {
  const TIMESTAMP_COLUMN: &'static str = "event_timestamp";
}
