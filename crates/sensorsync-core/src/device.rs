//! Devices: the sensors whose state is polled.

use crate::{entity, value::Timestamp};

entity! {
  table = "devices", key = "device_id";

  /// A sensor as known to the local store.
  pub struct Device / DeviceFilter {
    /// Identifier assigned by the vendor; the dedup key during sync.
    pub brand_device_id: String => "brand_device_id",
    pub brand:           String => "device_brand",
    /// Vendor device type, e.g. `THSensor`.
    pub kind:            String => "device_kind",
    pub name:            String => "device_name",
    /// Per-device token the vendor requires for state requests.
    pub token:           String => "device_token",
    /// When the device was first observed.
    pub timestamp:       Timestamp => "device_timestamp",
  }
}

impl DeviceFilter {
  /// Match devices of one vendor.
  pub fn by_brand(brand: impl Into<String>) -> Self {
    Self { brand: Some(brand.into()), ..Self::default() }
  }

  /// Match devices with the given vendor-assigned identity.
  pub fn by_brand_device_id(id: impl Into<String>) -> Self {
    Self { brand_device_id: Some(id.into()), ..Self::default() }
  }
}
