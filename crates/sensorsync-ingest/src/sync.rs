//! The device/event sync job.
//!
//! A run has two phases. [`update_managed_devices`] inserts every vendor
//! device not yet known locally, matched on the vendor-assigned identity.
//! [`store_all_sensor_data`] then polls each managed device and appends one
//! event per reported value.
//!
//! Failing to list vendor devices, to look a device up, or to page through
//! the managed devices ends the run. A device whose state cannot be read, or
//! an event that cannot be stored, is logged and skipped.

use std::time::Duration;

use sensorsync_core::{
  DeviceFilter, ErrorKind, JobCategory, RecordId, RetryPolicy, Timestamp,
  sensor::SensorConnection,
  store::{DataStore, Store},
};

use crate::{Error, JobHandle, Result};

/// Pause between two device state requests.
pub const DEFAULT_DEVICE_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SyncOptions {
  /// Applied to every vendor call and every insert. Device state requests
  /// additionally never retry vendor business errors.
  pub retry:        RetryPolicy,
  pub device_delay: Duration,
}

impl Default for SyncOptions {
  fn default() -> Self {
    Self {
      retry:        RetryPolicy::default(),
      device_delay: DEFAULT_DEVICE_DELAY,
    }
  }
}

/// Counters of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
  pub devices_added:  usize,
  pub devices_polled: usize,
  pub devices_failed: usize,
  pub events_stored:  usize,
  pub events_failed:  usize,
}

/// Insert every vendor device that has no local record yet. Returns the
/// number of devices inserted.
pub async fn update_managed_devices<D, S>(
  db: &D,
  sensor: &S,
  job: &JobHandle<'_, D>,
  retry: &RetryPolicy,
) -> Result<usize>
where
  D: DataStore,
  S: SensorConnection,
{
  let listed = retry
    .run(|| sensor.list_devices())
    .await
    .map_err(Error::sensor("list vendor devices"))?;
  job.debug(format!("{} lists {} devices", sensor.brand(), listed.len())).await;

  let mut added = 0;
  for vendor in listed {
    let mut matches = db
      .devices()
      .get(DeviceFilter::by_brand_device_id(vendor.brand_device_id.clone()));
    let first = matches.next().await.map_err(Error::store("look up device"))?;
    if first.is_some() {
      if matches.next().await.map_err(Error::store("look up device"))?.is_some() {
        job.warn(format!("device {} has duplicate entries", vendor.brand_device_id)).await;
      }
      continue;
    }

    let device = vendor.into_device(sensor.brand(), Timestamp::now());
    let id = retry
      .run(|| db.devices().add(device.clone()))
      .await
      .map_err(Error::store("add device"))?;
    job.debug(format!("added device {} as {id}", device.brand_device_id)).await;
    added += 1;
  }

  job.info(format!("{added} devices added")).await;
  Ok(added)
}

/// Poll every device managed for `sensor`'s brand and store its state.
pub async fn store_all_sensor_data<D, S>(
  db: &D,
  sensor: &S,
  job: &JobHandle<'_, D>,
  options: &SyncOptions,
) -> Result<SyncReport>
where
  D: DataStore,
  S: SensorConnection,
{
  let state_retry = options.retry.clone().excluding(ErrorKind::VendorBusiness);
  let mut report = SyncReport::default();
  let mut devices = db.devices().get(DeviceFilter::by_brand(sensor.brand()));

  while let Some(device) = devices.next().await.map_err(Error::store("page managed devices"))? {
    if report.devices_polled > 0 && !options.device_delay.is_zero() {
      tokio::time::sleep(options.device_delay).await;
    }
    report.devices_polled += 1;

    let events = match state_retry.run(|| sensor.device_state(&device)).await {
      Ok(events) => events,
      Err(error) => {
        report.devices_failed += 1;
        job
          .error(format!(
            "failed to read state of device {} ({}): {error}",
            device.brand_device_id, device.name
          ))
          .await;
        continue;
      }
    };

    for event in events {
      match options.retry.run(|| db.events().add(event.clone())).await {
        Ok(_) => report.events_stored += 1,
        Err(error) => {
          report.events_failed += 1;
          job
            .error(format!(
              "failed to store {} of device {}: {error}",
              event.field_name, device.brand_device_id
            ))
            .await;
        }
      }
    }
  }

  job
    .info(format!(
      "polled {} devices ({} failed), stored {} events ({} failed)",
      report.devices_polled, report.devices_failed, report.events_stored, report.events_failed
    ))
    .await;
  Ok(report)
}

/// Run both phases under a new `SYNC` job, child of the `parent` job if
/// given.
///
/// The job is closed whether or not the run succeeds.
pub async fn run_sync<D, S>(
  db: &D,
  sensor: &S,
  parent: Option<&RecordId>,
  options: &SyncOptions,
) -> Result<SyncReport>
where
  D: DataStore,
  S: SensorConnection,
{
  let job = JobHandle::start(db, JobCategory::Sync, parent.cloned()).await?;

  let result = async {
    let added = update_managed_devices(db, sensor, &job, &options.retry).await?;
    let report = store_all_sensor_data(db, sensor, &job, options).await?;
    Ok::<_, Error>(SyncReport { devices_added: added, ..report })
  }
  .await;

  if let Err(error) = &result {
    job.error(format!("sync failed: {error}")).await;
  }
  job.finish().await?;
  result
}
