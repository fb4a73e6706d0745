//! Ingestion jobs for sensorsync.
//!
//! [`run_sync`] reconciles the vendor device list with the local store and
//! appends one event per reported state value. Every run is attributed to a
//! job row through an explicit [`JobHandle`], which also persists the run's
//! log lines. [`Scheduler`] repeats a run on a fixed interval until stopped.

#![allow(async_fn_in_trait)]

mod job;
mod scheduler;
mod sync;

pub mod error;

pub use error::{Error, Result};
pub use job::JobHandle;
pub use scheduler::Scheduler;
pub use sync::{
  DEFAULT_DEVICE_DELAY, SyncOptions, SyncReport, run_sync, store_all_sensor_data,
  update_managed_devices,
};
