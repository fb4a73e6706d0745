//! Core types and trait definitions for sensorsync.
//!
//! This crate is free of HTTP and database dependencies. It defines the four
//! persisted entities, the ordered field contract every store relies on, the
//! cursor paginator, the retry policy, and the traits implemented by storage
//! backends and vendor connections.

// Native `async fn` in traits; the `Send` bounds are spelled out explicitly.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod pagination;
pub mod record;
pub mod retry;
pub mod sensor;
pub mod store;
pub mod value;

mod device;
mod event;
mod job;
mod log;

pub use device::{Device, DeviceFilter};
pub use error::{Classify, Error, ErrorKind, Result};
pub use event::{Event, EventFilter};
pub use job::{Job, JobCategory, JobFilter};
pub use log::{Log, LogFilter, LogLevel};
pub use pagination::{PAGE_SIZE, Page, PageSource, Paginator};
pub use record::{Closable, Entity, Filter, Stored, Timestamped};
pub use retry::RetryPolicy;
pub use value::{Field, RecordId, Timestamp, Value};
