//! SQLite backend for sensorsync.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. A single generic [`Table`] implements
//! the store traits for every entity; statements are built from the entity's
//! declared column order by the pure functions in [`query`].

mod database;
mod encode;
mod export;
mod schema;
mod table;

pub mod error;
pub mod query;

pub use database::{REQUEST_TIMEOUT, SqliteDatabase, StoreOptions};
pub use error::{Error, Result};
pub use export::export_path;
pub use schema::SqlEntity;
pub use table::{SqlPages, Table};
