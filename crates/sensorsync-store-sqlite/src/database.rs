//! [`SqliteDatabase`]: one connection, one [`Table`] per entity.

use std::{path::Path, path::PathBuf, sync::Arc, time::Duration};

use sensorsync_core::{
  Device, Event, Job, Log, sensor::ConnectionStatus, store::DataStore, store::Store,
};

use crate::{Error, Result, schema::CONNECTION_PRAGMAS, table::Table};

/// Deadline applied to every individual database operation.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Knobs for [`SqliteDatabase::open`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
  /// Directory export files are written to.
  pub export_dir:        PathBuf,
  /// Drop and recreate every table while opening.
  pub destructive_setup: bool,
  pub request_timeout:   Duration,
}

impl Default for StoreOptions {
  fn default() -> Self {
    Self {
      export_dir:        PathBuf::from("exports"),
      destructive_setup: false,
      request_timeout:   REQUEST_TIMEOUT,
    }
  }
}

/// A SQLite-backed [`DataStore`].
///
/// Cloning is cheap; all clones share one connection thread.
#[derive(Clone)]
pub struct SqliteDatabase {
  conn:    tokio_rusqlite::Connection,
  timeout: Duration,
  devices: Table<Device>,
  events:  Table<Event>,
  jobs:    Table<Job>,
  logs:    Table<Log>,
}

impl SqliteDatabase {
  /// Open (creating if necessary) the database at `path` and set up every
  /// table.
  pub async fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
    let path = path.as_ref().to_owned();
    tracing::debug!(path = %path.display(), "opening database");
    let conn = tokio_rusqlite::Connection::open(path).await.map_err(Error::Connection)?;
    Self::init(conn, options).await
  }

  /// Open an in-memory database, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    Self::open_in_memory_with(StoreOptions::default()).await
  }

  pub async fn open_in_memory_with(options: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(Error::Connection)?;
    Self::init(conn, options).await
  }

  async fn init(conn: tokio_rusqlite::Connection, options: StoreOptions) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(())
      })
      .await
      .map_err(Error::Connection)?;

    let export_dir = Arc::new(options.export_dir);
    let timeout = options.request_timeout;
    let db = Self {
      devices: Table::new(conn.clone(), export_dir.clone(), timeout),
      events: Table::new(conn.clone(), export_dir.clone(), timeout),
      jobs: Table::new(conn.clone(), export_dir.clone(), timeout),
      logs: Table::new(conn.clone(), export_dir, timeout),
      conn,
      timeout,
    };
    db.setup(options.destructive_setup).await?;
    Ok(db)
  }

  /// Create every table, referenced tables first.
  pub async fn setup(&self, destructive: bool) -> Result<()> {
    self.devices.setup(destructive).await?;
    self.events.setup(destructive).await?;
    self.jobs.setup(destructive).await?;
    self.logs.setup(destructive).await?;
    Ok(())
  }

  async fn ping(&self) -> Result<()> {
    let ping = self.conn.call(|conn| {
      conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
      Ok(())
    });
    match tokio::time::timeout(self.timeout, ping).await {
      Ok(result) => result.map_err(Error::Connection),
      Err(_) => Err(Error::Timeout {
        table:     "sqlite",
        operation: "ping",
        timeout:   self.timeout,
      }),
    }
  }
}

impl DataStore for SqliteDatabase {
  type Error = Error;
  type Devices = Table<Device>;
  type Events = Table<Event>;
  type Jobs = Table<Job>;
  type Logs = Table<Log>;

  fn devices(&self) -> &Table<Device> { &self.devices }

  fn events(&self) -> &Table<Event> { &self.events }

  fn jobs(&self) -> &Table<Job> { &self.jobs }

  fn logs(&self) -> &Table<Log> { &self.logs }

  async fn status(&self) -> ConnectionStatus {
    match self.ping().await {
      Ok(()) => ConnectionStatus::Good,
      Err(error) => ConnectionStatus::Bad(error.to_string()),
    }
  }
}
