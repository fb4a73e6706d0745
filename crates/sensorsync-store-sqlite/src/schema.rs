//! Table DDL per entity.
//!
//! Column order in each `CREATE TABLE` matches the entity's declared column
//! list. Every statement is idempotent thanks to `IF NOT EXISTS`.

use sensorsync_core::{Device, Entity, Event, Job, Log};

/// PRAGMAs applied once per connection.
pub const CONNECTION_PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// An entity with a SQLite table definition.
pub trait SqlEntity: Entity {
  const DDL: &'static str;
}

impl SqlEntity for Device {
  const DDL: &'static str = "
CREATE TABLE IF NOT EXISTS devices (
    device_id        TEXT    PRIMARY KEY NOT NULL,
    brand_device_id  TEXT    NOT NULL,
    device_brand     TEXT    NOT NULL,
    device_kind      TEXT    NOT NULL,
    device_name      TEXT    NOT NULL,
    device_token     TEXT    NOT NULL,
    device_timestamp INTEGER NOT NULL
);

-- Not unique: duplicate vendor ids are detected and logged by the sync job.
CREATE INDEX IF NOT EXISTS devices_brand_device_idx ON devices(brand_device_id);
";
}

impl SqlEntity for Event {
  const DDL: &'static str = "
CREATE TABLE IF NOT EXISTS events (
    event_id               TEXT    PRIMARY KEY NOT NULL,
    request_device_id      TEXT    NOT NULL,
    event_source_device_id TEXT    NOT NULL REFERENCES devices(device_id),
    response_timestamp     INTEGER NOT NULL,
    event_timestamp        INTEGER NOT NULL,
    field_name             TEXT    NOT NULL,
    field_value            TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS events_source_idx    ON events(event_source_device_id);
CREATE INDEX IF NOT EXISTS events_timestamp_idx ON events(event_timestamp);
";
}

impl SqlEntity for Job {
  const DDL: &'static str = "
CREATE TABLE IF NOT EXISTS jobs (
    job_id              TEXT    PRIMARY KEY NOT NULL,
    parent_job_id       TEXT,             -- unvalidated reference to jobs(job_id)
    job_category        TEXT    NOT NULL, -- 'MAIN' | 'EXPORT' | 'IMPORT' | 'SYNC'
    job_start_timestamp INTEGER NOT NULL,
    job_end_timestamp   INTEGER           -- NULL while running
);
";
}

impl SqlEntity for Log {
  const DDL: &'static str = "
CREATE TABLE IF NOT EXISTS logs (
    log_id          TEXT    PRIMARY KEY NOT NULL,
    job_id          TEXT    NOT NULL REFERENCES jobs(job_id),
    log_level       INTEGER NOT NULL, -- 1 error .. 4 debug
    log_stack_trace TEXT    NOT NULL,
    log_description TEXT    NOT NULL,
    log_timestamp   INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS logs_job_idx ON logs(job_id);
";
}

/// Drop `table` with foreign-key enforcement suspended, so tables can be
/// dropped regardless of reference order.
pub fn drop_table(table: &str) -> String {
  format!(
    "PRAGMA foreign_keys = OFF;
     DROP TABLE IF EXISTS {table};
     PRAGMA foreign_keys = ON;"
  )
}
