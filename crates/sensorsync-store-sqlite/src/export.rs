//! CSV export of a drained paginator.
//!
//! Rows are fetched on the runtime and handed over a bounded channel to a
//! blocking task that owns the file, so disk writes never stall the runtime.

use std::{
  fs::{File, OpenOptions},
  io,
  path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use sensorsync_core::{Entity, PAGE_SIZE, Paginator, RecordId};
use tokio::sync::mpsc;

use crate::{Result, schema::SqlEntity, table::SqlPages};

/// Timestamp prefix of export file names.
pub const EXPORT_FILE_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// `<dir>/<YYYY-MM-DD_HH-MM-SS>_<table>.csv`.
pub fn export_path(dir: &Path, table: &str, now: DateTime<Utc>) -> PathBuf {
  numbered_export_path(dir, table, now, 0)
}

/// Like [`export_path`], with `-<n>` before the extension when `n > 0`.
fn numbered_export_path(dir: &Path, table: &str, now: DateTime<Utc>, n: u32) -> PathBuf {
  let stamp = now.format(EXPORT_FILE_TIME_FORMAT);
  match n {
    0 => dir.join(format!("{stamp}_{table}.csv")),
    n => dir.join(format!("{stamp}_{table}-{n}.csv")),
  }
}

/// Create a fresh export file. An existing file is never truncated; a later
/// export in the same second gets a numbered name instead.
fn create_export_file(dir: &Path, table: &str, now: DateTime<Utc>) -> Result<(PathBuf, File)> {
  std::fs::create_dir_all(dir)?;
  let mut n = 0;
  loop {
    let path = numbered_export_path(dir, table, now, n);
    match OpenOptions::new().write(true).create_new(true).open(&path) {
      Ok(file) => return Ok((path, file)),
      Err(error) if error.kind() == io::ErrorKind::AlreadyExists => n += 1,
      Err(error) => return Err(error.into()),
    }
  }
}

/// Write a header of column names, then one row per item.
///
/// A failed page fetch ends the export with whatever was written so far; a
/// failed row write is skipped.
pub(crate) async fn write_csv<E: SqlEntity>(
  dir: &Path,
  mut items: Paginator<SqlPages<E>>,
) -> Result<PathBuf> {
  let table = E::TABLE;
  let columns = E::COLUMNS;

  let dir = dir.to_owned();
  let (path, file) =
    tokio::task::spawn_blocking(move || create_export_file(&dir, table, Utc::now())).await??;

  let (rows, mut pending) = mpsc::channel::<(RecordId, Vec<String>)>(PAGE_SIZE);
  let writer = tokio::task::spawn_blocking(move || -> Result<usize> {
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(columns)?;
    let mut written = 0usize;
    while let Some((id, record)) = pending.blocking_recv() {
      match writer.write_record(&record) {
        Ok(()) => written += 1,
        Err(error) => tracing::error!(table, %id, %error, "skipped row"),
      }
    }
    writer.flush()?;
    Ok(written)
  });

  loop {
    let item = match items.next().await {
      Ok(Some(item)) => item,
      Ok(None) => break,
      Err(error) => {
        tracing::error!(table, %error, "export stopped early");
        break;
      }
    };
    // The writer only hangs up after failing; its error is returned below.
    if rows.send((item.id.clone(), item.export_spread())).await.is_err() {
      break;
    }
  }
  drop(rows);

  let written = writer.await??;
  tracing::info!(table, rows = written, path = %path.display(), "export written");
  Ok(path)
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn path_is_timestamp_then_table() {
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
    assert_eq!(
      export_path(Path::new("/tmp/out"), "events", now),
      PathBuf::from("/tmp/out/2024-03-09_07-05-01_events.csv")
    );
  }

  #[test]
  fn existing_export_is_never_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
    std::fs::write(export_path(dir.path(), "jobs", now), "kept").unwrap();

    let (second, _) = create_export_file(dir.path(), "jobs", now).unwrap();
    let (third, _) = create_export_file(dir.path(), "jobs", now).unwrap();

    assert_eq!(second, dir.path().join("2024-03-09_07-05-01_jobs-1.csv"));
    assert_eq!(third, dir.path().join("2024-03-09_07-05-01_jobs-2.csv"));
    assert_eq!(std::fs::read_to_string(export_path(dir.path(), "jobs", now)).unwrap(), "kept");
  }
}
