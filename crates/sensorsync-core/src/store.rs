//! Store traits implemented by storage backends.
//!
//! [`Store`] is the generic CRUD + pagination + export surface shared by every
//! entity. The narrower traits add operations that only make sense for some
//! entities. [`DataStore`] bundles one store per entity behind a single
//! connection. Higher layers (`sensorsync-ingest`) depend on these traits, not
//! on any concrete backend.

use std::{future::Future, path::PathBuf};

use crate::{
  Device, Event, Job, Log,
  error::Classify,
  pagination::{PageSource, Paginator},
  record::{Entity, Stored},
  sensor::ConnectionStatus,
  value::{RecordId, Timestamp},
};

// ─── Per-entity stores ───────────────────────────────────────────────────────

pub trait Store<E: Entity>: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;
  type Pages: PageSource<Item = Stored<E>, Error = Self::Error>;

  /// Persist `item` under a freshly allocated identity and return it.
  fn add(&self, item: E) -> impl Future<Output = Result<RecordId, Self::Error>> + Send + '_;

  /// Lazily query records matching `filter`. No I/O happens until the
  /// returned paginator is first advanced.
  fn get(&self, filter: E::Filter) -> Paginator<Self::Pages>;

  /// Remove a record. Fails if no row had its identity.
  fn delete<'a>(
    &'a self,
    item: &'a Stored<E>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Create the backing table if missing; drop and recreate it first when
  /// `destructive` is set.
  fn setup(&self, destructive: bool) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Drain `items` into a CSV file and return its path.
  fn export(
    &self,
    items: Paginator<Self::Pages>,
  ) -> impl Future<Output = Result<PathBuf, Self::Error>> + Send + '_;
}

/// Stores whose records can be replaced in full.
pub trait EditableStore<E: Entity>: Store<E> {
  /// Overwrite every field of the record with `item`'s identity. Fails if no
  /// row had that identity.
  fn edit<'a>(
    &'a self,
    item: &'a Stored<E>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// Stores of timestamped records.
pub trait TimestampedStore<E: Entity>: Store<E> {
  /// Like [`Store::get`], additionally bounded (exclusively) by the record
  /// timestamp.
  fn get_in_time_range(
    &self,
    filter: E::Filter,
    start: Option<Timestamp>,
    end: Option<Timestamp>,
  ) -> Paginator<Self::Pages>;
}

/// Stores of records that can be ended.
pub trait ClosableStore<E: Entity>: Store<E> {
  /// Set the record's end timestamp to now. Fails if no row had its identity.
  fn close<'a>(
    &'a self,
    item: &'a Stored<E>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Connection ──────────────────────────────────────────────────────────────

/// One connection to a backing store, exposing a store per entity.
pub trait DataStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;
  type Devices: EditableStore<Device, Error = Self::Error>;
  type Events: TimestampedStore<Event, Error = Self::Error>;
  type Jobs: TimestampedStore<Job, Error = Self::Error> + ClosableStore<Job, Error = Self::Error>;
  type Logs: TimestampedStore<Log, Error = Self::Error>;

  fn devices(&self) -> &Self::Devices;
  fn events(&self) -> &Self::Events;
  fn jobs(&self) -> &Self::Jobs;
  fn logs(&self) -> &Self::Logs;

  /// Probe the connection.
  fn status(&self) -> impl Future<Output = ConnectionStatus> + Send + '_;
}
