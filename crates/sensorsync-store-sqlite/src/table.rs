//! [`Table`]: the generic SQLite implementation of the store traits.

use std::{future::Future, marker::PhantomData, path::PathBuf, sync::Arc, time::Duration};

use rusqlite::types::Value as SqlValue;
use sensorsync_core::{
  Closable, Entity, Field, Filter, Page, PageSource, Paginator, RecordId, Stored, Timestamp,
  Timestamped, Value,
  store::{ClosableStore, EditableStore, Store, TimestampedStore},
};

use crate::{
  Error, Result,
  encode::{decode_value, encode_values},
  export,
  query::{self, Condition, PageQuery},
  schema::{self, SqlEntity},
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Run `fut` under an operation-scoped deadline.
async fn timed<T>(
  timeout: Duration,
  table: &'static str,
  operation: &'static str,
  fut: impl Future<Output = Result<T>>,
) -> Result<T> {
  match tokio::time::timeout(timeout, fut).await {
    Ok(result) => result,
    Err(_) => Err(Error::Timeout { table, operation, timeout }),
  }
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// The store for one entity, backed by one SQLite table.
///
/// Cloning is cheap; clones share the underlying connection.
#[derive(Clone)]
pub struct Table<E> {
  conn:       tokio_rusqlite::Connection,
  export_dir: Arc<PathBuf>,
  timeout:    Duration,
  _entity:    PhantomData<fn() -> E>,
}

impl<E: SqlEntity> Table<E> {
  pub(crate) fn new(
    conn: tokio_rusqlite::Connection,
    export_dir: Arc<PathBuf>,
    timeout: Duration,
  ) -> Self {
    Self { conn, export_dir, timeout, _entity: PhantomData }
  }

  /// Execute one write statement and return the number of affected rows.
  async fn execute(
    &self,
    operation: &'static str,
    sql: String,
    values: Vec<Value>,
  ) -> Result<usize> {
    let args = encode_values(&values);
    timed(self.timeout, E::TABLE, operation, async move {
      self
        .conn
        .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(args))?))
        .await
        .map_err(|source| Error::Write { table: E::TABLE, values, source })
    })
    .await
  }

  fn expect_row(&self, operation: &'static str, affected: usize, id: &RecordId) -> Result<()> {
    if affected == 0 {
      tracing::warn!(table = E::TABLE, %id, operation, "no row matched");
      return Err(Error::NotFound {
        table:       E::TABLE,
        primary_key: E::primary_key(),
        id:          id.clone(),
      });
    }
    Ok(())
  }

  fn pages(&self, conditions: Vec<Condition>) -> Paginator<SqlPages<E>> {
    Paginator::new(SqlPages {
      conn:    self.conn.clone(),
      query:   query::page_query(E::TABLE, E::COLUMNS, conditions),
      timeout: self.timeout,
      _entity: PhantomData,
    })
  }
}

impl<E: SqlEntity> Store<E> for Table<E> {
  type Error = Error;
  type Pages = SqlPages<E>;

  async fn add(&self, item: E) -> Result<RecordId> {
    let stored = Stored::new(RecordId::generate(), item);
    self
      .execute("insert", query::insert(E::TABLE, E::COLUMNS), stored.spread())
      .await?;
    Ok(stored.id)
  }

  fn get(&self, filter: E::Filter) -> Paginator<SqlPages<E>> {
    self.pages(query::filter_conditions(E::COLUMNS, filter.spread()))
  }

  async fn delete(&self, item: &Stored<E>) -> Result<()> {
    let affected = self
      .execute("delete", query::delete(E::TABLE, E::primary_key()), vec![item.id.to_value()])
      .await?;
    self.expect_row("delete", affected, &item.id)
  }

  async fn setup(&self, destructive: bool) -> Result<()> {
    let mut batch = String::new();
    if destructive {
      tracing::warn!(table = E::TABLE, "dropping table before setup");
      batch.push_str(&schema::drop_table(E::TABLE));
    }
    batch.push_str(E::DDL);

    timed(self.timeout, E::TABLE, "setup", async move {
      self
        .conn
        .call(move |conn| {
          conn.execute_batch(&batch)?;
          Ok(())
        })
        .await
        .map_err(|source| Error::Database { table: E::TABLE, source })
    })
    .await
  }

  async fn export(&self, items: Paginator<SqlPages<E>>) -> Result<PathBuf> {
    export::write_csv(&self.export_dir, items).await
  }
}

impl<E: SqlEntity> EditableStore<E> for Table<E> {
  async fn edit(&self, item: &Stored<E>) -> Result<()> {
    let mut values = item.record.spread();
    values.push(item.id.to_value());
    let affected = self
      .execute("update", query::update(E::TABLE, E::COLUMNS), values)
      .await?;
    self.expect_row("update", affected, &item.id)
  }
}

impl<E: SqlEntity + Timestamped> TimestampedStore<E> for Table<E> {
  fn get_in_time_range(
    &self,
    filter: E::Filter,
    start: Option<Timestamp>,
    end: Option<Timestamp>,
  ) -> Paginator<SqlPages<E>> {
    let mut conditions = query::filter_conditions(E::COLUMNS, filter.spread());
    conditions.extend(query::range_conditions(E::TIMESTAMP_COLUMN, start, end));
    self.pages(conditions)
  }
}

impl<E: SqlEntity + Closable> ClosableStore<E> for Table<E> {
  async fn close(&self, item: &Stored<E>) -> Result<()> {
    let sql = query::set_column(E::TABLE, E::CLOSE_COLUMN, E::primary_key());
    let affected = self
      .execute("close", sql, vec![Timestamp::now().to_value(), item.id.to_value()])
      .await?;
    self.expect_row("close", affected, &item.id)
  }
}

// ─── Page source ─────────────────────────────────────────────────────────────

/// Fetches pages of one prepared query.
pub struct SqlPages<E> {
  conn:    tokio_rusqlite::Connection,
  query:   PageQuery,
  timeout: Duration,
  _entity: PhantomData<fn() -> E>,
}

impl<E: SqlEntity> SqlPages<E> {
  pub fn sql(&self) -> &str { &self.query.sql }

  async fn fetch(&self, cursor: Option<&RecordId>) -> Result<Page<Stored<E>>> {
    let sql = self.query.sql.clone();
    let args = encode_values(&self.query.args_after(cursor.map(RecordId::as_str)));

    let rows: Vec<Vec<SqlValue>> = timed(self.timeout, E::TABLE, "select", async move {
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&sql)?;
          let width = stmt.column_count();
          let rows = stmt
            .query_map(rusqlite::params_from_iter(args), |row| {
              (0..width)
                .map(|i| row.get::<_, SqlValue>(i))
                .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await
        .map_err(|source| Error::Database { table: E::TABLE, source })
    })
    .await?;

    let items = rows
      .into_iter()
      .map(|row| {
        Stored::<E>::from_values(row.into_iter().map(decode_value).collect())
          .map_err(|source| Error::Scan { table: E::TABLE, source })
      })
      .collect::<Result<Vec<_>>>()?;

    let next_cursor = items.last().map(|item| item.id.clone());
    Ok(Page { items, next_cursor })
  }
}

impl<E: SqlEntity> PageSource for SqlPages<E> {
  type Item = Stored<E>;
  type Error = Error;

  async fn fetch_page(&self, cursor: Option<RecordId>) -> Result<Page<Stored<E>>> {
    let fetched = self.fetch(cursor.as_ref()).await;
    fetched.map_err(|source| Error::Fetch {
      table: E::TABLE,
      cursor,
      source: Box::new(source),
    })
  }
}
