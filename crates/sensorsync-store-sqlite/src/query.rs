//! Statement builders.
//!
//! Pure functions from table metadata and column order to SQL text plus
//! positional arguments. Nothing here touches the driver, so the ordering
//! rules can be tested in isolation: arguments are always produced in the
//! same order as the column list they were built from.

use sensorsync_core::{PAGE_SIZE, Timestamp, Value};

/// One predicate and its argument, if it takes one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
  pub clause: String,
  pub arg:    Option<Value>,
}

/// A page query. The cursor and page size are appended to `args` at fetch
/// time, in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
  pub sql:  String,
  pub args: Vec<Value>,
}

impl PageQuery {
  /// Arguments for the page after `cursor`; no cursor starts from the
  /// beginning.
  pub fn args_after(&self, cursor: Option<&str>) -> Vec<Value> {
    let mut args = self.args.clone();
    args.push(Value::Text(cursor.unwrap_or_default().to_owned()));
    args.push(Value::Integer(PAGE_SIZE as i64));
    args
  }
}

/// Equality predicates for each present filter field, in column order. A
/// present `Null` matches rows where the column is NULL.
pub fn filter_conditions(columns: &[&str], filter: Vec<Option<Value>>) -> Vec<Condition> {
  debug_assert_eq!(columns.len(), filter.len(), "filter spread must cover every column");
  columns
    .iter()
    .zip(filter)
    .filter_map(|(column, value)| match value? {
      Value::Null => Some(Condition { clause: format!("{column} IS NULL"), arg: None }),
      arg => Some(Condition { clause: format!("{column} = ?"), arg: Some(arg) }),
    })
    .collect()
}

/// Exclusive bounds on a timestamp column.
pub fn range_conditions(
  column: &str,
  start: Option<Timestamp>,
  end: Option<Timestamp>,
) -> Vec<Condition> {
  let lower = start.map(|ts| Condition {
    clause: format!("{column} > ?"),
    arg:    Some(Value::Integer(ts.as_secs())),
  });
  let upper = end.map(|ts| Condition {
    clause: format!("{column} < ?"),
    arg:    Some(Value::Integer(ts.as_secs())),
  });
  lower.into_iter().chain(upper).collect()
}

/// `SELECT <columns> FROM <table> WHERE <conditions AND> <pk> > ? ORDER BY <pk> LIMIT ?`.
pub fn page_query(table: &str, columns: &[&str], conditions: Vec<Condition>) -> PageQuery {
  let primary_key = columns[0];
  let mut clauses = Vec::with_capacity(conditions.len() + 1);
  let mut args = Vec::with_capacity(conditions.len());
  for condition in conditions {
    clauses.push(condition.clause);
    args.extend(condition.arg);
  }
  clauses.push(format!("{primary_key} > ?"));

  let sql = format!(
    "SELECT {} FROM {table} WHERE {} ORDER BY {primary_key} LIMIT ?",
    columns.join(", "),
    clauses.join(" AND "),
  );
  PageQuery { sql, args }
}

/// `INSERT INTO <table> (<columns>) VALUES (?, …)`.
pub fn insert(table: &str, columns: &[&str]) -> String {
  let placeholders = vec!["?"; columns.len()].join(", ");
  format!("INSERT INTO {table} ({}) VALUES ({placeholders})", columns.join(", "))
}

/// `UPDATE <table> SET <non-key columns = ?> WHERE <pk> = ?`; arguments are
/// the record spread followed by the identity.
pub fn update(table: &str, columns: &[&str]) -> String {
  let assignments: Vec<String> = columns[1..].iter().map(|c| format!("{c} = ?")).collect();
  format!("UPDATE {table} SET {} WHERE {} = ?", assignments.join(", "), columns[0])
}

pub fn delete(table: &str, primary_key: &str) -> String {
  format!("DELETE FROM {table} WHERE {primary_key} = ?")
}

/// Set a single column by primary key; arguments are the value then the
/// identity.
pub fn set_column(table: &str, column: &str, primary_key: &str) -> String {
  format!("UPDATE {table} SET {column} = ? WHERE {primary_key} = ?")
}
