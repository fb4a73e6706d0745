//! The ordered field contract shared by every entity.
//!
//! An entity's column list is declared exactly once, through [`entity!`]. The
//! macro derives the insert spread, the filter spread, the row scan and the
//! export spread from that single list, so the four can never disagree on
//! column order. The primary key is always the first column and is never part
//! of the base record: it lives on [`Stored`].

use std::{fmt::Debug, ops::Deref, vec};

use crate::{
  Error, Result,
  value::{Field, RecordId, Value},
};

// ─── Traits ──────────────────────────────────────────────────────────────────

/// A base record: the fields needed to create an entry, without identity.
pub trait Entity: Debug + Clone + Send + Sync + Sized + 'static {
  type Filter: Filter;

  const TABLE: &'static str;

  /// Column names, primary key first, in spread order.
  const COLUMNS: &'static [&'static str];

  /// Field values in column order, excluding the primary key.
  fn spread(&self) -> Vec<Value>;

  /// Field values rendered for CSV export, excluding the primary key.
  fn export_spread(&self) -> Vec<String>;

  /// Rebuild the record from values in column order, excluding the primary
  /// key.
  fn from_values(values: Vec<Value>) -> Result<Self>;

  fn primary_key() -> &'static str { Self::COLUMNS[0] }
}

/// A partial record used for querying. Absent fields impose no constraint.
pub trait Filter: Debug + Clone + Default + Send + Sync + 'static {
  /// One entry per column, primary key first; `None` means "any value".
  fn spread(&self) -> Vec<Option<Value>>;
}

/// Entities carrying a recording timestamp, queryable by time range.
pub trait Timestamped: Entity {
  const TIMESTAMP_COLUMN: &'static str;
}

/// Entities with an end timestamp that can be closed.
pub trait Closable: Entity {
  const CLOSE_COLUMN: &'static str;
}

// ─── Stored ──────────────────────────────────────────────────────────────────

/// A base record plus the identity the store assigned to it on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stored<T> {
  pub id:     RecordId,
  pub record: T,
}

impl<T: Entity> Stored<T> {
  pub fn new(id: RecordId, record: T) -> Self { Self { id, record } }

  /// All column values, primary key first.
  pub fn spread(&self) -> Vec<Value> {
    let mut values = Vec::with_capacity(T::COLUMNS.len());
    values.push(self.id.to_value());
    values.extend(self.record.spread());
    values
  }

  pub fn export_spread(&self) -> Vec<String> {
    let mut values = Vec::with_capacity(T::COLUMNS.len());
    values.push(self.id.export());
    values.extend(self.record.export_spread());
    values
  }

  /// Decode a full row, primary key first.
  pub fn from_values(values: Vec<Value>) -> Result<Self> {
    if values.len() != T::COLUMNS.len() {
      return Err(Error::ColumnCount {
        table:    T::TABLE,
        expected: T::COLUMNS.len(),
        found:    values.len(),
      });
    }
    let mut values = values.into_iter();
    let id = take_field::<RecordId>(&mut values, T::primary_key())?;
    let record = T::from_values(values.collect())?;
    Ok(Self { id, record })
  }
}

impl<T> Deref for Stored<T> {
  type Target = T;

  fn deref(&self) -> &T { &self.record }
}

#[doc(hidden)]
pub fn take_field<T: Field>(
  values: &mut vec::IntoIter<Value>,
  column: &'static str,
) -> Result<T> {
  let value = values.next().ok_or(Error::MissingColumn(column))?;
  let found = value.type_name();
  T::from_value(value).ok_or(Error::ColumnType {
    column,
    expected: T::TYPE_NAME,
    found,
  })
}

// ─── Declaration macro ───────────────────────────────────────────────────────

/// Declare an entity, its filter, and its column list in one place.
///
/// ```rust,ignore
/// entity! {
///   table = "devices", key = "device_id";
///
///   pub struct Device / DeviceFilter {
///     pub name: String => "device_name",
///   }
/// }
/// ```
#[macro_export]
macro_rules! entity {
  (
    table = $table:literal, key = $key:literal;

    $(#[$meta:meta])*
    pub struct $name:ident / $filter:ident {
      $(
        $(#[$field_meta:meta])*
        pub $field:ident : $ty:ty => $column:literal,
      )+
    }
  ) => {
    $(#[$meta])*
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct $name {
      $(
        $(#[$field_meta])*
        pub $field: $ty,
      )+
    }

    #[doc = concat!("Query filter over `", $table, "`; absent fields match anything.")]
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct $filter {
      pub id: ::core::option::Option<$crate::value::RecordId>,
      $(
        pub $field: ::core::option::Option<$ty>,
      )+
    }

    impl $crate::record::Entity for $name {
      type Filter = $filter;

      const TABLE: &'static str = $table;
      const COLUMNS: &'static [&'static str] = &[$key, $($column),+];

      fn spread(&self) -> ::std::vec::Vec<$crate::value::Value> {
        ::std::vec![$($crate::value::Field::to_value(&self.$field)),+]
      }

      fn export_spread(&self) -> ::std::vec::Vec<::std::string::String> {
        ::std::vec![$($crate::value::Field::export(&self.$field)),+]
      }

      fn from_values(
        values: ::std::vec::Vec<$crate::value::Value>,
      ) -> $crate::Result<Self> {
        let expected = <Self as $crate::record::Entity>::COLUMNS.len() - 1;
        if values.len() != expected {
          return Err($crate::Error::ColumnCount {
            table: $table,
            expected,
            found: values.len(),
          });
        }
        let mut values = values.into_iter();
        $(
          let $field = $crate::record::take_field::<$ty>(&mut values, $column)?;
        )+
        Ok(Self { $($field),+ })
      }
    }

    impl $crate::record::Filter for $filter {
      fn spread(
        &self,
      ) -> ::std::vec::Vec<::core::option::Option<$crate::value::Value>> {
        ::std::vec![
          self.id.as_ref().map($crate::value::Field::to_value),
          $(self.$field.as_ref().map($crate::value::Field::to_value)),+
        ]
      }
    }
  };
}
