//! Error types for `sensorsync-core`, plus the error classification shared by
//! every crate in the workspace.

use thiserror::Error;

/// Coarse classes of failure.
///
/// Every error type in the workspace maps onto one of these through
/// [`Classify`]; the retry policy uses the mapping to decide which failures
/// must not be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  /// The store or the vendor API could not be reached.
  Connection,
  /// An operation-scoped deadline elapsed.
  Timeout,
  /// An insert, update or delete statement failed.
  Write,
  /// An update, delete or close affected zero rows.
  NotFound,
  /// A row could not be decoded into a record.
  Scan,
  /// The vendor answered with a non-success application code.
  VendorBusiness,
  /// A response body could not be decoded.
  Decode,
  Io,
  Config,
}

/// Maps an error onto its [`ErrorKind`].
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

/// Failures decoding a row into a record.
#[derive(Debug, Error)]
pub enum Error {
  #[error("{table}: expected {expected} columns, row has {found}")]
  ColumnCount {
    table:    &'static str,
    expected: usize,
    found:    usize,
  },

  #[error("column {column}: expected {expected}, found {found}")]
  ColumnType {
    column:   &'static str,
    expected: &'static str,
    found:    &'static str,
  },

  #[error("column {0} missing from row")]
  MissingColumn(&'static str),
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind { ErrorKind::Scan }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
