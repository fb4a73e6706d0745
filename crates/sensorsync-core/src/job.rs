//! Jobs: units of work that logs are attributed to.

use std::fmt;

use crate::{
  entity,
  record::{Closable, Timestamped},
  value::{Field, RecordId, Timestamp, Value},
};

/// What a job was doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobCategory {
  Main,
  Export,
  Import,
  Sync,
}

impl JobCategory {
  pub fn as_str(self) -> &'static str {
    match self {
      JobCategory::Main => "MAIN",
      JobCategory::Export => "EXPORT",
      JobCategory::Import => "IMPORT",
      JobCategory::Sync => "SYNC",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "MAIN" => Some(JobCategory::Main),
      "EXPORT" => Some(JobCategory::Export),
      "IMPORT" => Some(JobCategory::Import),
      "SYNC" => Some(JobCategory::Sync),
      _ => None,
    }
  }
}

impl fmt::Display for JobCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl Field for JobCategory {
  const TYPE_NAME: &'static str = "job category";

  fn to_value(&self) -> Value { Value::Text(self.as_str().to_owned()) }

  fn from_value(value: Value) -> Option<Self> {
    match value {
      Value::Text(s) => Self::parse(&s),
      _ => None,
    }
  }

  fn export(&self) -> String { self.as_str().to_owned() }
}

entity! {
  table = "jobs", key = "job_id";

  /// A job. Jobs form a tree through `parent_id`, which is not validated
  /// against existing jobs.
  pub struct Job / JobFilter {
    pub parent_id:       Option<RecordId> => "parent_job_id",
    pub category:        JobCategory => "job_category",
    pub start_timestamp: Timestamp => "job_start_timestamp",
    /// `None` while the job is running.
    pub end_timestamp:   Option<Timestamp> => "job_end_timestamp",
  }
}

impl Job {
  /// A job starting now.
  pub fn start(category: JobCategory, parent_id: Option<RecordId>) -> Self {
    Self {
      parent_id,
      category,
      start_timestamp: Timestamp::now(),
      end_timestamp: None,
    }
  }
}

impl Timestamped for Job {
  const TIMESTAMP_COLUMN: &'static str = "job_start_timestamp";
}

impl Closable for Job {
  const CLOSE_COLUMN: &'static str = "job_end_timestamp";
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::{Entity, Stored};

  #[test]
  fn open_job_roundtrips_with_null_end() {
    let job = Job::start(JobCategory::Import, Some(RecordId::from("parent")));
    let row = Stored::new(RecordId::from("child"), job.clone()).spread();
    assert_eq!(row[4], Value::Null);
    let decoded = Stored::<Job>::from_values(row).unwrap();
    assert_eq!(decoded.record, job);
  }

  #[test]
  fn unknown_category_is_rejected() {
    let row = vec![
      Value::Null,
      Value::Text("BOGUS".into()),
      Value::Integer(1),
      Value::Null,
    ];
    assert!(Job::from_values(row).is_err());
  }
}
