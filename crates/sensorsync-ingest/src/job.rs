//! [`JobHandle`]: the job a unit of work is attributed to.

use std::backtrace::Backtrace;

use sensorsync_core::{
  Job, JobCategory, Log, LogLevel, RecordId, Stored, Timestamp,
  store::{ClosableStore, DataStore, Store},
};

use crate::{Error, Result};

/// A started job plus the store its log lines go to.
///
/// Every log call emits a `tracing` event tagged with the job id and persists
/// a [`Log`] row. Warnings and errors carry a captured backtrace. A log row
/// that cannot be written is reported through `tracing` only.
pub struct JobHandle<'a, D: DataStore> {
  db:  &'a D,
  job: Stored<Job>,
}

impl<'a, D: DataStore> JobHandle<'a, D> {
  /// Insert a job row starting now.
  pub async fn start(db: &'a D, category: JobCategory, parent: Option<RecordId>) -> Result<Self> {
    let job = Job::start(category, parent);
    let id = db
      .jobs()
      .add(job.clone())
      .await
      .map_err(Error::store("start job"))?;
    tracing::debug!(job = %id, %category, "job started");
    Ok(Self { db, job: Stored::new(id, job) })
  }

  /// Start a job whose parent is this one.
  pub async fn child(&self, category: JobCategory) -> Result<JobHandle<'a, D>> {
    JobHandle::start(self.db, category, Some(self.job.id.clone())).await
  }

  pub fn id(&self) -> &RecordId { &self.job.id }

  pub async fn debug(&self, description: impl Into<String>) {
    self.log(LogLevel::Debug, description.into()).await
  }

  pub async fn info(&self, description: impl Into<String>) {
    self.log(LogLevel::Info, description.into()).await
  }

  pub async fn warn(&self, description: impl Into<String>) {
    self.log(LogLevel::Warn, description.into()).await
  }

  pub async fn error(&self, description: impl Into<String>) {
    self.log(LogLevel::Error, description.into()).await
  }

  async fn log(&self, level: LogLevel, description: String) {
    let job = &self.job.id;
    let stack_trace = match level {
      LogLevel::Error => {
        tracing::error!(%job, "{description}");
        Backtrace::force_capture().to_string()
      }
      LogLevel::Warn => {
        tracing::warn!(%job, "{description}");
        Backtrace::force_capture().to_string()
      }
      LogLevel::Info => {
        tracing::info!(%job, "{description}");
        String::new()
      }
      LogLevel::Debug => {
        tracing::debug!(%job, "{description}");
        String::new()
      }
    };

    let line = Log {
      job_id: job.clone(),
      level,
      stack_trace,
      description,
      timestamp: Timestamp::now(),
    };
    if let Err(error) = self.db.logs().add(line).await {
      tracing::warn!(%job, %error, "failed to persist log line");
    }
  }

  /// Close the job row.
  pub async fn finish(self) -> Result<()> {
    self
      .db
      .jobs()
      .close(&self.job)
      .await
      .map_err(Error::store("finish job"))?;
    tracing::debug!(job = %self.job.id, "job finished");
    Ok(())
  }
}
