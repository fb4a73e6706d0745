//! Fixed-count retry with an exclusion set.
//!
//! A [`RetryPolicy`] runs an operation up to `attempts` times and returns the
//! last error if none succeeds. Errors whose [`ErrorKind`] is excluded end the
//! loop immediately, even on the first attempt. There is no backoff: attempts
//! run back to back.

use std::{fmt::Display, future::Future};

use crate::error::{Classify, ErrorKind};

pub const DEFAULT_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
  attempts: u32,
  excluded: Vec<ErrorKind>,
}

impl RetryPolicy {
  /// A policy making at most `attempts` calls. Zero is raised to one: the
  /// operation always runs at least once.
  pub fn new(attempts: u32) -> Self {
    Self {
      attempts: attempts.max(1),
      excluded: Vec::new(),
    }
  }

  /// Return immediately on errors of `kind` instead of retrying them.
  pub fn excluding(mut self, kind: ErrorKind) -> Self {
    if !self.excluded.contains(&kind) {
      self.excluded.push(kind);
    }
    self
  }

  pub fn attempts(&self) -> u32 { self.attempts }

  pub fn is_excluded(&self, error: &impl Classify) -> bool {
    self.excluded.contains(&error.kind())
  }

  /// Run `op` until it succeeds, fails with an excluded error, or the attempt
  /// budget is spent.
  pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + Display,
  {
    let mut attempt = 1;
    loop {
      match op().await {
        Ok(value) => return Ok(value),
        Err(error) if self.is_excluded(&error) => {
          tracing::debug!(attempt, %error, "excluded error, not retrying");
          return Err(error);
        }
        Err(error) if attempt >= self.attempts => {
          tracing::debug!(attempt, %error, "retry budget exhausted");
          return Err(error);
        }
        Err(error) => {
          tracing::debug!(attempt, %error, "attempt failed, retrying");
          attempt += 1;
        }
      }
    }
  }
}

impl Default for RetryPolicy {
  fn default() -> Self { Self::new(DEFAULT_ATTEMPTS) }
}

#[cfg(test)]
mod tests {
  use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
  };

  use super::*;

  #[derive(Debug, PartialEq, Eq)]
  struct TestError(ErrorKind);

  impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:?}", self.0) }
  }

  impl Classify for TestError {
    fn kind(&self) -> ErrorKind { self.0 }
  }

  #[tokio::test]
  async fn succeeds_after_transient_failures() {
    let calls = AtomicU32::new(0);
    let result = RetryPolicy::new(3)
      .run(|| async {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        if n < 2 { Err(TestError(ErrorKind::Timeout)) } else { Ok("done") }
      })
      .await;
    assert_eq!(result, Ok("done"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn excluded_error_returns_on_first_attempt() {
    let calls = AtomicU32::new(0);
    let result: Result<(), _> = RetryPolicy::new(5)
      .excluding(ErrorKind::VendorBusiness)
      .run(|| async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(TestError(ErrorKind::VendorBusiness))
      })
      .await;
    assert_eq!(result, Err(TestError(ErrorKind::VendorBusiness)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn returns_last_error_when_budget_is_spent() {
    let calls = AtomicU32::new(0);
    let result: Result<(), _> = RetryPolicy::new(4)
      .run(|| async {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        Err(if n == 3 { TestError(ErrorKind::Write) } else { TestError(ErrorKind::Timeout) })
      })
      .await;
    assert_eq!(result, Err(TestError(ErrorKind::Write)));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
  }

  #[tokio::test]
  async fn zero_attempts_still_runs_once() {
    let policy = RetryPolicy::new(0);
    assert_eq!(policy.attempts(), 1);
    let calls = AtomicU32::new(0);
    let _: Result<(), _> = policy
      .run(|| async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(TestError(ErrorKind::Connection))
      })
      .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}
