//! [`Scheduler`]: a periodic task with explicit start and stop.

use std::{future::Future, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Runs a task every `interval` on a background tokio task.
///
/// The first run happens one interval after [`start`](Self::start). Runs never
/// overlap: a run that outlasts the interval delays the next tick rather than
/// causing a burst. [`stop`](Self::stop) lets an in-flight run finish.
/// A zero interval is refused.
#[derive(Debug)]
pub struct Scheduler {
  stop: CancellationToken,
  task: JoinHandle<()>,
}

impl Scheduler {
  pub fn start<F, Fut>(interval: Duration, mut run: F) -> Result<Self>
  where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    if interval.is_zero() {
      return Err(Error::ZeroInterval);
    }

    let stop = CancellationToken::new();
    let stop_child = stop.child_token();
    let task = tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      // The first tick completes immediately.
      ticker.tick().await;

      let mut runs: u64 = 0;
      loop {
        tokio::select! {
          _ = stop_child.cancelled() => break,
          _ = ticker.tick() => {
            runs += 1;
            tracing::debug!(run = runs, "scheduled run starting");
            run().await;
          }
        }
      }
      tracing::info!(runs, "scheduler stopped");
    });
    tracing::info!(?interval, "scheduler started");
    Ok(Self { stop, task })
  }

  pub fn is_running(&self) -> bool { !self.task.is_finished() }

  /// Signal the loop to end and wait for it.
  pub async fn stop(self) -> Result<()> {
    self.stop.cancel();
    self.task.await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  };

  use sensorsync_core::{Classify, ErrorKind};

  use super::*;

  #[tokio::test(start_paused = true)]
  async fn runs_once_per_interval_until_stopped() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let scheduler = Scheduler::start(Duration::from_secs(60), move || {
      let counter = counter.clone();
      async move {
        counter.fetch_add(1, Ordering::SeqCst);
      }
    })
    .unwrap();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(160)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 3);
    assert!(scheduler.is_running());

    scheduler.stop().await.unwrap();
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn stop_waits_for_the_run_in_flight() {
    let finished = Arc::new(AtomicUsize::new(0));
    let counter = finished.clone();
    let scheduler = Scheduler::start(Duration::from_secs(10), move || {
      let counter = counter.clone();
      async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        counter.fetch_add(1, Ordering::SeqCst);
      }
    })
    .unwrap();

    tokio::time::sleep(Duration::from_secs(12)).await;
    scheduler.stop().await.unwrap();
    assert_eq!(finished.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn zero_interval_is_refused() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let err = Scheduler::start(Duration::ZERO, move || {
      let counter = counter.clone();
      async move {
        counter.fetch_add(1, Ordering::SeqCst);
      }
    })
    .unwrap_err();

    assert!(matches!(err, Error::ZeroInterval));
    assert_eq!(err.kind(), ErrorKind::Config);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 0);
  }
}
