//! Lazily fetched, cursor-paginated sequences.
//!
//! A [`Paginator`] wraps a [`PageSource`] and hands out one item at a time,
//! fetching the next page only once the buffered one is exhausted. The cursor
//! passed to each fetch is the identity of the last item of the previous page;
//! the first fetch passes `None`. A page with zero items ends the sequence for
//! good.
//!
//! A paginator is forward-only and owns its cursor and buffer, so it must not
//! be shared between consumers. Fetch failures are returned as-is and are not
//! retried here.

use std::{collections::VecDeque, future::Future};

use crate::value::RecordId;

/// Number of rows requested per page, for every entity.
pub const PAGE_SIZE: usize = 50;

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
  pub items:       Vec<T>,
  /// Cursor for the following page; `None` when `items` is empty.
  pub next_cursor: Option<RecordId>,
}

/// Produces pages of items strictly after a cursor.
pub trait PageSource: Send + Sync {
  type Item: Send;
  type Error: Send;

  fn fetch_page(
    &self,
    cursor: Option<RecordId>,
  ) -> impl Future<Output = Result<Page<Self::Item>, Self::Error>> + Send + '_;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  /// No page requested yet.
  Uninitialized,
  /// At least one page fetched; more may follow.
  Paging,
  /// A fetch returned zero items. Permanent.
  Done,
}

/// Forward-only iterator over a [`PageSource`].
pub struct Paginator<P: PageSource> {
  source: P,
  buffer: VecDeque<P::Item>,
  cursor: Option<RecordId>,
  state:  State,
}

impl<P: PageSource> Paginator<P> {
  /// Build a paginator. No I/O happens until the first [`next`](Self::next).
  pub fn new(source: P) -> Self {
    Self {
      source,
      buffer: VecDeque::new(),
      cursor: None,
      state: State::Uninitialized,
    }
  }

  /// The next item, or `None` once the sequence is exhausted.
  pub async fn next(&mut self) -> Result<Option<P::Item>, P::Error> {
    loop {
      if let Some(item) = self.buffer.pop_front() {
        return Ok(Some(item));
      }
      if self.state == State::Done {
        return Ok(None);
      }

      let page = self.source.fetch_page(self.cursor.clone()).await?;
      if page.items.is_empty() {
        self.state = State::Done;
        return Ok(None);
      }
      self.state = State::Paging;
      self.cursor = page.next_cursor;
      self.buffer.extend(page.items);
    }
  }

  /// Drain the remaining items into a vector.
  pub async fn collect_all(mut self) -> Result<Vec<P::Item>, P::Error> {
    let mut items = Vec::new();
    while let Some(item) = self.next().await? {
      items.push(item);
    }
    Ok(items)
  }

  /// Whether the sequence has ended.
  pub fn is_done(&self) -> bool { self.state == State::Done && self.buffer.is_empty() }

  pub fn source(&self) -> &P { &self.source }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  };

  use super::*;

  /// Serves ids `"000"`, `"001"`, … in pages of `page_size`.
  struct Numbers {
    total:     usize,
    page_size: usize,
    fetches:   AtomicUsize,
    cursors:   Mutex<Vec<Option<RecordId>>>,
    fail_on:   Option<usize>,
  }

  impl Numbers {
    fn new(total: usize, page_size: usize) -> Self {
      Self {
        total,
        page_size,
        fetches: AtomicUsize::new(0),
        cursors: Mutex::new(Vec::new()),
        fail_on: None,
      }
    }
  }

  impl PageSource for Numbers {
    type Item = RecordId;
    type Error = String;

    async fn fetch_page(&self, cursor: Option<RecordId>) -> Result<Page<RecordId>, String> {
      let n = self.fetches.fetch_add(1, Ordering::SeqCst);
      self.cursors.lock().unwrap().push(cursor.clone());
      if self.fail_on == Some(n) {
        return Err(format!("fetch {n} failed"));
      }
      let items: Vec<RecordId> = (0..self.total)
        .map(|i| RecordId::from(format!("{i:03}")))
        .filter(|id| cursor.as_ref().is_none_or(|c| id > c))
        .take(self.page_size)
        .collect();
      let next_cursor = items.last().cloned();
      Ok(Page { items, next_cursor })
    }
  }

  #[tokio::test]
  async fn yields_every_item_once_in_order() {
    for total in [0, 1, 49, 50, 51, 100, 123] {
      let items = Paginator::new(Numbers::new(total, PAGE_SIZE)).collect_all().await.unwrap();
      assert_eq!(items.len(), total, "total = {total}");
      assert!(items.windows(2).all(|w| w[0] < w[1]));
    }
  }

  #[tokio::test]
  async fn construction_does_no_io() {
    let paginator = Paginator::new(Numbers::new(3, 2));
    assert_eq!(paginator.source().fetches.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn first_fetch_has_no_cursor_then_follows_last_item() {
    let mut paginator = Paginator::new(Numbers::new(5, 2));
    while paginator.next().await.unwrap().is_some() {}
    let cursors = paginator.source().cursors.lock().unwrap().clone();
    assert_eq!(cursors, vec![
      None,
      Some(RecordId::from("001")),
      Some(RecordId::from("003")),
      Some(RecordId::from("004")),
    ]);
  }

  #[tokio::test]
  async fn done_is_permanent() {
    let mut paginator = Paginator::new(Numbers::new(0, 2));
    assert_eq!(paginator.next().await.unwrap(), None);
    assert_eq!(paginator.next().await.unwrap(), None);
    assert!(paginator.is_done());
    assert_eq!(paginator.source().fetches.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn fetch_failure_surfaces_without_retry() {
    let mut source = Numbers::new(10, 2);
    source.fail_on = Some(1);
    let mut paginator = Paginator::new(source);
    assert!(paginator.next().await.unwrap().is_some());
    assert!(paginator.next().await.unwrap().is_some());
    assert_eq!(paginator.next().await.unwrap_err(), "fetch 1 failed");
    assert_eq!(paginator.source().fetches.load(Ordering::SeqCst), 2);
  }
}
