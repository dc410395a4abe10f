//! Paginated list state bound to the shared page cache.
//!
//! A [`ListController`] owns the paging, sort and search state of one list view.
//! Every interaction derives a new [`QueryDescriptor`], swaps the controller's
//! cache subscription to the matching key and republishes a [`ListSnapshot`].
//! Only the current key's subscription is held, so a slower response for a
//! superseded descriptor can never reach the visible state.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::api::{FetchError, PageFetcher, PaginatedList};
use crate::cache::{CacheEntry, CacheKey, CacheStatus, CacheStore, Cacheable, Subscription};
use crate::debounce::Debouncer;
use crate::query::{QueryDescriptor, Sort};
use crate::retry::RetryPolicy;

/// What a list view renders.
#[derive(Debug, Clone)]
pub struct ListSnapshot<T> {
  pub descriptor: QueryDescriptor,
  pub data: Option<Arc<PaginatedList<T>>>,
  pub total_count: u64,
  /// No usable answer for the current descriptor yet
  pub is_loading: bool,
  /// Serving cached rows while a refresh runs
  pub is_revalidating: bool,
  pub error: Option<String>,
}

impl<T> ListSnapshot<T> {
  fn empty(descriptor: QueryDescriptor) -> Self {
    Self {
      descriptor,
      data: None,
      total_count: 0,
      is_loading: false,
      is_revalidating: false,
      error: None,
    }
  }

  fn from_entry(descriptor: QueryDescriptor, entry: &CacheEntry<T>) -> Self {
    Self {
      descriptor,
      data: entry.data.clone(),
      total_count: entry.data.as_ref().map_or(0, |page| page.total_count),
      is_loading: matches!(entry.status, CacheStatus::Idle | CacheStatus::Loading),
      is_revalidating: entry.is_revalidating(),
      error: entry.error.clone(),
    }
  }

  pub fn rows(&self) -> &[T] {
    self
      .data
      .as_ref()
      .map(|page| page.items.as_slice())
      .unwrap_or(&[])
  }

  pub fn page_count(&self) -> u64 {
    self
      .total_count
      .div_ceil(u64::from(self.descriptor.page_size()))
  }

  pub fn has_next_page(&self) -> bool {
    u64::from(self.descriptor.page_index()) + 1 < self.page_count()
  }

  pub fn has_previous_page(&self) -> bool {
    self.descriptor.page_index() > 0
  }
}

/// Handle returned by [`ListController::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener<T> = Box<dyn FnMut(&ListSnapshot<T>) + Send>;

pub struct ListController<T: Cacheable> {
  store: CacheStore<T>,
  fetcher: Arc<dyn PageFetcher<T>>,
  retry: RetryPolicy,
  descriptor: QueryDescriptor,
  subscription: Option<Subscription<T>>,
  debouncer: Debouncer,
  snapshot: ListSnapshot<T>,
  listeners: Vec<(ListenerId, Listener<T>)>,
  next_listener: u64,
}

impl<T: Cacheable> ListController<T> {
  /// Create an unmounted controller. Nothing is fetched until [`load`](Self::load).
  pub fn new(
    store: CacheStore<T>,
    fetcher: Arc<dyn PageFetcher<T>>,
    descriptor: QueryDescriptor,
  ) -> Self {
    Self {
      store,
      fetcher,
      retry: RetryPolicy::default(),
      snapshot: ListSnapshot::empty(descriptor.clone()),
      descriptor,
      subscription: None,
      debouncer: Debouncer::default(),
      listeners: Vec::new(),
      next_listener: 0,
    }
  }

  pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub fn with_debounce(mut self, quiet_period: Duration) -> Self {
    self.debouncer = Debouncer::new(quiet_period);
    self
  }

  pub fn descriptor(&self) -> &QueryDescriptor {
    &self.descriptor
  }

  pub fn snapshot(&self) -> &ListSnapshot<T> {
    &self.snapshot
  }

  pub fn cache_key(&self) -> CacheKey {
    CacheKey::build(&self.descriptor)
  }

  /// Whether a search keystroke is waiting for its quiet period.
  pub fn search_pending(&self) -> bool {
    self.debouncer.is_pending()
  }

  /// Request the current descriptor.
  pub fn load(&mut self) {
    self.request();
  }

  pub fn set_page(&mut self, page_index: u32) {
    let next = self.descriptor.with_page(page_index);
    self.navigate(next);
  }

  /// Move forward one page. Returns false on the last known page.
  pub fn next_page(&mut self) -> bool {
    if !self.snapshot.has_next_page() {
      return false;
    }
    self.set_page(self.descriptor.page_index() + 1);
    true
  }

  /// Move back one page. Returns false on the first page.
  pub fn prev_page(&mut self) -> bool {
    let Some(previous) = self.descriptor.page_index().checked_sub(1) else {
      return false;
    };
    self.set_page(previous);
    true
  }

  pub fn set_page_size(&mut self, page_size: u32) -> Result<(), FetchError> {
    let next = self.descriptor.with_page_size(page_size)?;
    self.navigate(next);
    Ok(())
  }

  pub fn set_sort(&mut self, sort: Option<Sort>) {
    let next = self.descriptor.with_sort(sort);
    self.navigate(next);
  }

  /// Feed one search keystroke. The search is committed after the quiet period.
  pub fn search(&mut self, text: &str) {
    self.debouncer.on_input(text);
  }

  /// Commit `text` as the search immediately, dropping any pending keystroke.
  pub fn commit_search(&mut self, text: &str) {
    self.debouncer.cancel();
    let next = self.descriptor.with_search(text);
    self.navigate(next);
  }

  /// Fetch the current page again regardless of freshness.
  pub fn reload(&mut self) {
    let key = self.cache_key();
    debug!(%key, "reloading list");
    self.store.invalidate(&key);
    self.request();
  }

  /// Apply a committed search and any cache change. For tick-driven callers.
  /// Returns true if the snapshot changed.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;
    if let Some(text) = self.debouncer.try_commit() {
      self.commit_search(&text);
      changed = true;
    }
    if self
      .subscription
      .as_ref()
      .is_some_and(Subscription::has_changed)
    {
      self.sync();
      changed = true;
    }
    changed
  }

  /// Wait until a search commits or the current entry changes, then apply it.
  /// Returns false once nothing can change: the current entry was dropped from
  /// the store, or nothing is loaded and no search keystroke is pending.
  pub async fn wait_for_change(&mut self) -> bool {
    enum Wake {
      Commit(Option<String>),
      Entry(bool),
    }

    if self.subscription.is_none() && !self.debouncer.is_pending() {
      return false;
    }

    let wake = match self.subscription.as_mut() {
      Some(subscription) => tokio::select! {
        commit = self.debouncer.next_commit() => Wake::Commit(commit),
        alive = subscription.changed() => Wake::Entry(alive),
      },
      None => Wake::Commit(self.debouncer.next_commit().await),
    };

    match wake {
      Wake::Commit(Some(text)) => {
        self.commit_search(&text);
        true
      }
      Wake::Commit(None) => false,
      Wake::Entry(true) => {
        self.sync();
        true
      }
      Wake::Entry(false) => {
        debug!(descriptor = %self.descriptor, "cache entry dropped");
        self.subscription = None;
        false
      }
    }
  }

  /// Register `listener`, called with every new snapshot.
  pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
  where
    F: FnMut(&ListSnapshot<T>) + Send + 'static,
  {
    self.next_listener += 1;
    let id = ListenerId(self.next_listener);
    self.listeners.push((id, Box::new(listener)));
    id
  }

  pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
    let before = self.listeners.len();
    self.listeners.retain(|(listener_id, _)| *listener_id != id);
    self.listeners.len() != before
  }

  fn navigate(&mut self, descriptor: QueryDescriptor) {
    if descriptor == self.descriptor && self.subscription.is_some() {
      return;
    }
    self.descriptor = descriptor;
    self.request();
  }

  fn request(&mut self) {
    let key = self.cache_key();
    let fetcher = Arc::clone(&self.fetcher);
    let retry = self.retry.clone();
    let descriptor = self.descriptor.clone();

    // Replacing the subscription detaches from the previous key
    self.subscription = Some(self.store.request(key, move || async move {
      retry.run(|| fetcher.fetch_page(&descriptor)).await
    }));
    self.sync();
  }

  fn sync(&mut self) {
    let Some(subscription) = self.subscription.as_mut() else {
      return;
    };
    let entry = subscription.take();

    // Invalidated while mounted, typically after a mutation elsewhere
    if entry.invalidated && entry.in_flight.is_none() {
      debug!(key = %entry.key, "entry invalidated, fetching again");
      self.request();
      return;
    }

    self.snapshot = ListSnapshot::from_entry(self.descriptor.clone(), &entry);
    for (_, listener) in self.listeners.iter_mut() {
      listener(&self.snapshot);
    }
  }
}
