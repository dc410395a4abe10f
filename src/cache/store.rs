//! Shared in-memory store of list pages.
//!
//! One [`CacheStore`] exists per resource for the whole session. Each cache key
//! owns a `watch` channel carrying its [`CacheEntry`]; subscribers see every
//! state transition, and completions for superseded requests are dropped.

use chrono::Utc;
use lru::LruCache;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::key::CacheKey;
use super::traits::{CacheEntry, CacheStatus, Cacheable, RequestId};
use crate::api::{FetchError, PaginatedList};

/// Freshness and eviction limits for a [`CacheStore`].
#[derive(Debug, Clone)]
pub struct CacheSettings {
  /// How long a successful page is served without revalidation
  pub stale_time: Duration,
  /// Entries not accessed for this long are dropped
  pub ttl: Duration,
  /// Maximum number of entries kept
  pub capacity: usize,
}

impl Default for CacheSettings {
  fn default() -> Self {
    Self {
      stale_time: Duration::from_secs(30),
      ttl: Duration::from_secs(600),
      capacity: 64,
    }
  }
}

struct Slot<T> {
  tx: watch::Sender<CacheEntry<T>>,
  refreshed_at: Option<Instant>,
  last_access: Instant,
  /// Completion order of the last successful fetch, newest highest
  fetched_seq: u64,
  /// Invalidated while a request was in flight
  dirty: bool,
}

impl<T> Slot<T> {
  fn new(key: CacheKey, now: Instant) -> Self {
    let (tx, _) = watch::channel(CacheEntry::idle(key));
    Self {
      tx,
      refreshed_at: None,
      last_access: now,
      fetched_seq: 0,
      dirty: false,
    }
  }

  fn is_pinned(&self) -> bool {
    self.tx.receiver_count() > 0 || self.tx.borrow().in_flight.is_some()
  }
}

struct StoreState<T> {
  /// Most recently used first. Capacity is enforced by `evict`, since pinned
  /// entries may keep the store above its limit.
  slots: LruCache<CacheKey, Slot<T>>,
  next_request: u64,
  next_fetch: u64,
}

impl<T> StoreState<T> {
  /// Drop expired entries, then least recently used ones above capacity.
  /// Entries with subscribers or an in-flight request are never dropped.
  fn evict(&mut self, now: Instant, settings: &CacheSettings, keep: &CacheKey) {
    let before = self.slots.len();
    let expired: Vec<CacheKey> = self
      .slots
      .iter()
      .filter(|(key, slot)| {
        *key != keep && !slot.is_pinned() && now.duration_since(slot.last_access) >= settings.ttl
      })
      .map(|(key, _)| key.clone())
      .collect();
    for key in &expired {
      self.slots.pop(key);
    }

    // Leave room for `keep` when it is about to be inserted
    let limit = if self.slots.contains(keep) {
      settings.capacity
    } else {
      settings.capacity.saturating_sub(1)
    };
    while self.slots.len() > limit {
      let victim = self
        .slots
        .iter()
        .rev()
        .find(|(key, slot)| *key != keep && !slot.is_pinned())
        .map(|(key, _)| key.clone());

      match victim {
        Some(key) => {
          self.slots.pop(&key);
        }
        None => break,
      }
    }

    let evicted = before - self.slots.len();
    if evicted > 0 {
      debug!(evicted, remaining = self.slots.len(), "evicted cache entries");
    }
  }
}

enum Plan {
  /// A request for this key is already running
  Attach,
  /// Fresh data, nothing to do
  Serve,
  Fetch { id: RequestId, background: bool },
}

/// Process-wide page cache for one row type.
pub struct CacheStore<T: Cacheable> {
  state: Arc<Mutex<StoreState<T>>>,
  settings: CacheSettings,
}

impl<T: Cacheable> CacheStore<T> {
  pub fn new(settings: CacheSettings) -> Self {
    Self {
      state: Arc::new(Mutex::new(StoreState {
        slots: LruCache::unbounded(),
        next_request: 0,
        next_fetch: 0,
      })),
      settings,
    }
  }

  pub fn settings(&self) -> &CacheSettings {
    &self.settings
  }

  fn lock(&self) -> MutexGuard<'_, StoreState<T>> {
    // No invariant spans a panic point, so a poisoned lock is still consistent
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Current cached state for `key`, if any.
  pub fn get(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
    let mut state = self.lock();
    let slot = state.slots.get_mut(key)?;
    slot.last_access = Instant::now();
    let entry = slot.tx.borrow().clone();
    Some(entry)
  }

  /// Subscribe to `key`, starting a fetch through `producer` when needed.
  ///
  /// - in flight: attach to the running request
  /// - fresh success: serve as-is
  /// - stale success: serve as-is and revalidate in the background
  /// - anything else: mark loading (keeping prior data) and fetch
  ///
  /// Must be called from within a tokio runtime.
  pub fn request<F, Fut>(&self, key: CacheKey, producer: F) -> Subscription<T>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<PaginatedList<T>, FetchError>> + Send + 'static,
  {
    let now = Instant::now();
    let stale_time = self.settings.stale_time;

    let (rx, plan) = {
      let mut state = self.lock();
      state.evict(now, &self.settings, &key);

      let StoreState {
        slots,
        next_request,
        ..
      } = &mut *state;
      let slot = slots.get_or_insert_mut(key.clone(), || Slot::new(key.clone(), now));
      slot.last_access = now;

      let plan = {
        let entry = slot.tx.borrow();
        let fresh = entry.status == CacheStatus::Success
          && !entry.invalidated
          && slot
            .refreshed_at
            .is_some_and(|at| now.duration_since(at) < stale_time);

        if entry.in_flight.is_some() {
          Plan::Attach
        } else if fresh {
          Plan::Serve
        } else {
          *next_request += 1;
          Plan::Fetch {
            id: RequestId(*next_request),
            background: entry.status == CacheStatus::Success && !entry.invalidated,
          }
        }
      };

      if let Plan::Fetch { id, background } = plan {
        slot.dirty = false;
        slot.tx.send_modify(|entry| {
          entry.in_flight = Some(id);
          entry.invalidated = false;
          if !background {
            entry.status = CacheStatus::Loading;
          }
        });
      }

      (slot.tx.subscribe(), plan)
    };

    match plan {
      Plan::Attach => trace!(%key, "attached to in-flight request"),
      Plan::Serve => trace!(%key, "served fresh entry"),
      Plan::Fetch { id, background } => {
        debug!(%key, background, "fetching page");
        let future = producer();
        let store = self.clone();
        let task_key = key.clone();
        tokio::spawn(async move {
          let result = future.await;
          store.complete(&task_key, id, result);
        });
      }
    }

    Subscription { key, rx }
  }

  fn complete(&self, key: &CacheKey, id: RequestId, result: Result<PaginatedList<T>, FetchError>) {
    let mut state = self.lock();
    let StoreState {
      slots, next_fetch, ..
    } = &mut *state;
    let Some(slot) = slots.peek_mut(key) else {
      debug!(%key, "discarding result for evicted entry");
      return;
    };
    if slot.tx.borrow().in_flight != Some(id) {
      debug!(%key, "discarding result for superseded request");
      return;
    }

    let dirty = std::mem::take(&mut slot.dirty);
    match result {
      Ok(page) => {
        *next_fetch += 1;
        slot.fetched_seq = *next_fetch;
        slot.refreshed_at = Some(Instant::now());
        slot.tx.send_modify(|entry| {
          entry.status = CacheStatus::Success;
          entry.data = Some(Arc::new(page));
          entry.error = None;
          entry.fetched_at = Some(Utc::now());
          entry.in_flight = None;
          entry.invalidated = dirty;
        });
      }
      Err(err) => {
        warn!(%key, error = %err, "page fetch failed");
        slot.tx.send_modify(|entry| {
          entry.status = CacheStatus::Error;
          entry.error = Some(err.user_message());
          entry.in_flight = None;
          entry.invalidated = false;
        });
      }
    }
  }

  /// Force the next request for `key` to fetch, even if the entry is fresh.
  pub fn invalidate(&self, key: &CacheKey) {
    let mut state = self.lock();
    if let Some(slot) = state.slots.peek_mut(key) {
      invalidate_slot(slot);
    }
  }

  /// Invalidate every entry whose page contains the row `row_key`.
  pub fn invalidate_rows(&self, row_key: &str) -> Vec<CacheKey> {
    let mut state = self.lock();
    let mut keys = Vec::new();
    for (key, slot) in state.slots.iter_mut() {
      if slot.tx.borrow().contains_row(row_key) {
        invalidate_slot(slot);
        keys.push(key.clone());
      }
    }
    keys
  }

  /// Keys of every entry whose page contains the row `row_key`.
  pub fn keys_containing(&self, row_key: &str) -> Vec<CacheKey> {
    self
      .lock()
      .slots
      .iter()
      .filter(|(_, slot)| slot.tx.borrow().contains_row(row_key))
      .map(|(key, _)| key.clone())
      .collect()
  }

  /// Invalidate every entry in the store. Returns the affected keys.
  pub fn invalidate_all(&self) -> Vec<CacheKey> {
    let mut state = self.lock();
    let mut keys = Vec::with_capacity(state.slots.len());
    for (key, slot) in state.slots.iter_mut() {
      invalidate_slot(slot);
      keys.push(key.clone());
    }
    keys
  }

  /// Copy of the row `row_key` from the most recently fetched page holding it.
  pub fn latest_row(&self, row_key: &str) -> Option<T> {
    self
      .lock()
      .slots
      .iter()
      .filter_map(|(_, slot)| {
        let entry = slot.tx.borrow();
        let row = entry.rows().iter().find(|row| row.cache_key() == row_key)?;
        Some((slot.fetched_seq, row.clone()))
      })
      .max_by_key(|(seq, _)| *seq)
      .map(|(_, row)| row)
  }

  /// Apply `patch` to every cached row matching `matches`. Returns rows touched.
  pub fn update_rows<P, F>(&self, matches: P, patch: F) -> usize
  where
    P: Fn(&T) -> bool,
    F: Fn(&mut T),
  {
    let mut state = self.lock();
    let mut touched = 0;
    for (_, slot) in state.slots.iter_mut() {
      slot.tx.send_if_modified(|entry| {
        let Some(data) = entry.data.as_mut() else {
          return false;
        };
        if !data.items.iter().any(&matches) {
          return false;
        }
        let page = Arc::make_mut(data);
        for row in page.items.iter_mut().filter(|row| matches(row)) {
          patch(row);
          touched += 1;
        }
        true
      });
    }
    touched
  }

  /// Drop the entry for `key`. Pending completions for it become no-ops.
  pub fn remove(&self, key: &CacheKey) -> bool {
    self.lock().slots.pop(key).is_some()
  }

  /// Drop every entry.
  pub fn clear(&self) {
    let mut state = self.lock();
    let count = state.slots.len();
    state.slots.clear();
    debug!(count, entity = T::entity_type(), "cleared cache");
  }

  pub fn len(&self) -> usize {
    self.lock().slots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

fn invalidate_slot<T>(slot: &mut Slot<T>) {
  if slot.tx.borrow().in_flight.is_some() {
    slot.dirty = true;
  } else {
    slot.tx.send_modify(|entry| entry.invalidated = true);
  }
}

impl<T: Cacheable> Clone for CacheStore<T> {
  fn clone(&self) -> Self {
    Self {
      state: Arc::clone(&self.state),
      settings: self.settings.clone(),
    }
  }
}

impl<T: Cacheable> Default for CacheStore<T> {
  fn default() -> Self {
    Self::new(CacheSettings::default())
  }
}

/// Receiver side of one cache entry.
pub struct Subscription<T> {
  key: CacheKey,
  rx: watch::Receiver<CacheEntry<T>>,
}

impl<T: Clone> Subscription<T> {
  pub fn key(&self) -> &CacheKey {
    &self.key
  }

  pub fn current(&self) -> CacheEntry<T> {
    self.rx.borrow().clone()
  }

  /// Current entry, marking it as seen.
  pub fn take(&mut self) -> CacheEntry<T> {
    self.rx.borrow_and_update().clone()
  }

  /// Whether the entry changed since it was last taken.
  pub fn has_changed(&self) -> bool {
    self.rx.has_changed().unwrap_or(false)
  }

  /// Wait for the next change. Returns false once the entry was dropped.
  pub async fn changed(&mut self) -> bool {
    self.rx.changed().await.is_ok()
  }

  /// Wait until no request is in flight for this entry.
  pub async fn settled(&mut self) -> CacheEntry<T> {
    if let Ok(entry) = self.rx.wait_for(|entry| entry.in_flight.is_none()).await {
      return entry.clone();
    }
    self.rx.borrow().clone()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::QueryDescriptor;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[derive(Debug, Clone, PartialEq)]
  struct Row {
    id: String,
    label: String,
  }

  impl Cacheable for Row {
    fn cache_key(&self) -> String {
      self.id.clone()
    }

    fn entity_type() -> &'static str {
      "rows"
    }
  }

  fn row(id: &str, label: &str) -> Row {
    Row {
      id: id.to_string(),
      label: label.to_string(),
    }
  }

  fn page(rows: Vec<Row>) -> PaginatedList<Row> {
    let total_count = rows.len() as u64;
    PaginatedList {
      items: rows,
      page_index: 0,
      page_size: 10,
      total_count,
    }
  }

  fn key(page_index: u32) -> CacheKey {
    CacheKey::build(
      &QueryDescriptor::new("rows", 10)
        .unwrap()
        .with_page(page_index),
    )
  }

  fn counting_producer(
    calls: &Arc<AtomicUsize>,
    result: Result<PaginatedList<Row>, FetchError>,
  ) -> impl FnOnce() -> futures::future::BoxFuture<'static, Result<PaginatedList<Row>, FetchError>>
  {
    let calls = Arc::clone(calls);
    move || {
      calls.fetch_add(1, Ordering::SeqCst);
      Box::pin(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        result
      })
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_concurrent_requests_share_one_call() {
    let store = CacheStore::<Row>::default();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut first = store.request(key(0), counting_producer(&calls, Ok(page(vec![row("a", "A")]))));
    let mut second = store.request(key(0), counting_producer(&calls, Ok(page(vec![row("b", "B")]))));

    assert!(first.current().is_loading());
    let a = first.settled().await;
    let b = second.settled().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(a.rows(), b.rows());
    assert_eq!(a.rows()[0].id, "a");
  }

  #[tokio::test(start_paused = true)]
  async fn test_fresh_entry_is_served_without_fetch() {
    let store = CacheStore::<Row>::default();
    let calls = Arc::new(AtomicUsize::new(0));

    store
      .request(key(0), counting_producer(&calls, Ok(page(vec![row("a", "A")]))))
      .settled()
      .await;
    let sub = store.request(key(0), counting_producer(&calls, Ok(page(vec![]))));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let entry = sub.current();
    assert_eq!(entry.status, CacheStatus::Success);
    assert_eq!(entry.rows().len(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_stale_entry_revalidates_in_background() {
    let store = CacheStore::<Row>::new(CacheSettings {
      stale_time: Duration::from_secs(5),
      ..CacheSettings::default()
    });
    let calls = Arc::new(AtomicUsize::new(0));

    store
      .request(key(0), counting_producer(&calls, Ok(page(vec![row("a", "old")]))))
      .settled()
      .await;
    tokio::time::advance(Duration::from_secs(6)).await;

    let mut sub = store.request(key(0), counting_producer(&calls, Ok(page(vec![row("a", "new")]))));
    let served = sub.current();
    assert_eq!(served.status, CacheStatus::Success);
    assert!(served.is_revalidating());
    assert!(!served.is_loading());
    assert_eq!(served.rows()[0].label, "old");

    let refreshed = sub.settled().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(refreshed.rows()[0].label, "new");
  }

  #[tokio::test(start_paused = true)]
  async fn test_invalidate_bypasses_freshness() {
    let store = CacheStore::<Row>::default();
    let calls = Arc::new(AtomicUsize::new(0));

    store
      .request(key(0), counting_producer(&calls, Ok(page(vec![row("a", "A")]))))
      .settled()
      .await;
    store.invalidate(&key(0));
    assert!(store.get(&key(0)).unwrap().invalidated);

    let mut sub = store.request(key(0), counting_producer(&calls, Ok(page(vec![row("a", "B")]))));
    assert!(sub.current().is_loading());
    assert_eq!(sub.settled().await.rows()[0].label, "B");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_failure_keeps_previous_data() {
    let store = CacheStore::<Row>::default();
    let calls = Arc::new(AtomicUsize::new(0));

    store
      .request(key(0), counting_producer(&calls, Ok(page(vec![row("a", "A")]))))
      .settled()
      .await;
    store.invalidate(&key(0));
    let entry = store
      .request(
        key(0),
        counting_producer(&calls, Err(FetchError::Backend("DB timeout".into()))),
      )
      .settled()
      .await;

    assert_eq!(entry.status, CacheStatus::Error);
    assert_eq!(entry.error.as_deref(), Some("DB timeout"));
    assert_eq!(entry.rows()[0].label, "A");
  }

  #[tokio::test(start_paused = true)]
  async fn test_invalidate_during_flight_marks_result_invalid() {
    let store = CacheStore::<Row>::default();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut sub = store.request(key(0), counting_producer(&calls, Ok(page(vec![row("a", "A")]))));
    store.invalidate(&key(0));
    let entry = sub.settled().await;

    assert_eq!(entry.status, CacheStatus::Success);
    assert!(entry.invalidated);
  }

  #[tokio::test(start_paused = true)]
  async fn test_capacity_evicts_least_recently_used() {
    let store = CacheStore::<Row>::new(CacheSettings {
      capacity: 2,
      ..CacheSettings::default()
    });
    let calls = Arc::new(AtomicUsize::new(0));

    for index in 0..3 {
      store
        .request(key(index), counting_producer(&calls, Ok(page(vec![]))))
        .settled()
        .await;
      tokio::time::advance(Duration::from_millis(10)).await;
    }

    assert_eq!(store.len(), 2);
    assert!(store.get(&key(0)).is_none());
    assert!(store.get(&key(2)).is_some());
  }

  #[tokio::test(start_paused = true)]
  async fn test_reading_an_entry_protects_it_from_eviction() {
    let store = CacheStore::<Row>::new(CacheSettings {
      capacity: 2,
      ..CacheSettings::default()
    });
    let calls = Arc::new(AtomicUsize::new(0));

    for index in 0..2 {
      store
        .request(key(index), counting_producer(&calls, Ok(page(vec![]))))
        .settled()
        .await;
    }
    assert!(store.get(&key(0)).is_some());
    store
      .request(key(2), counting_producer(&calls, Ok(page(vec![]))))
      .settled()
      .await;

    assert!(store.get(&key(0)).is_some());
    assert!(store.get(&key(1)).is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_latest_row_prefers_most_recent_fetch() {
    let store = CacheStore::<Row>::default();
    let calls = Arc::new(AtomicUsize::new(0));

    store
      .request(key(3), counting_producer(&calls, Ok(page(vec![row("a", "first")]))))
      .settled()
      .await;
    store
      .request(key(1), counting_producer(&calls, Ok(page(vec![row("a", "second")]))))
      .settled()
      .await;
    assert_eq!(store.latest_row("a").unwrap().label, "second");

    // Refetching the older page makes its copy the latest
    store.invalidate(&key(3));
    store
      .request(key(3), counting_producer(&calls, Ok(page(vec![row("a", "third")]))))
      .settled()
      .await;
    assert_eq!(store.latest_row("a").unwrap().label, "third");
    assert!(store.latest_row("missing").is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_invalidate_all_flags_every_entry() {
    let store = CacheStore::<Row>::default();
    let calls = Arc::new(AtomicUsize::new(0));

    for index in 0..3 {
      store
        .request(key(index), counting_producer(&calls, Ok(page(vec![]))))
        .settled()
        .await;
    }

    assert_eq!(store.invalidate_all().len(), 3);
    assert!((0..3).all(|index| store.get(&key(index)).unwrap().invalidated));
  }

  #[tokio::test(start_paused = true)]
  async fn test_subscribed_entries_survive_eviction() {
    let store = CacheStore::<Row>::new(CacheSettings {
      capacity: 1,
      ..CacheSettings::default()
    });
    let calls = Arc::new(AtomicUsize::new(0));

    let mut held = store.request(key(0), counting_producer(&calls, Ok(page(vec![]))));
    held.settled().await;
    store
      .request(key(1), counting_producer(&calls, Ok(page(vec![]))))
      .settled()
      .await;

    assert!(store.get(&key(0)).is_some());
  }

  #[tokio::test(start_paused = true)]
  async fn test_ttl_expires_unused_entries() {
    let store = CacheStore::<Row>::new(CacheSettings {
      ttl: Duration::from_secs(60),
      ..CacheSettings::default()
    });
    let calls = Arc::new(AtomicUsize::new(0));

    store
      .request(key(0), counting_producer(&calls, Ok(page(vec![]))))
      .settled()
      .await;
    tokio::time::advance(Duration::from_secs(61)).await;
    store
      .request(key(1), counting_producer(&calls, Ok(page(vec![]))))
      .settled()
      .await;

    assert!(store.get(&key(0)).is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_update_rows_patches_matching_rows() {
    let store = CacheStore::<Row>::default();
    let calls = Arc::new(AtomicUsize::new(0));

    store
      .request(
        key(0),
        counting_producer(&calls, Ok(page(vec![row("a", "A"), row("b", "B")]))),
      )
      .settled()
      .await;

    let touched = store.update_rows(|r| r.id == "b", |r| r.label = "patched".to_string());
    assert_eq!(touched, 1);
    assert_eq!(store.latest_row("b").unwrap().label, "patched");
    assert_eq!(store.keys_containing("b"), vec![key(0)]);
    assert_eq!(store.invalidate_rows("a"), vec![key(0)]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_removed_entry_ignores_late_completion() {
    let store = CacheStore::<Row>::default();
    let calls = Arc::new(AtomicUsize::new(0));

    let mut sub = store.request(key(0), counting_producer(&calls, Ok(page(vec![row("a", "A")]))));
    assert!(store.remove(&key(0)));
    assert!(!sub.changed().await);
    assert!(store.get(&key(0)).is_none());
  }
}
