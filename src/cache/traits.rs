//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::key::CacheKey;
use crate::api::PaginatedList;

/// Trait for rows that can live in a cached page.
pub trait Cacheable: Clone + Send + Sync + 'static {
  /// Unique identifier for this row (e.g., order id)
  fn cache_key(&self) -> String;

  /// Endpoint the rows are listed from (e.g., "orders")
  fn entity_type() -> &'static str;
}

/// Opaque tag for one in-flight network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub(crate) u64);

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
  /// Created but never requested
  Idle,
  /// Fetching with no usable answer yet (prior data may still be shown)
  Loading,
  /// The last fetch succeeded
  Success,
  /// The last fetch failed; prior data, if any, is retained
  Error,
}

/// Cached state of one list page.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
  pub key: CacheKey,
  pub status: CacheStatus,
  pub data: Option<Arc<PaginatedList<T>>>,
  pub error: Option<String>,
  pub fetched_at: Option<DateTime<Utc>>,
  pub in_flight: Option<RequestId>,
  /// Set when the entry must be fetched again before it can be trusted.
  pub invalidated: bool,
}

impl<T> CacheEntry<T> {
  pub(crate) fn idle(key: CacheKey) -> Self {
    Self {
      key,
      status: CacheStatus::Idle,
      data: None,
      error: None,
      fetched_at: None,
      in_flight: None,
      invalidated: false,
    }
  }

  pub fn is_loading(&self) -> bool {
    self.status == CacheStatus::Loading
  }

  /// Background refresh of data that is already being served.
  pub fn is_revalidating(&self) -> bool {
    self.in_flight.is_some() && self.status == CacheStatus::Success
  }

  pub fn rows(&self) -> &[T] {
    self.data.as_ref().map(|d| d.items.as_slice()).unwrap_or(&[])
  }

  pub fn contains_row(&self, row_key: &str) -> bool
  where
    T: Cacheable,
  {
    self.rows().iter().any(|row| row.cache_key() == row_key)
  }
}
