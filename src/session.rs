//! Per-run wiring of the API client and the shared page caches.

use color_eyre::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::api::{ApiClient, OrderRecord, PageFetcher, Post, Product, Report, UserAccount};
use crate::cache::{CacheStore, Cacheable};
use crate::config::{Config, SyncConfig};
use crate::list::ListController;
use crate::orders::StatusTransitionController;
use crate::query::QueryDescriptor;
use crate::retry::RetryPolicy;

/// Everything list views share for one application run.
///
/// Created once at startup and torn down with [`Session::shutdown`]. Stores are
/// cheap handles; cloning one shares the underlying cache.
pub struct Session {
  client: ApiClient,
  sync: SyncConfig,
  pub products: CacheStore<Product>,
  pub orders: CacheStore<OrderRecord>,
  pub users: CacheStore<UserAccount>,
  pub posts: CacheStore<Post>,
  pub reports: CacheStore<Report>,
}

impl Session {
  pub fn new(config: &Config) -> Result<Self> {
    let client = ApiClient::new(config)?;
    Ok(Self::with_client(client, config.sync.clone()))
  }

  pub fn with_client(client: ApiClient, sync: SyncConfig) -> Self {
    let settings = sync.cache_settings();
    info!(
      base_url = %client.base_url(),
      stale_secs = sync.stale_time_secs,
      capacity = settings.capacity,
      "session started"
    );

    Self {
      client,
      products: CacheStore::new(settings.clone()),
      orders: CacheStore::new(settings.clone()),
      users: CacheStore::new(settings.clone()),
      posts: CacheStore::new(settings.clone()),
      reports: CacheStore::new(settings),
      sync,
    }
  }

  pub fn client(&self) -> &ApiClient {
    &self.client
  }

  pub fn page_size(&self) -> u32 {
    self.sync.page_size
  }

  pub fn retry_policy(&self) -> RetryPolicy {
    self.sync.retry_policy()
  }

  pub fn debounce(&self) -> Duration {
    self.sync.debounce()
  }

  /// A list controller over `store`, configured from this session.
  pub fn list<T>(&self, store: &CacheStore<T>) -> Result<ListController<T>>
  where
    T: Cacheable,
    ApiClient: PageFetcher<T>,
  {
    let descriptor = QueryDescriptor::new(T::entity_type(), self.sync.page_size)?;
    let fetcher: Arc<dyn PageFetcher<T>> = Arc::new(self.client.clone());
    Ok(
      ListController::new(store.clone(), fetcher, descriptor)
        .with_retry_policy(self.retry_policy())
        .with_debounce(self.debounce()),
    )
  }

  pub fn transitions(&self) -> StatusTransitionController {
    StatusTransitionController::new(self.orders.clone(), Arc::new(self.client.clone()))
  }

  /// Drop every cached page. Pending fetches complete into nothing.
  pub fn shutdown(&self) {
    self.products.clear();
    self.orders.clear();
    self.users.clear();
    self.posts.clear();
    self.reports.clear();
    info!("session shut down");
  }
}
