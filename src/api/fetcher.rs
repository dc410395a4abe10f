use futures::future::BoxFuture;
use serde::de::DeserializeOwned;

use super::client::ApiClient;
use super::error::FetchError;
use super::types::{OrderStatus, PaginatedList};
use crate::query::QueryDescriptor;

/// Performs the network call for one list page.
///
/// Implementations resolve every expected failure to a [`FetchError`] value.
pub trait PageFetcher<T>: Send + Sync + 'static {
  fn fetch_page(
    &self,
    descriptor: &QueryDescriptor,
  ) -> BoxFuture<'static, Result<PaginatedList<T>, FetchError>>;
}

/// Issues order status mutations.
pub trait OrderStatusApi: Send + Sync + 'static {
  fn update_status(
    &self,
    order_id: &str,
    status: OrderStatus,
  ) -> BoxFuture<'static, Result<(), FetchError>>;
}

impl<T> PageFetcher<T> for ApiClient
where
  T: DeserializeOwned + Send + 'static,
{
  fn fetch_page(
    &self,
    descriptor: &QueryDescriptor,
  ) -> BoxFuture<'static, Result<PaginatedList<T>, FetchError>> {
    let client = self.clone();
    let descriptor = descriptor.clone();
    Box::pin(async move { client.get_page(&descriptor).await })
  }
}

impl OrderStatusApi for ApiClient {
  fn update_status(
    &self,
    order_id: &str,
    status: OrderStatus,
  ) -> BoxFuture<'static, Result<(), FetchError>> {
    let client = self.clone();
    let order_id = order_id.to_string();
    Box::pin(async move { client.update_order_status(&order_id, status).await })
  }
}
