use color_eyre::{eyre::eyre, Result};
use reqwest::RequestBuilder;
use serde::de::{DeserializeOwned, IgnoredAny};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::api_types::{ApiStatusUpdate, Envelope};
use super::error::FetchError;
use super::types::{OrderStatus, PaginatedList};
use crate::config::Config;
use crate::query::QueryDescriptor;

/// Storefront REST API client
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
  token: Option<String>,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    Self::with_base_url(&config.api.url, Config::get_api_token())
  }

  pub fn with_base_url(url: &str, token: Option<String>) -> Result<Self> {
    let mut base_url = Url::parse(url).map_err(|e| eyre!("Invalid API url {}: {}", url, e))?;
    // Without a trailing slash, join() would replace the last path segment
    if !base_url.path().ends_with('/') {
      let path = format!("{}/", base_url.path());
      base_url.set_path(&path);
    }

    let http = reqwest::Client::builder()
      .user_agent(concat!("storefront-admin/", env!("CARGO_PKG_VERSION")))
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      token,
    })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Build the list URL for a descriptor
  pub fn list_url(&self, descriptor: &QueryDescriptor) -> Result<Url, FetchError> {
    let mut url = self
      .base_url
      .join(descriptor.endpoint())
      .map_err(|e| FetchError::InvalidRequest(format!("bad endpoint: {}", e)))?;

    {
      let mut query = url.query_pairs_mut();
      query.append_pair("pageIndex", &descriptor.page_index().to_string());
      query.append_pair("pageSize", &descriptor.page_size().to_string());
      if let Some(sort) = descriptor.sort() {
        query.append_pair("sortColumn", &sort.column);
        query.append_pair("sortOrder", sort.order.as_str());
      }
      if !descriptor.search_text().is_empty() {
        query.append_pair("textSearch", descriptor.search_text());
      }
    }

    Ok(url)
  }

  /// Fetch one page of a list endpoint
  pub async fn get_page<T: DeserializeOwned>(
    &self,
    descriptor: &QueryDescriptor,
  ) -> Result<PaginatedList<T>, FetchError> {
    let url = self.list_url(descriptor)?;
    debug!(%url, "fetching list page");

    let response = self.authorize(self.http.get(url)).send().await?;
    let page: PaginatedList<T> = read_envelope(response).await?.into_data()?;

    if page.items.len() > page.page_size as usize {
      return Err(FetchError::Decode(format!(
        "page holds {} items but page size is {}",
        page.items.len(),
        page.page_size
      )));
    }

    Ok(page)
  }

  /// Change the status of one order
  pub async fn update_order_status(
    &self,
    order_id: &str,
    status: OrderStatus,
  ) -> Result<(), FetchError> {
    let url = self
      .base_url
      .join("orders/status")
      .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;
    debug!(order_id, %status, "updating order status");

    let body = ApiStatusUpdate {
      id: order_id,
      status,
    };
    let response = self.authorize(self.http.put(url)).json(&body).send().await?;

    read_envelope::<IgnoredAny>(response).await?.into_unit()
  }

  fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
    match &self.token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }
}

/// Decode the response envelope, falling back to the HTTP status when the body
/// is not an envelope.
async fn read_envelope<T: DeserializeOwned>(
  response: reqwest::Response,
) -> Result<Envelope<T>, FetchError> {
  let status = response.status();
  let body = response.bytes().await?;

  match Envelope::<T>::from_slice(&body) {
    Ok(envelope) => Ok(envelope),
    Err(_) if !status.is_success() => Err(FetchError::Http {
      status: status.as_u16(),
    }),
    Err(err) => Err(err),
  }
}
