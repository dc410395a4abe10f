//! Storefront REST API: wire envelope, row types, and the HTTP client.

pub mod api_types;
mod cache;
pub mod client;
mod error;
mod fetcher;
pub mod types;

pub use client::ApiClient;
pub use error::FetchError;
pub use fetcher::{OrderStatusApi, PageFetcher};
pub use types::{OrderRecord, OrderStatus, PaginatedList, Post, Product, Report, UserAccount};
