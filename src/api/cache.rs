//! Caching implementations for storefront row types.

use crate::cache::Cacheable;

use super::types::{OrderRecord, Post, Product, Report, UserAccount};

impl Cacheable for OrderRecord {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "orders"
  }
}

impl Cacheable for Product {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "products"
  }
}

impl Cacheable for UserAccount {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "users"
  }
}

impl Cacheable for Post {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "posts"
  }
}

impl Cacheable for Report {
  fn cache_key(&self) -> String {
    self.id.clone()
  }

  fn entity_type() -> &'static str {
    "reports"
  }
}
