use sha2::{Digest, Sha256};
use std::fmt;

use crate::query::QueryDescriptor;

/// Comparison key for one cached list page.
///
/// Keys are scoped by endpoint; within an endpoint the digest covers every
/// other descriptor field, so equal descriptors always share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
  endpoint: String,
  digest: String,
}

impl CacheKey {
  pub fn build(descriptor: &QueryDescriptor) -> Self {
    let sort = descriptor.sort();
    // JSON escaping keeps the canonical form unambiguous for arbitrary text
    let canonical = serde_json::json!([
      descriptor.page_index(),
      descriptor.page_size(),
      sort.map(|s| s.column.as_str()),
      sort.map(|s| s.order.as_str()),
      descriptor.search_text(),
    ])
    .to_string();

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());

    Self {
      endpoint: descriptor.endpoint().to_string(),
      digest: hex::encode(hasher.finalize()),
    }
  }

  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }

  pub fn digest(&self) -> &str {
    &self.digest
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.endpoint, &self.digest[..12])
  }
}
