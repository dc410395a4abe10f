//! Shared page cache for paginated list views.
//!
//! This module provides a resource-agnostic caching mechanism that:
//! - Derives order-independent keys from query descriptors
//! - Serves fresh pages immediately and revalidates stale ones in the background
//! - Shares one in-flight request between concurrent subscribers of a key
//! - Bounds its size with a TTL and an LRU capacity

mod key;
mod store;
mod traits;

pub use key::CacheKey;
pub use store::{CacheSettings, CacheStore, Subscription};
pub use traits::{CacheEntry, CacheStatus, Cacheable, RequestId};
