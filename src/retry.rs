//! Bounded fixed-interval retry for fetches.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::FetchError;

pub const DEFAULT_RETRY_COUNT: u32 = 2;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(3);

type RetryCondition = Arc<dyn Fn(&FetchError) -> bool + Send + Sync>;

/// Retries an operation a fixed number of times with a fixed pause between
/// attempts, but only for errors the condition accepts.
#[derive(Clone)]
pub struct RetryPolicy {
  max_retries: u32,
  interval: Duration,
  retry_on: RetryCondition,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self::new(DEFAULT_RETRY_COUNT, DEFAULT_RETRY_INTERVAL)
  }
}

impl RetryPolicy {
  /// Retry transient failures `max_retries` times, `interval` apart.
  pub fn new(max_retries: u32, interval: Duration) -> Self {
    Self {
      max_retries,
      interval,
      retry_on: Arc::new(FetchError::is_transient),
    }
  }

  /// A policy that never retries.
  pub fn none() -> Self {
    Self::new(0, Duration::ZERO)
  }

  /// Replace the predicate deciding which errors are retried.
  pub fn with_retry_condition<F>(mut self, condition: F) -> Self
  where
    F: Fn(&FetchError) -> bool + Send + Sync + 'static,
  {
    self.retry_on = Arc::new(condition);
    self
  }

  pub fn max_retries(&self) -> u32 {
    self.max_retries
  }

  pub fn interval(&self) -> Duration {
    self.interval
  }

  /// Run `operation`, retrying per this policy. Returns the last error once
  /// attempts are exhausted or the error is not retryable.
  pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, FetchError>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
  {
    let mut attempt = 0;
    loop {
      match operation().await {
        Ok(value) => {
          if attempt > 0 {
            debug!(attempt, "succeeded after retry");
          }
          return Ok(value);
        }
        Err(err) if attempt < self.max_retries && (self.retry_on)(&err) => {
          attempt += 1;
          warn!(
            attempt,
            max_retries = self.max_retries,
            error = %err,
            "retrying after failure"
          );
          tokio::time::sleep(self.interval).await;
        }
        Err(err) => return Err(err),
      }
    }
  }
}

impl fmt::Debug for RetryPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RetryPolicy")
      .field("max_retries", &self.max_retries)
      .field("interval", &self.interval)
      .finish_non_exhaustive()
  }
}
