//! Order status transitions.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{FetchError, OrderRecord, OrderStatus, OrderStatusApi};
use crate::cache::{CacheKey, CacheStore};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
  #[error("order {0} is not loaded")]
  NotLoaded(String),

  #[error("order is {0} and can no longer change status")]
  Terminal(OrderStatus),

  #[error("order is already {0}")]
  Unchanged(OrderStatus),

  #[error("order status is not recognized by this client")]
  Unrecognized,

  #[error(transparent)]
  Backend(#[from] FetchError),
}

impl TransitionError {
  /// Whether the transition was refused before reaching the network.
  pub fn is_local(&self) -> bool {
    !matches!(self, Self::Backend(_))
  }

  pub fn user_message(&self) -> String {
    match self {
      Self::Backend(err) => err.user_message(),
      other => other.to_string(),
    }
  }
}

/// Validates and applies status changes against the shared orders cache.
///
/// The current status is read from the most recently fetched page holding the
/// order. A change is only written into the cache after the backend confirms
/// it. Every cached orders page is then invalidated, since the order may have
/// moved between pages of a sorted or filtered listing.
#[derive(Clone)]
pub struct StatusTransitionController {
  store: CacheStore<OrderRecord>,
  api: Arc<dyn OrderStatusApi>,
}

impl StatusTransitionController {
  pub fn new(store: CacheStore<OrderRecord>, api: Arc<dyn OrderStatusApi>) -> Self {
    Self { store, api }
  }

  pub fn current_status(&self, order_id: &str) -> Option<OrderStatus> {
    self.store.latest_row(order_id).map(|order| order.status)
  }

  /// Statuses the order may move to; empty for terminal, unrecognized or unloaded orders.
  pub fn allowed_transitions(&self, order_id: &str) -> Vec<OrderStatus> {
    self
      .current_status(order_id)
      .map(OrderStatus::transitions)
      .unwrap_or_default()
  }

  /// Check a transition locally. Returns the current status when allowed.
  pub fn validate(&self, order_id: &str, next: OrderStatus) -> Result<OrderStatus, TransitionError> {
    let current = self
      .current_status(order_id)
      .ok_or_else(|| TransitionError::NotLoaded(order_id.to_string()))?;

    if current.is_terminal() {
      return Err(TransitionError::Terminal(current));
    }
    if current == next {
      return Err(TransitionError::Unchanged(current));
    }
    if !current.can_transition_to(next) {
      return Err(TransitionError::Unrecognized);
    }
    Ok(current)
  }

  /// Why no transition can be offered for `order_id`, if that is the case.
  pub fn blocked_reason(&self, order_id: &str) -> Option<TransitionError> {
    match self.current_status(order_id) {
      None => Some(TransitionError::NotLoaded(order_id.to_string())),
      Some(status) if status.is_terminal() => Some(TransitionError::Terminal(status)),
      Some(status) if status.transitions().is_empty() => Some(TransitionError::Unrecognized),
      Some(_) => None,
    }
  }

  /// Move `order_id` to `next`. Returns the cache keys that were invalidated.
  pub async fn set_status(
    &self,
    order_id: &str,
    next: OrderStatus,
  ) -> Result<Vec<CacheKey>, TransitionError> {
    let current = self.validate(order_id, next)?;
    info!(order_id, from = %current, to = %next, "changing order status");

    if let Err(err) = self.api.update_status(order_id, next).await {
      warn!(order_id, error = %err, "status change rejected");
      return Err(err.into());
    }

    let patched = self
      .store
      .update_rows(|order| order.id == order_id, |order| order.status = next);
    let keys = self.store.invalidate_all();
    info!(order_id, patched, invalidated = keys.len(), "order status changed");

    Ok(keys)
  }
}
