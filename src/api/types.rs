use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One page of a server-side list.
///
/// `total_count` is server-authoritative and never recomputed client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedList<T> {
  pub items: Vec<T>,
  pub page_index: u32,
  pub page_size: u32,
  pub total_count: u64,
}

impl<T> PaginatedList<T> {
  /// Number of pages implied by `total_count` and `page_size`.
  pub fn page_count(&self) -> u64 {
    if self.page_size == 0 {
      return 0;
    }
    self.total_count.div_ceil(u64::from(self.page_size))
  }

  pub fn has_next_page(&self) -> bool {
    u64::from(self.page_index) + 1 < self.page_count()
  }

  pub fn has_previous_page(&self) -> bool {
    self.page_index > 0
  }
}

/// Order workflow status. The member set is defined by the backend.
///
/// Statuses this client does not know decode as [`OrderStatus::Unknown`]. Such
/// orders are listed but never offered a transition, and `Unknown` is never
/// sent as a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
  Pending,
  Processing,
  Shipping,
  Completed,
  Cancelled,
  #[serde(other)]
  Unknown,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Processing,
    OrderStatus::Shipping,
    OrderStatus::Completed,
    OrderStatus::Cancelled,
  ];

  /// Terminal statuses have no outgoing transitions.
  pub fn is_terminal(self) -> bool {
    matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
  }

  pub fn is_known(self) -> bool {
    self != OrderStatus::Unknown
  }

  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    self.is_known() && next.is_known() && !self.is_terminal() && self != next
  }

  /// Statuses reachable from `self`, in declaration order.
  pub fn transitions(self) -> Vec<OrderStatus> {
    Self::ALL
      .into_iter()
      .filter(|next| self.can_transition_to(*next))
      .collect()
  }

  pub fn label(self) -> &'static str {
    match self {
      OrderStatus::Pending => "Pending",
      OrderStatus::Processing => "Processing",
      OrderStatus::Shipping => "Shipping",
      OrderStatus::Completed => "Completed",
      OrderStatus::Cancelled => "Cancelled",
      OrderStatus::Unknown => "Unknown",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Order row as listed in the orders dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
  pub id: String,
  pub customer_name: String,
  pub status: OrderStatus,
  #[serde(default)]
  pub total_amount: f64,
  #[serde(default)]
  pub item_count: u32,
  pub created_at: Option<DateTime<Utc>>,
}

/// Catalog product row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default)]
  pub price: f64,
  #[serde(default)]
  pub stock: i64,
}

/// Back-office user account row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
  pub id: String,
  pub user_name: String,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub role: Option<String>,
  #[serde(default)]
  pub is_active: bool,
}

/// Blog post row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub author: Option<String>,
  #[serde(default)]
  pub published: bool,
  pub created_at: Option<DateTime<Utc>>,
}

/// Sales report row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub period: Option<String>,
  #[serde(default)]
  pub revenue: f64,
  #[serde(default)]
  pub order_count: u64,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn page(page_index: u32, page_size: u32, total_count: u64) -> PaginatedList<u32> {
    PaginatedList {
      items: Vec::new(),
      page_index,
      page_size,
      total_count,
    }
  }

  #[test]
  fn test_page_count_rounds_up() {
    assert_eq!(page(0, 10, 0).page_count(), 0);
    assert_eq!(page(0, 10, 10).page_count(), 1);
    assert_eq!(page(0, 10, 11).page_count(), 2);
  }

  #[test]
  fn test_page_count_independent_of_page_index() {
    let counts: Vec<u64> = (0..5).map(|i| page(i, 20, 95).page_count()).collect();
    assert!(counts.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(counts[0], 5);
  }

  #[test]
  fn test_next_and_previous_page() {
    assert!(page(0, 10, 25).has_next_page());
    assert!(!page(2, 10, 25).has_next_page());
    assert!(!page(0, 10, 25).has_previous_page());
    assert!(page(1, 10, 25).has_previous_page());
  }

  #[test]
  fn test_terminal_statuses_have_no_transitions() {
    assert!(OrderStatus::Completed.transitions().is_empty());
    assert!(OrderStatus::Cancelled.transitions().is_empty());
  }

  #[test]
  fn test_non_terminal_reaches_every_other_status() {
    let targets = OrderStatus::Processing.transitions();
    assert_eq!(
      targets,
      vec![
        OrderStatus::Pending,
        OrderStatus::Shipping,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
      ]
    );
  }

  #[test]
  fn test_order_record_decodes_camel_case() {
    let json = r#"{
      "id": "o-17",
      "customerName": "Ada",
      "status": "Shipping",
      "totalAmount": 42.5,
      "itemCount": 3,
      "createdAt": "2024-03-01T10:00:00Z"
    }"#;
    let order: OrderRecord = serde_json::from_str(json).unwrap();
    assert_eq!(order.status, OrderStatus::Shipping);
    assert_eq!(order.item_count, 3);
  }

  #[test]
  fn test_unrecognized_status_keeps_the_page() {
    let json = r#"{
      "items": [
        {"id": "o-1", "customerName": "Ada", "status": "Pending"},
        {"id": "o-2", "customerName": "Grace", "status": "Refunded"}
      ],
      "pageIndex": 0,
      "pageSize": 10,
      "totalCount": 2
    }"#;
    let page: PaginatedList<OrderRecord> = serde_json::from_str(json).unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1].status, OrderStatus::Unknown);
    assert!(!OrderStatus::Unknown.is_terminal());
    assert!(OrderStatus::Unknown.transitions().is_empty());
    assert!(!OrderStatus::ALL.contains(&OrderStatus::Unknown));
    assert!(OrderStatus::Pending
      .transitions()
      .iter()
      .all(|status| status.is_known()));
  }
}
