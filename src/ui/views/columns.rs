//! Table layout for each resource.

use crate::api::{OrderRecord, Post, Product, Report, UserAccount};
use crate::cache::Cacheable;
use crate::ui::renderfns::{format_amount, status_color, truncate};
use chrono::{DateTime, Utc};
use ratatui::prelude::*;
use ratatui::widgets::Cell;

pub struct Column {
  pub title: &'static str,
  /// Server-side sort column, if the list can be sorted by this column
  pub sort_key: Option<&'static str>,
  pub width: Constraint,
}

impl Column {
  const fn new(title: &'static str, width: Constraint) -> Self {
    Self {
      title,
      sort_key: None,
      width,
    }
  }

  const fn sortable(mut self, key: &'static str) -> Self {
    self.sort_key = Some(key);
    self
  }
}

/// A row type that can be shown in a [`ListView`](super::ListView).
pub trait TableRow: Cacheable {
  /// Human name of the resource, used for titles and breadcrumbs
  const TITLE: &'static str;

  fn columns() -> &'static [Column];

  fn cells(&self) -> Vec<Cell<'static>>;

  /// Server-side sort keys in column order
  fn sort_keys() -> Vec<&'static str> {
    Self::columns().iter().filter_map(|c| c.sort_key).collect()
  }
}

fn text(value: &str, max: usize) -> Cell<'static> {
  Cell::from(truncate(value, max))
}

fn optional(value: Option<&str>, max: usize) -> Cell<'static> {
  match value {
    Some(v) => text(v, max),
    None => Cell::from(Span::styled("-", Style::default().fg(Color::DarkGray))),
  }
}

fn date(value: Option<DateTime<Utc>>) -> Cell<'static> {
  let formatted = value.map(|d| d.format("%Y-%m-%d %H:%M").to_string());
  optional(formatted.as_deref(), 16)
}

fn number(value: String) -> Cell<'static> {
  Cell::from(Line::from(value).alignment(Alignment::Right))
}

fn flag(value: bool, yes: &'static str, no: &'static str) -> Cell<'static> {
  if value {
    Cell::from(Span::styled(yes, Style::default().fg(Color::Green)))
  } else {
    Cell::from(Span::styled(no, Style::default().fg(Color::DarkGray)))
  }
}

const ORDER_COLUMNS: &[Column] = &[
  Column::new("Order", Constraint::Length(12)),
  Column::new("Customer", Constraint::Min(16)).sortable("customerName"),
  Column::new("Status", Constraint::Length(11)).sortable("status"),
  Column::new("Items", Constraint::Length(6)),
  Column::new("Total", Constraint::Length(12)).sortable("totalAmount"),
  Column::new("Created", Constraint::Length(17)).sortable("createdAt"),
];

impl TableRow for OrderRecord {
  const TITLE: &'static str = "Orders";

  fn columns() -> &'static [Column] {
    ORDER_COLUMNS
  }

  fn cells(&self) -> Vec<Cell<'static>> {
    vec![
      Cell::from(Span::styled(self.id.clone(), Style::default().fg(Color::Cyan))),
      text(&self.customer_name, 30),
      Cell::from(Span::styled(
        self.status.label(),
        Style::default().fg(status_color(self.status)),
      )),
      number(self.item_count.to_string()),
      number(format_amount(self.total_amount)),
      date(self.created_at),
    ]
  }
}

const PRODUCT_COLUMNS: &[Column] = &[
  Column::new("Id", Constraint::Length(12)),
  Column::new("Name", Constraint::Min(20)).sortable("name"),
  Column::new("Category", Constraint::Length(16)).sortable("category"),
  Column::new("Price", Constraint::Length(12)).sortable("price"),
  Column::new("Stock", Constraint::Length(7)).sortable("stock"),
];

impl TableRow for Product {
  const TITLE: &'static str = "Products";

  fn columns() -> &'static [Column] {
    PRODUCT_COLUMNS
  }

  fn cells(&self) -> Vec<Cell<'static>> {
    let stock = if self.stock <= 0 {
      Cell::from(
        Line::from(Span::styled(self.stock.to_string(), Style::default().fg(Color::Red)))
          .alignment(Alignment::Right),
      )
    } else {
      number(self.stock.to_string())
    };

    vec![
      Cell::from(Span::styled(self.id.clone(), Style::default().fg(Color::Cyan))),
      text(&self.name, 40),
      optional(self.category.as_deref(), 16),
      number(format_amount(self.price)),
      stock,
    ]
  }
}

const USER_COLUMNS: &[Column] = &[
  Column::new("Id", Constraint::Length(12)),
  Column::new("User", Constraint::Length(20)).sortable("userName"),
  Column::new("Email", Constraint::Min(24)).sortable("email"),
  Column::new("Role", Constraint::Length(12)).sortable("role"),
  Column::new("Active", Constraint::Length(8)),
];

impl TableRow for UserAccount {
  const TITLE: &'static str = "Users";

  fn columns() -> &'static [Column] {
    USER_COLUMNS
  }

  fn cells(&self) -> Vec<Cell<'static>> {
    vec![
      Cell::from(Span::styled(self.id.clone(), Style::default().fg(Color::Cyan))),
      text(&self.user_name, 20),
      optional(self.email.as_deref(), 40),
      optional(self.role.as_deref(), 12),
      flag(self.is_active, "yes", "no"),
    ]
  }
}

const POST_COLUMNS: &[Column] = &[
  Column::new("Id", Constraint::Length(12)),
  Column::new("Title", Constraint::Min(24)).sortable("title"),
  Column::new("Author", Constraint::Length(18)).sortable("author"),
  Column::new("State", Constraint::Length(10)),
  Column::new("Created", Constraint::Length(17)).sortable("createdAt"),
];

impl TableRow for Post {
  const TITLE: &'static str = "Posts";

  fn columns() -> &'static [Column] {
    POST_COLUMNS
  }

  fn cells(&self) -> Vec<Cell<'static>> {
    vec![
      Cell::from(Span::styled(self.id.clone(), Style::default().fg(Color::Cyan))),
      text(&self.title, 60),
      optional(self.author.as_deref(), 18),
      flag(self.published, "published", "draft"),
      date(self.created_at),
    ]
  }
}

const REPORT_COLUMNS: &[Column] = &[
  Column::new("Id", Constraint::Length(12)),
  Column::new("Report", Constraint::Min(20)).sortable("name"),
  Column::new("Period", Constraint::Length(14)).sortable("period"),
  Column::new("Orders", Constraint::Length(8)).sortable("orderCount"),
  Column::new("Revenue", Constraint::Length(14)).sortable("revenue"),
];

impl TableRow for Report {
  const TITLE: &'static str = "Reports";

  fn columns() -> &'static [Column] {
    REPORT_COLUMNS
  }

  fn cells(&self) -> Vec<Cell<'static>> {
    vec![
      Cell::from(Span::styled(self.id.clone(), Style::default().fg(Color::Cyan))),
      text(&self.name, 40),
      optional(self.period.as_deref(), 14),
      number(self.order_count.to_string()),
      number(format_amount(self.revenue)),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn assert_cells_match_columns<T: TableRow>(row: &T) {
    assert_eq!(row.cells().len(), T::columns().len(), "{}", T::TITLE);
  }

  #[test]
  fn test_every_row_type_fills_its_columns() {
    assert_cells_match_columns(&OrderRecord {
      id: "o-1".into(),
      customer_name: "Ada".into(),
      status: crate::api::OrderStatus::Pending,
      total_amount: 1.0,
      item_count: 1,
      created_at: None,
    });
    assert_cells_match_columns(&Product {
      id: "p-1".into(),
      name: "Phone".into(),
      category: None,
      price: 1.0,
      stock: 0,
    });
    assert_cells_match_columns(&UserAccount {
      id: "u-1".into(),
      user_name: "ada".into(),
      email: None,
      role: Some("admin".into()),
      is_active: true,
    });
    assert_cells_match_columns(&Post {
      id: "b-1".into(),
      title: "Hello".into(),
      author: None,
      published: false,
      created_at: None,
    });
    assert_cells_match_columns(&Report {
      id: "r-1".into(),
      name: "Q1".into(),
      period: None,
      revenue: 0.0,
      order_count: 0,
    });
  }

  #[test]
  fn test_sort_keys_follow_column_order() {
    assert_eq!(
      OrderRecord::sort_keys(),
      vec!["customerName", "status", "totalAmount", "createdAt"]
    );
  }
}
