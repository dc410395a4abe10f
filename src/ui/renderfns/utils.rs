use crate::api::OrderStatus;
use ratatui::prelude::Color;

/// Truncate to at most `max_len` characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for an order status
pub fn status_color(status: OrderStatus) -> Color {
  match status {
    OrderStatus::Pending => Color::White,
    OrderStatus::Processing => Color::Yellow,
    OrderStatus::Shipping => Color::Blue,
    OrderStatus::Completed => Color::Green,
    OrderStatus::Cancelled => Color::Red,
    OrderStatus::Unknown => Color::DarkGray,
  }
}

/// Two decimal places with a thousands separator
pub fn format_amount(amount: f64) -> String {
  let cents = (amount * 100.0).round() as i64;
  let (sign, cents) = if cents < 0 { ("-", -cents) } else { ("", cents) };
  let whole = (cents / 100).to_string();

  let mut grouped = String::new();
  for (i, c) in whole.chars().enumerate() {
    if i > 0 && (whole.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(c);
  }

  format!("{}{}.{:02}", sign, grouped, cents % 100)
}
