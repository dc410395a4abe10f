use super::KeyResult;
use crate::api::OrderStatus;
use crate::ui::renderfns::status_color;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

/// Events emitted by status picker that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusPickerEvent {
  Selected(OrderStatus),
  Cancelled,
}

/// Overlay listing the statuses an order may move to
#[derive(Debug, Clone, Default)]
pub struct StatusPicker {
  active: bool,
  statuses: Vec<OrderStatus>,
  selected: usize,
  title: String,
}

impl StatusPicker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Show the picker. Does nothing when there is nothing to pick.
  pub fn show(&mut self, title: String, statuses: Vec<OrderStatus>) {
    if statuses.is_empty() {
      return;
    }
    self.active = true;
    self.statuses = statuses;
    self.selected = 0;
    self.title = title;
  }

  pub fn hide(&mut self) {
    self.active = false;
    self.statuses.clear();
    self.selected = 0;
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<StatusPickerEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(StatusPickerEvent::Cancelled)
      }
      KeyCode::Enter => {
        let choice = self.statuses.get(self.selected).copied();
        self.hide();
        match choice {
          Some(status) => KeyResult::Event(StatusPickerEvent::Selected(status)),
          None => KeyResult::Event(StatusPickerEvent::Cancelled),
        }
      }
      KeyCode::Char('j') | KeyCode::Down => {
        self.selected = (self.selected + 1) % self.statuses.len();
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.selected = self
          .selected
          .checked_sub(1)
          .unwrap_or(self.statuses.len() - 1);
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (self.title.len() as u16 + 6)
      .max(24)
      .min(area.width.saturating_sub(4));
    let height = (self.statuses.len() as u16 + 2).min(area.height.saturating_sub(2));
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let items: Vec<ListItem> = self
      .statuses
      .iter()
      .map(|status| {
        ListItem::new(Line::from(Span::styled(
          status.label(),
          Style::default().fg(status_color(*status)),
        )))
      })
      .collect();

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let mut state = ListState::default();
    state.select(Some(self.selected));

    frame.render_stateful_widget(list, inner, &mut state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_empty_list_does_not_open() {
    let mut picker = StatusPicker::new();
    picker.show("Order o-1".to_string(), Vec::new());
    assert!(!picker.is_active());
  }

  #[test]
  fn test_navigation_wraps_and_enter_selects() {
    let mut picker = StatusPicker::new();
    picker.show("Order o-1".to_string(), OrderStatus::Pending.transitions());

    picker.handle_key(key(KeyCode::Char('k')));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(StatusPickerEvent::Selected(OrderStatus::Cancelled))
    );
    assert!(!picker.is_active());
  }

  #[test]
  fn test_escape_cancels() {
    let mut picker = StatusPicker::new();
    picker.show("Order o-1".to_string(), OrderStatus::Shipping.transitions());
    assert_eq!(
      picker.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(StatusPickerEvent::Cancelled)
    );
  }
}
