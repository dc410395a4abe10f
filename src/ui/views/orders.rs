use super::list::ListView;
use crate::api::{OrderRecord, OrderStatus};
use crate::list::ListController;
use crate::orders::{StatusTransitionController, TransitionError};
use crate::ui::components::{KeyResult, StatusPicker, StatusPickerEvent};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// Result of a status change running in the background
struct Outcome {
  order_id: String,
  status: OrderStatus,
  result: Result<(), TransitionError>,
}

struct Notification {
  message: String,
  is_error: bool,
  shown_at: Instant,
}

/// Orders table with a status picker on `t`
pub struct OrdersView {
  table: ListView<OrderRecord>,
  transitions: StatusTransitionController,
  picker: StatusPicker,
  /// Order the open picker applies to
  picking: Option<String>,
  outcome_tx: mpsc::UnboundedSender<Outcome>,
  outcome_rx: mpsc::UnboundedReceiver<Outcome>,
  notification: Option<Notification>,
}

impl OrdersView {
  pub fn new(list: ListController<OrderRecord>, transitions: StatusTransitionController) -> Self {
    let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
    Self {
      table: ListView::new(list),
      transitions,
      picker: StatusPicker::new(),
      picking: None,
      outcome_tx,
      outcome_rx,
      notification: None,
    }
  }

  fn notify(&mut self, message: String, is_error: bool) {
    self.notification = Some(Notification {
      message,
      is_error,
      shown_at: Instant::now(),
    });
  }

  fn open_picker(&mut self) {
    let Some(order) = self.table.selected_row() else {
      return;
    };
    let order_id = order.id.clone();

    if let Some(err) = self.transitions.blocked_reason(&order_id) {
      self.notify(err.user_message(), true);
      return;
    }
    let targets = self.transitions.allowed_transitions(&order_id);

    self.picker.show(format!("Move {} to", order_id), targets);
    self.picking = Some(order_id);
  }

  fn start_transition(&mut self, order_id: String, status: OrderStatus) {
    if let Err(err) = self.transitions.validate(&order_id, status) {
      self.notify(err.user_message(), true);
      return;
    }

    self.notify(format!("Updating {} to {}...", order_id, status), false);

    let transitions = self.transitions.clone();
    let tx = self.outcome_tx.clone();
    tokio::spawn(async move {
      let result = transitions.set_status(&order_id, status).await.map(|_| ());
      // The view may be gone by now
      let _ = tx.send(Outcome {
        order_id,
        status,
        result,
      });
    });
  }

  fn apply_outcome(&mut self, outcome: Outcome) {
    match outcome.result {
      Ok(()) => self.notify(
        format!("{} is now {}", outcome.order_id, outcome.status),
        false,
      ),
      Err(err) => self.notify(
        format!("{}: {}", outcome.order_id, err.user_message()),
        true,
      ),
    }
  }

  fn render_notification(&self, frame: &mut Frame, area: Rect) {
    let Some(notification) = &self.notification else {
      return;
    };
    let color = if notification.is_error {
      Color::Red
    } else {
      Color::Green
    };
    let line = Line::from(Span::styled(
      format!(" {}", notification.message),
      Style::default().fg(color),
    ));
    frame.render_widget(Paragraph::new(line), area);
  }
}

impl View for OrdersView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.picker.handle_key(key) {
      KeyResult::Event(StatusPickerEvent::Selected(status)) => {
        if let Some(order_id) = self.picking.take() {
          self.start_transition(order_id, status);
        }
        return ViewAction::None;
      }
      KeyResult::Event(StatusPickerEvent::Cancelled) => {
        self.picking = None;
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    if key.code == KeyCode::Char('t') && !self.table.captures_input() {
      self.open_picker();
      return ViewAction::None;
    }

    self.table.handle_key(key)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let notification_height = u16::from(self.notification.is_some());
    let [table_area, notification_area] = Layout::vertical([
      Constraint::Min(1),
      Constraint::Length(notification_height),
    ])
    .areas(area);

    self.table.render(frame, table_area);
    self.render_notification(frame, notification_area);
    self.picker.render_overlay(frame, table_area);
  }

  fn breadcrumb_label(&self) -> String {
    self.table.breadcrumb_label()
  }

  fn captures_input(&self) -> bool {
    self.picker.is_active() || self.table.captures_input()
  }

  fn status(&self) -> Option<String> {
    self.table.status()
  }

  fn tick(&mut self) {
    self.table.tick();

    while let Ok(outcome) = self.outcome_rx.try_recv() {
      self.apply_outcome(outcome);
    }

    if self
      .notification
      .as_ref()
      .is_some_and(|n| n.shown_at.elapsed() >= NOTIFICATION_TTL)
    {
      self.notification = None;
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = self.table.shortcuts();
    shortcuts.push(ShortcutInfo::new("t", "status").with_priority(55));
    shortcuts
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{FetchError, OrderStatusApi, PageFetcher, PaginatedList};
  use crate::cache::CacheStore;
  use crate::query::QueryDescriptor;
  use crossterm::event::KeyModifiers;
  use futures::future::BoxFuture;
  use std::sync::Arc;

  struct OneOrder(OrderStatus);

  impl PageFetcher<OrderRecord> for OneOrder {
    fn fetch_page(
      &self,
      descriptor: &QueryDescriptor,
    ) -> BoxFuture<'static, Result<PaginatedList<OrderRecord>, FetchError>> {
      let page = PaginatedList {
        items: vec![OrderRecord {
          id: "o-1".to_string(),
          customer_name: "Ada".to_string(),
          status: self.0,
          total_amount: 10.0,
          item_count: 1,
          created_at: None,
        }],
        page_index: 0,
        page_size: descriptor.page_size(),
        total_count: 1,
      };
      Box::pin(async move { Ok(page) })
    }
  }

  impl OrderStatusApi for OneOrder {
    fn update_status(
      &self,
      _order_id: &str,
      _status: OrderStatus,
    ) -> BoxFuture<'static, Result<(), FetchError>> {
      Box::pin(async { Ok(()) })
    }
  }

  async fn loaded_view(status: OrderStatus) -> OrdersView {
    let backend = Arc::new(OneOrder(status));
    let store = CacheStore::default();
    let list = ListController::new(
      store.clone(),
      backend.clone(),
      QueryDescriptor::new("orders", 10).unwrap(),
    );
    let mut view = OrdersView::new(list, StatusTransitionController::new(store, backend));
    tokio::time::sleep(Duration::from_millis(10)).await;
    view.tick();
    view
  }

  fn press(view: &mut OrdersView, code: KeyCode) {
    view.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
  }

  #[tokio::test]
  async fn test_terminal_order_shows_error_instead_of_picker() {
    let mut view = loaded_view(OrderStatus::Completed).await;

    press(&mut view, KeyCode::Char('t'));

    assert!(!view.picker.is_active());
    let notification = view.notification.as_ref().unwrap();
    assert!(notification.is_error);
    assert!(notification.message.contains("Completed"));
  }

  #[tokio::test]
  async fn test_picked_status_is_applied_and_reported() {
    let mut view = loaded_view(OrderStatus::Pending).await;

    press(&mut view, KeyCode::Char('t'));
    assert!(view.captures_input());
    press(&mut view, KeyCode::Enter);
    assert!(!view.captures_input());

    tokio::time::sleep(Duration::from_millis(10)).await;
    view.tick();

    let notification = view.notification.as_ref().unwrap();
    assert!(!notification.is_error);
    assert_eq!(notification.message, "o-1 is now Processing");
  }
}
