pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::TableState;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let [header, body, footer] = Layout::vertical([
    Constraint::Length(1), // Header with shortcuts
    Constraint::Min(1),    // Current view
    Constraint::Length(1), // Breadcrumb and list status
  ])
  .areas(frame.area());

  let title = app.title();
  let api_url = app.api_url().to_string();
  let breadcrumb = app.breadcrumb();

  let (shortcuts, status) = match app.current_view() {
    Some(view) => (view.shortcuts(), view.status()),
    None => (Vec::new(), None),
  };

  renderfns::draw_header(frame, header, &title, &api_url, &shortcuts);

  if let Some(view) = app.current_view_mut() {
    view.render(frame, body);
  }

  renderfns::draw_footer(frame, footer, &breadcrumb, status.as_deref());
  app.command().render_overlay(frame, body);
}

/// Keep a table selection inside `0..len`, selecting the first row when there is none.
pub fn ensure_valid_selection(state: &mut TableState, len: usize) {
  if len == 0 {
    state.select(None);
    return;
  }
  match state.selected() {
    Some(index) if index >= len => state.select(Some(len - 1)),
    Some(_) => {}
    None => state.select(Some(0)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_ensure_valid_selection() {
    let mut state = TableState::default();
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(0));

    state.select(Some(7));
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(2));

    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }
}
