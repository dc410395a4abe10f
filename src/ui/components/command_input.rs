use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::commands::{self, Command, Target};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

const MAX_SUGGESTIONS: usize = 8;

/// Command bar opened with `:`, with autocomplete
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
  input: TextInput,
  active: bool,
  selected_suggestion: usize,
}

impl CommandInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn activate(&mut self) {
    self.active = true;
    self.input.clear();
    self.selected_suggestion = 0;
  }

  fn close(&mut self) {
    self.active = false;
    self.input.clear();
    self.selected_suggestion = 0;
  }

  pub fn suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(self.input.value())
  }

  fn cycle(&mut self, forward: bool) {
    let count = self.suggestions().len();
    if count == 0 {
      return;
    }
    self.selected_suggestion = if forward {
      (self.selected_suggestion + 1) % count
    } else {
      self.selected_suggestion.checked_sub(1).unwrap_or(count - 1)
    };
  }

  /// Selected suggestion, or an exact name/alias match of the typed text
  fn resolve(&self) -> Option<Target> {
    self
      .suggestions()
      .get(self.selected_suggestion)
      .copied()
      .or_else(|| commands::find(self.input.value()))
      .map(|cmd| cmd.target)
  }

  /// Emits the chosen target on Enter; unknown input closes the bar silently
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<Target> {
    if !self.active {
      if key.code == KeyCode::Char(':') {
        self.activate();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Tab | KeyCode::Down => {
        self.cycle(true);
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.cycle(false);
        return KeyResult::Handled;
      }
      _ => {}
    }

    match self.input.handle_key(key) {
      InputResult::Edited => {
        self.selected_suggestion = 0;
        KeyResult::Handled
      }
      InputResult::Submitted(_) => {
        let target = self.resolve();
        self.close();
        target.map_or(KeyResult::Handled, KeyResult::Event)
      }
      InputResult::Cancelled => {
        self.close();
        KeyResult::Handled
      }
      InputResult::Moved | InputResult::NotHandled => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let suggestions = self.suggestions();
    let shown = suggestions.len().min(MAX_SUGGESTIONS) as u16;
    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width.saturating_sub(1));
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, 3 + shown);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Command ");
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let [input_area, list_area] =
      Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);

    let input_line = Line::from(vec![
      Span::styled(":", Style::default().fg(Color::Yellow)),
      Span::raw(self.input.value()),
      Span::styled("_", Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(Paragraph::new(input_line), input_area);

    if suggestions.is_empty() || list_area.height == 0 {
      return;
    }

    let items: Vec<ListItem> = suggestions
      .iter()
      .take(MAX_SUGGESTIONS)
      .map(|cmd| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<12}", cmd.name), Style::default().fg(Color::Cyan)),
          Span::styled(cmd.description, Style::default().fg(Color::DarkGray)),
        ]))
      })
      .collect();

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let mut state = ListState::default();
    state.select(Some(self.selected_suggestion));

    frame.render_stateful_widget(list, list_area, &mut state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn submit(text: &str) -> KeyResult<Target> {
    let mut command = CommandInput::new();
    command.handle_key(key(KeyCode::Char(':')));
    for c in text.chars() {
      command.handle_key(key(KeyCode::Char(c)));
    }
    command.handle_key(key(KeyCode::Enter))
  }

  #[test]
  fn test_prefix_resolves_to_best_suggestion() {
    assert_eq!(submit("ord"), KeyResult::Event(Target::Orders));
  }

  #[test]
  fn test_unknown_command_closes_without_event() {
    assert_eq!(submit("zzz"), KeyResult::Handled);
  }

  #[test]
  fn test_tab_cycles_suggestions() {
    let mut command = CommandInput::new();
    command.handle_key(key(KeyCode::Char(':')));
    command.handle_key(key(KeyCode::Tab));
    assert_eq!(
      command.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(Target::Orders)
    );
    assert!(!command.is_active());
  }
}
