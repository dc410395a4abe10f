use super::columns::TableRow;
use crate::list::{ListController, ListSnapshot};
use crate::query::{Sort, SortOrder};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState};
use tracing::warn;

/// Page sizes offered by `+` and `-`
const PAGE_SIZES: [u32; 5] = [5, 10, 20, 50, 100];

/// Paginated, sortable, searchable table over one resource
pub struct ListView<T: TableRow> {
  list: ListController<T>,
  table_state: TableState,
  search: SearchInput,
}

impl<T: TableRow> ListView<T> {
  /// Wrap `list` and start loading its first page.
  pub fn new(mut list: ListController<T>) -> Self {
    list.load();
    Self {
      list,
      table_state: TableState::default().with_selected(Some(0)),
      search: SearchInput::new(),
    }
  }

  pub fn snapshot(&self) -> &ListSnapshot<T> {
    self.list.snapshot()
  }

  pub fn selected_row(&self) -> Option<&T> {
    let index = self.table_state.selected()?;
    self.snapshot().rows().get(index)
  }

  fn after_navigation(&mut self) {
    self.table_state.select(Some(0));
  }

  fn change_page_size(&mut self, larger: bool) {
    let current = self.list.descriptor().page_size();
    let next = if larger {
      PAGE_SIZES.iter().copied().find(|size| *size > current)
    } else {
      PAGE_SIZES.iter().rev().copied().find(|size| *size < current)
    };

    if let Some(size) = next {
      if let Err(e) = self.list.set_page_size(size) {
        warn!(error = %e, "page size rejected");
      }
      self.after_navigation();
    }
  }

  /// Next sortable column, then back to unsorted
  fn cycle_sort(&mut self) {
    let keys = T::sort_keys();
    let current = self.list.descriptor().sort().map(|s| s.column.as_str());
    let next = match current.and_then(|column| keys.iter().position(|k| *k == column)) {
      Some(index) => keys.get(index + 1).copied(),
      None => keys.first().copied(),
    };

    self.list.set_sort(next.map(|key| Sort::new(key, SortOrder::Asc)));
    self.after_navigation();
  }

  fn flip_order(&mut self) {
    if let Some(sort) = self.list.descriptor().sort() {
      let flipped = Sort::new(sort.column.clone(), sort.order.flipped());
      self.list.set_sort(Some(flipped));
      self.after_navigation();
    }
  }

  fn title(&self) -> String {
    let snapshot = self.snapshot();
    let mut title = format!(" {}", T::TITLE);

    let search = snapshot.descriptor.search_text();
    if !search.is_empty() {
      title.push_str(&format!(" /{}", search));
    }

    if let Some(error) = &snapshot.error {
      title.push_str(&format!(" (error: {})", error));
    } else if snapshot.is_loading {
      title.push_str(" (loading...)");
    } else if snapshot.is_revalidating {
      title.push_str(&format!(" ({}, refreshing)", snapshot.total_count));
    } else {
      title.push_str(&format!(" ({})", snapshot.total_count));
    }

    title.push(' ');
    title
  }

  fn header_row(&self) -> Row<'static> {
    let sort = self.list.descriptor().sort();
    let cells = T::columns().iter().map(|column| {
      let marker = match (sort, column.sort_key) {
        (Some(sort), Some(key)) if sort.column == key => match sort.order {
          SortOrder::Asc => " ▲",
          SortOrder::Desc => " ▼",
        },
        _ => "",
      };
      format!("{}{}", column.title, marker)
    });

    Row::new(cells).style(Style::default().fg(Color::Yellow).bold())
  }

  pub fn render_table(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.snapshot().rows().len();
    ensure_valid_selection(&mut self.table_state, len);

    let border_color = if self.snapshot().error.is_some() {
      Color::Red
    } else {
      Color::Blue
    };
    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border_color));

    let snapshot = self.list.snapshot();
    if snapshot.rows().is_empty() && !snapshot.is_loading {
      let content = if snapshot.error.is_some() {
        "Failed to load. Press 'r' to retry."
      } else if !snapshot.descriptor.search_text().is_empty() {
        "Nothing matches the search."
      } else {
        "Nothing here yet."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let rows: Vec<Row> = snapshot.rows().iter().map(|row| Row::new(row.cells())).collect();
    let widths: Vec<Constraint> = T::columns().iter().map(|c| c.width).collect();

    let table = Table::new(rows, widths)
      .header(self.header_row())
      .block(block)
      .row_highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }
}

impl<T: TableRow> View for ListView<T> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // Let search component try to handle first
    match self.search.handle_key(key) {
      KeyResult::Handled => return ViewAction::None,
      KeyResult::Event(SearchEvent::Changed(text)) => {
        self.list.search(&text);
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted(text)) => {
        self.list.commit_search(&text);
        self.after_navigation();
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Cancelled) => {
        self.list.commit_search("");
        self.after_navigation();
        return ViewAction::None;
      }
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('n') | KeyCode::Right => {
        if self.list.next_page() {
          self.after_navigation();
        }
      }
      KeyCode::Char('p') | KeyCode::Left => {
        if self.list.prev_page() {
          self.after_navigation();
        }
      }
      KeyCode::Char('+') => self.change_page_size(true),
      KeyCode::Char('-') => self.change_page_size(false),
      KeyCode::Char('s') => self.cycle_sort(),
      KeyCode::Char('o') => self.flip_order(),
      KeyCode::Char('r') => self.list.reload(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_table(frame, area);
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    T::TITLE.to_string()
  }

  fn captures_input(&self) -> bool {
    self.search.is_active()
  }

  fn status(&self) -> Option<String> {
    let snapshot = self.snapshot();
    let descriptor = &snapshot.descriptor;
    let mut status = format!(
      "page {}/{} | {} rows | {} per page",
      descriptor.page_index() + 1,
      snapshot.page_count().max(1),
      snapshot.total_count,
      descriptor.page_size()
    );
    if let Some(sort) = descriptor.sort() {
      status.push_str(&format!(" | sort {} {}", sort.column, sort.order.as_str()));
    }
    if self.list.search_pending() {
      status.push_str(" | searching...");
    }
    Some(status)
  }

  fn tick(&mut self) {
    self.list.poll();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("n/p", "page").with_priority(30),
      ShortcutInfo::new("+/-", "size").with_priority(40),
      ShortcutInfo::new("s/o", "sort").with_priority(50),
      ShortcutInfo::new("r", "reload").with_priority(60),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
