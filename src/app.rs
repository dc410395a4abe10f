use crate::commands::Target;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::session::Session;
use crate::ui;
use crate::ui::components::{CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{ListView, OrdersView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{debug, info};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Main application state
pub struct App {
  config: Config,
  session: Session,

  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// `:` command bar
  command: CommandInput,

  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let session = Session::new(&config)?;
    let mut app = Self {
      config,
      session,
      view_stack: Vec::new(),
      command: CommandInput::new(),
      should_quit: false,
    };
    app.open(Target::Orders)?;
    Ok(app)
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = self.event_loop().await;

    // Cleanup terminal, even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    self.session.shutdown();

    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key)?,
        Some(Event::Tick) => {
          if let Some(view) = self.current_view_mut() {
            view.tick();
          }
        }
        Some(Event::Resize) => {}
        None => break,
      }
    }

    Ok(())
  }

  /// Replace the navigation stack with a fresh view for `target`
  fn open(&mut self, target: Target) -> Result<()> {
    let view: Box<dyn View> = match target {
      Target::Quit => {
        self.should_quit = true;
        return Ok(());
      }
      Target::Orders => Box::new(OrdersView::new(
        self.session.list(&self.session.orders)?,
        self.session.transitions(),
      )),
      Target::Products => Box::new(ListView::new(self.session.list(&self.session.products)?)),
      Target::Users => Box::new(ListView::new(self.session.list(&self.session.users)?)),
      Target::Posts => Box::new(ListView::new(self.session.list(&self.session.posts)?)),
      Target::Reports => Box::new(ListView::new(self.session.list(&self.session.reports)?)),
    };

    info!(view = %view.breadcrumb_label(), "opened view");
    self.view_stack.clear();
    self.view_stack.push(view);
    Ok(())
  }

  fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return Ok(());
    }

    let view_captures = self.current_view().is_some_and(|v| v.captures_input());
    if self.command.is_active() || !view_captures {
      match self.command.handle_key(key) {
        KeyResult::Event(target) => return self.open(target),
        KeyResult::Handled => return Ok(()),
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.current_view_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };

    if action == ViewAction::Pop {
      if self.view_stack.len() > 1 {
        self.view_stack.pop();
      } else {
        debug!("back at root view, quitting");
        self.should_quit = true;
      }
    }
    Ok(())
  }

  pub fn title(&self) -> String {
    self
      .config
      .title
      .clone()
      .unwrap_or_else(|| "storefront-admin".to_string())
  }

  pub fn api_url(&self) -> &str {
    &self.config.api.url
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self.view_stack.iter().map(|v| v.breadcrumb_label()).collect()
  }

  pub fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| v.as_ref())
  }

  pub fn current_view_mut(&mut self) -> Option<&mut (dyn View + 'static)> {
    self.view_stack.last_mut().map(|v| v.as_mut())
  }

  pub fn command(&self) -> &CommandInput {
    &self.command
  }
}
