use crate::api::CachedBackend;
use crate::config::Config;
use crate::event::{Event, EventHandler, Notice};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{self, DashboardView, ViewContext};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Main application state
pub struct App {
  pub(crate) config: Arc<Config>,
  backend: CachedBackend,
  events: EventHandler,
  /// Root view, replaced by `:` commands
  pub(crate) view: Box<dyn View>,
  pub(crate) command: CommandInput,
  /// Latest status bar message
  pub(crate) notice: Option<Notice>,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let config = Arc::new(config);
    let backend = CachedBackend::new(&config)?;
    let events = EventHandler::new(Duration::from_millis(250));
    events.forward_query_updates(backend.cache().subscribe());

    let ctx = Self::view_context(&backend, &config, &events);

    Ok(Self {
      view: Box::new(DashboardView::new(ctx)),
      config,
      backend,
      events,
      command: CommandInput::new(),
      notice: None,
      should_quit: false,
    })
  }

  fn view_context(
    backend: &CachedBackend,
    config: &Arc<Config>,
    events: &EventHandler,
  ) -> ViewContext {
    ViewContext {
      backend: backend.clone(),
      config: Arc::clone(config),
      tx: events.sender(),
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    info!(base_url = %self.config.api.base_url, "started");

    let result = self.main_loop(&mut terminal).await;
    self.view.unmount();

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match self.events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      // Redraw happens at the top of the loop
      Event::Tick => {}
      Event::QueryUpdated(key) => trace!(%key, "query updated"),
      Event::Notice(notice) => self.notice = Some(notice),
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // A focused text field owns the keyboard, so ':' is typed, not a command
    if self.command.is_active() || !self.view.captures_input() {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    // Any other key press dismisses the last notice
    self.notice = None;

    match self.view.handle_key(key) {
      ViewAction::Quit => self.should_quit = true,
      ViewAction::None => {}
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    if cmd == "quit" {
      self.should_quit = true;
      return;
    }

    let ctx = Self::view_context(&self.backend, &self.config, &self.events);
    match views::open(cmd, &ctx) {
      Some(view) => self.switch_to(view),
      None => self.notice = Some(Notice::error(format!("Unknown command: {}", cmd))),
    }
  }

  /// Replace the root view. The old one is unmounted first so its scheduled
  /// refreshes are cancelled.
  fn switch_to(&mut self, view: Box<dyn View>) {
    debug!(from = %self.view.title(), to = %view.title(), "switching view");
    let mut old = std::mem::replace(&mut self.view, view);
    old.unmount();
    self.notice = None;
  }
}
