use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use super::{missing_guid, spawn_job, ViewContext};
use crate::api::keys;
use crate::api::types::{ReportLog, TaskAck};
use crate::api::BackendClient;
use crate::event::{Event, Notice};
use crate::jobs::{JobAck, JobCoordinator, JobRequest};
use crate::ui::components::{GuidForm, KeyResult};
use crate::ui::renderfns::{entry_label, format_amount};
use crate::ui::view::{ShortcutInfo, View, ViewAction};

/// Report generation plus the log of generated reports
pub struct ReportsView {
  ctx: ViewContext,
  jobs: JobCoordinator,
  form: GuidForm,
  list_state: ListState,
}

impl ReportsView {
  pub fn new(ctx: ViewContext) -> Self {
    ctx.backend.load_report_logs();
    let jobs = ctx.backend.jobs();
    Self {
      ctx,
      jobs,
      form: GuidForm::new(),
      list_state: ListState::default(),
    }
  }

  fn generate(&self, guid: &str) {
    let delay = self.ctx.config.jobs.report_refresh_delay();
    self.start(guid, "Report generation", |g| {
      BackendClient::generate_report_job(g, delay)
    });
  }

  fn fetch_finance(&self, guid: &str) {
    let delay = self.ctx.config.jobs.finance_refresh_delay();
    self.start(guid, "Finance fetch", |g| {
      BackendClient::fetch_finance_job(g, delay)
    });
  }

  fn start(
    &self,
    guid: &str,
    label: &'static str,
    build: impl FnOnce(&str) -> JobRequest,
  ) {
    if guid.is_empty() {
      let _ = self.ctx.tx.send(Event::Notice(missing_guid()));
      return;
    }

    let request = build(guid);
    let guid = guid.to_string();
    spawn_job(&self.jobs, request, self.ctx.tx.clone(), move |ack| {
      task_notice(label, &guid, ack)
    });
  }

  fn render_logs(&mut self, frame: &mut Frame, area: Rect) {
    let entry = self.ctx.backend.report_logs();
    let logs = entry.data().map(Vec::as_slice).unwrap_or(&[]);
    crate::ui::ensure_valid_selection(&mut self.list_state, logs.len());

    let block = Block::default()
      .title(entry_label("Report Logs", &entry, logs.len()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if logs.is_empty() {
      let content = if entry.is_error() {
        "Failed to load report logs. Press 'r' to retry."
      } else if entry.is_loading() {
        "Loading..."
      } else {
        "No reports generated yet."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = logs.iter().map(log_item).collect();
    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

fn task_notice(label: &str, guid: &str, ack: &JobAck) -> Notice {
  match ack.decode::<TaskAck>() {
    Ok(task) => Notice::info(format!(
      "{} started for {} (task {})",
      label, guid, task.task_id
    )),
    Err(_) => Notice::info(format!("{} started for {}", label, guid)),
  }
}

fn log_item(log: &ReportLog) -> ListItem<'static> {
  ListItem::new(Line::from(vec![
    Span::styled(
      format!("{:<38}", log.company_guid),
      Style::default().fg(Color::Cyan),
    ),
    Span::styled(
      format!("{:<21}", log.created_at_display()),
      Style::default().fg(Color::DarkGray),
    ),
    Span::styled(
      format!("Sales {:>14}", format_amount(log.total_sales)),
      Style::default().fg(Color::Green),
    ),
    Span::raw("  "),
    Span::styled(
      format!("Refunds {:>12}", format_amount(log.total_refunds)),
      Style::default().fg(Color::Red),
    ),
  ]))
}

impl View for ReportsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.form.handle_key(key) {
      KeyResult::Event(guid) => {
        self.generate(&guid);
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('g') => self.generate(self.form.value()),
      KeyCode::Char('f') => self.fetch_finance(self.form.value()),
      KeyCode::Char('r') => self.ctx.backend.refresh(&keys::report_logs()),
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('q') => return ViewAction::Quit,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let [form, logs] =
      Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);
    self.form.render(frame, form, "Company GUID");
    self.render_logs(frame, logs);
  }

  fn title(&self) -> String {
    "Reports".to_string()
  }

  fn captures_input(&self) -> bool {
    self.form.is_focused()
  }

  fn unmount(&mut self) {
    self.jobs.dispose();
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("i", "edit guid").with_priority(20),
      ShortcutInfo::new("g", "generate").with_priority(30),
      ShortcutInfo::new("f", "fetch finance").with_priority(35),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}
