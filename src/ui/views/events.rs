use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::{missing_guid, spawn_job, ViewContext};
use crate::api::types::SyncAck;
use crate::api::BackendClient;
use crate::event::{Event, Notice};
use crate::jobs::{JobAck, JobCoordinator};
use crate::ui::components::{GuidForm, KeyResult};
use crate::ui::view::{ShortcutInfo, View, ViewAction};

/// Pulls a company's events from the ticketing provider
pub struct EventsView {
  ctx: ViewContext,
  jobs: JobCoordinator,
  form: GuidForm,
}

impl EventsView {
  pub fn new(ctx: ViewContext) -> Self {
    let jobs = ctx.backend.jobs();
    Self {
      ctx,
      jobs,
      form: GuidForm::new(),
    }
  }

  fn sync(&self, guid: &str) {
    if guid.is_empty() {
      let _ = self.ctx.tx.send(Event::Notice(missing_guid()));
      return;
    }

    let delay = self.ctx.config.jobs.sync_refresh_delay();
    let request = BackendClient::sync_events_job(guid, delay);
    spawn_job(&self.jobs, request, self.ctx.tx.clone(), sync_notice);
  }
}

fn sync_notice(ack: &JobAck) -> Notice {
  match ack.decode::<SyncAck>() {
    Ok(sync) => Notice::info(format!("Synced {} events", sync.count)),
    Err(e) => Notice::error(e.to_string()),
  }
}

impl View for EventsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.form.handle_key(key) {
      KeyResult::Event(guid) => {
        self.sync(&guid);
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('s') => self.sync(self.form.value()),
      KeyCode::Char('q') => return ViewAction::Quit,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let [form, info] =
      Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);
    self.form.render(frame, form, "Company GUID");

    let pending = self.jobs.pending();
    let mut lines = vec![
      Line::from("Sync pulls the company's latest events from the ticketing provider."),
      Line::from("The companies list refreshes shortly after the backend accepts the job."),
      Line::from(""),
    ];
    if pending > 0 {
      lines.push(Line::from(Span::styled(
        format!("{} refresh(es) scheduled", pending),
        Style::default().fg(Color::Yellow),
      )));
    }

    let paragraph = Paragraph::new(lines)
      .wrap(Wrap { trim: true })
      .style(Style::default().fg(Color::Gray))
      .block(
        Block::default()
          .title(" Event Sync ")
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::Blue)),
      );
    frame.render_widget(paragraph, info);
  }

  fn title(&self) -> String {
    "Events".to_string()
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
      ShortcutInfo::new("s", "sync").with_priority(30),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;
  use serde_json::json;

  fn ack(body: serde_json::Value) -> JobAck {
    JobAck {
      endpoint: "/events/sync".to_string(),
      body,
      triggered_at: Utc::now(),
    }
  }

  #[test]
  fn test_sync_notice_reports_count() {
    let notice = sync_notice(&ack(json!({ "status": "success", "count": 12 })));
    assert_eq!(notice, Notice::info("Synced 12 events"));
  }

  #[test]
  fn test_sync_notice_on_unexpected_body() {
    let notice = sync_notice(&ack(json!({ "queued": true })));
    assert_eq!(notice.level, crate::event::NoticeLevel::Error);
  }
}
