use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use super::ViewContext;
use crate::config::{Config, API_BASE_ENV};
use crate::logging::LOG_ENV;
use crate::ui::view::{View, ViewAction};

/// Read-only view of the effective configuration
pub struct SettingsView {
  ctx: ViewContext,
}

impl SettingsView {
  pub fn new(ctx: ViewContext) -> Self {
    Self { ctx }
  }
}

fn setting(name: &str, value: String) -> Line<'static> {
  Line::from(vec![
    Span::styled(format!("  {:<24}", name), Style::default().fg(Color::Cyan)),
    Span::raw(value),
  ])
}

fn section(title: &str) -> Line<'static> {
  Line::from(Span::styled(
    title.to_string(),
    Style::default().fg(Color::Yellow).bold(),
  ))
}

fn settings_lines(config: &Config, stale_secs: u64) -> Vec<Line<'static>> {
  let log_file = config
    .log_path()
    .map(|p| p.display().to_string())
    .unwrap_or_else(|e| format!("unavailable ({})", e));

  vec![
    section("API"),
    setting("base_url", config.api.base_url.clone()),
    setting(
      "request_timeout_ms",
      config.api.request_timeout_ms.to_string(),
    ),
    Line::from(""),
    section("Cache"),
    setting("stale_time_secs", stale_secs.to_string()),
    Line::from(""),
    section("Jobs"),
    setting(
      "report_refresh_delay_ms",
      config.jobs.report_refresh_delay_ms.to_string(),
    ),
    setting(
      "sync_refresh_delay_ms",
      config.jobs.sync_refresh_delay_ms.to_string(),
    ),
    setting(
      "finance_refresh_delay_ms",
      config.jobs.finance_refresh_delay_ms.to_string(),
    ),
    Line::from(""),
    section("Logging"),
    setting("log_file", log_file),
    Line::from(""),
    Line::from(Span::styled(
      format!(
        "{} overrides base_url; {} sets the log filter (e.g. wzm=debug).",
        API_BASE_ENV, LOG_ENV
      ),
      Style::default().fg(Color::DarkGray),
    )),
  ]
}

impl View for SettingsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('q') => ViewAction::Quit,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let stale_secs = self.ctx.backend.cache().stale_time().as_secs();
    let paragraph = Paragraph::new(settings_lines(&self.ctx.config, stale_secs)).block(
      Block::default()
        .title(" Settings ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue)),
    );
    frame.render_widget(paragraph, area);
  }

  fn title(&self) -> String {
    "Settings".to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_settings_lines_show_effective_values() {
    let mut config = Config::default();
    config.api.base_url = "http://reports.internal:9000".to_string();
    config.log_file = Some("/tmp/wzm-test.log".into());

    let text: Vec<String> = settings_lines(&config, 60)
      .iter()
      .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
      .collect();

    assert!(text.iter().any(|l| l.contains("http://reports.internal:9000")));
    assert!(text.iter().any(|l| l.contains("stale_time_secs") && l.ends_with("60")));
    assert!(text
      .iter()
      .any(|l| l.contains("finance_refresh_delay_ms") && l.ends_with("1500")));
    assert!(text.iter().any(|l| l.ends_with("/tmp/wzm-test.log")));
  }
}
