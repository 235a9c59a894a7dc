use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::event::{Notice, NoticeLevel};
use crate::query::{QueryEntry, QueryStatus};

/// Draw the bottom status line: the latest notice, or navigation hints
pub fn draw_status_bar(frame: &mut Frame, area: Rect, notice: Option<&Notice>) {
  let (content, style) = match notice {
    Some(Notice {
      level: NoticeLevel::Info,
      message,
    }) => (format!(" {}", message), Style::default().fg(Color::Green)),
    Some(Notice {
      level: NoticeLevel::Error,
      message,
    }) => (format!(" {}", message), Style::default().fg(Color::Red)),
    None => (
      " :command  j/k:nav  r:refresh  Ctrl-C:quit".to_string(),
      Style::default().fg(Color::DarkGray),
    ),
  };

  frame.render_widget(Paragraph::new(content).style(style), area);
}

/// Block title describing a query entry, e.g. " Companies (12) "
pub fn entry_label<T>(name: &str, entry: &QueryEntry<T>, count: usize) -> String {
  match entry.status {
    QueryStatus::Idle | QueryStatus::Loading => format!(" {} (loading...) ", name),
    QueryStatus::Error => match &entry.error {
      Some(e) if e.is_timeout() => format!(" {} (timed out) ", name),
      Some(e) => format!(" {} (error: {}) ", name, e),
      None => format!(" {} (error) ", name),
    },
    QueryStatus::Success if entry.is_fetching => format!(" {} ({}, refreshing...) ", name, count),
    QueryStatus::Success => format!(" {} ({}) ", name, count),
  }
}
