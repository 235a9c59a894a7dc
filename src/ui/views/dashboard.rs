use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use super::ViewContext;
use crate::api::keys;
use crate::api::types::{Health, ReportLog};
use crate::query::{QueryEntry, QueryStatus};
use crate::ui::renderfns::format_amount;
use crate::ui::view::{ShortcutInfo, View, ViewAction};

/// Overview of backend health and totals across all report logs
pub struct DashboardView {
  ctx: ViewContext,
}

impl DashboardView {
  pub fn new(ctx: ViewContext) -> Self {
    ctx.backend.load_health();
    ctx.backend.load_companies();
    ctx.backend.load_report_logs();
    Self { ctx }
  }

  fn refresh(&self) {
    let backend = &self.ctx.backend;
    backend.refresh(&keys::health());
    backend.refresh(&keys::companies());
    backend.refresh(&keys::report_logs());
  }

  fn card(frame: &mut Frame, area: Rect, title: &str, value: String, color: Color) {
    let block = Block::default()
      .title(format!(" {} ", title))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let paragraph = Paragraph::new(Line::from(Span::styled(
      value,
      Style::default().fg(color).bold(),
    )))
    .alignment(Alignment::Center)
    .block(block);
    frame.render_widget(paragraph, area);
  }
}

fn pending(status: QueryStatus) -> bool {
  matches!(status, QueryStatus::Idle | QueryStatus::Loading)
}

/// Backend card text: live status, last known status, or why there is none
fn health_card(entry: &QueryEntry<Health>) -> (String, Color) {
  match entry.data() {
    Some(h) if entry.is_success() => (h.status.clone(), Color::Green),
    Some(h) => (format!("{} (stale)", h.status), Color::Yellow),
    None => match entry.error.as_ref().map(|e| e.status()) {
      Some(Some(code)) => (format!("HTTP {}", code), Color::Red),
      Some(None) => ("unreachable".to_string(), Color::Red),
      None => ("...".to_string(), Color::DarkGray),
    },
  }
}

fn totals(logs: &[ReportLog]) -> (f64, f64) {
  logs.iter().fold((0.0, 0.0), |(sales, refunds), log| {
    (sales + log.total_sales, refunds + log.total_refunds)
  })
}

impl View for DashboardView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => {
        self.refresh();
        ViewAction::None
      }
      KeyCode::Char('q') => ViewAction::Quit,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let backend = &self.ctx.backend;
    let health = backend.health();
    let companies = backend.companies();
    let logs = backend.report_logs();

    let [cards, chart] =
      Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);
    let [sales, refunds, active, status] =
      Layout::horizontal([Constraint::Ratio(1, 4); 4]).areas(cards);

    let (total_sales, total_refunds) = logs.data().map(|l| totals(l)).unwrap_or((0.0, 0.0));
    let amount = |status: QueryStatus, value: f64| {
      if pending(status) {
        "...".to_string()
      } else {
        format_amount(value)
      }
    };
    Self::card(
      frame,
      sales,
      "Total Sales",
      amount(logs.status, total_sales),
      Color::Green,
    );
    Self::card(
      frame,
      refunds,
      "Total Refunds",
      amount(logs.status, total_refunds),
      Color::Red,
    );

    let active_count = match companies.data() {
      Some(list) => list
        .iter()
        .filter(|c| c.is_active == Some(true))
        .count()
        .to_string(),
      None if pending(companies.status) => "...".to_string(),
      None => "-".to_string(),
    };
    Self::card(frame, active, "Active Companies", active_count, Color::Cyan);

    let (health_text, health_color) = health_card(&health);
    Self::card(frame, status, "Backend", health_text, health_color);

    let placeholder = Paragraph::new("No revenue series available yet.")
      .style(Style::default().fg(Color::DarkGray))
      .alignment(Alignment::Center)
      .block(
        Block::default()
          .title(" Revenue (last 30 days) ")
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::Blue)),
      );
    frame.render_widget(placeholder, chart);
  }

  fn title(&self) -> String {
    "Dashboard".to_string()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("r", "refresh").with_priority(20),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::error::{Method, NetworkErrorKind};
  use crate::api::types::RecordId;
  use crate::api::TransportError;
  use std::sync::Arc;

  fn health_entry(
    status: QueryStatus,
    data: Option<&str>,
    error: Option<TransportError>,
  ) -> QueryEntry<Health> {
    QueryEntry {
      status,
      data: data.map(|s| {
        Arc::new(Health {
          status: s.to_string(),
          app: None,
          timestamp: None,
        })
      }),
      error,
      last_fetched_at: None,
      is_fetching: false,
      is_stale: false,
    }
  }

  fn log(sales: f64, refunds: f64) -> ReportLog {
    ReportLog {
      id: RecordId::Int(1),
      company_guid: "abc".to_string(),
      total_sales: sales,
      total_refunds: refunds,
      created_at: None,
    }
  }

  #[test]
  fn test_totals_sum_all_logs() {
    assert_eq!(totals(&[]), (0.0, 0.0));
    assert_eq!(totals(&[log(100.5, 2.0), log(50.0, 0.5)]), (150.5, 2.5));
  }

  #[test]
  fn test_health_card() {
    let http = TransportError::Http {
      status: 503,
      method: Method::Get,
      path: "/health".to_string(),
    };
    let refused = TransportError::Network {
      kind: NetworkErrorKind::Connect,
      method: Method::Get,
      path: "/health".to_string(),
      message: "connection refused".to_string(),
    };

    let ok = health_entry(QueryStatus::Success, Some("ok"), None);
    assert_eq!(health_card(&ok), ("ok".to_string(), Color::Green));

    let stale = health_entry(QueryStatus::Error, Some("ok"), Some(http.clone()));
    assert_eq!(health_card(&stale), ("ok (stale)".to_string(), Color::Yellow));

    let down = health_entry(QueryStatus::Error, None, Some(http));
    assert_eq!(health_card(&down), ("HTTP 503".to_string(), Color::Red));

    let gone = health_entry(QueryStatus::Error, None, Some(refused));
    assert_eq!(health_card(&gone), ("unreachable".to_string(), Color::Red));

    let loading = health_entry(QueryStatus::Loading, None, None);
    assert_eq!(health_card(&loading).1, Color::DarkGray);
  }
}
