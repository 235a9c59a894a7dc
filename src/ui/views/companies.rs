use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

use super::ViewContext;
use crate::api::keys;
use crate::api::types::Company;
use crate::ui::renderfns::{active_color, entry_label, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};

/// Table of every company known to the backend
pub struct CompaniesView {
  ctx: ViewContext,
  table_state: TableState,
}

impl CompaniesView {
  pub fn new(ctx: ViewContext) -> Self {
    ctx.backend.load_companies();
    Self {
      ctx,
      table_state: TableState::default(),
    }
  }
}

fn row(company: &Company) -> Row<'static> {
  let active = match company.is_active {
    Some(true) => "yes",
    Some(false) => "no",
    None => "-",
  };
  Row::new(vec![
    Cell::from(truncate(company.name.as_deref().unwrap_or("(unnamed)"), 40)),
    Cell::from(company.company_guid.clone().unwrap_or_else(|| "-".to_string()))
      .style(Style::default().fg(Color::Cyan)),
    Cell::from(active).style(Style::default().fg(active_color(company.is_active))),
  ])
}

impl View for CompaniesView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('r') => self.ctx.backend.refresh(&keys::companies()),
      KeyCode::Char('q') => return ViewAction::Quit,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let entry = self.ctx.backend.companies();
    let companies = entry.data().map(Vec::as_slice).unwrap_or(&[]);
    crate::ui::ensure_valid_selection(&mut self.table_state, companies.len());

    let block = Block::default()
      .title(entry_label("Companies", &entry, companies.len()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if companies.is_empty() {
      let content = if entry.is_error() {
        "Failed to load companies. Press 'r' to retry."
      } else if entry.is_loading() {
        "Loading..."
      } else {
        "No companies found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let header = Row::new(vec!["Name", "Guid", "Active"])
      .style(Style::default().fg(Color::Yellow).bold());
    let table = Table::new(
      companies.iter().map(row),
      [
        Constraint::Percentage(45),
        Constraint::Percentage(45),
        Constraint::Length(8),
      ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }

  fn title(&self) -> String {
    "Companies".to_string()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("j/k", "move").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(30),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}
