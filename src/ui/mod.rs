pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::TableState;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let [header, content, status] = Layout::vertical([
    Constraint::Length(1), // Header
    Constraint::Min(1),    // Current view
    Constraint::Length(1), // Status bar
  ])
  .areas(frame.area());

  let shortcuts = app.view.shortcuts();
  let view_title = app.view.title();
  renderfns::draw_header(
    frame,
    header,
    app.config.title(),
    &app.config.api.base_url,
    &view_title,
    &shortcuts,
  );

  app.view.render(frame, content);
  renderfns::draw_status_bar(frame, status, app.notice.as_ref());

  // Overlay last so it sits above the view
  app.command.render_overlay(frame, content);
}

/// Selection that can be clamped to the number of rows being drawn
pub trait Selectable {
  fn selected(&self) -> Option<usize>;
  fn select(&mut self, index: Option<usize>);
}

impl Selectable for TableState {
  fn selected(&self) -> Option<usize> {
    TableState::selected(self)
  }

  fn select(&mut self, index: Option<usize>) {
    TableState::select(self, index)
  }
}

impl Selectable for ratatui::widgets::ListState {
  fn selected(&self) -> Option<usize> {
    ratatui::widgets::ListState::selected(self)
  }

  fn select(&mut self, index: Option<usize>) {
    ratatui::widgets::ListState::select(self, index)
  }
}

/// Keep the selection on a real row: first row when nothing is selected,
/// last row when the list shrank, none when it is empty.
pub fn ensure_valid_selection(state: &mut impl Selectable, len: usize) {
  match (len, state.selected()) {
    (0, _) => state.select(None),
    (_, None) => state.select(Some(0)),
    (len, Some(i)) if i >= len => state.select(Some(len - 1)),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use ratatui::widgets::ListState;

  #[test]
  fn test_ensure_valid_selection() {
    let mut state = ListState::default();
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(0));

    state.select(Some(7));
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(2));

    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }
}
