use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Company GUID field shared by the job views.
///
/// `i` or Enter focuses the field. While focused every key goes to the
/// field; Enter submits the trimmed value and Esc leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct GuidForm {
  input: TextInput,
  focused: bool,
}

impl GuidForm {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_focused(&self) -> bool {
    self.focused
  }

  pub fn value(&self) -> &str {
    self.input.value().trim()
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<String> {
    if !self.focused {
      return match key.code {
        KeyCode::Char('i') | KeyCode::Enter => {
          self.focused = true;
          KeyResult::Handled
        }
        _ => KeyResult::NotHandled,
      };
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(_) => {
        self.focused = false;
        KeyResult::Event(self.value().to_string())
      }
      InputResult::Cancelled => {
        self.focused = false;
        KeyResult::Handled
      }
      InputResult::Consumed | InputResult::NotHandled => KeyResult::Handled,
    }
  }

  pub fn render(&self, frame: &mut Frame, area: Rect, label: &str) {
    let border = if self.focused {
      Color::Yellow
    } else {
      Color::Blue
    };
    let block = Block::default()
      .title(format!(" {} ", label))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border));

    let line = if self.focused {
      let cursor = self.input.cursor_position();
      let (before, after): (String, String) = {
        let chars: Vec<char> = self.input.value().chars().collect();
        (
          chars[..cursor].iter().collect(),
          chars[cursor..].iter().collect(),
        )
      };
      Line::from(vec![
        Span::raw(before),
        Span::styled("_", Style::default().fg(Color::Yellow)),
        Span::raw(after),
      ])
    } else if self.input.is_empty() {
      Line::from(Span::styled(
        "press i to enter a company GUID",
        Style::default().fg(Color::DarkGray),
      ))
    } else {
      Line::from(self.input.value().to_string())
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
  }
}
