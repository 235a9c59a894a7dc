use ratatui::prelude::Color;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for a company's active flag
pub fn active_color(is_active: Option<bool>) -> Color {
  match is_active {
    Some(true) => Color::Green,
    Some(false) => Color::Red,
    None => Color::DarkGray,
  }
}

/// Money amount with two decimals and thousands separators
pub fn format_amount(amount: f64) -> String {
  let negative = amount < 0.0;
  let cents = (amount.abs() * 100.0).round() as u64;
  let whole = (cents / 100).to_string();

  let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
  for (i, c) in whole.chars().enumerate() {
    if i > 0 && (whole.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(c);
  }

  format!(
    "{}{}.{:02}",
    if negative { "-" } else { "" },
    grouped,
    cents % 100
  )
}
