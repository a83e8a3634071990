use crate::query::Status;
use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for a product availability status
pub fn availability_color(low_stock: bool) -> Color {
  if low_stock {
    Color::Red
  } else {
    Color::Green
  }
}

/// Display color for a query or mutation status
pub fn status_color(status: Status) -> Color {
  match status {
    Status::Idle => Color::DarkGray,
    Status::Loading => Color::Yellow,
    Status::Success => Color::Green,
    Status::Error => Color::Red,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("crème brûlée tart", 8), "crème...");
  }

  #[test]
  fn test_availability_color() {
    assert_eq!(availability_color(true), Color::Red);
    assert_eq!(availability_color(false), Color::Green);
  }

  #[test]
  fn test_status_color() {
    assert_eq!(status_color(Status::Loading), Color::Yellow);
    assert_eq!(status_color(Status::Error), Color::Red);
  }
}
