use super::input::TextInput;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Draw a one-line input overlay at the top-left of `area`
pub fn draw_prompt(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  prefix: &str,
  input: &TextInput,
  accent: Color,
) {
  let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
  let overlay_area = Rect::new(area.x + 1, area.y + 1, width, 3.min(area.height));

  frame.render_widget(Clear, overlay_area);

  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(accent))
    .title(format!(" {} ", title));

  let inner = block.inner(overlay_area);
  frame.render_widget(block, overlay_area);

  if inner.height == 0 {
    return;
  }

  frame.render_widget(Paragraph::new(input.line(prefix, accent)), inner);
}
