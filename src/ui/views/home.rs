use crate::app::Services;
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::ProductListView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Start page for the `/` route
pub struct HomeView {
  services: Services,
}

impl HomeView {
  pub fn new(services: Services) -> Self {
    Self { services }
  }
}

impl View for HomeView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Enter | KeyCode::Char('p') => {
        ViewAction::Push(Box::new(ProductListView::new(self.services.clone())))
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Home ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let key = Style::default().fg(Color::Cyan);
    let dim = Style::default().fg(Color::DarkGray);
    let lines = vec![
      Line::styled("Welcome to shelf", Style::default().bold()),
      Line::raw(""),
      Line::from(vec![
        Span::raw("Catalog at "),
        Span::styled(self.services.catalog.base_url().to_string(), key),
      ]),
      Line::raw(""),
      Line::from(vec![
        Span::styled("enter", key),
        Span::styled("            browse products", dim),
      ]),
      Line::from(vec![
        Span::styled(":product <id>", key),
        Span::styled("    open one product", dim),
      ]),
      Line::from(vec![
        Span::styled(":cache", key),
        Span::styled("           inspect cached queries", dim),
      ]),
    ];

    frame.render_widget(
      Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
      area,
    );
  }

  fn breadcrumb_label(&self) -> String {
    "Home".to_string()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("enter", "products").with_priority(20),
      Shortcut::new("q", "quit").with_priority(30),
    ]
  }
}
