use crate::app::Services;
use crate::catalog::{CatalogClient, Product};
use crate::query::{MutationRunner, Status, Subscription};
use crate::ui::components::{draw_prompt, InputResult, TextInput};
use crate::ui::renderfns::{
  availability_color, error_message, product_panel, status_color, ProductCard, ProductPanel,
};
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use serde_json::json;
use tokio::time::Instant;
use tracing::info;

/// Single product backed by the `["product", id]` query, with a title editor
pub struct ProductDetailView {
  id: u64,
  services: Services,
  product: Subscription<Product>,
  update: MutationRunner,
  editor: Option<TextInput>,
}

impl ProductDetailView {
  pub fn new(id: u64, services: Services) -> Self {
    let product = services
      .catalog
      .subscribe_product(&services.queries, id, services.options);
    let update = services.catalog.update_runner(&services.queries, id);

    Self {
      id,
      services,
      product,
      update,
      editor: None,
    }
  }

  fn open_editor(&mut self) {
    let current = self
      .product
      .data()
      .and_then(|p| p.title.clone())
      .unwrap_or_default();
    self.update.reset();
    self.editor = Some(TextInput::with_value(&current));
  }

  fn handle_editor(&mut self, key: KeyEvent) -> Option<ViewAction> {
    let editor = self.editor.as_mut()?;
    match editor.handle_key(key) {
      InputResult::Submitted(title) => {
        self.editor = None;
        let title = title.trim();
        if !title.is_empty() && self.update.run(json!({ "title": title })) {
          info!(id = self.id, "title update submitted");
        }
      }
      InputResult::Cancelled => self.editor = None,
      InputResult::Consumed | InputResult::NotHandled => {}
    }
    Some(ViewAction::None)
  }

  /// Refresh every query that can show this product
  fn invalidate_product(&self) {
    let queries = &self.services.queries;
    queries.invalidate(self.product.key());
    queries.invalidate(&CatalogClient::products_key());
  }

  fn render_detail(&self, frame: &mut Frame, area: Rect) {
    let panel = product_panel(self.product.state());

    let title = match &panel {
      ProductPanel::Card(card) => format!(" {} ", card.title),
      ProductPanel::Loading => format!(" Product {} (loading...) ", self.id),
      ProductPanel::Error { status: Some(status), .. } => {
        format!(" Product {} (HTTP {}) ", self.id, status)
      }
      _ => format!(" Product {} ", self.id),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [body, status_line] = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(1), Constraint::Length(1)])
      .areas(inner);

    let lines = match panel {
      ProductPanel::Empty => vec![Line::styled(
        "Nothing loaded.",
        Style::default().fg(Color::DarkGray),
      )],
      ProductPanel::Loading => vec![Line::styled(
        "Loading product...",
        Style::default().fg(Color::DarkGray),
      )],
      ProductPanel::Error { message, stale, .. } => {
        let hint = match self.product.error() {
          Some(error) if error.is_retryable() => "Connection problem. Press 'r' to retry.",
          _ => "Press 'r' to reload.",
        };
        let mut lines = vec![
          Line::styled(format!("Error: {}", message), Style::default().fg(Color::Red)),
          Line::styled(hint, Style::default().fg(Color::DarkGray)),
        ];
        if let Some(card) = stale {
          lines.push(Line::raw(""));
          lines.push(Line::styled(
            "Showing last loaded data:",
            Style::default().fg(Color::DarkGray),
          ));
          lines.extend(card_lines(&card));
        }
        lines
      }
      ProductPanel::Card(card) => card_lines(&card),
    };

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), body);
    frame.render_widget(Paragraph::new(self.mutation_line()), status_line);
  }

  fn mutation_line(&self) -> Line<'static> {
    let state = self.update.state();
    let detail = match state.status {
      Status::Idle => "press 'e' to edit the title".to_string(),
      Status::Loading => "saving...".to_string(),
      Status::Success => "saved".to_string(),
      Status::Error => state
        .error()
        .map(error_message)
        .unwrap_or_else(|| "failed".to_string()),
    };

    let cached = self
      .services
      .queries
      .snapshot(self.product.key())
      .and_then(|snapshot| snapshot.age(Instant::now()))
      .map(|age| format!("cached {}s ago  ", age.as_secs()))
      .unwrap_or_default();

    Line::from(vec![
      Span::styled(cached, Style::default().fg(Color::DarkGray)),
      Span::styled("Update: ", Style::default().fg(Color::DarkGray)),
      Span::styled(
        state.status.label(),
        Style::default().fg(status_color(state.status)),
      ),
      Span::styled(format!("  {}", detail), Style::default().fg(Color::DarkGray)),
    ])
  }
}

fn card_lines(card: &ProductCard) -> Vec<Line<'static>> {
  let mut lines = vec![
    Line::styled(
      card.title.clone(),
      Style::default().add_modifier(Modifier::BOLD),
    ),
    Line::raw(card.description.clone()),
    Line::raw(""),
  ];

  for (label, value) in card.fields() {
    let value_style = if label == "Availability" {
      Style::default().fg(availability_color(card.low_stock))
    } else {
      Style::default()
    };
    lines.push(Line::from(vec![
      Span::styled(format!("{:<14}", label), Style::default().fg(Color::DarkGray)),
      Span::styled(value.to_string(), value_style),
    ]));
  }

  lines
}

impl View for ProductDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(action) = self.handle_editor(key) {
      return action;
    }

    match key.code {
      KeyCode::Char('r') => {
        self.product.refetch();
        ViewAction::None
      }
      KeyCode::Char('e') if !self.update.is_loading() => {
        self.open_editor();
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_detail(frame, area);
    if let Some(editor) = &self.editor {
      draw_prompt(frame, area, "Edit title", "> ", editor, Color::Magenta);
    }
  }

  fn breadcrumb_label(&self) -> String {
    format!("#{}", self.id)
  }

  fn captures_input(&self) -> bool {
    self.editor.is_some()
  }

  fn tick(&mut self) {
    self.product.poll();
    if self.update.poll() && self.update.state().is_success() {
      info!(id = self.id, "title updated, invalidating product queries");
      self.invalidate_product();
    }
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("e", "edit title").with_priority(20),
      Shortcut::new("r", "refresh").with_priority(25),
      Shortcut::new("q", "back").with_priority(30),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::testing::ScriptedTransport;
  use crate::query::{Fetcher, QueryClient, QueryOptions};
  use crossterm::event::KeyModifiers;
  use serde_json::json;
  use url::Url;

  fn services(transport: ScriptedTransport) -> Services {
    Services {
      catalog: CatalogClient::new(
        Fetcher::new(transport),
        Url::parse("https://api.test").unwrap(),
      ),
      queries: QueryClient::new(),
      options: QueryOptions::default(),
    }
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  async fn settle(view: &mut ProductDetailView) {
    for _ in 0..20 {
      tokio::task::yield_now().await;
      view.tick();
    }
  }

  #[tokio::test]
  async fn test_edit_title_invalidates_product_queries() {
    let transport = ScriptedTransport::new().respond(
      "/products/1",
      200,
      json!({"id": 1, "title": "Essence Mascara Lash Princess"}),
    );
    let calls = transport.calls();
    let services = services(transport);
    let mut view = ProductDetailView::new(1, services.clone());
    view.product.settled().await;
    assert_eq!(calls.count("GET", "/products/1"), 1);

    view.handle_key(key(KeyCode::Char('e')));
    assert!(view.captures_input());
    view.handle_key(key(KeyCode::Char('!')));
    view.handle_key(key(KeyCode::Enter));
    assert!(!view.captures_input());
    assert!(view.update.is_loading());

    for _ in 0..10 {
      if calls.count("PUT", "/products/1") == 1 {
        break;
      }
      tokio::task::yield_now().await;
    }
    assert_eq!(
      calls.last_body(),
      Some(json!({"title": "Essence Mascara Lash Princess!"}))
    );

    settle(&mut view).await;
    assert_eq!(view.update.state().status, Status::Success);
    assert_eq!(calls.count("PUT", "/products/1"), 1);
    // The invalidation refetched the live product subscription
    assert_eq!(calls.count("GET", "/products/1"), 2);
  }

  #[tokio::test]
  async fn test_cancel_editor_runs_nothing() {
    let transport = ScriptedTransport::new().respond("/products/1", 200, json!({"id": 1}));
    let calls = transport.calls();
    let mut view = ProductDetailView::new(1, services(transport));
    view.product.settled().await;

    view.handle_key(key(KeyCode::Char('e')));
    view.handle_key(key(KeyCode::Esc));
    settle(&mut view).await;

    assert!(!view.captures_input());
    assert_eq!(view.update.state().status, Status::Idle);
    assert_eq!(calls.count("PUT", "/products/1"), 0);
  }

  #[tokio::test]
  async fn test_keys_while_editing_do_not_leave_view() {
    let transport = ScriptedTransport::new().respond("/products/1", 200, json!({"id": 1}));
    let mut view = ProductDetailView::new(1, services(transport));
    view.product.settled().await;

    view.handle_key(key(KeyCode::Char('e')));
    assert!(matches!(
      view.handle_key(key(KeyCode::Char('q'))),
      ViewAction::None
    ));
    assert!(view.captures_input());
  }
}
