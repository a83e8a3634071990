use crate::app::Services;
use crate::catalog::Product;
use crate::query::Subscription;
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{error_message, product_row, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::ProductDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Catalog list backed by the shared `["products"]` query
pub struct ProductListView {
  services: Services,
  products: Subscription<Vec<Product>>,
  list_state: ListState,
  search: SearchInput,
  filter: String,
}

impl ProductListView {
  pub fn new(services: Services) -> Self {
    let products = services
      .catalog
      .subscribe_products(&services.queries, services.options);

    Self {
      services,
      products,
      list_state: ListState::default(),
      search: SearchInput::new(),
      filter: String::new(),
    }
  }

  /// Products matching the current filter on title or category
  fn visible(&self) -> Vec<&Product> {
    let all = self.products.data().map(|v| v.as_slice()).unwrap_or(&[]);
    if self.filter.is_empty() {
      return all.iter().collect();
    }
    let needle = self.filter.to_lowercase();
    all
      .iter()
      .filter(|p| matches_filter(p, &needle))
      .collect()
  }

  fn title(&self, shown: usize) -> String {
    let count = if self.filter.is_empty() {
      format!("{}", shown)
    } else {
      format!("{} matching '{}'", shown, self.filter)
    };

    if self.products.is_loading() {
      format!(" Products {} (loading...) ", count)
    } else if let Some(error) = self.products.error() {
      format!(" Products {} (error: {}) ", count, error_message(error))
    } else {
      format!(" Products {} ", count)
    }
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.visible().len();
    ensure_valid_selection(&mut self.list_state, len);

    let block = Block::default()
      .title(self.title(len))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 {
      let state = self.products.state();
      let content = if state.is_loading() {
        "Loading products..."
      } else if state.is_error() {
        "Failed to load products. Press 'r' to retry."
      } else if !self.filter.is_empty() {
        "No products match the filter."
      } else {
        "No products found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let title_width = (area.width as usize).saturating_sub(40).max(16);
    let items: Vec<ListItem> = self
      .visible()
      .into_iter()
      .map(|product| {
        let row = product_row(product);
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<6}", row.id), Style::default().fg(Color::Cyan)),
          Span::raw(format!(
            "{:<width$}",
            truncate(&row.title, title_width),
            width = title_width
          )),
          Span::raw(" "),
          Span::styled(
            format!("{:<16}", truncate(&row.category, 16)),
            Style::default().fg(Color::Yellow),
          ),
          Span::styled(
            format!("{:>10}", row.price),
            Style::default().fg(Color::Green),
          ),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.search.handle_key(key) {
      KeyResult::Handled | KeyResult::Event(SearchEvent::Submitted) => Some(ViewAction::None),
      KeyResult::Event(SearchEvent::Changed(filter)) => {
        self.filter = filter;
        self.list_state.select(None);
        Some(ViewAction::None)
      }
      KeyResult::NotHandled => None,
    }
  }

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
        Some(ViewAction::None)
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
        Some(ViewAction::None)
      }
      KeyCode::Char('g') | KeyCode::Home => {
        self.list_state.select_first();
        Some(ViewAction::None)
      }
      KeyCode::Char('G') | KeyCode::End => {
        self.list_state.select_last();
        Some(ViewAction::None)
      }
      _ => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('r') => {
        self.products.refetch();
        Some(ViewAction::None)
      }
      KeyCode::Enter => {
        let idx = self.list_state.selected()?;
        let id = self.visible().get(idx)?.id;
        Some(ViewAction::Push(Box::new(ProductDetailView::new(
          id,
          self.services.clone(),
        ))))
      }
      KeyCode::Esc if !self.filter.is_empty() => {
        self.filter.clear();
        Some(ViewAction::None)
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

fn matches_filter(product: &Product, needle: &str) -> bool {
  let hit = |field: &Option<String>| {
    field
      .as_deref()
      .is_some_and(|value| value.to_lowercase().contains(needle))
  };
  hit(&product.title) || hit(&product.category)
}

impl View for ProductListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_overlays(key)
      .or_else(|| self.handle_navigation(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Products".to_string()
  }

  fn captures_input(&self) -> bool {
    self.search.is_active()
  }

  fn tick(&mut self) {
    self.products.poll();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("/", "search").with_priority(20),
      Shortcut::new("enter", "open").with_priority(25),
      Shortcut::new("r", "refresh").with_priority(28),
      Shortcut::new("q", "back").with_priority(30),
    ]
  }
}
