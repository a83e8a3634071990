use crate::catalog::CatalogClient;
use crate::commands::{self, Action};
use crate::event::{Event, EventHandler};
use crate::query::{QueryClient, QueryOptions};
use crate::route::Route;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{CacheInspectorView, HomeView, ProductDetailView, ProductListView};
use crate::ui;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{debug, info, warn};

const TICK_RATE: Duration = Duration::from_millis(100);

/// Shared handles every view needs. Clones share the same cache.
#[derive(Clone)]
pub struct Services {
  pub catalog: CatalogClient,
  pub queries: QueryClient,
  pub options: QueryOptions,
}

impl Services {
  /// Build the view for a route
  pub fn open(&self, route: Route) -> Box<dyn View> {
    match route {
      Route::Home => Box::new(HomeView::new(self.clone())),
      Route::Products => Box::new(ProductListView::new(self.clone())),
      Route::Product(id) => Box::new(ProductDetailView::new(id, self.clone())),
    }
  }
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// `:` command overlay
  command: CommandInput,

  services: Services,

  /// Header title
  title: String,

  /// Last command error or notice, shown in the footer
  notice: Option<String>,

  should_quit: bool,
}

impl App {
  pub fn new(services: Services, title: String, route: Route) -> Self {
    info!(%route, "opening initial route");
    let root = services.open(route);
    Self {
      view_stack: vec![root],
      command: CommandInput::new(),
      services,
      title,
      notice: None,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Restore the terminal even if the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    Ok(())
  }

  fn draw(&mut self, frame: &mut Frame) {
    let [header, body, footer] = ui::layout(frame.area());

    let shortcuts = self
      .view_stack
      .last()
      .map(|view| view.shortcuts())
      .unwrap_or_default();
    draw_header(
      frame,
      header,
      &self.title,
      self.services.catalog.base_url().as_str(),
      &shortcuts,
    );

    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, body);
    }
    self.command.render_overlay(frame, body);

    let breadcrumb: Vec<String> = self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label())
      .collect();
    draw_footer(frame, footer, &breadcrumb, self.notice.as_deref().unwrap_or(""));
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {
        // Views below the top keep polling so their state is current on pop
        for view in &mut self.view_stack {
          view.tick();
        }
      }
      Event::Resize => {}
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let view_owns_input = self
      .view_stack
      .last()
      .is_some_and(|view| view.captures_input());

    if !view_owns_input {
      match self.command.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    self.notice = None;
    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::Pop,
    };
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => {
        debug!(view = %view.breadcrumb_label(), "push view");
        self.view_stack.push(view);
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn execute_command(&mut self, input: &str) {
    match commands::parse(input) {
      Ok(Action::Open(route)) => {
        info!(%route, "navigate");
        // Routes replace the whole stack
        self.view_stack = vec![self.services.open(route)];
        self.notice = None;
      }
      Ok(Action::Cache) => {
        self
          .view_stack
          .push(Box::new(CacheInspectorView::new(self.services.queries.clone())));
        self.notice = None;
      }
      Ok(Action::Quit) => self.should_quit = true,
      Err(message) => {
        warn!(%input, %message, "command rejected");
        self.notice = Some(message);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::testing::ScriptedTransport;
  use crate::query::Fetcher;
  use url::Url;

  fn app(route: Route) -> App {
    let services = Services {
      catalog: CatalogClient::new(
        Fetcher::new(ScriptedTransport::new()),
        Url::parse("https://api.test").unwrap(),
      ),
      queries: QueryClient::new(),
      options: QueryOptions::default(),
    };
    App::new(services, "Shop".to_string(), route)
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_command(app: &mut App, cmd: &str) {
    app.handle_key(key(KeyCode::Char(':')));
    for c in cmd.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Enter));
  }

  fn labels(app: &App) -> Vec<String> {
    app.view_stack.iter().map(|v| v.breadcrumb_label()).collect()
  }

  #[tokio::test]
  async fn test_initial_route() {
    assert_eq!(labels(&app(Route::Home)), vec!["Home"]);
    assert_eq!(labels(&app(Route::Product(3))), vec!["#3"]);
  }

  #[tokio::test]
  async fn test_enter_from_home_pushes_list_and_q_pops() {
    let mut app = app(Route::Home);
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(labels(&app), vec!["Home", "Products"]);

    app.handle_key(key(KeyCode::Char('q')));
    assert_eq!(labels(&app), vec!["Home"]);
    assert!(!app.should_quit);

    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_product_command_replaces_stack() {
    let mut app = app(Route::Home);
    app.handle_key(key(KeyCode::Enter));
    type_command(&mut app, "product 5");
    assert_eq!(labels(&app), vec!["#5"]);
  }

  #[tokio::test]
  async fn test_cache_command_pushes_inspector() {
    let mut app = app(Route::Products);
    type_command(&mut app, "cache");
    assert_eq!(labels(&app), vec!["Products", "Cache"]);
  }

  #[tokio::test]
  async fn test_bad_command_sets_notice() {
    let mut app = app(Route::Home);
    type_command(&mut app, "product abc");
    assert_eq!(app.notice.as_deref(), Some("invalid product id: abc"));
    assert_eq!(labels(&app), vec!["Home"]);
  }

  #[tokio::test]
  async fn test_ctrl_c_quits() {
    let mut app = app(Route::Products);
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }
}
