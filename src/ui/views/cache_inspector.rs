use crate::query::{EntryInfo, QueryClient};
use crate::ui::renderfns::status_color;
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use std::time::Duration;
use tokio::time::Instant;

/// Live table of every query cache entry
pub struct CacheInspectorView {
  queries: QueryClient,
  table_state: TableState,
}

impl CacheInspectorView {
  pub fn new(queries: QueryClient) -> Self {
    Self {
      queries,
      table_state: TableState::default(),
    }
  }

  fn selected_entry(&self) -> Option<EntryInfo> {
    let idx = self.table_state.selected()?;
    self.queries.entries().into_iter().nth(idx)
  }
}

/// One inspector row: key, status, age, freshness, subscribers
fn entry_cells(info: &EntryInfo, now: Instant) -> [String; 5] {
  let snapshot = &info.snapshot;
  let freshness = if snapshot.is_fresh(now) {
    "fresh"
  } else if snapshot.invalidated {
    "invalidated"
  } else {
    "stale"
  };

  [
    snapshot.key.to_string(),
    snapshot.status.label().to_string(),
    snapshot.age(now).map(format_age).unwrap_or_else(|| "-".to_string()),
    freshness.to_string(),
    info.subscribers.to_string(),
  ]
}

fn format_age(age: Duration) -> String {
  let secs = age.as_secs();
  if secs < 60 {
    format!("{}s", secs)
  } else {
    format!("{}m{:02}s", secs / 60, secs % 60)
  }
}

impl View for CacheInspectorView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('r') => {
        if let Some(info) = self.selected_entry() {
          self.queries.refetch(&info.snapshot.key);
        }
      }
      KeyCode::Char('i') => {
        if let Some(info) = self.selected_entry() {
          self.queries.invalidate(&info.snapshot.key);
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let entries = self.queries.entries();
    let selected = match self.table_state.selected() {
      _ if entries.is_empty() => None,
      None => Some(0),
      Some(idx) => Some(idx.min(entries.len() - 1)),
    };
    self.table_state.select(selected);

    let block = Block::default()
      .title(format!(" Query cache ({}) ", entries.len()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if entries.is_empty() {
      let paragraph = Paragraph::new("No queries yet.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let now = Instant::now();
    let rows: Vec<Row> = entries
      .iter()
      .map(|info| {
        let [key, status, age, freshness, subscribers] = entry_cells(info, now);
        Row::new(vec![
          Cell::from(key).style(Style::default().fg(Color::Cyan)),
          Cell::from(status).style(Style::default().fg(status_color(info.snapshot.status))),
          Cell::from(age),
          Cell::from(freshness),
          Cell::from(subscribers),
        ])
      })
      .collect();

    let table = Table::new(
      rows,
      [
        Constraint::Min(20),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(5),
      ],
    )
    .header(
      Row::new(vec!["KEY", "STATUS", "AGE", "FRESHNESS", "SUBS"])
        .style(Style::default().fg(Color::DarkGray).bold()),
    )
    .block(block)
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }

  fn breadcrumb_label(&self) -> String {
    "Cache".to_string()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("r", "refetch").with_priority(20),
      Shortcut::new("i", "invalidate").with_priority(25),
      Shortcut::new("q", "back").with_priority(30),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::query::{FetchError, QueryKey, QueryOptions, Subscription};
  use serde_json::{json, Value};

  #[test]
  fn test_format_age() {
    assert_eq!(format_age(Duration::from_secs(3)), "3s");
    assert_eq!(format_age(Duration::from_secs(125)), "2m05s");
  }

  #[tokio::test(start_paused = true)]
  async fn test_entry_cells_track_freshness() {
    let queries = QueryClient::new();
    let key = QueryKey::new().push("product").push(1i64);
    let mut sub: Subscription<Value> = queries.subscribe(
      key.clone(),
      QueryOptions::with_stale_time(Duration::from_secs(15)),
      || async { Ok::<_, FetchError>(json!({"id": 1})) },
    );
    sub.settled().await;

    let entries = queries.entries();
    assert_eq!(
      entry_cells(&entries[0], Instant::now()),
      [
        "[\"product\",1]".to_string(),
        "success".to_string(),
        "0s".to_string(),
        "fresh".to_string(),
        "1".to_string(),
      ]
    );

    tokio::time::advance(Duration::from_secs(20)).await;
    let cells = entry_cells(&queries.entries()[0], Instant::now());
    assert_eq!(cells[2], "20s");
    assert_eq!(cells[3], "stale");

    drop(sub);
    queries.invalidate(&key);
    let cells = entry_cells(&queries.entries()[0], Instant::now());
    assert_eq!(cells[3], "invalidated");
    assert_eq!(cells[4], "0");
  }
}
