use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Terminal resized; redraw
  Resize,
  /// Periodic tick for UI refresh and subscription polling
  Tick,
}

/// Event handler that produces events from terminal input and a tick timer
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    spawn_ticker(tx.clone(), tick_rate);
    spawn_terminal_reader(tx, tick_rate);
    Self { rx }
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

/// Ticks on a fixed schedule, independent of key input
fn spawn_ticker(tx: mpsc::UnboundedSender<Event>, tick_rate: Duration) {
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(tick_rate);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
      interval.tick().await;
      if tx.send(Event::Tick).is_err() {
        break;
      }
    }
  });
}

/// crossterm polling blocks, keep it off the async workers. The poll
/// timeout only bounds how long a closed channel goes unnoticed.
fn spawn_terminal_reader(tx: mpsc::UnboundedSender<Event>, poll_timeout: Duration) {
  tokio::task::spawn_blocking(move || loop {
    if tx.is_closed() {
      break;
    }

    let event = match event::poll(poll_timeout) {
      Ok(true) => match event::read() {
        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
        Ok(CrosstermEvent::Resize(_, _)) => Event::Resize,
        Ok(_) => continue,
        Err(e) => {
          warn!(error = %e, "failed to read terminal event");
          continue;
        }
      },
      Ok(false) => continue,
      Err(e) => {
        warn!(error = %e, "terminal event poll failed");
        std::thread::sleep(poll_timeout);
        continue;
      }
    };

    if tx.send(event).is_err() {
      break;
    }
  });
}
