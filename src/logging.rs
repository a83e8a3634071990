use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive
pub const LOG_ENV: &str = "SHELF_LOG";

const DEFAULT_FILTER: &str = "shelf=info";

/// Directory for log files: $XDG_DATA_HOME/shelf/logs
pub fn log_dir() -> Option<PathBuf> {
  dirs::data_dir().map(|dir| dir.join("shelf").join("logs"))
}

/// Route tracing output to a daily-rolling file. The terminal belongs to the
/// TUI, so nothing is written to stdout.
///
/// Without a usable log directory the app runs with logging off.
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init() -> Result<Option<WorkerGuard>> {
  match log_dir() {
    Some(dir) => init_in(&dir),
    None => Ok(None),
  }
}

fn init_in(dir: &Path) -> Result<Option<WorkerGuard>> {
  if let Err(e) = std::fs::create_dir_all(dir) {
    // Printed before the TUI takes over the screen
    eprintln!(
      "shelf: logging disabled, cannot create {}: {}",
      dir.display(),
      e
    );
    return Ok(None);
  }

  let appender = tracing_appender::rolling::daily(dir, "shelf.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(Some(guard))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_unusable_log_dir_disables_logging() {
    // A regular file where a directory is expected
    let blocker = std::env::temp_dir().join(format!("shelf-log-blocker-{}", std::process::id()));
    std::fs::write(&blocker, b"").unwrap();

    let guard = init_in(&blocker.join("logs")).unwrap();
    assert!(guard.is_none());

    std::fs::remove_file(&blocker).unwrap();
  }
}
