use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::query::DEFAULT_STALE_TIME;

const DEFAULT_BASE_URL: &str = "https://dummyjson.com";

/// Environment variable overriding `api.base_url`
pub const BASE_URL_ENV: &str = "SHELF_BASE_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub query: QueryConfig,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Per-request timeout; none by default
  pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      timeout_secs: None,
    }
  }
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
  /// How long a successful result is served without refetching
  #[serde(default = "default_stale_time_secs")]
  pub stale_time_secs: u64,
}

impl Default for QueryConfig {
  fn default() -> Self {
    Self {
      stale_time_secs: default_stale_time_secs(),
    }
  }
}

fn default_stale_time_secs() -> u64 {
  DEFAULT_STALE_TIME.as_secs()
}

impl Config {
  /// Load configuration, falling back to defaults when no file exists.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./shelf.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/shelf/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = match explicit_path {
      Some(p) if p.exists() => Some(p.to_path_buf()),
      Some(p) => return Err(eyre!("Config file not found: {}", p.display())),
      None => Self::find_config_file(),
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
      config.api.base_url = base_url;
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("shelf.yaml");
    if local.exists() {
      return Some(local);
    }

    let xdg_path = dirs::config_dir()?.join("shelf").join("config.yaml");
    xdg_path.exists().then_some(xdg_path)
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file is an empty mapping
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Validated API base URL (http or https only)
  pub fn base_url(&self) -> Result<Url> {
    let url = Url::parse(&self.api.base_url)
      .map_err(|e| eyre!("Invalid API base URL '{}': {}", self.api.base_url, e))?;
    match url.scheme() {
      "http" | "https" => Ok(url),
      other => Err(eyre!(
        "Unsupported scheme '{}' in API base URL '{}'",
        other,
        self.api.base_url
      )),
    }
  }

  pub fn stale_time(&self) -> Duration {
    Duration::from_secs(self.query.stale_time_secs)
  }

  pub fn request_timeout(&self) -> Option<Duration> {
    self.api.timeout_secs.map(Duration::from_secs)
  }
}
