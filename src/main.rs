mod app;
mod catalog;
mod commands;
mod config;
mod event;
mod logging;
mod print;
mod query;
mod route;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing::info;

use crate::app::{App, Services};
use crate::catalog::CatalogClient;
use crate::query::{Fetcher, QueryClient, QueryOptions, ReqwestTransport};
use crate::route::Route;

#[derive(Parser, Debug)]
#[command(name = "shelf")]
#[command(about = "A terminal storefront browser with a cached query layer")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./shelf.yaml, then $XDG_CONFIG_HOME/shelf/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Catalog API base URL (overrides config and SHELF_BASE_URL)
  #[arg(short, long)]
  base_url: Option<String>,

  /// Seconds a fetched result stays fresh
  #[arg(short, long)]
  stale_time: Option<u64>,

  /// Print the route's data as text and exit instead of starting the TUI
  #[arg(short, long)]
  print: bool,

  /// Initial route: /, /products or /products/<id>
  #[arg(default_value = "/products")]
  path: String,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = logging::init()?;

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(base_url) = args.base_url {
    config.api.base_url = base_url;
  }
  if let Some(secs) = args.stale_time {
    config.query.stale_time_secs = secs;
  }

  let route: Route = args
    .path
    .parse()
    .map_err(|e| eyre!("Invalid start path: {}", e))?;
  let base_url = config.base_url()?;
  let stale_time = config.stale_time();
  info!(%base_url, ?stale_time, "starting");

  let transport = ReqwestTransport::new(config.request_timeout())?;
  let services = Services {
    catalog: CatalogClient::new(Fetcher::new(transport), base_url.clone()),
    queries: QueryClient::new(),
    options: QueryOptions::with_stale_time(stale_time),
  };

  let title = config
    .title
    .clone()
    .unwrap_or_else(|| base_url.host_str().unwrap_or("shelf").to_string());

  if args.print {
    for line in print::render(&services, route).await? {
      println!("{}", line);
    }
    return Ok(());
  }

  let mut app = App::new(services, title, route);
  app.run().await?;

  Ok(())
}
