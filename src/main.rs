mod api;
mod app;
mod commands;
mod config;
mod event;
mod jobs;
mod logging;
mod query;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "wzm")]
#[command(about = "A terminal client for the WeezMon reporting backend")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./wzm.yaml, then $XDG_CONFIG_HOME/wzm/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Backend base URL, e.g. http://localhost:8000
  #[arg(short, long)]
  api_base: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Command line wins over file and environment
  if let Some(api_base) = args.api_base {
    config.api.base_url = api_base;
  }

  let _log_guard = logging::init(&config.log_path()?)?;

  // Initialize and run the app
  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
