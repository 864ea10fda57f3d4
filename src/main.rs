mod app;
mod commands;
mod event;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use txreview::config::Config;

#[derive(Parser, Debug)]
#[command(name = "txreview")]
#[command(about = "Review and approve transactions from the command line")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/txreview/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Transaction dataset to serve (overrides `fixture` in the config)
  #[arg(short, long)]
  fixture: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  // Override fixture if specified on command line
  let config = if let Some(fixture) = args.fixture {
    Config {
      fixture: Some(fixture),
      ..config
    }
  } else {
    config
  };

  let _log_guard = init_logging(&config)?;

  // Initialize and run the app
  let mut app = app::App::new(&config)?;
  app.run().await?;

  Ok(())
}

/// Log to a file; stdout belongs to the shell.
fn init_logging(config: &Config) -> Result<WorkerGuard> {
  let path = config.log_path()?;
  let dir = path
    .parent()
    .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;
  let file_name = path
    .file_name()
    .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;

  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::never(dir, file_name);
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let filter = EnvFilter::try_from_env("TXREVIEW_LOG")
    .or_else(|_| EnvFilter::try_from_default_env())
    .unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}
