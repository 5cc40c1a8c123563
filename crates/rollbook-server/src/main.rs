//! rollbook-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), layers
//! `ROLLBOOK_*` environment variables over it, opens the SQLite store and
//! serves the JSON API under `/api`.
//!
//! The API trusts the `x-user-*` principal headers, so run it behind the
//! session proxy that sets them.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use rollbook_core::Rollbook;
use rollbook_server::{IN_MEMORY, app, expand_tilde, load_config, open_store};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Rollbook attendance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create the database schema and exit.
  #[arg(long)]
  init_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = load_config(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if store_path != PathBuf::from(IN_MEMORY)
    && let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty())
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create store directory {parent:?}"))?;
  }

  let store = open_store(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if cli.init_only {
    tracing::info!(path = ?store_path, "store initialised");
    return Ok(());
  }

  let app = app(Rollbook::new(Arc::new(store)));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
