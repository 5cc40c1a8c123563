//! Application assembly for the Rollbook server binary: configuration,
//! store opening and the top-level router.

use std::path::{Path, PathBuf};

use axum::Router;
use rollbook_core::Rollbook;
use rollbook_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

/// Environment variables with this prefix override file settings, e.g.
/// `ROLLBOOK_PORT=9000`.
pub const ENV_PREFIX: &str = "ROLLBOOK";

/// Store path that selects a throwaway in-memory database.
pub const IN_MEMORY: &str = ":memory:";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from("rollbook.db"),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Layer the optional TOML file at `path` under `ROLLBOOK_*` variables.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix(ENV_PREFIX))
    .build()?
    .try_deserialize()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Store and router ─────────────────────────────────────────────────────────

/// Open the store named by `path`, running schema initialisation.
pub async fn open_store(path: &Path) -> rollbook_store_sqlite::Result<SqliteStore> {
  if path == Path::new(IN_MEMORY) {
    SqliteStore::open_in_memory().await
  } else {
    SqliteStore::open(path).await
  }
}

/// The API mounted under `/api`, with request tracing.
pub fn app(rollbook: Rollbook<SqliteStore>) -> Router {
  Router::new()
    .nest("/api", rollbook_api::api_router(rollbook))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn tilde_expands_against_home() {
    let expanded = expand_tilde(Path::new("~/rollbook.db"));
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expanded, PathBuf::from(home).join("rollbook.db"));
    }
    assert_eq!(expand_tilde(Path::new("/var/rollbook.db")), PathBuf::from("/var/rollbook.db"));
  }

  #[test]
  fn missing_config_file_falls_back_to_defaults() {
    let cfg = load_config(Path::new("/nonexistent/rollbook-config.toml")).unwrap();
    assert_eq!(cfg.store_path, ServerConfig::default().store_path);
  }

  #[test]
  fn config_file_overrides_defaults() {
    let path = std::env::temp_dir().join(format!("rollbook-test-{}.toml", std::process::id()));
    std::fs::write(&path, "port = 9123\nstore_path = \":memory:\"\n").unwrap();
    let cfg = load_config(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.port, 9123);
    assert_eq!(cfg.store_path, PathBuf::from(IN_MEMORY));
    assert_eq!(cfg.host, "127.0.0.1");
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = open_store(Path::new(IN_MEMORY)).await.unwrap();
    let app = app(Rollbook::new(Arc::new(store)));

    let req = Request::builder()
      .uri("/api/streams")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }
}
