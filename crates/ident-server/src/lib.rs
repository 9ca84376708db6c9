//! Server assembly for Ident: configuration loading and the top-level
//! router wrapping [`ident_api::api_router`].

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use ident_api::api_router;
use ident_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::cors::CorsLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration.
///
/// Layered as: built-in defaults, then the optional TOML file, then
/// `IDENT_*` environment variables (e.g. `IDENT_PORT=8080`).
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Answer cross-origin requests from any origin.
  pub cors:       bool,
}

impl ServerConfig {
  pub fn load(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 3000)?
      .set_default("store_path", "identity.db")?
      .set_default("cors", true)?
      .add_source(config::File::from(path.as_ref().to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("IDENT"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path` with a leading `~` expanded to the user's home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router for `store`.
pub fn app(store: Arc<SqliteStore>, config: &ServerConfig) -> Router {
  let router = api_router(store);
  if config.cors {
    router.layer(CorsLayer::permissive())
  } else {
    router
  }
}
