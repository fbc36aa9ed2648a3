//! HTTP server assembly for clubhub.
//!
//! Wires the API router from `clubhub-api` to an [`EngagementService`],
//! puts bearer-token identification and request tracing in front of it, and
//! mounts everything under `/api`.

pub mod auth;
pub mod error;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware};
use clubhub_core::{EngagementService, store::EngagementStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::JwtKeys;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_saved_limit() -> u32 { 50 }

fn default_token_ttl() -> i64 { 7 * 24 * 60 * 60 }

/// Runtime server configuration, deserialised from `config.toml` and
/// `CLUBHUB_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub jwt_secret:          String,
  /// Saved-content page size when the request gives no `limit`.
  #[serde(default = "default_saved_limit")]
  pub default_saved_limit: u32,
  /// Lifetime of tokens minted by `issue-token`, in seconds.
  #[serde(default = "default_token_ttl")]
  pub token_ttl_secs:      i64,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(service: EngagementService<S>, config: &ServerConfig, keys: Arc<JwtKeys>) -> Router
where
  S: EngagementStore + 'static,
{
  Router::new()
    .nest("/api", clubhub_api::api_router(service, config.default_saved_limit))
    .layer(middleware::from_fn_with_state(keys, auth::identify))
    .layer(TraceLayer::new_for_http())
}
