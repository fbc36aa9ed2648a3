//! JSON REST API for clubhub engagement.
//!
//! Exposes an axum [`Router`] backed by an [`EngagementService`] over any
//! [`EngagementStore`]. Credential checks, TLS and transport concerns are the
//! caller's responsibility: authenticated routes only require that a
//! [`CurrentUser`] has been placed in the request extensions.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", clubhub_api::api_router(service, 50))
//! ```

pub mod comments;
pub mod content;
pub mod engagement;
pub mod error;
pub mod identity;
pub mod notifications;
pub mod resources;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use clubhub_core::{
  EngagementService,
  content::{ContentKind, ContentRef},
  store::EngagementStore,
};
use uuid::Uuid;

pub use error::ApiError;
pub use identity::CurrentUser;

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub service:     EngagementService<S>,
  /// Used when a saved-content request carries no `limit`.
  pub saved_limit: u32,
}

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(service: EngagementService<S>, saved_limit: u32) -> Router<()>
where
  S: EngagementStore + 'static,
{
  let state = Arc::new(AppState { service, saved_limit });

  // One parameter name per path position: under `/comments`, `{target}` is a
  // comment id on the single-comment routes and a content type elsewhere.
  Router::new()
    // Engagement
    .route("/engagement/user/saved", get(engagement::saved::<S>))
    .route("/engagement/user/saved/{type}", get(engagement::saved_of_kind::<S>))
    .route("/engagement/{type}/{id}", get(engagement::snapshot::<S>))
    .route("/engagement/{type}/{id}/stats", get(engagement::stats::<S>))
    .route("/engagement/{type}/{id}/like", post(engagement::like::<S>))
    .route("/engagement/{type}/{id}/save", post(engagement::save::<S>))
    .route("/engagement/{type}/{id}/share", post(engagement::share::<S>))
    // Resources
    .route("/resources/{id}/view", post(resources::view::<S>))
    .route("/resources/{id}/download", post(resources::download::<S>))
    // Comments
    .route(
      "/comments/{target}",
      get(comments::get_one::<S>)
        .put(comments::update::<S>)
        .delete(comments::delete_one::<S>),
    )
    .route("/comments/{target}/{id}", get(comments::list::<S>).post(comments::create::<S>))
    .route("/comments/{target}/{id}/count", get(comments::count::<S>))
    // Content
    .route("/content/{type}", post(content::create::<S>))
    .route("/content/{type}/{id}", get(content::get_one::<S>).delete(content::delete_one::<S>))
    // Notifications
    .route("/notifications", get(notifications::list::<S>))
    .route("/notifications/unread-count", get(notifications::unread_count::<S>))
    .route("/notifications/read-all", put(notifications::mark_all_read::<S>))
    .route("/notifications/{id}/read", put(notifications::mark_read::<S>))
    .with_state(state)
}

// ─── Path helpers ────────────────────────────────────────────────────────────

/// Parse a `{type}/{id}` pair from the path.
pub(crate) fn parse_ref(kind: &str, id: &str) -> Result<ContentRef, ApiError> {
  let kind = ContentKind::parse(kind)?;
  Ok(ContentRef::new(kind, parse_id(id)?))
}

pub(crate) fn parse_id(id: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(id).map_err(|_| ApiError::BadRequest(format!("invalid id: {id:?}")))
}
