//! Handlers for the resource-only counters.
//!
//! Views and downloads only make sense for resources, so these routes fix
//! the content type instead of taking it from the path.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use clubhub_core::{
  content::{ContentKind, ContentRef},
  engagement::{DownloadOutcome, ViewOutcome},
  store::EngagementStore,
};

use crate::{AppState, CurrentUser, error::ApiError, parse_id};

/// `POST /resources/{id}/view`
pub async fn view<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<ViewOutcome>, ApiError> {
  let item = ContentRef::new(ContentKind::Resource, parse_id(&id)?);
  Ok(Json(state.service.record_view(&user.id, item).await?))
}

/// `POST /resources/{id}/download`
pub async fn download<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<DownloadOutcome>, ApiError> {
  let item = ContentRef::new(ContentKind::Resource, parse_id(&id)?);
  Ok(Json(state.service.record_download(&user.id, item).await?))
}
