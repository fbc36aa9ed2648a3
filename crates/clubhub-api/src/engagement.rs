//! Handlers for `/engagement` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/engagement/{type}/{id}/like` | Toggle; `{liked, likeCount}` |
//! | `POST` | `/engagement/{type}/{id}/save` | Toggle; `{saved, saveCount}` |
//! | `POST` | `/engagement/{type}/{id}/share` | Once per user; `{shareCount, newShare}` |
//! | `GET`  | `/engagement/{type}/{id}` | `{engagement, stats}` for the caller |
//! | `GET`  | `/engagement/{type}/{id}/stats` | Public aggregates |
//! | `GET`  | `/engagement/user/saved` | `?limit`; grouped by kind |
//! | `GET`  | `/engagement/user/saved/{type}` | `?limit`; one kind |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use clubhub_core::{
  content::ContentKind,
  engagement::{
    ContentStats, EngagementSnapshot, LikeOutcome, SaveOutcome, SavedContent, SavedItem,
    ShareOutcome,
  },
  store::EngagementStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, CurrentUser, error::ApiError, parse_ref};

type Target = Path<(String, String)>;

// ─── Mutations ───────────────────────────────────────────────────────────────

/// `POST /engagement/{type}/{id}/like`
pub async fn like<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
  Path((kind, id)): Target,
) -> Result<Json<LikeOutcome>, ApiError> {
  let item = parse_ref(&kind, &id)?;
  Ok(Json(state.service.toggle_like(&user.id, item).await?))
}

/// `POST /engagement/{type}/{id}/save`
pub async fn save<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
  Path((kind, id)): Target,
) -> Result<Json<SaveOutcome>, ApiError> {
  let item = parse_ref(&kind, &id)?;
  Ok(Json(state.service.toggle_save(&user.id, item).await?))
}

/// `POST /engagement/{type}/{id}/share`
pub async fn share<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
  Path((kind, id)): Target,
) -> Result<Json<ShareOutcome>, ApiError> {
  let item = parse_ref(&kind, &id)?;
  Ok(Json(state.service.record_share(&user.id, item).await?))
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /engagement/{type}/{id}`
pub async fn snapshot<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
  Path((kind, id)): Target,
) -> Result<Json<EngagementSnapshot>, ApiError> {
  let item = parse_ref(&kind, &id)?;
  Ok(Json(state.service.get_snapshot(&user.id, item).await?))
}

/// `GET /engagement/{type}/{id}/stats`, no identity required.
pub async fn stats<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  Path((kind, id)): Target,
) -> Result<Json<ContentStats>, ApiError> {
  let item = parse_ref(&kind, &id)?;
  Ok(Json(state.service.get_stats(item).await?))
}

// ─── Saved content ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SavedParams {
  pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SavedResponse<T> {
  pub content: T,
}

/// `GET /engagement/user/saved[?limit=n]`
pub async fn saved<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
  Query(params): Query<SavedParams>,
) -> Result<Json<SavedResponse<SavedContent>>, ApiError> {
  let limit = params.limit.unwrap_or(state.saved_limit);
  let content = state.service.get_user_saved_content(&user.id, limit).await?;
  Ok(Json(SavedResponse { content }))
}

/// `GET /engagement/user/saved/{type}[?limit=n]`
pub async fn saved_of_kind<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
  Path(kind): Path<String>,
  Query(params): Query<SavedParams>,
) -> Result<Json<SavedResponse<Vec<SavedItem>>>, ApiError> {
  let kind = ContentKind::parse(&kind)?;
  let limit = params.limit.unwrap_or(state.saved_limit);
  let content = state.service.get_user_saved_of_kind(&user.id, kind, limit).await?;
  Ok(Json(SavedResponse { content }))
}
