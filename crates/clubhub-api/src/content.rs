//! Handlers for `/content` endpoints: the minimal document surface the
//! engagement routes point at.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use clubhub_core::{
  content::{ContentItem, ContentKind},
  engagement::ContentStats,
  store::EngagementStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, CurrentUser, error::ApiError, parse_ref};

#[derive(Debug, Deserialize)]
pub struct NewContentBody {
  pub title: String,
  #[serde(default)]
  pub body:  String,
}

/// `POST /content/{type}`, returns 201 + the stored [`ContentItem`].
pub async fn create<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
  Path(kind): Path<String>,
  Json(body): Json<NewContentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let kind = ContentKind::parse(&kind)?;
  let item = state
    .service
    .create_content(&user.id, kind, &body.title, &body.body)
    .await?;
  Ok((StatusCode::CREATED, Json(item)))
}

#[derive(Debug, Serialize)]
pub struct ContentWithStats {
  #[serde(flatten)]
  pub item:  ContentItem,
  pub stats: ContentStats,
}

/// `GET /content/{type}/{id}`
pub async fn get_one<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  Path((kind, id)): Path<(String, String)>,
) -> Result<Json<ContentWithStats>, ApiError> {
  let target = parse_ref(&kind, &id)?;
  let item = state.service.get_content(target).await?;
  let stats = state.service.get_stats(target).await?;
  Ok(Json(ContentWithStats { item, stats }))
}

/// `DELETE /content/{type}/{id}`, author only.
pub async fn delete_one<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
  Path((kind, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
  let target = parse_ref(&kind, &id)?;
  state.service.delete_content(&user.id, target).await?;
  Ok(StatusCode::NO_CONTENT)
}
