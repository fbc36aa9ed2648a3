//! Handlers for `/comments` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/comments/{type}/{id}` | `?sort=newest\|likes&page&limit&parentId` |
//! | `POST`   | `/comments/{type}/{id}` | Body: [`NewCommentBody`]; 201 + comment |
//! | `GET`    | `/comments/{type}/{id}/count` | `{count, totalCount}` |
//! | `GET`    | `/comments/{id}` | Any status, for audit |
//! | `PUT`    | `/comments/{id}` | Author only; body `{"content": "..."}` |
//! | `DELETE` | `/comments/{id}` | Author only; soft delete, 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use clubhub_core::{
  comment::{Comment, CommentCount, CommentPage, CommentQuery, CommentSort},
  store::EngagementStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, CurrentUser, error::ApiError, parse_id, parse_ref};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub sort:      Option<CommentSort>,
  pub page:      Option<u32>,
  pub limit:     Option<u32>,
  /// List replies to this comment instead of top-level comments.
  pub parent_id: Option<Uuid>,
}

impl From<ListParams> for CommentQuery {
  fn from(p: ListParams) -> Self {
    let defaults = CommentQuery::default();
    CommentQuery {
      sort:      p.sort.unwrap_or(defaults.sort),
      page:      p.page.unwrap_or(defaults.page),
      limit:     p.limit.unwrap_or(defaults.limit),
      parent_id: p.parent_id,
    }
  }
}

/// `GET /comments/{type}/{id}`
pub async fn list<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  Path((kind, id)): Path<(String, String)>,
  Query(params): Query<ListParams>,
) -> Result<Json<CommentPage>, ApiError> {
  let target = parse_ref(&kind, &id)?;
  Ok(Json(state.service.list_comments(target, params.into()).await?))
}

/// `GET /comments/{type}/{id}/count`
pub async fn count<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  Path((kind, id)): Path<(String, String)>,
) -> Result<Json<CommentCount>, ApiError> {
  let target = parse_ref(&kind, &id)?;
  Ok(Json(state.service.get_comment_count(target).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentBody {
  pub content:   String,
  pub parent_id: Option<Uuid>,
}

/// `POST /comments/{type}/{id}`, returns 201 + the stored [`Comment`].
pub async fn create<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
  Path((kind, id)): Path<(String, String)>,
  Json(body): Json<NewCommentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let target = parse_ref(&kind, &id)?;
  let comment = state
    .service
    .add_comment(&user.id, target, &body.content, body.parent_id)
    .await?;
  Ok((StatusCode::CREATED, Json(comment)))
}

// ─── Single comment ──────────────────────────────────────────────────────────

/// `GET /comments/{id}`
pub async fn get_one<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  Path(id): Path<String>,
) -> Result<Json<Comment>, ApiError> {
  Ok(Json(state.service.get_comment(parse_id(&id)?).await?))
}

#[derive(Debug, Deserialize)]
pub struct EditBody {
  pub content: String,
}

/// `PUT /comments/{id}`
pub async fn update<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
  Path(id): Path<String>,
  Json(body): Json<EditBody>,
) -> Result<Json<Comment>, ApiError> {
  let id = parse_id(&id)?;
  Ok(Json(state.service.edit_comment(&user.id, id, &body.content).await?))
}

/// `DELETE /comments/{id}`
pub async fn delete_one<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
  state.service.delete_comment(&user.id, parse_id(&id)?).await?;
  Ok(StatusCode::NO_CONTENT)
}
