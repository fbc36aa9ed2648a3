//! Handlers for `/notifications` endpoints. All require an identity and only
//! ever touch the caller's own notifications.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/notifications` | `?unread=true&limit`; `{notifications: [...]}` newest first |
//! | `GET` | `/notifications/unread-count` | `{count}` |
//! | `PUT` | `/notifications/{id}/read` | 204; 404 if not the caller's |
//! | `PUT` | `/notifications/read-all` | `{updated}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use clubhub_core::{
  notification::{Notification, NotificationQuery},
  store::EngagementStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, CurrentUser, error::ApiError, parse_id};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub unread: bool,
  pub limit:  Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct NotificationList {
  pub notifications: Vec<Notification>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
  pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
  pub updated: u64,
}

/// `GET /notifications`
pub async fn list<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<NotificationList>, ApiError> {
  let query = NotificationQuery {
    unread_only: params.unread,
    limit:       params.limit.unwrap_or(NotificationQuery::default().limit),
  };
  let notifications = state.service.list_notifications(&user.id, query).await?;
  Ok(Json(NotificationList { notifications }))
}

/// `GET /notifications/unread-count`
pub async fn unread_count<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
) -> Result<Json<UnreadCount>, ApiError> {
  let count = state.service.unread_notification_count(&user.id).await?;
  Ok(Json(UnreadCount { count }))
}

/// `PUT /notifications/{id}/read`
pub async fn mark_read<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
  state.service.mark_notification_read(&user.id, parse_id(&id)?).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `PUT /notifications/read-all`
pub async fn mark_all_read<S: EngagementStore>(
  State(state): State<Arc<AppState<S>>>,
  user: CurrentUser,
) -> Result<Json<MarkedRead>, ApiError> {
  let updated = state.service.mark_all_notifications_read(&user.id).await?;
  Ok(Json(MarkedRead { updated }))
}
