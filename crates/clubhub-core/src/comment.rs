//! Polymorphic comments.
//!
//! A comment targets any non-comment content item; replies point at their
//! parent through `parent_id`. Deletion is soft and terminal: a deleted
//! comment drops out of counts and listings but stays readable by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::{ContentCounters, ContentRef, UserId};

/// Longest comment body accepted, in characters.
pub const MAX_COMMENT_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
  Active,
  Deleted,
}

impl CommentStatus {
  pub fn is_active(self) -> bool { matches!(self, Self::Active) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub comment_id: Uuid,
  pub target:     ContentRef,
  pub author_id:  UserId,
  pub content:    String,
  pub status:     CommentStatus,
  pub parent_id:  Option<Uuid>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
  /// Comments are likeable content in their own right.
  pub counters:   ContentCounters,
}

/// Input to [`crate::store::EngagementStore::insert_comment`].
#[derive(Debug, Clone)]
pub struct NewComment {
  pub target:    ContentRef,
  pub author_id: UserId,
  pub content:   String,
  pub parent_id: Option<Uuid>,
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentSort {
  #[default]
  Newest,
  /// Most liked first; ties broken by recency.
  Likes,
}

/// Parameters for [`crate::store::EngagementStore::list_comments`].
#[derive(Debug, Clone)]
pub struct CommentQuery {
  pub sort:      CommentSort,
  /// 1-based page number.
  pub page:      u32,
  pub limit:     u32,
  /// `None` lists top-level comments; `Some(id)` lists replies to `id`.
  pub parent_id: Option<Uuid>,
}

impl Default for CommentQuery {
  fn default() -> Self {
    Self { sort: CommentSort::Newest, page: 1, limit: 20, parent_id: None }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
  pub page:     u32,
  pub limit:    u32,
  pub total:    u64,
  pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentPage {
  pub comments:   Vec<Comment>,
  pub pagination: Pagination,
}

/// Active-comment counts for one content item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCount {
  /// Top-level comments only.
  pub count:       i64,
  /// Every active comment, replies included.
  pub total_count: i64,
}
