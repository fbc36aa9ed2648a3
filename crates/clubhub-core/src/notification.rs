//! Comment notifications.
//!
//! A notification tells a comment's author that someone else replied to it
//! or liked it. Nobody is ever notified about their own actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::{ContentRef, UserId};

/// Default page size for a notification listing.
pub const DEFAULT_NOTIFICATION_LIMIT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  /// `comment_id` is the reply; the recipient wrote its parent.
  CommentReply,
  /// `comment_id` is the recipient's comment that was liked.
  CommentLike,
}

impl NotificationKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::CommentReply => "comment_reply",
      Self::CommentLike => "comment_like",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "comment_reply" => Some(Self::CommentReply),
      "comment_like" => Some(Self::CommentLike),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id:         Uuid,
  #[serde(rename = "type")]
  pub kind:       NotificationKind,
  pub recipient:  UserId,
  pub actor:      UserId,
  pub comment_id: Uuid,
  /// The item the comment thread hangs off.
  pub target:     ContentRef,
  pub read:       bool,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::EngagementStore::insert_notification`].
#[derive(Debug, Clone)]
pub struct NewNotification {
  pub kind:       NotificationKind,
  pub recipient:  UserId,
  pub actor:      UserId,
  pub comment_id: Uuid,
  pub target:     ContentRef,
}

/// Parameters for [`crate::store::EngagementStore::list_notifications`].
#[derive(Debug, Clone, Copy)]
pub struct NotificationQuery {
  pub unread_only: bool,
  pub limit:       u32,
}

impl Default for NotificationQuery {
  fn default() -> Self { Self { unread_only: false, limit: DEFAULT_NOTIFICATION_LIMIT } }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stored_names_parse_back() {
    assert_eq!(NotificationKind::CommentReply.as_str(), "comment_reply");
    for kind in [NotificationKind::CommentReply, NotificationKind::CommentLike] {
      assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(NotificationKind::parse("comment_mention"), None);
  }
}
