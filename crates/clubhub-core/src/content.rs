//! Content kinds and the polymorphic content reference.
//!
//! Every engageable thing in the club application (news articles, events,
//! resources, social posts and comments) lives in its own table. A
//! [`ContentRef`] points at one of them: the [`ContentKind`] discriminant
//! selects the table, the UUID selects the row.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Opaque account identifier handed to us by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for UserId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for UserId {
  fn from(s: String) -> Self { Self(s) }
}

// ─── ContentKind ─────────────────────────────────────────────────────────────

/// The discriminant of a polymorphic content reference.
///
/// Parsing is case-insensitive and also accepts the short route aliases the
/// web frontend uses (`social`, `events`, ...). `Display` always yields the
/// canonical name, which is also what gets stored.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum ContentKind {
  #[strum(to_string = "News")]
  News,
  #[strum(to_string = "Event", serialize = "events")]
  Event,
  #[strum(to_string = "Resource", serialize = "resources")]
  Resource,
  #[strum(to_string = "SocialPost", serialize = "social", serialize = "social_post")]
  SocialPost,
  #[strum(to_string = "Comment", serialize = "comments")]
  Comment,
}

impl ContentKind {
  pub const ALL: [ContentKind; 5] =
    [Self::News, Self::Event, Self::Resource, Self::SocialPost, Self::Comment];

  /// Parse a path segment or stored discriminant.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::Validation(format!("unknown content type: {s:?}")))
  }

  /// The table holding documents of this kind.
  pub fn table(self) -> &'static str {
    match self {
      Self::News => "news",
      Self::Event => "events",
      Self::Resource => "resources",
      Self::SocialPost => "social_posts",
      Self::Comment => "comments",
    }
  }

  /// Key used when saved content is grouped by kind.
  pub fn group_key(self) -> &'static str {
    match self {
      Self::News => "news",
      Self::Event => "events",
      Self::Resource => "resources",
      Self::SocialPost => "social",
      Self::Comment => "comments",
    }
  }

  /// Whether comments may be attached to content of this kind. Replies to
  /// comments go through `parent_id` instead.
  pub fn accepts_comments(self) -> bool { !matches!(self, Self::Comment) }
}

// ─── ContentRef ──────────────────────────────────────────────────────────────

/// A tagged reference into one of the content tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRef {
  pub content_type: ContentKind,
  pub content_id:   Uuid,
}

impl ContentRef {
  pub fn new(content_type: ContentKind, content_id: Uuid) -> Self {
    Self { content_type, content_id }
  }
}

impl fmt::Display for ContentRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.content_type, self.content_id)
  }
}

// ─── Counters ────────────────────────────────────────────────────────────────

/// Denormalised counters stored on every content row.
///
/// These are a cache of what the engagement table says; they are only ever
/// moved by relative increments, and can be rebuilt with
/// [`EngagementStore::reconcile_counters`](crate::store::EngagementStore::reconcile_counters).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCounters {
  pub like_count:     i64,
  pub save_count:     i64,
  pub share_count:    i64,
  pub views:          i64,
  pub download_count: i64,
}

// ─── Content documents ───────────────────────────────────────────────────────

/// A content document as seen by the engagement core. Comments are exposed
/// through the same shape, with their text as `body` and no title.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
  pub content_type: ContentKind,
  pub content_id:   Uuid,
  pub author_id:    UserId,
  pub title:        Option<String>,
  pub body:         String,
  pub created_at:   DateTime<Utc>,
  pub counters:     ContentCounters,
}

impl ContentItem {
  pub fn content_ref(&self) -> ContentRef {
    ContentRef::new(self.content_type, self.content_id)
  }
}

/// Input to [`crate::store::EngagementStore::create_content`].
#[derive(Debug, Clone)]
pub struct NewContent {
  pub kind:      ContentKind,
  pub author_id: UserId,
  pub title:     String,
  pub body:      String,
}
