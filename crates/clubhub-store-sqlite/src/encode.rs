//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! UUIDs are stored as hyphenated lowercase strings, content kinds by their
//! canonical name.

use chrono::{DateTime, SecondsFormat, Utc};
use clubhub_core::{
  comment::{Comment, CommentStatus},
  content::{ContentCounters, ContentItem, ContentKind, ContentRef, UserId},
  engagement::{EngagementRecord, Flag},
  notification::{Notification, NotificationKind},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── ContentKind ─────────────────────────────────────────────────────────────

pub fn encode_kind(kind: ContentKind) -> String { kind.to_string() }

pub fn decode_kind(s: &str) -> Result<ContentKind> { Ok(ContentKind::parse(s)?) }

// ─── CommentStatus ───────────────────────────────────────────────────────────

pub fn encode_status(status: CommentStatus) -> &'static str {
  match status {
    CommentStatus::Active => "active",
    CommentStatus::Deleted => "deleted",
  }
}

pub fn decode_status(s: &str) -> Result<CommentStatus> {
  match s {
    "active" => Ok(CommentStatus::Active),
    "deleted" => Ok(CommentStatus::Deleted),
    other => Err(Error::Decode(format!("unknown comment status: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Counter columns in their canonical order, as selected by every query that
/// builds a [`RawCounters`].
pub const COUNTER_COLUMNS: &str = "like_count, save_count, share_count, views, download_count";

/// The five counter columns of a content row.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCounters {
  pub like_count:     i64,
  pub save_count:     i64,
  pub share_count:    i64,
  pub views:          i64,
  pub download_count: i64,
}

impl RawCounters {
  /// Read the counters from `row` starting at column `offset`.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      like_count:     row.get(offset)?,
      save_count:     row.get(offset + 1)?,
      share_count:    row.get(offset + 2)?,
      views:          row.get(offset + 3)?,
      download_count: row.get(offset + 4)?,
    })
  }

  pub fn into_counters(self) -> ContentCounters {
    ContentCounters {
      like_count:     self.like_count,
      save_count:     self.save_count,
      share_count:    self.share_count,
      views:          self.views,
      download_count: self.download_count,
    }
  }
}

/// Raw strings read from a content table (comments included, with their
/// text in `body` and no title).
pub struct RawContent {
  pub id:         String,
  pub author_id:  String,
  pub title:      Option<String>,
  pub body:       String,
  pub created_at: String,
  pub counters:   RawCounters,
}

impl RawContent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      author_id:  row.get(1)?,
      title:      row.get(2)?,
      body:       row.get(3)?,
      created_at: row.get(4)?,
      counters:   RawCounters::from_row(row, 5)?,
    })
  }

  pub fn into_item(self, kind: ContentKind) -> Result<ContentItem> {
    Ok(ContentItem {
      content_type: kind,
      content_id:   decode_uuid(&self.id)?,
      author_id:    UserId(self.author_id),
      title:        self.title,
      body:         self.body,
      created_at:   decode_dt(&self.created_at)?,
      counters:     self.counters.into_counters(),
    })
  }
}

/// Column list matching [`RawEngagement::from_row`].
pub const ENGAGEMENT_COLUMNS: &str = "user_id, content_type, content_id, \
   liked, liked_at, saved, saved_at, shared, shared_at, \
   viewed, viewed_at, downloaded, downloaded_at, \
   created_at, last_engaged_at";

/// Raw values read directly from an `engagements` row.
pub struct RawEngagement {
  pub user_id:         String,
  pub content_type:    String,
  pub content_id:      String,
  pub liked:           bool,
  pub liked_at:        Option<String>,
  pub saved:           bool,
  pub saved_at:        Option<String>,
  pub shared:          bool,
  pub shared_at:       Option<String>,
  pub viewed:          bool,
  pub viewed_at:       Option<String>,
  pub downloaded:      bool,
  pub downloaded_at:   Option<String>,
  pub created_at:      String,
  pub last_engaged_at: String,
}

impl RawEngagement {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:         row.get(0)?,
      content_type:    row.get(1)?,
      content_id:      row.get(2)?,
      liked:           row.get(3)?,
      liked_at:        row.get(4)?,
      saved:           row.get(5)?,
      saved_at:        row.get(6)?,
      shared:          row.get(7)?,
      shared_at:       row.get(8)?,
      viewed:          row.get(9)?,
      viewed_at:       row.get(10)?,
      downloaded:      row.get(11)?,
      downloaded_at:   row.get(12)?,
      created_at:      row.get(13)?,
      last_engaged_at: row.get(14)?,
    })
  }

  pub fn flag(&self, flag: Flag) -> bool {
    match flag {
      Flag::Liked => self.liked,
      Flag::Saved => self.saved,
      Flag::Shared => self.shared,
      Flag::Viewed => self.viewed,
      Flag::Downloaded => self.downloaded,
    }
  }

  pub fn into_record(self) -> Result<EngagementRecord> {
    Ok(EngagementRecord {
      user_id:         UserId(self.user_id),
      content:         ContentRef::new(
        decode_kind(&self.content_type)?,
        decode_uuid(&self.content_id)?,
      ),
      liked:           self.liked,
      liked_at:        decode_opt_dt(self.liked_at)?,
      saved:           self.saved,
      saved_at:        decode_opt_dt(self.saved_at)?,
      shared:          self.shared,
      shared_at:       decode_opt_dt(self.shared_at)?,
      viewed:          self.viewed,
      viewed_at:       decode_opt_dt(self.viewed_at)?,
      downloaded:      self.downloaded,
      downloaded_at:   decode_opt_dt(self.downloaded_at)?,
      created_at:      decode_dt(&self.created_at)?,
      last_engaged_at: decode_dt(&self.last_engaged_at)?,
    })
  }
}

/// Column list matching [`RawComment::from_row`].
pub const COMMENT_COLUMNS: &str = "id, content_type, content_id, author_id, content, status, \
   parent_id, created_at, updated_at, deleted_at, \
   like_count, save_count, share_count, views, download_count";

/// Raw values read directly from a `comments` row.
pub struct RawComment {
  pub id:           String,
  pub content_type: String,
  pub content_id:   String,
  pub author_id:    String,
  pub content:      String,
  pub status:       String,
  pub parent_id:    Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
  pub deleted_at:   Option<String>,
  pub counters:     RawCounters,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      content_type: row.get(1)?,
      content_id:   row.get(2)?,
      author_id:    row.get(3)?,
      content:      row.get(4)?,
      status:       row.get(5)?,
      parent_id:    row.get(6)?,
      created_at:   row.get(7)?,
      updated_at:   row.get(8)?,
      deleted_at:   row.get(9)?,
      counters:     RawCounters::from_row(row, 10)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: decode_uuid(&self.id)?,
      target:     ContentRef::new(
        decode_kind(&self.content_type)?,
        decode_uuid(&self.content_id)?,
      ),
      author_id:  UserId(self.author_id),
      content:    self.content,
      status:     decode_status(&self.status)?,
      parent_id:  self.parent_id.as_deref().map(decode_uuid).transpose()?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      deleted_at: decode_opt_dt(self.deleted_at)?,
      counters:   self.counters.into_counters(),
    })
  }
}

// ─── Notifications ───────────────────────────────────────────────────────────

pub const NOTIFICATION_COLUMNS: &str =
  "id, recipient_id, actor_id, kind, comment_id, content_type, content_id, read, created_at";

pub fn decode_notification_kind(s: &str) -> Result<NotificationKind> {
  NotificationKind::parse(s)
    .ok_or_else(|| Error::Decode(format!("unknown notification kind: {s:?}")))
}

/// A `notifications` row as stored.
pub struct RawNotification {
  pub id:           String,
  pub recipient_id: String,
  pub actor_id:     String,
  pub kind:         String,
  pub comment_id:   String,
  pub content_type: String,
  pub content_id:   String,
  pub read:         bool,
  pub created_at:   String,
}

impl RawNotification {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      recipient_id: row.get(1)?,
      actor_id:     row.get(2)?,
      kind:         row.get(3)?,
      comment_id:   row.get(4)?,
      content_type: row.get(5)?,
      content_id:   row.get(6)?,
      read:         row.get(7)?,
      created_at:   row.get(8)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      id:         decode_uuid(&self.id)?,
      kind:       decode_notification_kind(&self.kind)?,
      recipient:  UserId(self.recipient_id),
      actor:      UserId(self.actor_id),
      comment_id: decode_uuid(&self.comment_id)?,
      target:     ContentRef::new(
        decode_kind(&self.content_type)?,
        decode_uuid(&self.content_id)?,
      ),
      read:       self.read,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
