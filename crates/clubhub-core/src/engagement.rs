//! Engagement records and the outcome types returned by the service.
//!
//! One [`EngagementRecord`] exists per `(user, content)` pair. Its flags come
//! in two flavours:
//!
//! - toggle flags (`liked`, `saved`) flip back and forth, moving their counter
//!   by `+1`/`-1` in lockstep;
//! - one-shot flags (`shared`, `viewed`, `downloaded`) go `false → true` once
//!   and bump their counter at most once per user, ever.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{ContentCounters, ContentItem, ContentKind, ContentRef, UserId};

// ─── Flags ───────────────────────────────────────────────────────────────────

/// How a flag reacts to repeated invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagMode {
  Toggle,
  OneShot,
}

/// A per-user engagement flag. Each flag owns exactly one counter column on
/// the content row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
  Liked,
  Saved,
  Shared,
  Viewed,
  Downloaded,
}

impl Flag {
  pub const ALL: [Flag; 5] =
    [Self::Liked, Self::Saved, Self::Shared, Self::Viewed, Self::Downloaded];

  pub fn mode(self) -> FlagMode {
    match self {
      Self::Liked | Self::Saved => FlagMode::Toggle,
      Self::Shared | Self::Viewed | Self::Downloaded => FlagMode::OneShot,
    }
  }

  /// Boolean column on the `engagements` table.
  pub fn column(self) -> &'static str {
    match self {
      Self::Liked => "liked",
      Self::Saved => "saved",
      Self::Shared => "shared",
      Self::Viewed => "viewed",
      Self::Downloaded => "downloaded",
    }
  }

  /// Timestamp column paired with [`Flag::column`].
  pub fn at_column(self) -> &'static str {
    match self {
      Self::Liked => "liked_at",
      Self::Saved => "saved_at",
      Self::Shared => "shared_at",
      Self::Viewed => "viewed_at",
      Self::Downloaded => "downloaded_at",
    }
  }

  /// Counter column on the content tables.
  pub fn counter_column(self) -> &'static str {
    match self {
      Self::Liked => "like_count",
      Self::Saved => "save_count",
      Self::Shared => "share_count",
      Self::Viewed => "views",
      Self::Downloaded => "download_count",
    }
  }

  pub fn read(self, counters: &ContentCounters) -> i64 {
    match self {
      Self::Liked => counters.like_count,
      Self::Saved => counters.save_count,
      Self::Shared => counters.share_count,
      Self::Viewed => counters.views,
      Self::Downloaded => counters.download_count,
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// Durable per-user interaction state for one content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementRecord {
  pub user_id:         UserId,
  pub content:         ContentRef,
  pub liked:           bool,
  pub liked_at:        Option<DateTime<Utc>>,
  pub saved:           bool,
  pub saved_at:        Option<DateTime<Utc>>,
  pub shared:          bool,
  pub shared_at:       Option<DateTime<Utc>>,
  pub viewed:          bool,
  pub viewed_at:       Option<DateTime<Utc>>,
  pub downloaded:      bool,
  pub downloaded_at:   Option<DateTime<Utc>>,
  pub created_at:      DateTime<Utc>,
  pub last_engaged_at: DateTime<Utc>,
}

impl EngagementRecord {
  pub fn flag(&self, flag: Flag) -> bool {
    match flag {
      Flag::Liked => self.liked,
      Flag::Saved => self.saved,
      Flag::Shared => self.shared,
      Flag::Viewed => self.viewed,
      Flag::Downloaded => self.downloaded,
    }
  }

  pub fn state(&self) -> EngagementState {
    EngagementState {
      liked:      self.liked,
      saved:      self.saved,
      shared:     self.shared,
      viewed:     self.viewed,
      downloaded: self.downloaded,
    }
  }
}

/// Result of a single atomic flag change plus counter adjustment.
#[derive(Debug, Clone)]
pub struct Applied {
  pub record:   EngagementRecord,
  pub previous: bool,
  pub current:  bool,
  /// The counter value after the adjustment was committed.
  pub count:    i64,
}

impl Applied {
  pub fn transitioned(&self) -> bool { self.previous != self.current }
}

// ─── Wire outcomes ───────────────────────────────────────────────────────────

/// The flags of one user on one item, as rendered by toggle buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementState {
  pub liked:      bool,
  pub saved:      bool,
  pub shared:     bool,
  pub viewed:     bool,
  pub downloaded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
  pub liked:      bool,
  pub like_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
  pub saved:      bool,
  pub save_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareOutcome {
  pub share_count: i64,
  pub new_share:   bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewOutcome {
  pub views:    i64,
  pub new_view: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadOutcome {
  pub download_count: i64,
  pub new_download:   bool,
}

/// Content-scoped aggregates. `comment_count` is computed live from the
/// comments table rather than stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStats {
  pub like_count:     i64,
  pub save_count:     i64,
  pub share_count:    i64,
  pub views:          i64,
  pub download_count: i64,
  pub comment_count:  i64,
}

impl ContentStats {
  pub fn from_parts(counters: ContentCounters, comment_count: i64) -> Self {
    Self {
      like_count: counters.like_count,
      save_count: counters.save_count,
      share_count: counters.share_count,
      views: counters.views,
      download_count: counters.download_count,
      comment_count,
    }
  }
}

/// Everything an interaction-button row needs on first render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementSnapshot {
  pub engagement: EngagementState,
  pub stats:      ContentStats,
}

// ─── Saved content ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
  pub item:     ContentItem,
  pub saved_at: Option<DateTime<Utc>>,
}

/// A user's saved items grouped by content kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavedContent {
  pub news:      Vec<SavedItem>,
  pub events:    Vec<SavedItem>,
  pub resources: Vec<SavedItem>,
  pub social:    Vec<SavedItem>,
  pub comments:  Vec<SavedItem>,
}

impl SavedContent {
  pub fn group(&self, kind: ContentKind) -> &[SavedItem] {
    match kind {
      ContentKind::News => &self.news,
      ContentKind::Event => &self.events,
      ContentKind::Resource => &self.resources,
      ContentKind::SocialPost => &self.social,
      ContentKind::Comment => &self.comments,
    }
  }

  pub fn group_mut(&mut self, kind: ContentKind) -> &mut Vec<SavedItem> {
    match kind {
      ContentKind::News => &mut self.news,
      ContentKind::Event => &mut self.events,
      ContentKind::Resource => &mut self.resources,
      ContentKind::SocialPost => &mut self.social,
      ContentKind::Comment => &mut self.comments,
    }
  }

  pub fn len(&self) -> usize {
    self.news.len()
      + self.events.len()
      + self.resources.len()
      + self.social.len()
      + self.comments.len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

/// Rows whose cached counters disagreed with the engagement table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
  pub kind:           ContentKind,
  pub rows_scanned:   u64,
  pub rows_corrected: u64,
}
