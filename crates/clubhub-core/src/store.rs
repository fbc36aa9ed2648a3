//! The `EngagementStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `clubhub-store-sqlite`).
//! [`EngagementService`](crate::service::EngagementService) is its only
//! caller in production; the HTTP layer never reaches the store directly for
//! engagement writes.
//!
//! Methods return `None` (or `false`) rather than an error when the
//! addressed row does not exist; the service decides what that means.

use std::future::Future;

use uuid::Uuid;

use crate::{
  comment::{Comment, CommentCount, CommentPage, CommentQuery, NewComment},
  content::{ContentCounters, ContentItem, ContentKind, ContentRef, NewContent, UserId},
  engagement::{Applied, EngagementRecord, Flag, ReconcileReport},
  notification::{NewNotification, Notification, NotificationQuery},
};

/// Abstraction over a clubhub storage backend.
///
/// Every engagement mutation (`set_flag`, `apply_engagement`, `purge_user`)
/// must commit the record change and the counter adjustment as one atomic
/// unit, and counters must only move by relative increments.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait EngagementStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Content documents ─────────────────────────────────────────────────

  /// Persist a new content document with zeroed counters.
  fn create_content(
    &self,
    input: NewContent,
  ) -> impl Future<Output = Result<ContentItem, Self::Error>> + Send + '_;

  /// Fetch one document. Soft-deleted comments are reported as absent.
  fn get_content(
    &self,
    item: ContentRef,
  ) -> impl Future<Output = Result<Option<ContentItem>, Self::Error>> + Send + '_;

  /// Hard-delete a document. Engagement records pointing at it are kept.
  fn delete_content(
    &self,
    item: ContentRef,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Batched lookup of many documents of one kind. Missing ids are skipped.
  fn resolve_content(
    &self,
    kind: ContentKind,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<ContentItem>, Self::Error>> + Send + '_;

  /// Current counter projection for one item.
  fn get_counters(
    &self,
    item: ContentRef,
  ) -> impl Future<Output = Result<Option<ContentCounters>, Self::Error>> + Send + '_;

  // ── Engagement records ────────────────────────────────────────────────

  /// Return the existing record or atomically create a zero-state one.
  /// Returns `None` if the content item does not exist.
  fn get_or_create_engagement(
    &self,
    user: UserId,
    item: ContentRef,
  ) -> impl Future<Output = Result<Option<EngagementRecord>, Self::Error>> + Send + '_;

  /// Read-only lookup; never creates a record.
  fn get_engagement(
    &self,
    user: UserId,
    item: ContentRef,
  ) -> impl Future<Output = Result<Option<EngagementRecord>, Self::Error>> + Send + '_;

  /// Set `flag` to `value` and move the matching counter if the flag
  /// actually changed. One-shot flags never go back to `false`; asking for
  /// that is a no-op report. Returns `None` if the content item is missing.
  fn set_flag(
    &self,
    user: UserId,
    item: ContentRef,
    flag: Flag,
    value: bool,
  ) -> impl Future<Output = Result<Option<Applied>, Self::Error>> + Send + '_;

  /// Apply the natural action for `flag`: invert a toggle flag, or set a
  /// one-shot flag. The new value is decided against the committed row
  /// inside the transaction, so concurrent callers never act on a stale
  /// read. Returns `None` if the content item is missing.
  fn apply_engagement(
    &self,
    user: UserId,
    item: ContentRef,
    flag: Flag,
  ) -> impl Future<Output = Result<Option<Applied>, Self::Error>> + Send + '_;

  /// The user's `saved = true` records, most recently saved first,
  /// optionally restricted to one kind.
  fn saved_engagements(
    &self,
    user: UserId,
    kind: Option<ContentKind>,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<EngagementRecord>, Self::Error>> + Send + '_;

  /// Account deletion cascade: remove every record owned by `user`,
  /// withdraw its contribution from the counters, and drop notifications
  /// sent to or caused by `user`. Returns engagement records removed.
  fn purge_user(
    &self,
    user: UserId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Recompute counters from a full scan of the engagement table. Intended
  /// for out-of-band maintenance only.
  fn reconcile_counters(
    &self,
    kind: Option<ContentKind>,
  ) -> impl Future<Output = Result<Vec<ReconcileReport>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  fn insert_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Fetch a comment regardless of status.
  fn get_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Replace the text of an active comment. `None` if missing or deleted.
  fn update_comment(
    &self,
    id: Uuid,
    content: String,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Mark an active comment deleted. `None` if missing or already deleted.
  fn soft_delete_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  fn count_comments(
    &self,
    target: ContentRef,
  ) -> impl Future<Output = Result<CommentCount, Self::Error>> + Send + '_;

  /// One page of active comments on `target`.
  fn list_comments(
    &self,
    target: ContentRef,
    query: CommentQuery,
  ) -> impl Future<Output = Result<CommentPage, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  /// Record a notification. Returns `None` without writing when the
  /// recipient already has an identical unread one (same kind, actor and
  /// comment), so like/unlike/like does not pile up duplicates.
  fn insert_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Option<Notification>, Self::Error>> + Send + '_;

  /// The recipient's notifications, newest first.
  fn list_notifications(
    &self,
    recipient: UserId,
    query: NotificationQuery,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  fn count_unread_notifications(
    &self,
    recipient: UserId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Mark one notification read. `false` if it does not exist or belongs to
  /// someone else; marking an already-read notification is `true`.
  fn mark_notification_read(
    &self,
    recipient: UserId,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Mark every unread notification read. Returns how many changed.
  fn mark_all_notifications_read(
    &self,
    recipient: UserId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
