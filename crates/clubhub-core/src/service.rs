//! [`EngagementService`], the single coordinator of engagement records,
//! counter projections and comments.
//!
//! Handlers call the service, the service calls the store. Validation,
//! ownership checks and the toggle/one-shot contracts live here; atomicity
//! lives in the store.
//!
//! Comment replies and comment likes also produce notifications for the
//! comment's author. Those are a side effect of an action that has already
//! committed, so a failure to record one is logged and never fails the
//! action.

use std::{collections::HashMap, sync::Arc};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  comment::{Comment, CommentCount, CommentPage, CommentQuery, MAX_COMMENT_CHARS, NewComment},
  content::{ContentItem, ContentKind, ContentRef, NewContent, UserId},
  engagement::{
    Applied, ContentStats, DownloadOutcome, EngagementRecord, EngagementSnapshot,
    EngagementState, Flag, LikeOutcome, ReconcileReport, SaveOutcome, SavedContent,
    SavedItem, ShareOutcome, ViewOutcome,
  },
  notification::{NewNotification, Notification, NotificationKind, NotificationQuery},
  store::EngagementStore,
};

/// Upper bound on saved items returned in one call.
pub const MAX_SAVED_LIMIT: u32 = 200;
/// Upper bound on comments returned per page.
pub const MAX_COMMENT_PAGE: u32 = 100;
/// Upper bound on notifications returned in one call.
pub const MAX_NOTIFICATION_PAGE: u32 = 100;

fn not_found(item: ContentRef) -> Error { Error::NotFound(item.to_string()) }

fn comment_not_found(id: Uuid) -> Error { Error::NotFound(format!("comment {id}")) }

/// Trim and bound a comment body.
fn validate_comment_text(content: &str) -> Result<String> {
  let trimmed = content.trim();
  if trimmed.is_empty() {
    return Err(Error::Validation("comment content must not be empty".into()));
  }
  if trimmed.chars().count() > MAX_COMMENT_CHARS {
    return Err(Error::Validation(format!(
      "comment content exceeds {MAX_COMMENT_CHARS} characters"
    )));
  }
  Ok(trimmed.to_owned())
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Engagement and comment operations over any [`EngagementStore`].
///
/// Cloning is cheap; the store is reference-counted.
pub struct EngagementService<S> {
  store: Arc<S>,
}

impl<S> Clone for EngagementService<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: EngagementStore> EngagementService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  async fn apply(&self, user: &UserId, item: ContentRef, flag: Flag) -> Result<Applied> {
    let applied = self
      .store
      .apply_engagement(user.clone(), item, flag)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| not_found(item))?;

    debug!(
      user = %user,
      content = %item,
      flag = flag.column(),
      previous = applied.previous,
      current = applied.current,
      count = applied.count,
      "engagement applied"
    );
    Ok(applied)
  }

  // ── Toggle counters ───────────────────────────────────────────────────

  /// Flip `liked`; the like counter follows the flip.
  pub async fn toggle_like(&self, user: &UserId, item: ContentRef) -> Result<LikeOutcome> {
    let applied = self.apply(user, item, Flag::Liked).await?;
    if item.content_type == ContentKind::Comment && applied.transitioned() && applied.current {
      self.notify_comment_like(user, item.content_id).await;
    }
    Ok(LikeOutcome { liked: applied.current, like_count: applied.count })
  }

  /// Flip `saved`, independently of `liked`.
  pub async fn toggle_save(&self, user: &UserId, item: ContentRef) -> Result<SaveOutcome> {
    let applied = self.apply(user, item, Flag::Saved).await?;
    Ok(SaveOutcome { saved: applied.current, save_count: applied.count })
  }

  // ── One-shot counters ─────────────────────────────────────────────────

  /// Count a share once per user; repeats report the current count.
  pub async fn record_share(&self, user: &UserId, item: ContentRef) -> Result<ShareOutcome> {
    let applied = self.apply(user, item, Flag::Shared).await?;
    Ok(ShareOutcome { share_count: applied.count, new_share: applied.transitioned() })
  }

  pub async fn record_view(&self, user: &UserId, item: ContentRef) -> Result<ViewOutcome> {
    let applied = self.apply(user, item, Flag::Viewed).await?;
    Ok(ViewOutcome { views: applied.count, new_view: applied.transitioned() })
  }

  pub async fn record_download(
    &self,
    user: &UserId,
    item: ContentRef,
  ) -> Result<DownloadOutcome> {
    let applied = self.apply(user, item, Flag::Downloaded).await?;
    Ok(DownloadOutcome {
      download_count: applied.count,
      new_download:   applied.transitioned(),
    })
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The user's flags on `item`; all `false` if they never engaged.
  pub async fn get_engagement_state(
    &self,
    user: &UserId,
    item: ContentRef,
  ) -> Result<EngagementState> {
    let record = self
      .store
      .get_engagement(user.clone(), item)
      .await
      .map_err(Error::storage)?;
    Ok(record.map(|r| r.state()).unwrap_or_default())
  }

  /// Content-scoped aggregates with a live comment count.
  pub async fn get_stats(&self, item: ContentRef) -> Result<ContentStats> {
    let counters = self
      .store
      .get_counters(item)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| not_found(item))?;

    let comments = if item.content_type.accepts_comments() {
      self.store.count_comments(item).await.map_err(Error::storage)?.total_count
    } else {
      0
    };

    Ok(ContentStats::from_parts(counters, comments))
  }

  /// User state and aggregates in one call, for first render.
  pub async fn get_snapshot(
    &self,
    user: &UserId,
    item: ContentRef,
  ) -> Result<EngagementSnapshot> {
    let stats = self.get_stats(item).await?;
    let engagement = self.get_engagement_state(user, item).await?;
    Ok(EngagementSnapshot { engagement, stats })
  }

  // ── Saved content ─────────────────────────────────────────────────────

  /// Resolve saved records into documents with one batched lookup per kind,
  /// keeping the records' order. Records whose document is gone are dropped.
  async fn resolve_saved(
    &self,
    records: Vec<EngagementRecord>,
  ) -> Result<Vec<SavedItem>> {
    let mut ids_by_kind: HashMap<ContentKind, Vec<Uuid>> = HashMap::new();
    for r in &records {
      ids_by_kind
        .entry(r.content.content_type)
        .or_default()
        .push(r.content.content_id);
    }

    let mut found: HashMap<ContentRef, ContentItem> = HashMap::new();
    for (kind, ids) in ids_by_kind {
      let items = self
        .store
        .resolve_content(kind, ids)
        .await
        .map_err(Error::storage)?;
      found.extend(items.into_iter().map(|i| (i.content_ref(), i)));
    }

    Ok(
      records
        .into_iter()
        .filter_map(|r| {
          found
            .remove(&r.content)
            .map(|item| SavedItem { item, saved_at: r.saved_at })
        })
        .collect(),
    )
  }

  /// Everything `user` has saved, grouped by kind.
  pub async fn get_user_saved_content(&self, user: &UserId, limit: u32) -> Result<SavedContent> {
    let records = self
      .store
      .saved_engagements(user.clone(), None, limit.clamp(1, MAX_SAVED_LIMIT))
      .await
      .map_err(Error::storage)?;

    let mut grouped = SavedContent::default();
    for saved in self.resolve_saved(records).await? {
      grouped.group_mut(saved.item.content_type).push(saved);
    }
    Ok(grouped)
  }

  /// Saved items of a single kind.
  pub async fn get_user_saved_of_kind(
    &self,
    user: &UserId,
    kind: ContentKind,
    limit: u32,
  ) -> Result<Vec<SavedItem>> {
    let records = self
      .store
      .saved_engagements(user.clone(), Some(kind), limit.clamp(1, MAX_SAVED_LIMIT))
      .await
      .map_err(Error::storage)?;
    self.resolve_saved(records).await
  }

  // ── Maintenance ───────────────────────────────────────────────────────

  pub async fn purge_user(&self, user: &UserId) -> Result<u64> {
    self.store.purge_user(user.clone()).await.map_err(Error::storage)
  }

  pub async fn reconcile(&self, kind: Option<ContentKind>) -> Result<Vec<ReconcileReport>> {
    self.store.reconcile_counters(kind).await.map_err(Error::storage)
  }

  // ── Content boundary ──────────────────────────────────────────────────

  pub async fn create_content(
    &self,
    author: &UserId,
    kind: ContentKind,
    title: &str,
    body: &str,
  ) -> Result<ContentItem> {
    if kind == ContentKind::Comment {
      return Err(Error::Validation("comments are created through the comment API".into()));
    }
    let title = title.trim();
    if title.is_empty() {
      return Err(Error::Validation("title must not be empty".into()));
    }

    self
      .store
      .create_content(NewContent {
        kind,
        author_id: author.clone(),
        title: title.to_owned(),
        body: body.to_owned(),
      })
      .await
      .map_err(Error::storage)
  }

  pub async fn get_content(&self, item: ContentRef) -> Result<ContentItem> {
    self
      .store
      .get_content(item)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| not_found(item))
  }

  /// Remove a document. Only its author may do so.
  pub async fn delete_content(&self, user: &UserId, item: ContentRef) -> Result<()> {
    if item.content_type == ContentKind::Comment {
      return Err(Error::Validation("comments are deleted through the comment API".into()));
    }
    let existing = self.get_content(item).await?;
    if &existing.author_id != user {
      return Err(Error::Authorization(format!("{user} is not the author of {item}")));
    }
    if !self.store.delete_content(item).await.map_err(Error::storage)? {
      return Err(not_found(item));
    }
    Ok(())
  }

  // ── Comments ──────────────────────────────────────────────────────────

  /// Attach a comment (or a reply, with `parent_id`) to `target`.
  pub async fn add_comment(
    &self,
    user: &UserId,
    target: ContentRef,
    content: &str,
    parent_id: Option<Uuid>,
  ) -> Result<Comment> {
    if !target.content_type.accepts_comments() {
      return Err(Error::Validation("reply to a comment with parentId instead".into()));
    }
    let content = validate_comment_text(content)?;

    self
      .store
      .get_counters(target)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| not_found(target))?;

    let parent = match parent_id {
      Some(pid) => {
        let parent = self
          .store
          .get_comment(pid)
          .await
          .map_err(Error::storage)?
          .filter(|c| c.status.is_active())
          .ok_or_else(|| Error::Validation(format!("parent comment {pid} is not available")))?;
        if parent.target != target {
          return Err(Error::Validation("parent comment belongs to different content".into()));
        }
        Some(parent)
      }
      None => None,
    };

    let comment = self
      .store
      .insert_comment(NewComment { target, author_id: user.clone(), content, parent_id })
      .await
      .map_err(Error::storage)?;

    debug!(comment = %comment.comment_id, target = %target, "comment added");

    if let Some(parent) = parent {
      self
        .notify(NewNotification {
          kind:       NotificationKind::CommentReply,
          recipient:  parent.author_id,
          actor:      user.clone(),
          comment_id: comment.comment_id,
          target,
        })
        .await;
    }
    Ok(comment)
  }

  async fn authored_comment(&self, user: &UserId, id: Uuid) -> Result<Comment> {
    let comment = self
      .store
      .get_comment(id)
      .await
      .map_err(Error::storage)?
      .filter(|c| c.status.is_active())
      .ok_or_else(|| comment_not_found(id))?;
    if &comment.author_id != user {
      return Err(Error::Authorization(format!("{user} is not the author of comment {id}")));
    }
    Ok(comment)
  }

  pub async fn edit_comment(&self, user: &UserId, id: Uuid, content: &str) -> Result<Comment> {
    let content = validate_comment_text(content)?;
    self.authored_comment(user, id).await?;
    self
      .store
      .update_comment(id, content)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| comment_not_found(id))
  }

  /// Soft-delete; `active → deleted` is terminal.
  pub async fn delete_comment(&self, user: &UserId, id: Uuid) -> Result<Comment> {
    self.authored_comment(user, id).await?;
    let deleted = self
      .store
      .soft_delete_comment(id)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| comment_not_found(id))?;
    debug!(comment = %id, "comment deleted");
    Ok(deleted)
  }

  /// Fetch a comment in any status, for audit.
  pub async fn get_comment(&self, id: Uuid) -> Result<Comment> {
    self
      .store
      .get_comment(id)
      .await
      .map_err(Error::storage)?
      .ok_or_else(|| comment_not_found(id))
  }

  pub async fn get_comment_count(&self, target: ContentRef) -> Result<CommentCount> {
    if !target.content_type.accepts_comments() {
      return Err(Error::Validation(format!("{} cannot carry comments", target.content_type)));
    }
    self.store.count_comments(target).await.map_err(Error::storage)
  }

  pub async fn list_comments(
    &self,
    target: ContentRef,
    mut query: CommentQuery,
  ) -> Result<CommentPage> {
    if !target.content_type.accepts_comments() {
      return Err(Error::Validation(format!("{} cannot carry comments", target.content_type)));
    }
    query.page = query.page.max(1);
    query.limit = query.limit.clamp(1, MAX_COMMENT_PAGE);
    self.store.list_comments(target, query).await.map_err(Error::storage)
  }

  // ── Notifications ─────────────────────────────────────────────────────

  /// Record `input` unless the actor is the recipient. Failures are logged.
  async fn notify(&self, input: NewNotification) {
    if input.recipient == input.actor {
      return;
    }
    let (kind, recipient, comment) = (input.kind, input.recipient.clone(), input.comment_id);
    match self.store.insert_notification(input).await {
      Ok(Some(n)) => debug!(notification = %n.id, kind = kind.as_str(), %recipient, "notified"),
      Ok(None) => debug!(kind = kind.as_str(), %recipient, %comment, "already notified"),
      Err(e) => warn!(kind = kind.as_str(), %recipient, %comment, "failed to notify: {e}"),
    }
  }

  async fn notify_comment_like(&self, user: &UserId, comment_id: Uuid) {
    let comment = match self.store.get_comment(comment_id).await {
      Ok(Some(comment)) => comment,
      Ok(None) => return,
      Err(e) => {
        warn!(comment = %comment_id, "failed to load liked comment: {e}");
        return;
      }
    };
    self
      .notify(NewNotification {
        kind:       NotificationKind::CommentLike,
        recipient:  comment.author_id,
        actor:      user.clone(),
        comment_id,
        target:     comment.target,
      })
      .await;
  }

  /// The user's notifications, newest first.
  pub async fn list_notifications(
    &self,
    user: &UserId,
    mut query: NotificationQuery,
  ) -> Result<Vec<Notification>> {
    query.limit = query.limit.clamp(1, MAX_NOTIFICATION_PAGE);
    self.store.list_notifications(user.clone(), query).await.map_err(Error::storage)
  }

  pub async fn unread_notification_count(&self, user: &UserId) -> Result<u64> {
    self.store.count_unread_notifications(user.clone()).await.map_err(Error::storage)
  }

  /// Mark one of the user's notifications read. Someone else's notification
  /// is reported as missing.
  pub async fn mark_notification_read(&self, user: &UserId, id: Uuid) -> Result<()> {
    if !self.store.mark_notification_read(user.clone(), id).await.map_err(Error::storage)? {
      return Err(Error::NotFound(format!("notification {id}")));
    }
    Ok(())
  }

  pub async fn mark_all_notifications_read(&self, user: &UserId) -> Result<u64> {
    self.store.mark_all_notifications_read(user.clone()).await.map_err(Error::storage)
  }
}
