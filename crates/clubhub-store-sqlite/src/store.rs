//! [`SqliteStore`], the SQLite implementation of [`EngagementStore`].
//!
//! Every engagement mutation runs as a single SQLite transaction on the
//! connection thread: the record upsert, the flag read, the flag write and
//! the relative counter adjustment either all commit or none do.

use std::path::Path;

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::{Connection, OptionalExtension as _, params};
use tracing::warn;
use uuid::Uuid;

use clubhub_core::{
  comment::{
    Comment, CommentCount, CommentPage, CommentQuery, CommentSort, CommentStatus, NewComment,
    Pagination,
  },
  content::{ContentCounters, ContentItem, ContentKind, ContentRef, NewContent, UserId},
  engagement::{Applied, EngagementRecord, Flag, FlagMode, ReconcileReport},
  notification::{NewNotification, Notification, NotificationQuery},
  store::EngagementStore,
};

use crate::{
  encode::{
    COMMENT_COLUMNS, COUNTER_COLUMNS, ENGAGEMENT_COLUMNS, NOTIFICATION_COLUMNS, RawComment,
    RawContent, RawCounters, RawEngagement, RawNotification, encode_dt, encode_kind,
    encode_status, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

/// SQLite caps bound parameters per statement; batched lookups are chunked
/// well below that.
const RESOLVE_CHUNK: usize = 500;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A clubhub store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by the tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL against the connection, for tests that need to corrupt
  /// state on purpose.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Shared body of `set_flag` and `apply_engagement`.
  async fn flag_change(
    &self,
    user: UserId,
    item: ContentRef,
    flag: Flag,
    target: Target,
  ) -> Result<Option<Applied>> {
    let user_str = user.0;
    let id_str = encode_uuid(item.content_id);
    let kind = item.content_type;

    let raw = self
      .conn
      .call(move |conn| Ok(flag_transaction(conn, &user_str, kind, &id_str, flag, target)?))
      .await?;

    let Some((record, previous, current, count)) = raw else {
      return Ok(None);
    };
    Ok(Some(Applied { record: record.into_record()?, previous, current, count }))
  }
}

// ─── Transaction helpers ─────────────────────────────────────────────────────
//
// These run on the connection thread, inside `conn.call`, and only ever see
// the encoded string forms of ids and kinds.

/// Microsecond precision, matching what the columns can hold.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

/// What a flag should become inside [`flag_transaction`].
#[derive(Debug, Clone, Copy)]
enum Target {
  /// Invert a toggle flag, set a one-shot flag.
  Natural,
  Value(bool),
}

fn live_filter(kind: ContentKind) -> &'static str {
  match kind {
    ContentKind::Comment => " AND status = 'active'",
    _ => "",
  }
}

/// `SELECT` producing [`RawContent`] rows for `kind`, open for further
/// `AND` clauses.
fn content_select(kind: ContentKind) -> String {
  match kind {
    ContentKind::Comment => format!(
      "SELECT id, author_id, NULL, content, created_at, {COUNTER_COLUMNS} \
       FROM comments WHERE status = 'active'"
    ),
    other => format!(
      "SELECT id, author_id, title, body, created_at, {COUNTER_COLUMNS} \
       FROM {} WHERE 1 = 1",
      other.table()
    ),
  }
}

fn content_exists(conn: &Connection, kind: ContentKind, id: &str) -> rusqlite::Result<bool> {
  let sql = format!("SELECT 1 FROM {} WHERE id = ?1{}", kind.table(), live_filter(kind));
  Ok(conn.query_row(&sql, [id], |_| Ok(())).optional()?.is_some())
}

fn upsert_engagement(
  conn: &Connection,
  user: &str,
  kind: &str,
  id: &str,
  now: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO engagements (user_id, content_type, content_id, created_at, last_engaged_at)
     VALUES (?1, ?2, ?3, ?4, ?4)
     ON CONFLICT (user_id, content_type, content_id) DO NOTHING",
    params![user, kind, id, now],
  )?;
  Ok(())
}

fn read_engagement(
  conn: &Connection,
  user: &str,
  kind: &str,
  id: &str,
) -> rusqlite::Result<Option<RawEngagement>> {
  conn
    .query_row(
      &format!(
        "SELECT {ENGAGEMENT_COLUMNS} FROM engagements
         WHERE user_id = ?1 AND content_type = ?2 AND content_id = ?3"
      ),
      params![user, kind, id],
      RawEngagement::from_row,
    )
    .optional()
}

fn write_flag(
  conn: &Connection,
  user: &str,
  kind: &str,
  id: &str,
  flag: Flag,
  value: bool,
  now: &str,
) -> rusqlite::Result<()> {
  // The timestamp is cleared when a toggle flag goes back to false.
  let at = value.then_some(now);
  conn.execute(
    &format!(
      "UPDATE engagements SET {} = ?1, {} = ?2, last_engaged_at = ?3
       WHERE user_id = ?4 AND content_type = ?5 AND content_id = ?6",
      flag.column(),
      flag.at_column()
    ),
    params![value, at, now, user, kind, id],
  )?;
  Ok(())
}

fn read_counter(
  conn: &Connection,
  kind: ContentKind,
  id: &str,
  flag: Flag,
) -> rusqlite::Result<Option<i64>> {
  conn
    .query_row(
      &format!("SELECT {} FROM {} WHERE id = ?1", flag.counter_column(), kind.table()),
      [id],
      |r| r.get(0),
    )
    .optional()
}

/// Move a counter by `delta`, relative to whatever is committed.
///
/// Decrements never take a counter below zero. A decrement that finds the
/// counter already at zero means the projection has drifted from the
/// engagement table; it is logged and left for reconciliation.
fn adjust_counter(
  conn: &Connection,
  kind: ContentKind,
  id: &str,
  flag: Flag,
  delta: i64,
) -> rusqlite::Result<i64> {
  let table = kind.table();
  let col = flag.counter_column();

  let changed = if delta >= 0 {
    conn.execute(&format!("UPDATE {table} SET {col} = {col} + ?1 WHERE id = ?2"), params![delta, id])?
  } else {
    conn.execute(
      &format!("UPDATE {table} SET {col} = MAX({col} + ?1, 0) WHERE id = ?2 AND {col} > 0"),
      params![delta, id],
    )?
  };

  let current = read_counter(conn, kind, id, flag)?;
  if changed == 0 && delta < 0 && current.is_some() {
    warn!(
      content_type = %kind,
      content_id = id,
      counter = col,
      "counter already at zero on decrement; projection has drifted"
    );
  }
  Ok(current.unwrap_or(0))
}

/// One atomic engagement change. `None` when the content row is missing.
fn flag_transaction(
  conn: &mut Connection,
  user: &str,
  kind: ContentKind,
  id: &str,
  flag: Flag,
  target: Target,
) -> rusqlite::Result<Option<(RawEngagement, bool, bool, i64)>> {
  let tx = conn.transaction()?;

  if !content_exists(&tx, kind, id)? {
    return Ok(None);
  }

  let kind_str = encode_kind(kind);
  let stamp = encode_dt(now());

  upsert_engagement(&tx, user, &kind_str, id, &stamp)?;
  let before =
    read_engagement(&tx, user, &kind_str, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;

  let previous = before.flag(flag);
  let current = match (target, flag.mode()) {
    (Target::Natural, FlagMode::Toggle) => !previous,
    (Target::Natural, FlagMode::OneShot) => true,
    (Target::Value(false), FlagMode::OneShot) => previous,
    (Target::Value(value), FlagMode::Toggle) => value,
    (Target::Value(true), FlagMode::OneShot) => true,
  };

  let count = if current != previous {
    write_flag(&tx, user, &kind_str, id, flag, current, &stamp)?;
    adjust_counter(&tx, kind, id, flag, if current { 1 } else { -1 })?
  } else {
    read_counter(&tx, kind, id, flag)?.unwrap_or(0)
  };

  let after =
    read_engagement(&tx, user, &kind_str, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
  tx.commit()?;

  Ok(Some((after, previous, current, count)))
}

/// Filter shared by the comment count and listing queries. Binds the target
/// as `?1`/`?2` and the parent as `?3`.
const COMMENT_FILTER: &str = "content_type = ?1 AND content_id = ?2 AND status = 'active' \
   AND ((?3 IS NULL AND parent_id IS NULL) OR parent_id = ?3)";

// ─── EngagementStore impl ────────────────────────────────────────────────────

impl EngagementStore for SqliteStore {
  type Error = Error;

  // ── Content documents ─────────────────────────────────────────────────

  async fn create_content(&self, input: NewContent) -> Result<ContentItem> {
    if input.kind == ContentKind::Comment {
      return Err(Error::Core(clubhub_core::Error::Validation(
        "comments are created through insert_comment".into(),
      )));
    }

    let item = ContentItem {
      content_type: input.kind,
      content_id:   Uuid::new_v4(),
      author_id:    input.author_id,
      title:        Some(input.title),
      body:         input.body,
      created_at:   now(),
      counters:     ContentCounters::default(),
    };

    let sql = format!(
      "INSERT INTO {} (id, author_id, title, body, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
      item.content_type.table()
    );
    let id_str = encode_uuid(item.content_id);
    let author = item.author_id.0.clone();
    let title = item.title.clone();
    let body = item.body.clone();
    let created = encode_dt(item.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, params![id_str, author, title, body, created])?;
        Ok(())
      })
      .await?;

    Ok(item)
  }

  async fn get_content(&self, item: ContentRef) -> Result<Option<ContentItem>> {
    let kind = item.content_type;
    let sql = format!("{} AND id = ?1", content_select(kind));
    let id_str = encode_uuid(item.content_id);

    let raw: Option<RawContent> = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [id_str], RawContent::from_row).optional()?))
      .await?;

    raw.map(|r| r.into_item(kind)).transpose()
  }

  async fn delete_content(&self, item: ContentRef) -> Result<bool> {
    // Comments keep their row and only change status.
    if item.content_type == ContentKind::Comment {
      return Ok(self.soft_delete_comment(item.content_id).await?.is_some());
    }

    let sql = format!("DELETE FROM {} WHERE id = ?1", item.content_type.table());
    let id_str = encode_uuid(item.content_id);

    let removed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, [id_str])?))
      .await?;
    Ok(removed > 0)
  }

  async fn resolve_content(&self, kind: ContentKind, ids: Vec<Uuid>) -> Result<Vec<ContentItem>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let ids: Vec<String> = ids.into_iter().map(encode_uuid).collect();
    let base = content_select(kind);

    let raws: Vec<RawContent> = self
      .conn
      .call(move |conn| {
        let mut out = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(RESOLVE_CHUNK) {
          let placeholders =
            (1..=chunk.len()).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ");
          let sql = format!("{base} AND id IN ({placeholders})");
          let mut stmt = conn.prepare(&sql)?;
          let rows = stmt
            .query_map(rusqlite::params_from_iter(chunk.iter()), RawContent::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          out.extend(rows);
        }
        Ok(out)
      })
      .await?;

    raws.into_iter().map(|r| r.into_item(kind)).collect()
  }

  async fn get_counters(&self, item: ContentRef) -> Result<Option<ContentCounters>> {
    let kind = item.content_type;
    let sql = format!(
      "SELECT {COUNTER_COLUMNS} FROM {} WHERE id = ?1{}",
      kind.table(),
      live_filter(kind)
    );
    let id_str = encode_uuid(item.content_id);

    let raw: Option<RawCounters> = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, [id_str], |row| RawCounters::from_row(row, 0)).optional()?)
      })
      .await?;

    Ok(raw.map(RawCounters::into_counters))
  }

  // ── Engagement records ────────────────────────────────────────────────

  async fn get_or_create_engagement(
    &self,
    user: UserId,
    item: ContentRef,
  ) -> Result<Option<EngagementRecord>> {
    let user_str = user.0;
    let kind = item.content_type;
    let id_str = encode_uuid(item.content_id);

    let raw: Option<RawEngagement> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !content_exists(&tx, kind, &id_str)? {
          return Ok(None);
        }
        let kind_str = encode_kind(kind);
        upsert_engagement(&tx, &user_str, &kind_str, &id_str, &encode_dt(now()))?;
        let raw = read_engagement(&tx, &user_str, &kind_str, &id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawEngagement::into_record).transpose()
  }

  async fn get_engagement(&self, user: UserId, item: ContentRef) -> Result<Option<EngagementRecord>> {
    let user_str = user.0;
    let kind_str = encode_kind(item.content_type);
    let id_str = encode_uuid(item.content_id);

    let raw: Option<RawEngagement> = self
      .conn
      .call(move |conn| Ok(read_engagement(conn, &user_str, &kind_str, &id_str)?))
      .await?;

    raw.map(RawEngagement::into_record).transpose()
  }

  async fn set_flag(
    &self,
    user: UserId,
    item: ContentRef,
    flag: Flag,
    value: bool,
  ) -> Result<Option<Applied>> {
    self.flag_change(user, item, flag, Target::Value(value)).await
  }

  async fn apply_engagement(
    &self,
    user: UserId,
    item: ContentRef,
    flag: Flag,
  ) -> Result<Option<Applied>> {
    self.flag_change(user, item, flag, Target::Natural).await
  }

  async fn saved_engagements(
    &self,
    user: UserId,
    kind: Option<ContentKind>,
    limit: u32,
  ) -> Result<Vec<EngagementRecord>> {
    let user_str = user.0;
    let kind_str = kind.map(encode_kind);

    let raws: Vec<RawEngagement> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ENGAGEMENT_COLUMNS} FROM engagements
           WHERE user_id = ?1 AND saved = 1 AND (?2 IS NULL OR content_type = ?2)
           ORDER BY saved_at DESC, rowid DESC
           LIMIT ?3"
        ))?;
        let rows = stmt
          .query_map(params![user_str, kind_str, limit], RawEngagement::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEngagement::into_record).collect()
  }

  async fn purge_user(&self, user: UserId) -> Result<u64> {
    let user_str = user.0;

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let rows = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {ENGAGEMENT_COLUMNS} FROM engagements WHERE user_id = ?1"
          ))?;
          stmt
            .query_map([&user_str], RawEngagement::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        for raw in &rows {
          // An unknown discriminant cannot own a counter; the row is still
          // removed below.
          let Ok(kind) = ContentKind::parse(&raw.content_type) else {
            continue;
          };
          for flag in Flag::ALL {
            if raw.flag(flag) {
              adjust_counter(&tx, kind, &raw.content_id, flag, -1)?;
            }
          }
        }

        let removed = tx.execute("DELETE FROM engagements WHERE user_id = ?1", [&user_str])?;
        tx.execute(
          "DELETE FROM notifications WHERE recipient_id = ?1 OR actor_id = ?1",
          [&user_str],
        )?;
        tx.commit()?;
        Ok(removed as u64)
      })
      .await?;

    Ok(removed)
  }

  async fn reconcile_counters(&self, kind: Option<ContentKind>) -> Result<Vec<ReconcileReport>> {
    let kinds: Vec<ContentKind> = match kind {
      Some(kind) => vec![kind],
      None => ContentKind::ALL.to_vec(),
    };

    let reports = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut reports = Vec::with_capacity(kinds.len());

        for kind in kinds {
          let table = kind.table();
          let kind_str = encode_kind(kind);
          let expected = |flag: Flag| {
            format!(
              "(SELECT COUNT(*) FROM engagements e \
                WHERE e.content_type = ?1 AND e.content_id = {table}.id AND e.{} = 1)",
              flag.column()
            )
          };
          let drift = Flag::ALL
            .iter()
            .map(|f| format!("{} != {}", f.counter_column(), expected(*f)))
            .collect::<Vec<_>>()
            .join(" OR ");
          let assignments = Flag::ALL
            .iter()
            .map(|f| format!("{} = {}", f.counter_column(), expected(*f)))
            .collect::<Vec<_>>()
            .join(", ");

          let scanned: i64 =
            tx.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?;
          let corrected: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE {drift}"),
            [&kind_str],
            |r| r.get(0),
          )?;
          if corrected > 0 {
            tx.execute(&format!("UPDATE {table} SET {assignments} WHERE {drift}"), [&kind_str])?;
          }

          reports.push(ReconcileReport {
            kind,
            rows_scanned: scanned as u64,
            rows_corrected: corrected as u64,
          });
        }

        tx.commit()?;
        Ok(reports)
      })
      .await?;

    Ok(reports)
  }

  // ── Comments ──────────────────────────────────────────────────────────

  async fn insert_comment(&self, input: NewComment) -> Result<Comment> {
    let created = now();
    let comment = Comment {
      comment_id: Uuid::new_v4(),
      target:     input.target,
      author_id:  input.author_id,
      content:    input.content,
      status:     CommentStatus::Active,
      parent_id:  input.parent_id,
      created_at: created,
      updated_at: created,
      deleted_at: None,
      counters:   ContentCounters::default(),
    };

    let id_str = encode_uuid(comment.comment_id);
    let kind_str = encode_kind(comment.target.content_type);
    let target_str = encode_uuid(comment.target.content_id);
    let author = comment.author_id.0.clone();
    let content = comment.content.clone();
    let status = encode_status(comment.status);
    let parent = comment.parent_id.map(encode_uuid);
    let created_str = encode_dt(created);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments
             (id, content_type, content_id, author_id, content, status, parent_id,
              created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
          params![id_str, kind_str, target_str, author, content, status, parent, created_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }

  async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
              [id_str],
              RawComment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn update_comment(&self, id: Uuid, content: String) -> Result<Option<Comment>> {
    let id_str = encode_uuid(id);
    let updated = encode_dt(now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE comments SET content = ?1, updated_at = ?2
           WHERE id = ?3 AND status = 'active'",
          params![content, updated, id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_comment(id).await
  }

  async fn soft_delete_comment(&self, id: Uuid) -> Result<Option<Comment>> {
    let id_str = encode_uuid(id);
    let deleted = encode_dt(now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE comments SET status = 'deleted', deleted_at = ?1, updated_at = ?1
           WHERE id = ?2 AND status = 'active'",
          params![deleted, id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_comment(id).await
  }

  async fn count_comments(&self, target: ContentRef) -> Result<CommentCount> {
    let kind_str = encode_kind(target.content_type);
    let id_str = encode_uuid(target.content_id);

    let (total_count, count): (i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*), COALESCE(SUM(CASE WHEN parent_id IS NULL THEN 1 ELSE 0 END), 0)
           FROM comments
           WHERE content_type = ?1 AND content_id = ?2 AND status = 'active'",
          params![kind_str, id_str],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?)
      })
      .await?;

    Ok(CommentCount { count, total_count })
  }

  async fn list_comments(&self, target: ContentRef, query: CommentQuery) -> Result<CommentPage> {
    let kind_str = encode_kind(target.content_type);
    let id_str = encode_uuid(target.content_id);
    let parent = query.parent_id.map(encode_uuid);
    let page = query.page.max(1);
    let limit = query.limit;
    let offset = u64::from(page - 1) * u64::from(limit);
    let order = match query.sort {
      CommentSort::Newest => "created_at DESC, rowid DESC",
      CommentSort::Likes => "like_count DESC, created_at DESC, rowid DESC",
    };

    let (total, raws): (i64, Vec<RawComment>) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM comments WHERE {COMMENT_FILTER}"),
          params![kind_str, id_str, parent],
          |r| r.get(0),
        )?;
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS} FROM comments WHERE {COMMENT_FILTER}
           ORDER BY {order} LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(params![kind_str, id_str, parent, limit, offset as i64], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((total, rows))
      })
      .await?;

    let comments = raws
      .into_iter()
      .map(RawComment::into_comment)
      .collect::<Result<Vec<_>>>()?;
    let total = total.max(0) as u64;
    let has_more = offset + (comments.len() as u64) < total;

    Ok(CommentPage {
      comments,
      pagination: Pagination { page, limit, total, has_more },
    })
  }

  // ── Notifications ─────────────────────────────────────────────────────

  async fn insert_notification(&self, input: NewNotification) -> Result<Option<Notification>> {
    let notification = Notification {
      id:         Uuid::new_v4(),
      kind:       input.kind,
      recipient:  input.recipient,
      actor:      input.actor,
      comment_id: input.comment_id,
      target:     input.target,
      read:       false,
      created_at: now(),
    };

    let id_str = encode_uuid(notification.id);
    let recipient = notification.recipient.0.clone();
    let actor = notification.actor.0.clone();
    let kind = notification.kind.as_str();
    let comment_str = encode_uuid(notification.comment_id);
    let kind_str = encode_kind(notification.target.content_type);
    let target_str = encode_uuid(notification.target.content_id);
    let created_str = encode_dt(notification.created_at);

    // The existence check and the insert are one statement, so two
    // concurrent likes cannot both slip past it.
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO notifications
             (id, recipient_id, actor_id, kind, comment_id, content_type, content_id,
              read, created_at)
           SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8
           WHERE NOT EXISTS (
             SELECT 1 FROM notifications
             WHERE recipient_id = ?2 AND actor_id = ?3 AND kind = ?4
               AND comment_id = ?5 AND read = 0
           )",
          params![id_str, recipient, actor, kind, comment_str, kind_str, target_str, created_str],
        )?)
      })
      .await?;

    Ok((inserted > 0).then_some(notification))
  }

  async fn list_notifications(
    &self,
    recipient: UserId,
    query: NotificationQuery,
  ) -> Result<Vec<Notification>> {
    let recipient = recipient.0;
    let unread_filter = if query.unread_only { " AND read = 0" } else { "" };
    let limit = query.limit;

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NOTIFICATION_COLUMNS} FROM notifications
           WHERE recipient_id = ?1{unread_filter}
           ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(params![recipient, limit], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }

  async fn count_unread_notifications(&self, recipient: UserId) -> Result<u64> {
    let recipient = recipient.0;

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND read = 0",
          [recipient],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(count.max(0) as u64)
  }

  async fn mark_notification_read(&self, recipient: UserId, id: Uuid) -> Result<bool> {
    let recipient = recipient.0;
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET read = 1 WHERE id = ?1 AND recipient_id = ?2",
          params![id_str, recipient],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn mark_all_notifications_read(&self, recipient: UserId) -> Result<u64> {
    let recipient = recipient.0;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET read = 1 WHERE recipient_id = ?1 AND read = 0",
          [recipient],
        )?)
      })
      .await?;

    Ok(changed as u64)
  }
}
