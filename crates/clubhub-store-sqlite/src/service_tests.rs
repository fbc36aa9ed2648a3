//! `EngagementService` driven end to end over an in-memory `SqliteStore`.

use std::sync::Arc;

use clubhub_core::{
  Error, EngagementService,
  comment::CommentQuery,
  content::{ContentKind, ContentRef, UserId},
  engagement::EngagementState,
  notification::{NotificationKind, NotificationQuery},
};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::SqliteStore;

async fn service() -> EngagementService<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  EngagementService::new(Arc::new(store))
}

async fn post(svc: &EngagementService<SqliteStore>, kind: ContentKind) -> ContentRef {
  svc
    .create_content(&UserId::from("author"), kind, "Club night", "Bring a friend")
    .await
    .unwrap()
    .content_ref()
}

// ─── Toggles ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn like_then_unlike_returns_to_start() {
  let svc = service().await;
  let item = post(&svc, ContentKind::News).await;
  let user = UserId::from("u1");

  let liked = svc.toggle_like(&user, item).await.unwrap();
  assert!(liked.liked);
  assert_eq!(liked.like_count, 1);

  let unliked = svc.toggle_like(&user, item).await.unwrap();
  assert!(!unliked.liked);
  assert_eq!(unliked.like_count, 0);

  let state = svc.get_engagement_state(&user, item).await.unwrap();
  assert!(!state.liked);
}

#[tokio::test]
async fn two_users_like_and_one_unlikes() {
  let svc = service().await;
  let item = post(&svc, ContentKind::SocialPost).await;
  let a = UserId::from("a");
  let b = UserId::from("b");

  assert_eq!(svc.toggle_like(&a, item).await.unwrap().like_count, 1);
  assert_eq!(svc.toggle_like(&b, item).await.unwrap().like_count, 2);

  let a_off = svc.toggle_like(&a, item).await.unwrap();
  assert!(!a_off.liked);
  assert_eq!(a_off.like_count, 1);

  assert!(svc.get_engagement_state(&b, item).await.unwrap().liked);
  assert_eq!(svc.get_stats(item).await.unwrap().like_count, 1);
}

#[tokio::test]
async fn save_is_independent_of_like() {
  let svc = service().await;
  let item = post(&svc, ContentKind::Event).await;
  let user = UserId::from("u1");

  svc.toggle_like(&user, item).await.unwrap();
  let saved = svc.toggle_save(&user, item).await.unwrap();
  assert!(saved.saved);
  assert_eq!(saved.save_count, 1);

  let unliked = svc.toggle_like(&user, item).await.unwrap();
  assert!(!unliked.liked);
  assert!(svc.get_engagement_state(&user, item).await.unwrap().saved);
}

#[tokio::test]
async fn toggles_on_missing_content_are_not_found() {
  let svc = service().await;
  let item = ContentRef::new(ContentKind::News, Uuid::new_v4());
  let err = svc.toggle_like(&UserId::from("u1"), item).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn like_count_matches_liked_records_under_concurrency() {
  let svc = service().await;
  let item = post(&svc, ContentKind::News).await;

  let mut set = JoinSet::new();
  for n in 0..12 {
    let svc = svc.clone();
    set.spawn(async move {
      let user = UserId(format!("member-{n}"));
      svc.toggle_like(&user, item).await.unwrap();
      // Every third member changes their mind.
      if n % 3 == 0 {
        svc.toggle_like(&user, item).await.unwrap();
      }
    });
  }
  while let Some(res) = set.join_next().await {
    res.unwrap();
  }

  let mut liked = 0;
  for n in 0..12 {
    if svc.get_engagement_state(&UserId(format!("member-{n}")), item).await.unwrap().liked {
      liked += 1;
    }
  }
  assert_eq!(liked, 8);
  assert_eq!(svc.get_stats(item).await.unwrap().like_count, liked);
}

// ─── One-shot counters ───────────────────────────────────────────────────────

#[tokio::test]
async fn repeated_views_count_once_per_user() {
  let svc = service().await;
  let item = post(&svc, ContentKind::Resource).await;
  let user = UserId::from("u1");

  let first = svc.record_view(&user, item).await.unwrap();
  assert!(first.new_view);
  assert_eq!(first.views, 1);

  for _ in 0..3 {
    let again = svc.record_view(&user, item).await.unwrap();
    assert!(!again.new_view);
    assert_eq!(again.views, 1);
  }

  let other = svc.record_view(&UserId::from("u2"), item).await.unwrap();
  assert!(other.new_view);
  assert_eq!(other.views, 2);
}

#[tokio::test]
async fn share_and_download_are_one_shot() {
  let svc = service().await;
  let item = post(&svc, ContentKind::Resource).await;
  let user = UserId::from("u1");

  assert!(svc.record_share(&user, item).await.unwrap().new_share);
  let again = svc.record_share(&user, item).await.unwrap();
  assert!(!again.new_share);
  assert_eq!(again.share_count, 1);

  assert!(svc.record_download(&user, item).await.unwrap().new_download);
  let again = svc.record_download(&user, item).await.unwrap();
  assert!(!again.new_download);
  assert_eq!(again.download_count, 1);

  let stats = svc.get_stats(item).await.unwrap();
  assert_eq!((stats.share_count, stats.download_count), (1, 1));
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn state_without_record_is_all_false() {
  let svc = service().await;
  let item = post(&svc, ContentKind::News).await;
  let state = svc.get_engagement_state(&UserId::from("lurker"), item).await.unwrap();
  assert_eq!(state, EngagementState::default());
}

#[tokio::test]
async fn snapshot_includes_live_comment_count() {
  let svc = service().await;
  let item = post(&svc, ContentKind::Event).await;
  let user = UserId::from("u1");

  svc.toggle_like(&user, item).await.unwrap();
  let c = svc.add_comment(&user, item, "see you there", None).await.unwrap();
  svc.add_comment(&user, item, "bringing snacks", Some(c.comment_id)).await.unwrap();

  let snap = svc.get_snapshot(&user, item).await.unwrap();
  assert!(snap.engagement.liked);
  assert_eq!(snap.stats.like_count, 1);
  assert_eq!(snap.stats.comment_count, 2);

  svc.delete_comment(&user, c.comment_id).await.unwrap();
  assert_eq!(svc.get_stats(item).await.unwrap().comment_count, 1);
}

#[tokio::test]
async fn stats_for_missing_content_are_not_found() {
  let svc = service().await;
  let item = ContentRef::new(ContentKind::Event, Uuid::new_v4());
  assert!(matches!(svc.get_stats(item).await, Err(Error::NotFound(_))));
}

// ─── Saved content ───────────────────────────────────────────────────────────

#[tokio::test]
async fn saved_content_is_grouped_and_skips_deleted_items() {
  let svc = service().await;
  let user = UserId::from("u1");
  let author = UserId::from("author");
  let news = post(&svc, ContentKind::News).await;
  let event = post(&svc, ContentKind::Event).await;
  let social = post(&svc, ContentKind::SocialPost).await;

  for item in [news, event, social] {
    svc.toggle_save(&user, item).await.unwrap();
  }
  svc.delete_content(&author, event).await.unwrap();

  let saved = svc.get_user_saved_content(&user, 50).await.unwrap();
  assert_eq!(saved.len(), 2);
  assert_eq!(saved.news[0].item.content_id, news.content_id);
  assert_eq!(saved.social[0].item.content_id, social.content_id);
  assert!(saved.events.is_empty());
  assert!(saved.news[0].saved_at.is_some());

  let only_news = svc.get_user_saved_of_kind(&user, ContentKind::News, 50).await.unwrap();
  assert_eq!(only_news.len(), 1);
}

#[tokio::test]
async fn unsaved_items_drop_out_of_saved_content() {
  let svc = service().await;
  let user = UserId::from("u1");
  let item = post(&svc, ContentKind::Resource).await;

  svc.toggle_save(&user, item).await.unwrap();
  svc.toggle_save(&user, item).await.unwrap();

  assert!(svc.get_user_saved_content(&user, 50).await.unwrap().is_empty());
}

// ─── Content boundary ────────────────────────────────────────────────────────

#[tokio::test]
async fn only_the_author_may_delete_content() {
  let svc = service().await;
  let item = post(&svc, ContentKind::News).await;

  let err = svc.delete_content(&UserId::from("intruder"), item).await.unwrap_err();
  assert!(matches!(err, Error::Authorization(_)));

  svc.delete_content(&UserId::from("author"), item).await.unwrap();
  assert!(matches!(svc.get_content(item).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn content_needs_a_title_and_a_real_kind() {
  let svc = service().await;
  let author = UserId::from("author");
  let blank = svc.create_content(&author, ContentKind::News, "   ", "").await;
  assert!(matches!(blank, Err(Error::Validation(_))));
  let comment = svc.create_content(&author, ContentKind::Comment, "hi", "").await;
  assert!(matches!(comment, Err(Error::Validation(_))));
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn comment_text_is_trimmed_and_bounded() {
  let svc = service().await;
  let item = post(&svc, ContentKind::News).await;
  let user = UserId::from("u1");

  let c = svc.add_comment(&user, item, "  nice one  ", None).await.unwrap();
  assert_eq!(c.content, "nice one");

  let empty = svc.add_comment(&user, item, "   ", None).await;
  assert!(matches!(empty, Err(Error::Validation(_))));

  let long = "x".repeat(2001);
  assert!(matches!(svc.add_comment(&user, item, &long, None).await, Err(Error::Validation(_))));
}

#[tokio::test]
async fn comment_on_missing_content_is_not_found() {
  let svc = service().await;
  let item = ContentRef::new(ContentKind::News, Uuid::new_v4());
  let err = svc.add_comment(&UserId::from("u1"), item, "hello?", None).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn reply_must_target_same_content() {
  let svc = service().await;
  let user = UserId::from("u1");
  let a = post(&svc, ContentKind::News).await;
  let b = post(&svc, ContentKind::News).await;
  let parent = svc.add_comment(&user, a, "on a", None).await.unwrap();

  let err = svc.add_comment(&user, b, "on b", Some(parent.comment_id)).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn only_the_author_may_edit_or_delete_a_comment() {
  let svc = service().await;
  let item = post(&svc, ContentKind::News).await;
  let owner = UserId::from("owner");
  let other = UserId::from("other");
  let c = svc.add_comment(&owner, item, "mine", None).await.unwrap();

  assert!(matches!(
    svc.edit_comment(&other, c.comment_id, "theirs").await,
    Err(Error::Authorization(_))
  ));
  assert!(matches!(
    svc.delete_comment(&other, c.comment_id).await,
    Err(Error::Authorization(_))
  ));

  let edited = svc.edit_comment(&owner, c.comment_id, "still mine").await.unwrap();
  assert_eq!(edited.content, "still mine");
}

#[tokio::test]
async fn deleted_comment_is_terminal() {
  let svc = service().await;
  let item = post(&svc, ContentKind::News).await;
  let owner = UserId::from("owner");
  let c = svc.add_comment(&owner, item, "oops", None).await.unwrap();

  svc.delete_comment(&owner, c.comment_id).await.unwrap();

  assert!(matches!(svc.delete_comment(&owner, c.comment_id).await, Err(Error::NotFound(_))));
  assert!(matches!(
    svc.edit_comment(&owner, c.comment_id, "undo").await,
    Err(Error::NotFound(_))
  ));

  let page = svc.list_comments(item, CommentQuery::default()).await.unwrap();
  assert!(page.comments.is_empty());
  assert_eq!(svc.get_comment_count(item).await.unwrap().total_count, 0);
  assert!(!svc.get_comment(c.comment_id).await.unwrap().status.is_active());
}

#[tokio::test]
async fn comments_are_likeable_content() {
  let svc = service().await;
  let item = post(&svc, ContentKind::News).await;
  let c = svc.add_comment(&UserId::from("u1"), item, "like me", None).await.unwrap();
  let as_content = ContentRef::new(ContentKind::Comment, c.comment_id);

  let liked = svc.toggle_like(&UserId::from("u2"), as_content).await.unwrap();
  assert_eq!(liked.like_count, 1);
  assert_eq!(svc.get_stats(as_content).await.unwrap().comment_count, 0);

  let err = svc.add_comment(&UserId::from("u2"), as_content, "nested", None).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn comment_page_limit_is_clamped() {
  let svc = service().await;
  let item = post(&svc, ContentKind::News).await;
  svc.add_comment(&UserId::from("u1"), item, "one", None).await.unwrap();

  let page = svc
    .list_comments(item, CommentQuery { page: 0, limit: 10_000, ..Default::default() })
    .await
    .unwrap();
  assert_eq!(page.pagination.page, 1);
  assert_eq!(page.pagination.limit, 100);
  assert_eq!(page.comments.len(), 1);
}

// ─── Maintenance ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn purge_user_then_reconcile_finds_nothing() {
  let svc = service().await;
  let item = post(&svc, ContentKind::News).await;
  let user = UserId::from("leaving");

  svc.toggle_like(&user, item).await.unwrap();
  svc.toggle_save(&user, item).await.unwrap();
  svc.record_view(&user, item).await.unwrap();

  assert_eq!(svc.purge_user(&user).await.unwrap(), 1);

  let stats = svc.get_stats(item).await.unwrap();
  assert_eq!((stats.like_count, stats.save_count, stats.views), (0, 0, 0));

  let reports = svc.reconcile(None).await.unwrap();
  assert!(reports.iter().all(|r| r.rows_corrected == 0));
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn reply_notifies_the_parent_author_but_never_yourself() {
  let svc = service().await;
  let item = post(&svc, ContentKind::News).await;
  let alice = UserId::from("alice");
  let bob = UserId::from("bob");
  let parent = svc.add_comment(&alice, item, "who's driving?", None).await.unwrap();

  let reply = svc.add_comment(&bob, item, "me", Some(parent.comment_id)).await.unwrap();
  svc.add_comment(&alice, item, "great", Some(parent.comment_id)).await.unwrap();
  // A top-level comment notifies nobody.
  svc.add_comment(&bob, item, "see you there", None).await.unwrap();

  let notes = svc.list_notifications(&alice, NotificationQuery::default()).await.unwrap();
  assert_eq!(notes.len(), 1);
  assert_eq!(notes[0].kind, NotificationKind::CommentReply);
  assert_eq!(notes[0].actor, bob);
  assert_eq!(notes[0].comment_id, reply.comment_id);
  assert_eq!(notes[0].target, item);
  assert_eq!(svc.unread_notification_count(&bob).await.unwrap(), 0);
}

#[tokio::test]
async fn liking_a_comment_notifies_its_author() {
  let svc = service().await;
  let item = post(&svc, ContentKind::Event).await;
  let alice = UserId::from("alice");
  let bob = UserId::from("bob");
  let c = svc.add_comment(&alice, item, "count me in", None).await.unwrap();
  let as_content = ContentRef::new(ContentKind::Comment, c.comment_id);

  svc.toggle_like(&bob, as_content).await.unwrap();
  // Unlike notifies nobody, and liking again does not stack an unread duplicate.
  svc.toggle_like(&bob, as_content).await.unwrap();
  svc.toggle_like(&bob, as_content).await.unwrap();
  // Own likes are silent.
  svc.toggle_like(&alice, as_content).await.unwrap();

  let notes = svc.list_notifications(&alice, NotificationQuery::default()).await.unwrap();
  assert_eq!(notes.len(), 1);
  assert_eq!(notes[0].kind, NotificationKind::CommentLike);
  assert_eq!(notes[0].comment_id, c.comment_id);
  assert_eq!(notes[0].target, item);
  assert_eq!(svc.unread_notification_count(&alice).await.unwrap(), 1);
}

#[tokio::test]
async fn liking_other_content_notifies_nobody() {
  let svc = service().await;
  let item = post(&svc, ContentKind::News).await;
  svc.toggle_like(&UserId::from("bob"), item).await.unwrap();
  assert_eq!(svc.unread_notification_count(&UserId::from("author")).await.unwrap(), 0);
}

#[tokio::test]
async fn notifications_are_marked_read_by_their_recipient_only() {
  let svc = service().await;
  let item = post(&svc, ContentKind::News).await;
  let alice = UserId::from("alice");
  let bob = UserId::from("bob");
  let parent = svc.add_comment(&alice, item, "first", None).await.unwrap();
  svc.add_comment(&bob, item, "second", Some(parent.comment_id)).await.unwrap();
  svc
    .toggle_like(&bob, ContentRef::new(ContentKind::Comment, parent.comment_id))
    .await
    .unwrap();

  let notes = svc.list_notifications(&alice, NotificationQuery::default()).await.unwrap();
  assert_eq!(notes.len(), 2);

  let err = svc.mark_notification_read(&bob, notes[0].id).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));

  svc.mark_notification_read(&alice, notes[0].id).await.unwrap();
  assert_eq!(svc.unread_notification_count(&alice).await.unwrap(), 1);
  assert_eq!(svc.mark_all_notifications_read(&alice).await.unwrap(), 1);
  assert_eq!(svc.unread_notification_count(&alice).await.unwrap(), 0);
}

#[tokio::test]
async fn notification_limit_is_clamped() {
  let svc = service().await;
  let item = post(&svc, ContentKind::News).await;
  let alice = UserId::from("alice");
  let parent = svc.add_comment(&alice, item, "first", None).await.unwrap();
  svc.add_comment(&UserId::from("bob"), item, "hi", Some(parent.comment_id)).await.unwrap();

  let none_asked = svc
    .list_notifications(&alice, NotificationQuery { unread_only: false, limit: 0 })
    .await
    .unwrap();
  assert_eq!(none_asked.len(), 1);
}
