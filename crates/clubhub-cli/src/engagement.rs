//! Client-side engagement state for one content item.
//!
//! [`EngagementHandle`] loads `{engagement, stats}` once and then applies
//! like/save/share toggles optimistically. Each toggle is confirmed with the
//! server's values or rolled back to the pre-click state. A toggle of a flag
//! that already has a request in flight is ignored, so a double-click can
//! never produce two server transitions.
//!
//! The toggle reply is the authority for its flag. A reload never touches a
//! flag whose toggle is still in flight, and a reload response that was
//! requested before a toggle completed leaves that flag alone.

use std::{
  future::Future,
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, AtomicU64, Ordering},
  },
};

use anyhow::Result;
use clubhub_core::{
  content::ContentRef,
  engagement::{
    ContentStats, EngagementSnapshot, EngagementState, LikeOutcome, SaveOutcome, ShareOutcome,
  },
};
use tracing::{debug, warn};

use crate::client::ApiClient;

// ─── API seam ─────────────────────────────────────────────────────────────────

/// The subset of the HTTP API a handle talks to.
pub trait EngagementApi: Send + Sync + 'static {
  fn snapshot(
    &self,
    item: ContentRef,
  ) -> impl Future<Output = Result<EngagementSnapshot>> + Send;

  fn toggle_like(&self, item: ContentRef) -> impl Future<Output = Result<LikeOutcome>> + Send;

  fn toggle_save(&self, item: ContentRef) -> impl Future<Output = Result<SaveOutcome>> + Send;

  fn record_share(&self, item: ContentRef)
  -> impl Future<Output = Result<ShareOutcome>> + Send;
}

impl EngagementApi for ApiClient {
  async fn snapshot(&self, item: ContentRef) -> Result<EngagementSnapshot> {
    ApiClient::snapshot(self, item).await
  }

  async fn toggle_like(&self, item: ContentRef) -> Result<LikeOutcome> {
    ApiClient::toggle_like(self, item).await
  }

  async fn toggle_save(&self, item: ContentRef) -> Result<SaveOutcome> {
    ApiClient::toggle_save(self, item).await
  }

  async fn record_share(&self, item: ContentRef) -> Result<ShareOutcome> {
    ApiClient::record_share(self, item).await
  }
}

// ─── Public state ─────────────────────────────────────────────────────────────

/// Where the most recent toggle stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
  #[default]
  Idle,
  /// At least one toggle is in flight.
  Pending,
  Confirmed,
  RolledBack,
}

/// What happened to one toggle call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
  /// The server accepted it; local state now carries the server's values.
  Confirmed,
  /// The request failed; local state was restored and `last_error` set.
  RolledBack,
  /// The same flag already had a request in flight; nothing was sent.
  Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleSnapshot {
  pub engagement: EngagementState,
  pub stats:      ContentStats,
  pub loading:    bool,
  pub phase:      Phase,
  pub last_error: Option<String>,
}

// ─── Slots ────────────────────────────────────────────────────────────────────

/// A toggleable flag together with its counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
  Like,
  Save,
  Share,
}

impl Slot {
  const ALL: [Slot; 3] = [Self::Like, Self::Save, Self::Share];

  fn index(self) -> usize {
    match self {
      Self::Like => 0,
      Self::Save => 1,
      Self::Share => 2,
    }
  }

  fn as_str(self) -> &'static str {
    match self {
      Self::Like => "like",
      Self::Save => "save",
      Self::Share => "share",
    }
  }
}

struct Inner {
  engagement: EngagementState,
  stats:      ContentStats,
  loading:    bool,
  phase:      Phase,
  last_error: Option<String>,
  /// Sequence stamp of the newest value applied to each slot.
  applied:    [u64; 3],
}

impl Inner {
  fn slot(&mut self, slot: Slot) -> (&mut bool, &mut i64) {
    match slot {
      Slot::Like => (&mut self.engagement.liked, &mut self.stats.like_count),
      Slot::Save => (&mut self.engagement.saved, &mut self.stats.save_count),
      Slot::Share => (&mut self.engagement.shared, &mut self.stats.share_count),
    }
  }

  /// Apply the local guess for `slot`, returning the values it replaced.
  fn optimistic(&mut self, slot: Slot) -> (bool, i64) {
    let (flag, count) = self.slot(slot);
    let before = (*flag, *count);
    match slot {
      Slot::Like | Slot::Save => {
        *flag = !*flag;
        *count = if *flag { *count + 1 } else { (*count - 1).max(0) };
      }
      Slot::Share => {
        if !*flag {
          *flag = true;
          *count += 1;
        }
      }
    }
    before
  }

  fn set(&mut self, slot: Slot, value: (bool, i64)) {
    let (flag, count) = self.slot(slot);
    *flag = value.0;
    *count = value.1.max(0);
  }
}

/// Resets a pending flag when the toggle that raised it finishes, however it
/// finishes.
struct PendingGuard<'a>(&'a AtomicBool);

impl<'a> PendingGuard<'a> {
  fn acquire(flag: &'a AtomicBool) -> Option<Self> {
    (!flag.swap(true, Ordering::AcqRel)).then_some(Self(flag))
  }
}

impl Drop for PendingGuard<'_> {
  fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

// ─── Handle ───────────────────────────────────────────────────────────────────

/// Engagement state for one content item, shared between the renderer and
/// the tasks running toggles.
pub struct EngagementHandle<A> {
  api:     Arc<A>,
  item:    ContentRef,
  state:   Mutex<Inner>,
  seq:     AtomicU64,
  pending: [AtomicBool; 3],
}

impl<A: EngagementApi> EngagementHandle<A> {
  pub fn new(api: Arc<A>, item: ContentRef) -> Self {
    Self {
      api,
      item,
      state: Mutex::new(Inner {
        engagement: EngagementState::default(),
        stats:      ContentStats::default(),
        loading:    true,
        phase:      Phase::Idle,
        last_error: None,
        applied:    [0; 3],
      }),
      seq: AtomicU64::new(0),
      pending: [AtomicBool::new(false), AtomicBool::new(false), AtomicBool::new(false)],
    }
  }

  pub fn item(&self) -> ContentRef { self.item }

  pub fn snapshot(&self) -> HandleSnapshot {
    let inner = self.lock();
    HandleSnapshot {
      engagement: inner.engagement,
      stats:      inner.stats,
      loading:    inner.loading,
      phase:      inner.phase,
      last_error: inner.last_error.clone(),
    }
  }

  /// Fetch `{engagement, stats}` in one request.
  ///
  /// Like, save and share are skipped while their toggle is in flight, and
  /// when a toggle reply newer than this request has already been applied.
  pub async fn load(&self) -> Result<()> {
    let seq = self.next_seq();
    self.lock().loading = true;

    let result = self.api.snapshot(self.item).await;

    let mut inner = self.lock();
    inner.loading = false;
    match result {
      Ok(snap) => {
        inner.stats.views = snap.stats.views;
        inner.stats.download_count = snap.stats.download_count;
        inner.stats.comment_count = snap.stats.comment_count;
        inner.engagement.viewed = snap.engagement.viewed;
        inner.engagement.downloaded = snap.engagement.downloaded;
        for slot in Slot::ALL {
          if inner.applied[slot.index()] > seq || self.pending[slot.index()].load(Ordering::Acquire)
          {
            debug!(item = %self.item, action = slot.as_str(), "reload left in-flight value alone");
            continue;
          }
          let value = match slot {
            Slot::Like => (snap.engagement.liked, snap.stats.like_count),
            Slot::Save => (snap.engagement.saved, snap.stats.save_count),
            Slot::Share => (snap.engagement.shared, snap.stats.share_count),
          };
          inner.set(slot, value);
          inner.applied[slot.index()] = seq;
        }
        inner.last_error = None;
        Ok(())
      }
      Err(err) => {
        inner.last_error = Some(format!("{err:#}"));
        Err(err)
      }
    }
  }

  pub async fn toggle_like(&self) -> ToggleOutcome {
    let request = async {
      let outcome = self.api.toggle_like(self.item).await?;
      Ok::<_, anyhow::Error>((outcome.liked, outcome.like_count))
    };
    self.run(Slot::Like, request).await
  }

  pub async fn toggle_save(&self) -> ToggleOutcome {
    let request = async {
      let outcome = self.api.toggle_save(self.item).await?;
      Ok::<_, anyhow::Error>((outcome.saved, outcome.save_count))
    };
    self.run(Slot::Save, request).await
  }

  /// Shares are one-shot: the flag only ever goes to `true`, and the count
  /// only moves on the first share.
  pub async fn record_share(&self) -> ToggleOutcome {
    let request = async {
      let outcome = self.api.record_share(self.item).await?;
      Ok::<_, anyhow::Error>((true, outcome.share_count))
    };
    self.run(Slot::Share, request).await
  }

  async fn run(
    &self,
    slot: Slot,
    request: impl Future<Output = Result<(bool, i64)>>,
  ) -> ToggleOutcome {
    let Some(_pending) = PendingGuard::acquire(&self.pending[slot.index()]) else {
      debug!(item = %self.item, action = slot.as_str(), "request in flight, ignoring");
      return ToggleOutcome::Ignored;
    };

    let before = {
      let mut inner = self.lock();
      inner.phase = Phase::Pending;
      inner.last_error = None;
      inner.optimistic(slot)
    };

    let result = request.await;

    let mut inner = self.lock();
    match result {
      Ok(value) => {
        inner.set(slot, value);
        // Any reload issued before this point may predate the commit.
        inner.applied[slot.index()] = self.next_seq();
        inner.phase = self.settle(slot, Phase::Confirmed);
        ToggleOutcome::Confirmed
      }
      Err(err) => {
        warn!(item = %self.item, action = slot.as_str(), "rolling back: {err:#}");
        inner.set(slot, before);
        inner.last_error = Some(format!("{err:#}"));
        inner.phase = self.settle(slot, Phase::RolledBack);
        ToggleOutcome::RolledBack
      }
    }
  }

  /// The phase to show once `slot` finishes: still pending while any other
  /// flag has a request in flight.
  fn settle(&self, slot: Slot, done: Phase) -> Phase {
    let others_pending = Slot::ALL
      .into_iter()
      .filter(|s| *s != slot)
      .any(|s| self.pending[s.index()].load(Ordering::Acquire));
    if others_pending { Phase::Pending } else { done }
  }

  fn next_seq(&self) -> u64 { self.seq.fetch_add(1, Ordering::AcqRel) + 1 }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicUsize;

  use anyhow::anyhow;
  use clubhub_core::content::ContentKind;
  use tokio::sync::Notify;
  use uuid::Uuid;

  use super::*;

  /// In-process server stand-in. By default mutations commit before the
  /// optional gate, modelling a slow response to an already-applied change;
  /// with `late_commit` they commit only once the gate opens. A snapshot
  /// gate holds snapshot replies after the state has been read.
  #[derive(Default)]
  struct FakeApi {
    server:        Mutex<EngagementSnapshot>,
    gate:          Option<Arc<Notify>>,
    late_commit:   bool,
    snapshot_gate: Option<Arc<Notify>>,
    fail:          AtomicBool,
    calls:         AtomicUsize,
    snapshots:     AtomicUsize,
  }

  impl FakeApi {
    fn gated() -> (Arc<Self>, Arc<Notify>) {
      let gate = Arc::new(Notify::new());
      (Arc::new(Self { gate: Some(gate.clone()), ..Default::default() }), gate)
    }

    fn with(snapshot: EngagementSnapshot) -> Arc<Self> {
      Arc::new(Self { server: Mutex::new(snapshot), ..Default::default() })
    }

    fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    async fn wait_gate(&self) {
      if let Some(gate) = &self.gate {
        gate.notified().await;
      }
    }

    async fn mutate<T>(&self, f: impl FnOnce(&mut EngagementSnapshot) -> T) -> Result<T> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.late_commit {
        self.wait_gate().await;
      }
      let out = if self.fail.load(Ordering::SeqCst) {
        Err(anyhow!("POST → 503: storage unavailable"))
      } else {
        Ok(f(&mut self.server.lock().unwrap()))
      };
      if !self.late_commit {
        self.wait_gate().await;
      }
      out
    }
  }

  impl EngagementApi for FakeApi {
    async fn snapshot(&self, _item: ContentRef) -> Result<EngagementSnapshot> {
      let snap = *self.server.lock().unwrap();
      self.snapshots.fetch_add(1, Ordering::SeqCst);
      if let Some(gate) = &self.snapshot_gate {
        gate.notified().await;
      }
      Ok(snap)
    }

    async fn toggle_like(&self, _item: ContentRef) -> Result<LikeOutcome> {
      self
        .mutate(|s| {
          s.engagement.liked = !s.engagement.liked;
          s.stats.like_count += if s.engagement.liked { 1 } else { -1 };
          LikeOutcome { liked: s.engagement.liked, like_count: s.stats.like_count }
        })
        .await
    }

    async fn toggle_save(&self, _item: ContentRef) -> Result<SaveOutcome> {
      self
        .mutate(|s| {
          s.engagement.saved = !s.engagement.saved;
          s.stats.save_count += if s.engagement.saved { 1 } else { -1 };
          SaveOutcome { saved: s.engagement.saved, save_count: s.stats.save_count }
        })
        .await
    }

    async fn record_share(&self, _item: ContentRef) -> Result<ShareOutcome> {
      self
        .mutate(|s| {
          let new_share = !s.engagement.shared;
          if new_share {
            s.engagement.shared = true;
            s.stats.share_count += 1;
          }
          ShareOutcome { share_count: s.stats.share_count, new_share }
        })
        .await
    }
  }

  fn item() -> ContentRef { ContentRef::new(ContentKind::News, Uuid::new_v4()) }

  async fn wait_for_calls(api: &FakeApi, n: usize) {
    while api.calls() < n {
      tokio::task::yield_now().await;
    }
  }

  #[tokio::test]
  async fn load_populates_state() {
    let mut server = EngagementSnapshot::default();
    server.engagement.saved = true;
    server.stats.save_count = 4;
    server.stats.comment_count = 2;
    let handle = EngagementHandle::new(FakeApi::with(server), item());

    assert!(handle.snapshot().loading);
    handle.load().await.unwrap();

    let snap = handle.snapshot();
    assert!(!snap.loading);
    assert!(snap.engagement.saved);
    assert_eq!(snap.stats.save_count, 4);
    assert_eq!(snap.stats.comment_count, 2);
    assert_eq!(snap.phase, Phase::Idle);
  }

  #[tokio::test]
  async fn like_is_optimistic_then_confirmed() {
    let (api, gate) = FakeApi::gated();
    let handle = Arc::new(EngagementHandle::new(api.clone(), item()));
    handle.load().await.unwrap();

    let task = tokio::spawn({
      let handle = handle.clone();
      async move { handle.toggle_like().await }
    });
    wait_for_calls(&api, 1).await;

    let during = handle.snapshot();
    assert!(during.engagement.liked);
    assert_eq!(during.stats.like_count, 1);
    assert_eq!(during.phase, Phase::Pending);

    gate.notify_one();
    assert_eq!(task.await.unwrap(), ToggleOutcome::Confirmed);

    let after = handle.snapshot();
    assert!(after.engagement.liked);
    assert_eq!(after.stats.like_count, 1);
    assert_eq!(after.phase, Phase::Confirmed);
  }

  #[tokio::test]
  async fn double_click_on_save_sends_one_request() {
    let (api, gate) = FakeApi::gated();
    let handle = Arc::new(EngagementHandle::new(api.clone(), item()));
    handle.load().await.unwrap();

    let first = tokio::spawn({
      let handle = handle.clone();
      async move { handle.toggle_save().await }
    });
    wait_for_calls(&api, 1).await;

    assert_eq!(handle.toggle_save().await, ToggleOutcome::Ignored);

    gate.notify_one();
    assert_eq!(first.await.unwrap(), ToggleOutcome::Confirmed);

    assert_eq!(api.calls(), 1);
    let snap = handle.snapshot();
    assert!(snap.engagement.saved);
    assert_eq!(snap.stats.save_count, 1);
  }

  #[tokio::test]
  async fn failure_rolls_back_to_pre_click_state() {
    let mut server = EngagementSnapshot::default();
    server.stats.like_count = 7;
    let api = FakeApi::with(server);
    let handle = EngagementHandle::new(api.clone(), item());
    handle.load().await.unwrap();

    api.fail.store(true, Ordering::SeqCst);
    assert_eq!(handle.toggle_like().await, ToggleOutcome::RolledBack);

    let snap = handle.snapshot();
    assert!(!snap.engagement.liked);
    assert_eq!(snap.stats.like_count, 7);
    assert_eq!(snap.phase, Phase::RolledBack);
    assert!(snap.last_error.unwrap().contains("503"));

    // The next success clears the error.
    api.fail.store(false, Ordering::SeqCst);
    assert_eq!(handle.toggle_like().await, ToggleOutcome::Confirmed);
    let snap = handle.snapshot();
    assert_eq!(snap.stats.like_count, 8);
    assert!(snap.last_error.is_none());
  }

  #[tokio::test]
  async fn reload_does_not_clobber_a_pending_toggle() {
    let gate = Arc::new(Notify::new());
    let api = Arc::new(FakeApi {
      gate: Some(gate.clone()),
      late_commit: true,
      ..Default::default()
    });
    let handle = Arc::new(EngagementHandle::new(api.clone(), item()));
    handle.load().await.unwrap();

    let task = tokio::spawn({
      let handle = handle.clone();
      async move { handle.toggle_like().await }
    });
    wait_for_calls(&api, 1).await;

    // The server has not committed yet, so the reload still says unliked.
    handle.load().await.unwrap();
    let during = handle.snapshot();
    assert!(during.engagement.liked);
    assert_eq!(during.stats.like_count, 1);
    assert_eq!(during.phase, Phase::Pending);

    gate.notify_one();
    assert_eq!(task.await.unwrap(), ToggleOutcome::Confirmed);
    let after = handle.snapshot();
    assert!(after.engagement.liked);
    assert_eq!(after.stats.like_count, 1);

    handle.load().await.unwrap();
    assert_eq!(handle.snapshot().engagement, after.engagement);
    assert_eq!(handle.snapshot().stats.like_count, 1);
  }

  #[tokio::test]
  async fn reload_reply_older_than_a_toggle_is_ignored_for_that_flag() {
    let mut server = EngagementSnapshot::default();
    server.stats.like_count = 3;
    server.stats.comment_count = 1;
    let snapshot_gate = Arc::new(Notify::new());
    let api = Arc::new(FakeApi {
      server: Mutex::new(server),
      snapshot_gate: Some(snapshot_gate.clone()),
      ..Default::default()
    });
    let handle = Arc::new(EngagementHandle::new(api.clone(), item()));

    // The server reads its state for this reload, then the reply stalls.
    let reload = tokio::spawn({
      let handle = handle.clone();
      async move { handle.load().await }
    });
    while api.snapshots.load(Ordering::SeqCst) < 1 {
      tokio::task::yield_now().await;
    }

    assert_eq!(handle.toggle_like().await, ToggleOutcome::Confirmed);
    assert_eq!(handle.snapshot().stats.like_count, 4);

    snapshot_gate.notify_one();
    reload.await.unwrap().unwrap();

    let snap = handle.snapshot();
    assert!(snap.engagement.liked);
    assert_eq!(snap.stats.like_count, 4);
    assert_eq!(snap.stats.comment_count, 1);
    assert!(!snap.loading);
  }

  #[tokio::test]
  async fn optimistic_unlike_never_goes_negative() {
    let mut server = EngagementSnapshot::default();
    server.engagement.liked = true;
    server.stats.like_count = 0;
    let api = FakeApi::with(server);
    let handle = EngagementHandle::new(api.clone(), item());
    handle.load().await.unwrap();

    api.fail.store(true, Ordering::SeqCst);
    let before = handle.snapshot();
    handle.toggle_like().await;
    assert_eq!(handle.snapshot().stats.like_count, before.stats.like_count);
    assert!(handle.snapshot().stats.like_count >= 0);

    let mut inner = handle.lock();
    inner.optimistic(Slot::Like);
    assert!(!inner.engagement.liked);
    assert_eq!(inner.stats.like_count, 0);
  }

  #[tokio::test]
  async fn share_counts_once() {
    let api = FakeApi::with(EngagementSnapshot::default());
    let handle = EngagementHandle::new(api.clone(), item());
    handle.load().await.unwrap();

    assert_eq!(handle.record_share().await, ToggleOutcome::Confirmed);
    assert_eq!(handle.record_share().await, ToggleOutcome::Confirmed);

    let snap = handle.snapshot();
    assert!(snap.engagement.shared);
    assert_eq!(snap.stats.share_count, 1);
    assert_eq!(api.calls(), 2);
  }

  #[tokio::test]
  async fn independent_flags_can_be_in_flight_together() {
    let (api, gate) = FakeApi::gated();
    let handle = Arc::new(EngagementHandle::new(api.clone(), item()));
    handle.load().await.unwrap();

    let like = tokio::spawn({
      let handle = handle.clone();
      async move { handle.toggle_like().await }
    });
    wait_for_calls(&api, 1).await;
    let save = tokio::spawn({
      let handle = handle.clone();
      async move { handle.toggle_save().await }
    });
    wait_for_calls(&api, 2).await;

    gate.notify_one();
    gate.notify_one();
    assert_eq!(like.await.unwrap(), ToggleOutcome::Confirmed);
    assert_eq!(save.await.unwrap(), ToggleOutcome::Confirmed);

    let snap = handle.snapshot();
    assert!(snap.engagement.liked && snap.engagement.saved);
    assert_eq!(snap.phase, Phase::Confirmed);
  }
}
