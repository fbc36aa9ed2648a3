//! Application state and key dispatch for the single-item view.

use std::sync::Arc;

use clubhub_core::{
  comment::{Comment, CommentQuery},
  content::ContentItem,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{client::ApiClient, engagement::EngagementHandle};

/// How many top-level comments the view shows.
const COMMENT_PREVIEW: u32 = 10;

/// Top-level application state.
pub struct App {
  /// The item being viewed, once fetched.
  pub content: Option<ContentItem>,

  /// Newest top-level comments.
  pub comments: Vec<Comment>,

  /// Engagement state; toggles run on spawned tasks against this.
  pub handle: Arc<EngagementHandle<ApiClient>>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Shared HTTP client.
  pub client: Arc<ApiClient>,
}

impl App {
  pub fn new(client: Arc<ApiClient>, handle: Arc<EngagementHandle<ApiClient>>) -> Self {
    Self {
      content: None,
      comments: Vec::new(),
      handle,
      status_msg: String::new(),
      client,
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch the item, its engagement snapshot and a page of comments.
  pub async fn reload(&mut self) -> anyhow::Result<()> {
    self.status_msg = "Loading…".into();
    let item = self.handle.item();

    self.content = Some(self.client.content(item).await?);
    self.handle.load().await?;

    let query = CommentQuery { limit: COMMENT_PREVIEW, ..CommentQuery::default() };
    match self.client.comments(item, query.sort, query.page, query.limit, None).await {
      Ok(page) => {
        self.comments = page.comments;
        self.status_msg = String::new();
      }
      Err(e) => {
        self.status_msg = format!("Error loading comments: {e}");
      }
    }
    Ok(())
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Returns `Ok(false)` when the app should quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    match key.code {
      KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
      KeyCode::Char('l') => self.spawn_toggle(Action::Like),
      KeyCode::Char('s') => self.spawn_toggle(Action::Save),
      KeyCode::Char('h') => self.spawn_toggle(Action::Share),
      KeyCode::Char('r') => {
        if let Err(e) = self.reload().await {
          self.status_msg = format!("Error: {e:#}");
        }
      }
      _ => {}
    }
    Ok(true)
  }

  /// Run a toggle on its own task so the next frame renders the optimistic
  /// state while the request is in flight.
  fn spawn_toggle(&mut self, action: Action) {
    let handle = self.handle.clone();
    tokio::spawn(async move {
      match action {
        Action::Like => handle.toggle_like().await,
        Action::Save => handle.toggle_save().await,
        Action::Share => handle.record_share().await,
      }
    });
    self.status_msg = String::new();
  }

  /// Status bar text derived from the handle, falling back to `status_msg`.
  pub fn status_line(&self) -> String {
    let snap = self.handle.snapshot();
    match snap.last_error {
      Some(err) => format!("Error: {err}"),
      None => self.status_msg.clone(),
    }
  }
}

#[derive(Debug, Clone, Copy)]
enum Action {
  Like,
  Save,
  Share,
}
