//! `clubhub`: command-line and terminal client for the clubhub API.
//!
//! # Usage
//!
//! ```
//! clubhub --url http://localhost:8080 --token $TOKEN open news 6f1c…
//! clubhub like social 6f1c…
//! clubhub saved --kind events
//! clubhub comments news 6f1c… --sort likes
//! ```

mod app;
mod client;
mod engagement;
mod ui;

use std::{io, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use clubhub_core::{
  comment::{Comment, CommentSort},
  content::{ContentKind, ContentRef},
  engagement::SavedItem,
};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use engagement::{EngagementHandle, ToggleOutcome};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "clubhub", about = "Client for the clubhub engagement API")]
struct Args {
  /// Path to a TOML config file (url, token).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the clubhub server (default: http://localhost:8080).
  #[arg(long, env = "CLUBHUB_URL")]
  url: Option<String>,

  /// Bearer token, as printed by `clubhub-server issue-token`.
  #[arg(long, env = "CLUBHUB_TOKEN")]
  token: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Interactive view of one item with live interaction buttons.
  Open {
    #[arg(value_parser = parse_kind)]
    kind: ContentKind,
    id:   Uuid,
  },
  /// Print the button row for one item.
  Show {
    #[arg(value_parser = parse_kind)]
    kind: ContentKind,
    id:   Uuid,
  },
  /// Toggle your like.
  Like {
    #[arg(value_parser = parse_kind)]
    kind: ContentKind,
    id:   Uuid,
  },
  /// Toggle your save.
  Save {
    #[arg(value_parser = parse_kind)]
    kind: ContentKind,
    id:   Uuid,
  },
  /// Record a share.
  Share {
    #[arg(value_parser = parse_kind)]
    kind: ContentKind,
    id:   Uuid,
  },
  /// Record a view of a resource.
  View { id: Uuid },
  /// Record a download of a resource.
  Download { id: Uuid },
  /// List your saved content, newest first.
  Saved {
    #[arg(long, value_parser = parse_kind)]
    kind:  Option<ContentKind>,
    #[arg(long, default_value_t = 50)]
    limit: u32,
  },
  /// List comments on an item.
  Comments {
    #[arg(value_parser = parse_kind)]
    kind:   ContentKind,
    id:     Uuid,
    #[arg(long, value_parser = parse_sort, default_value = "newest")]
    sort:   CommentSort,
    #[arg(long, default_value_t = 1)]
    page:   u32,
    #[arg(long, default_value_t = 20)]
    limit:  u32,
    /// List replies to this comment instead of top-level comments.
    #[arg(long)]
    parent: Option<Uuid>,
  },
  /// Post a comment.
  Comment {
    #[arg(value_parser = parse_kind)]
    kind:   ContentKind,
    id:     Uuid,
    text:   String,
    #[arg(long)]
    parent: Option<Uuid>,
  },
  /// Edit one of your comments.
  EditComment { id: Uuid, text: String },
  /// Delete one of your comments.
  DeleteComment { id: Uuid },
}

fn parse_kind(s: &str) -> Result<ContentKind, String> {
  s.parse().map_err(|_| format!("unknown content type: {s}"))
}

fn parse_sort(s: &str) -> Result<CommentSort, String> {
  match s.to_ascii_lowercase().as_str() {
    "newest" => Ok(CommentSort::Newest),
    "likes" => Ok(CommentSort::Likes),
    _ => Err(format!("unknown sort: {s} (expected newest or likes)")),
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:   String,
  #[serde(default)]
  token: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags and env override the config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: args
      .url
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    token:    args.token.or_else(|| (!file_cfg.token.is_empty()).then(|| file_cfg.token.clone())),
  };
  let client = Arc::new(ApiClient::new(api_config)?);

  // Logging would tear the alternate screen, so only line commands get it.
  if !matches!(args.command, Command::Open { .. }) {
    tracing_subscriber::fmt()
      .with_writer(io::stderr)
      .with_env_filter(
        EnvFilter::builder()
          .with_default_directive(LevelFilter::WARN.into())
          .from_env_lossy(),
      )
      .init();
  }

  match args.command {
    Command::Open { kind, id } => run_tui(client, ContentRef::new(kind, id)).await,
    Command::Show { kind, id } => {
      let item = ContentRef::new(kind, id);
      let snap = client.snapshot(item).await?;
      println!("{}", ui::buttons::button_text(&snap.engagement, &snap.stats));
      Ok(())
    }
    Command::Like { kind, id } => {
      toggle(client, ContentRef::new(kind, id), |h| async move { h.toggle_like().await }).await
    }
    Command::Save { kind, id } => {
      toggle(client, ContentRef::new(kind, id), |h| async move { h.toggle_save().await }).await
    }
    Command::Share { kind, id } => {
      toggle(client, ContentRef::new(kind, id), |h| async move { h.record_share().await }).await
    }
    Command::View { id } => {
      let outcome = client.record_view(id).await?;
      println!("views: {}{}", outcome.views, if outcome.new_view { " (new)" } else { "" });
      Ok(())
    }
    Command::Download { id } => {
      let outcome = client.record_download(id).await?;
      println!(
        "downloads: {}{}",
        outcome.download_count,
        if outcome.new_download { " (new)" } else { "" }
      );
      Ok(())
    }
    Command::Saved { kind: Some(kind), limit } => {
      for saved in client.saved_of_kind(kind, limit).await? {
        print_saved(&saved);
      }
      Ok(())
    }
    Command::Saved { kind: None, limit } => {
      let saved = client.saved(limit).await?;
      if saved.is_empty() {
        println!("nothing saved yet");
      }
      for kind in ContentKind::ALL {
        let group = saved.group(kind);
        if group.is_empty() {
          continue;
        }
        println!("{}:", kind.group_key());
        for item in group {
          print_saved(item);
        }
      }
      Ok(())
    }
    Command::Comments { kind, id, sort, page, limit, parent } => {
      let page = client.comments(ContentRef::new(kind, id), sort, page, limit, parent).await?;
      for comment in &page.comments {
        print_comment(comment);
      }
      let p = page.pagination;
      println!("page {} · {} total{}", p.page, p.total, if p.has_more { " · more" } else { "" });
      Ok(())
    }
    Command::Comment { kind, id, text, parent } => {
      let comment = client.add_comment(ContentRef::new(kind, id), &text, parent).await?;
      print_comment(&comment);
      Ok(())
    }
    Command::EditComment { id, text } => {
      let comment = client.edit_comment(id, &text).await?;
      print_comment(&comment);
      Ok(())
    }
    Command::DeleteComment { id } => {
      client.delete_comment(id).await?;
      println!("deleted {id}");
      Ok(())
    }
  }
}

/// Run one toggle through an [`EngagementHandle`] and print the resulting
/// button row.
async fn toggle<F, Fut>(client: Arc<ApiClient>, item: ContentRef, action: F) -> Result<()>
where
  F: FnOnce(Arc<EngagementHandle<ApiClient>>) -> Fut,
  Fut: Future<Output = ToggleOutcome>,
{
  let handle = Arc::new(EngagementHandle::new(client, item));
  handle.load().await?;
  let outcome = action(handle.clone()).await;

  let snap = handle.snapshot();
  if outcome == ToggleOutcome::RolledBack {
    anyhow::bail!(snap.last_error.unwrap_or_else(|| "request failed".into()));
  }
  println!("{}", ui::buttons::button_text(&snap.engagement, &snap.stats));
  Ok(())
}

fn print_saved(saved: &SavedItem) {
  let when = saved.saved_at.map(|t| t.format("%Y-%m-%d").to_string()).unwrap_or_default();
  println!(
    "  {when:10}  {}  {}",
    saved.item.content_id,
    saved.item.title.as_deref().unwrap_or(&saved.item.body)
  );
}

fn print_comment(comment: &Comment) {
  println!(
    "{}  {}  {} ♥ {}\n    {}",
    comment.comment_id,
    comment.author_id,
    comment.created_at.format("%Y-%m-%d %H:%M"),
    ui::buttons::format_count(comment.counters.like_count),
    comment.content,
  );
}

// ─── TUI ──────────────────────────────────────────────────────────────────────

async fn run_tui(client: Arc<ApiClient>, item: ContentRef) -> Result<()> {
  let handle = Arc::new(EngagementHandle::new(client.clone(), item));
  let mut app = App::new(client, handle);

  // Fail before touching the terminal if the item can't be loaded.
  app.reload().await?;

  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event {
      if !app.handle_key(key).await? {
        break;
      }
    }
  }

  Ok(())
}
