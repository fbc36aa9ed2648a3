//! clubhub server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `CLUBHUB_*` environment variables, opens the SQLite store, and either
//! serves the JSON API or runs a maintenance task against the store.
//!
//! ```text
//! clubhub-server serve
//! clubhub-server reconcile --kind news
//! clubhub-server purge-user <user-id>
//! clubhub-server issue-token <user-id> --name "Sam"
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use clubhub_core::{EngagementService, content::{ContentKind, UserId}};
use clubhub_server::{ServerConfig, auth::JwtKeys};
use clubhub_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "clubhub engagement server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Recompute every counter from the engagement table.
  Reconcile {
    /// Restrict to one content type (e.g. `news`, `SocialPost`).
    #[arg(long)]
    kind: Option<String>,
  },
  /// Delete a user's engagement records and withdraw them from counters.
  PurgeUser { user_id: String },
  /// Print a bearer token for a user.
  IssueToken {
    user_id: String,
    #[arg(long)]
    email:   Option<String>,
    #[arg(long)]
    name:    Option<String>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CLUBHUB"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let keys = JwtKeys::new(&server_cfg.jwt_secret, server_cfg.token_ttl_secs)
    .context("invalid jwt configuration")?;

  let command = cli.command.unwrap_or(Command::Serve);

  // Token minting needs no store.
  if let Command::IssueToken { user_id, email, name } = &command {
    println!("{}", keys.issue(user_id, email.clone(), name.clone())?);
    return Ok(());
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let service = EngagementService::new(Arc::new(store));

  match command {
    Command::Serve => serve(service, &server_cfg, Arc::new(keys)).await,
    Command::Reconcile { kind } => {
      let kind = kind.as_deref().map(ContentKind::parse).transpose()?;
      for report in service.reconcile(kind).await? {
        info!(
          kind = %report.kind,
          scanned = report.rows_scanned,
          corrected = report.rows_corrected,
          "reconciled counters"
        );
      }
      Ok(())
    }
    Command::PurgeUser { user_id } => {
      let removed = service.purge_user(&UserId::from(user_id.as_str())).await?;
      info!(user = %user_id, removed, "purged engagement records");
      Ok(())
    }
    // Handled before the store was opened.
    Command::IssueToken { .. } => Ok(()),
  }
}

async fn serve(
  service: EngagementService<SqliteStore>,
  config: &ServerConfig,
  keys: Arc<JwtKeys>,
) -> anyhow::Result<()> {
  let app = clubhub_server::router(service, config, keys);
  let address = format!("{}:{}", config.host, config.port);

  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
