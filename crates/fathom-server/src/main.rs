//! fathom-server binary.
//!
//! Serves either the observation service or the account service, configured
//! from an optional TOML file (`--config`) and `FATHOM_*` environment
//! variables. The two services are separate processes sharing a token secret
//! and a service key.
//!
//! # Bootstrapping an admin
//!
//! Registration always creates a `USER`. Promote the first administrator
//! directly on the account store:
//!
//! ```text
//! fathom-server grant --email root@example.com --role ADMIN
//! ```

mod settings;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use fathom_api::{AccountState, HttpLedger, ObservationState, TokenKey};
use fathom_core::{ledger::LedgerStore, subject::Role};
use fathom_store_sqlite::{SqliteLedgerStore, SqliteObservationStore};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Fathom observation and account services")]
struct Cli {
  /// Path to a TOML configuration file.
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve one of the two services.
  Serve {
    #[arg(value_enum)]
    service: Service,
  },
  /// Set an account's role directly on the account store.
  Grant {
    #[arg(long)]
    email: String,
    #[arg(long)]
    role:  Role,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum Service {
  Observation,
  Account,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = settings::load(cli.config.as_deref()).context("failed to load configuration")?;

  match cli.command {
    Command::Serve { service: Service::Observation } => serve_observation(cfg).await,
    Command::Serve { service: Service::Account } => serve_account(cfg).await,
    Command::Grant { email, role } => grant(cfg, &email, role).await,
  }
}

async fn serve_observation(cfg: ServerConfig) -> anyhow::Result<()> {
  cfg.check_secrets().map_err(anyhow::Error::msg)?;

  let store_path = prepare_store_path(&cfg.observation_store_path)?;
  let store = SqliteObservationStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let ledger = HttpLedger::new(
    cfg.ledger_url.clone(),
    cfg.service_key.clone(),
    Duration::from_millis(cfg.ledger_timeout_ms),
  )
  .context("failed to build ledger client")?;

  let state = ObservationState {
    store:  Arc::new(store),
    ledger: Arc::new(ledger),
    tokens: token_key(&cfg)?,
  };

  tracing::info!(ledger_url = %cfg.ledger_url, "observation service configured");
  let app = fathom_api::observation_router(state).layer(TraceLayer::new_for_http());
  serve(app, &cfg.host, cfg.observation_port).await
}

async fn serve_account(cfg: ServerConfig) -> anyhow::Result<()> {
  cfg.check_secrets().map_err(anyhow::Error::msg)?;

  let store_path = prepare_store_path(&cfg.account_store_path)?;
  let ledger = SqliteLedgerStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let state = AccountState {
    ledger:      Arc::new(ledger),
    tokens:      token_key(&cfg)?,
    service_key: Arc::from(cfg.service_key.as_str()),
  };

  let app = fathom_api::account_router(state).layer(TraceLayer::new_for_http());
  serve(app, &cfg.host, cfg.account_port).await
}

async fn grant(cfg: ServerConfig, email: &str, role: Role) -> anyhow::Result<()> {
  let store_path = prepare_store_path(&cfg.account_store_path)?;
  let ledger = SqliteLedgerStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let account = ledger
    .find_by_email(email)
    .await
    .context("failed to look up account")?
    .with_context(|| format!("no account registered with email {email}"))?;

  ledger
    .set_role(account.id, role)
    .await
    .context("failed to set role")?
    .with_context(|| format!("account {} disappeared", account.id))?;

  tracing::info!(subject_id = %account.id, %role, "role granted");
  println!("{} ({}) is now {role}", account.username, account.id);
  Ok(())
}

async fn serve(app: axum::Router, host: &str, port: u16) -> anyhow::Result<()> {
  let address = format!("{host}:{port}");

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

fn token_key(cfg: &ServerConfig) -> anyhow::Result<TokenKey> {
  TokenKey::new(
    cfg.token_secret.as_bytes(),
    chrono::Duration::seconds(cfg.token_ttl_secs),
  )
  .context("invalid token configuration")
}

/// Expand `~` and make sure the parent directory exists.
fn prepare_store_path(path: &Path) -> anyhow::Result<PathBuf> {
  let path = expand_tilde(path);
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create directory {parent:?}"))?;
  }
  Ok(path)
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
