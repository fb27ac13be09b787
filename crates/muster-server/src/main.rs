//! muster-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, and serves the Muster HTTP API.
//!
//! # Bootstrapping
//!
//! ```text
//! muster-server --generate-secret          # value for `session_secret`
//! muster-server --issue-token admin@example.com
//! muster-server --promote admin@example.com
//! ```
//!
//! `--issue-token` signs the user in; `--promote` only accepts a user that
//! already exists.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use muster_api::{AppState, SessionKey};
use muster_core::{
  invalidate::TracingInvalidator,
  roles::RoleAssignment,
  store::EventStore,
  user::{SignIn, User},
};
use muster_store_sqlite::SqliteStore;
use rand_core::{OsRng, RngCore as _};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Muster event-registration server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print a fresh random session secret (hex) and exit.
  #[arg(long)]
  generate_secret: bool,

  /// Sign in the user with this email, print a session token, and exit.
  #[arg(long, value_name = "EMAIL")]
  issue_token: Option<String>,

  /// Grant the admin role to the existing user with this email and exit.
  #[arg(long, value_name = "EMAIL")]
  promote: Option<String>,
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

  if cli.generate_secret {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    println!("{}", hex::encode(secret));
    return Ok(());
  }

  let server_cfg = ServerConfig::load(&cli.config)?;
  let sessions = SessionKey::from_hex(&server_cfg.session_secret)
    .context("invalid session_secret")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(email) = cli.promote {
    let promoted = promote(&store, &email).await?;
    println!("{} is now {}", promoted.email, promoted.role.as_str());
    return Ok(());
  }

  if let Some(email) = cli.issue_token {
    let user = store.sign_in(SignIn::email(email)).await?;
    let ttl = chrono::Duration::hours(server_cfg.session_ttl_hours);
    println!("{}", sessions.issue(&user.principal(), ttl)?);
    return Ok(());
  }

  let state = AppState {
    store:       Arc::new(store),
    sessions:    Arc::new(sessions),
    invalidator: Arc::new(TracingInvalidator),
  };

  let app = muster_api::router(state);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Grant the admin role to the user registered under `email`.
async fn promote(store: &SqliteStore, email: &str) -> anyhow::Result<User> {
  let user = store
    .find_user_by_email(email)
    .await?
    .with_context(|| format!("no user with email {email}; sign in first"))?;
  RoleAssignment::new(store, &TracingInvalidator)
    .make_admin(user.id)
    .await
    .context("role update failed; see log")
}
