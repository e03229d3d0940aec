//! Application setup and runtime.

use crate::{db, error::Result, smtp, store, sweep::SweepConfig};
use chrono::Utc;
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{error, info, warn};

/// Shared application state. Cloned into every SMTP session task.
#[derive(Clone)]
pub struct AppState {
  pub db: SqlitePool,
  pub http: reqwest::Client,
}

/// Start the SMTP listener and drive the sweeper with configured environment.
pub async fn run() -> Result<()> {
  crate::util::init_tracing();

  let db_url =
    std::env::var("DRIFTMAIL_DATABASE").unwrap_or_else(|_| "sqlite://driftmail.db".to_string());
  let db_url = db::ensure_sqlite_path(&db_url);
  let pool = db::connect(&db_url).await?;
  db::run_migrations(&pool).await?;

  let http = reqwest::Client::builder()
    .timeout(Duration::from_secs(10))
    .build()?;
  let state = AppState {
    db: pool.clone(),
    http,
  };

  let sweep_config = load_sweep_config(&pool).await;
  let sweep_interval = std::env::var("DRIFTMAIL_SWEEP_INTERVAL_SECS")
    .ok()
    .and_then(|v| v.parse().ok())
    .unwrap_or(300);
  info!(
    "sweep every {}s, batch {}, retain mailboxes: {}",
    sweep_interval, sweep_config.batch_size, sweep_config.retain_expired_mailboxes
  );

  // Deliveries arrive in background session tasks while the sweeper ticks
  // here; both sides share the pool with no further coordination.
  let smtp_state = state.clone();
  tokio::spawn(async move {
    if let Err(e) = smtp::start_smtp(smtp_state).await {
      error!("smtp listener error: {e}");
    }
  });

  let mut tick = tokio::time::interval(Duration::from_secs(sweep_interval));
  loop {
    tick.tick().await;
    // A failed cycle is retried on the next tick; both delete steps are
    // idempotent against whatever the failed run left behind.
    if let Err(e) = crate::sweep::run_sweep(&state.db, &sweep_config, Utc::now()).await {
      error!("sweep failed: {e}");
    }
  }
}

/// Build the sweep policy from environment defaults, then let operator
/// settings stored through the settings API override them.
async fn load_sweep_config(pool: &SqlitePool) -> SweepConfig {
  let mut config = SweepConfig::default();
  if let Ok(v) = std::env::var("DRIFTMAIL_SWEEP_BATCH") {
    if let Ok(n) = v.parse() {
      config.batch_size = n;
    }
  }
  if let Ok(v) = std::env::var("DRIFTMAIL_RETAIN_EXPIRED_MAILBOXES") {
    config.retain_expired_mailboxes = parse_flag(&v);
  }

  match store::read_setting(pool, "sweep.batch_size").await {
    Ok(Some(v)) => {
      if let Ok(n) = v.parse() {
        config.batch_size = n;
      }
    }
    Ok(None) => {}
    Err(e) => warn!("failed to read sweep.batch_size setting: {e}"),
  }
  match store::read_setting(pool, "sweep.retain_expired_mailboxes").await {
    Ok(Some(v)) => config.retain_expired_mailboxes = parse_flag(&v),
    Ok(None) => {}
    Err(e) => warn!("failed to read sweep.retain_expired_mailboxes setting: {e}"),
  }
  config
}

fn parse_flag(v: &str) -> bool {
  v == "1" || v.eq_ignore_ascii_case("true")
}
