//! Database helpers: pool construction, migrations, path handling.

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::path::Path;
use std::str::FromStr;

/// Open a pool with foreign keys enforced on every connection.
///
/// The FK constraint is what turns the sweep-vs-ingest race into a plain
/// insert error instead of an orphaned message row, so it must be on for
/// the whole pool, not set per statement.
pub async fn connect(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    // A :memory: database exists per connection; more than one connection in
    // the pool would each see an empty schema.
    let max_connections = if db_url.contains(":memory:") { 1 } else { 5 };
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Run SQLite migrations to create tables if absent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // COLLATE NOCASE on the address column makes the unique index itself
    // case-insensitive, so recipient lookup never depends on callers
    // lowercasing the query side.
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS mailboxes (
            id TEXT PRIMARY KEY,
            address TEXT NOT NULL UNIQUE COLLATE NOCASE,
            user_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            mailbox_id TEXT NOT NULL REFERENCES mailboxes(id),
            from_addr TEXT NOT NULL,
            subject TEXT NOT NULL,
            text_body TEXT NOT NULL,
            html_body TEXT NOT NULL,
            direction TEXT NOT NULL,
            received_at TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS webhooks (
            user_id TEXT PRIMARY KEY,
            url TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_mailbox ON messages(mailbox_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_mailboxes_expires ON mailboxes(expires_at)")
        .execute(pool)
        .await?;
    Ok(())
}

/// Ensure the parent folder exists for a file-backed sqlx SQLite URL.
pub fn ensure_sqlite_path(db_url: &str) -> String {
    if let Some(path_part) = db_url.strip_prefix("sqlite://") {
        if path_part != ":memory:" && !path_part.is_empty() {
            let path_only = path_part.split('?').next().unwrap_or(path_part);
            if let Some(parent) = Path::new(path_only).parent() {
                if !parent.as_os_str().is_empty() {
                    let _ = std::fs::create_dir_all(parent);
                }
            }
        }
    }
    db_url.to_string()
}
