//! Storage operations shared by ingestion and the sweeper.
//!
//! Mailbox and webhook rows are provisioned by the external account routes;
//! this module only reads them. Message rows are written here and deleted by
//! [`crate::sweep`].

use crate::models::{mailbox::Mailbox, message::{NewMessage, StoredMessage}, webhook::WebhookSubscription};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Subject stored when a delivery carries none.
pub const NO_SUBJECT: &str = "(no subject)";

/// Look up the mailbox for a destination address, case-insensitively.
///
/// The address column collates NOCASE, so the index does the folding; no
/// side effects on lookup.
pub async fn resolve_recipient(
    pool: &SqlitePool,
    address: &str,
) -> Result<Option<Mailbox>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, address, user_id, created_at, expires_at FROM mailboxes WHERE address = ?",
    )
    .bind(address)
    .fetch_optional(pool)
    .await
}

/// Persist a message, assigning its id and receipt timestamp.
///
/// The mailbox reference is enforced by the store: if the mailbox was swept
/// between resolution and this insert, the FK constraint fails the insert
/// and the error propagates to the caller.
pub async fn insert_message(
    pool: &SqlitePool,
    msg: NewMessage,
) -> Result<StoredMessage, sqlx::Error> {
    let stored = StoredMessage {
        id: Uuid::new_v4(),
        mailbox_id: msg.mailbox_id,
        from_addr: msg.from_addr,
        subject: msg.subject.unwrap_or_else(|| NO_SUBJECT.to_string()),
        text_body: msg.text.unwrap_or_default(),
        html_body: msg.html.unwrap_or_default(),
        direction: msg.direction,
        received_at: Utc::now(),
    };
    sqlx::query(
        "INSERT INTO messages (id, mailbox_id, from_addr, subject, text_body, html_body, direction, received_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(stored.id)
    .bind(stored.mailbox_id)
    .bind(&stored.from_addr)
    .bind(&stored.subject)
    .bind(&stored.text_body)
    .bind(&stored.html_body)
    .bind(stored.direction)
    .bind(stored.received_at)
    .execute(pool)
    .await?;
    Ok(stored)
}

/// Fetch a user's webhook subscription, if any.
pub async fn webhook_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<WebhookSubscription>, sqlx::Error> {
    sqlx::query_as("SELECT user_id, url, enabled FROM webhooks WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Read a named setting.
pub async fn read_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
}

/// Write a named setting, replacing any existing value.
pub async fn write_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}
