//! Stored message rows and their insert form.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Whether a message arrived at the mailbox or was sent from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Direction {
  Received,
  Sent,
}

/// A message as committed to the store. `id` and `received_at` are assigned
/// at insert time and carried verbatim into webhook payloads.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StoredMessage {
  pub id: Uuid,
  pub mailbox_id: Uuid,
  pub from_addr: String,
  pub subject: String,
  pub text_body: String,
  pub html_body: String,
  pub direction: Direction,
  pub received_at: DateTime<Utc>,
}

/// Insert form. Optional fields take documented defaults in the store so the
/// row never carries NULLs.
#[derive(Debug)]
pub struct NewMessage {
  pub mailbox_id: Uuid,
  pub from_addr: String,
  pub subject: Option<String>,
  pub text: Option<String>,
  pub html: Option<String>,
  pub direction: Direction,
}
