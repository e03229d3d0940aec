//! A provisioned, time-limited address owned by a user.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Mailbox row. Provisioned by the external account routes; the core only
/// resolves deliveries against it and deletes it once expired.
#[derive(Debug, Clone, FromRow)]
pub struct Mailbox {
  pub id: Uuid,
  pub address: String,
  pub user_id: String,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}
