//! Webhook subscription row and the outbound payload envelope.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A user's notification endpoint. Managed by external CRUD routes,
/// read-only here.
#[derive(Debug, Clone, FromRow)]
pub struct WebhookSubscription {
  pub user_id: String,
  pub url: String,
  pub enabled: bool,
}

/// JSON body of the new-message POST. Field names are part of the service
/// API, so they serialize in camelCase; `emailId` is the mailbox identifier
/// under its historical wire name.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
  pub email_id: Uuid,
  pub message_id: Uuid,
  pub from_address: String,
  pub subject: String,
  pub content: String,
  pub html: String,
  pub received_at: DateTime<Utc>,
  pub to_address: String,
}
