//! Per-delivery ingestion pipeline: decode, resolve, persist, notify.
//!
//! A single linear pass with two abort points (decode, resolve) and one
//! isolated side effect (webhook dispatch) that can never roll back the
//! committed message row. Only store errors escape to the caller; the
//! transport decides what a failed invocation means.

use crate::{
  app::AppState,
  models::message::{Direction, NewMessage, StoredMessage},
  store,
  util::{self, DecodedMessage},
  webhook,
};
use mailparse::MailParseError;
use tracing::{info, warn};

/// Transport-level sender and destination accompanying a raw delivery,
/// distinct from any addresses inside the MIME headers.
#[derive(Debug, Clone)]
pub struct Envelope {
  pub from: String,
  pub to: String,
}

/// What became of one delivery. Only `Stored` produced a row.
#[derive(Debug)]
pub enum IngestOutcome {
  Stored(StoredMessage),
  UnknownRecipient,
  Malformed,
}

/// Ingest one raw inbound message.
///
/// Malformed payloads and unknown recipients are dropped with a log line;
/// the inbound transport has no redelivery path, so there is nothing else
/// to do with them. A store failure (including a mailbox swept between
/// resolution and insert) is the one hard failure mode.
pub async fn handle_delivery(
  state: &AppState,
  envelope: &Envelope,
  raw: &[u8],
) -> Result<IngestOutcome, sqlx::Error> {
  ingest_decoded(state, envelope, util::decode_message(raw)).await
}

/// Run the pipeline over the result of the decode step.
pub async fn ingest_decoded(
  state: &AppState,
  envelope: &Envelope,
  decoded: Result<DecodedMessage, MailParseError>,
) -> Result<IngestOutcome, sqlx::Error> {
  let decoded = match decoded {
    Ok(d) => d,
    Err(e) => {
      warn!("dropping malformed delivery from {}: {e}", envelope.from);
      return Ok(IngestOutcome::Malformed);
    }
  };

  let Some(mailbox) = store::resolve_recipient(&state.db, &envelope.to).await? else {
    info!("no mailbox for {}, dropping delivery", envelope.to);
    return Ok(IngestOutcome::UnknownRecipient);
  };

  let stored = store::insert_message(
    &state.db,
    NewMessage {
      mailbox_id: mailbox.id,
      from_addr: envelope.from.clone(),
      subject: decoded.subject,
      text: decoded.text,
      html: decoded.html,
      direction: Direction::Received,
    },
  )
  .await?;

  // The row is durable from here on; everything on the notification path is
  // absorbed, including the subscription lookup itself.
  match store::webhook_for_user(&state.db, &mailbox.user_id).await {
    Ok(Some(hook)) if hook.enabled => {
      webhook::dispatch(&state.http, &mailbox, &stored, &hook).await;
    }
    Ok(_) => {}
    Err(e) => warn!("webhook lookup for user {} failed: {e}", mailbox.user_id),
  }

  info!("stored message {} for {}", stored.id, mailbox.address);
  Ok(IngestOutcome::Stored(stored))
}
