//! Best-effort new-message notifications.

use crate::models::{mailbox::Mailbox, message::StoredMessage, webhook::{WebhookPayload, WebhookSubscription}};
use tracing::{debug, warn};

/// Header naming the event carried by the POST body.
pub const EVENT_HEADER: &str = "X-Webhook-Event";

/// Event token for an inbound message landing in a mailbox.
pub const NEW_MESSAGE_EVENT: &str = "new_message";

/// POST the new-message payload to a subscription endpoint, at most once.
///
/// Fire-and-forget: the message row is already committed when this runs, so
/// timeouts, non-2xx responses, and transport errors are logged and dropped.
/// There is no retry; an unreachable endpoint must not stall ingestion.
pub async fn dispatch(
    client: &reqwest::Client,
    mailbox: &Mailbox,
    message: &StoredMessage,
    hook: &WebhookSubscription,
) {
    let payload = WebhookPayload {
        email_id: mailbox.id,
        message_id: message.id,
        from_address: message.from_addr.clone(),
        subject: message.subject.clone(),
        content: message.text_body.clone(),
        html: message.html_body.clone(),
        received_at: message.received_at,
        to_address: mailbox.address.clone(),
    };
    let result = client
        .post(&hook.url)
        .header(EVENT_HEADER, NEW_MESSAGE_EVENT)
        .json(&payload)
        .send()
        .await
        .and_then(|res| res.error_for_status());
    match result {
        Ok(_) => debug!("notified {} about message {}", hook.url, message.id),
        Err(e) => warn!("webhook dispatch to {} failed: {e}", hook.url),
    }
}
