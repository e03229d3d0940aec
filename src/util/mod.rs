//! Utility functions: tracing setup and MIME decoding.

use mailparse::{MailHeaderMap, MailParseError, ParsedMail, parse_mail};
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize pretty CLI logging.
pub fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  fmt()
    .with_env_filter(filter)
    .with_target(false)
    .pretty()
    .init();
}

/// The slice of a MIME message this service keeps.
#[derive(Debug, Default)]
pub struct DecodedMessage {
  pub subject: Option<String>,
  pub text: Option<String>,
  pub html: Option<String>,
}

/// Decode a raw delivery into the fields the store persists.
///
/// A present-but-empty `Subject:` header counts as absent, so the storage
/// placeholder applies to both.
pub fn decode_message(raw: &[u8]) -> Result<DecodedMessage, MailParseError> {
  let parsed = parse_mail(raw)?;
  let subject = parsed
    .headers
    .get_first_value("Subject")
    .filter(|s| !s.is_empty());
  let (text, html) = extract_bodies(&parsed);
  Ok(DecodedMessage {
    subject,
    text,
    html,
  })
}

/// Extract the first plain-text and HTML bodies from a MIME tree.
///
/// Anything beyond subject/text/html (attachments, nested alternatives past
/// the first hit) is deliberately ignored; mailboxes here are disposable.
pub fn extract_bodies(parsed: &ParsedMail<'_>) -> (Option<String>, Option<String>) {
  if parsed.subparts.is_empty() {
    let data = parsed.get_body().unwrap_or_default();
    match parsed.ctype.mimetype.as_str() {
      "text/html" => (None, Some(data)),
      _ => (Some(data), None),
    }
  } else {
    let mut text = None;
    let mut html = None;
    for part in &parsed.subparts {
      let (t, h) = extract_bodies(part);
      if text.is_none() {
        text = t;
      }
      if html.is_none() {
        html = h;
      }
    }
    (text, html)
  }
}
