//! Error types for the service core.

use thiserror::Error;

/// Errors surfaced by startup and the long-running listeners.
///
/// Per-delivery failure policy lives in [`crate::ingest`]: only store errors
/// escape an ingestion invocation, everything else is absorbed and logged.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O error (listener sockets, SMTP streams).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Outbound HTTP client could not be built.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
