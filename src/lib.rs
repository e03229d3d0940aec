//! driftmail library entrypoint.
//!
//! Modules:
//! - `app`: startup, configuration, shared state
//! - `smtp`: SMTP listener, the delivery transport feeding ingestion
//! - `ingest`: per-delivery pipeline (decode, resolve, persist, notify)
//! - `store`: mailbox resolution, message persistence, settings
//! - `webhook`: best-effort new-message notifications
//! - `sweep`: batched deletion of expired mailboxes
//! - `db`: migrations and SQLite helpers
//! - `models`: typed records used across layers
//! - `util`: tracing and MIME body extraction

pub mod app;
pub mod db;
pub mod error;
pub mod ingest;
pub mod models;
pub mod smtp;
pub mod store;
pub mod sweep;
pub mod util;
pub mod webhook;
