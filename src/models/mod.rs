//! Typed records shared across layers.

pub mod mailbox;
pub mod message;
pub mod webhook;
