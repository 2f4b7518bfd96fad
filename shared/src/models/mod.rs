//! Data models
//!
//! Shared between the ledger core, its storage backends and any
//! presentation layer (serialized camelCase, matching the backup format).
//! All IDs are `i64` snowflakes; `0` means "not saved yet".

pub mod event;
pub mod member;
pub mod participant;

// Re-exports
pub use event::*;
pub use member::*;
pub use participant::*;
