//! Core module - configuration and shared state
//!
//! - [`Config`] - ledger configuration
//! - [`ClubState`] - service handles

pub mod config;
pub mod state;

pub use config::{Config, StorageBackend, parse_credential_pairs};
pub use state::ClubState;
