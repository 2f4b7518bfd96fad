//! Shared types for the club ledger
//!
//! Data models (members, events, participants), the unified error
//! system and small utilities used across crates.

pub mod error;
pub mod models;
pub mod util;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
