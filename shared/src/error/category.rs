//! Area of the ledger an error code belongs to

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Derived from the thousands digit of an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    General,
    Auth,
    Member,
    Event,
    Participant,
    /// CSV import/export and JSON backups
    Transfer,
    /// Storage, configuration and anything outside the known ranges
    System,
}

impl ErrorCategory {
    pub fn from_code(code: u16) -> Self {
        match code / 1000 {
            0 => Self::General,
            1 => Self::Auth,
            3 => Self::Member,
            4 => Self::Event,
            5 => Self::Participant,
            6 => Self::Transfer,
            _ => Self::System,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Member => "member",
            Self::Event => "event",
            Self::Participant => "participant",
            Self::Transfer => "transfer",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
