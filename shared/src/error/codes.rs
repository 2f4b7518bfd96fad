//! Numeric error codes
//!
//! The thousands digit names the area that raised the error, see
//! [`ErrorCategory`](super::ErrorCategory). Numbers are part of the wire
//! format of [`ApiResponse`](super::ApiResponse) and never get reused.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Every failure a ledger operation can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    Success = 0,
    /// A mandatory input (login identifier, secret) was blank
    RequiredField = 7,

    NotAuthenticated = 1001,
    InvalidCredentials = 1002,
    TokenInvalid = 1004,

    MemberNotFound = 3001,
    /// CNI comparison is case-insensitive
    MemberCniExists = 3002,
    MemberNameRequired = 3003,

    EventNotFound = 4001,
    EventNameRequired = 4002,

    /// The member has no entry in the event's participant list
    ParticipantNotFound = 5001,
    ParticipantAlreadyEnrolled = 5002,

    /// Unreadable CSV: empty file, missing column or unknown status
    ImportHeaderInvalid = 6001,
    BackupInvalid = 6002,

    InternalError = 9001,
    DatabaseError = 9002,
    ConfigError = 9005,
    /// The data file exists but cannot be decoded
    StorageCorrupted = 9403,
}

impl ErrorCode {
    /// All codes, in numeric order
    pub const ALL: [ErrorCode; 18] = [
        ErrorCode::Success,
        ErrorCode::RequiredField,
        ErrorCode::NotAuthenticated,
        ErrorCode::InvalidCredentials,
        ErrorCode::TokenInvalid,
        ErrorCode::MemberNotFound,
        ErrorCode::MemberCniExists,
        ErrorCode::MemberNameRequired,
        ErrorCode::EventNotFound,
        ErrorCode::EventNameRequired,
        ErrorCode::ParticipantNotFound,
        ErrorCode::ParticipantAlreadyEnrolled,
        ErrorCode::ImportHeaderInvalid,
        ErrorCode::BackupInvalid,
        ErrorCode::InternalError,
        ErrorCode::DatabaseError,
        ErrorCode::ConfigError,
        ErrorCode::StorageCorrupted,
    ];

    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Default message, used when the raising site has nothing more specific
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "OK",
            ErrorCode::RequiredField => "A required value is missing",

            ErrorCode::NotAuthenticated => "Administrator login required",
            ErrorCode::InvalidCredentials => "Unknown identifier or wrong secret",
            ErrorCode::TokenInvalid => "Bearer token could not be read",

            ErrorCode::MemberNotFound => "No such member",
            ErrorCode::MemberCniExists => "Another member already holds this CNI",
            ErrorCode::MemberNameRequired => "A member needs a full name",

            ErrorCode::EventNotFound => "No such event",
            ErrorCode::EventNameRequired => "An event needs a name",

            ErrorCode::ParticipantNotFound => "Member is not enrolled in this event",
            ErrorCode::ParticipantAlreadyEnrolled => "Member is already enrolled in this event",

            ErrorCode::ImportHeaderInvalid => "CSV file could not be read",
            ErrorCode::BackupInvalid => "Backup file could not be read",

            ErrorCode::InternalError => "Unexpected failure",
            ErrorCode::DatabaseError => "Storage failure",
            ErrorCode::ConfigError => "Bad configuration",
            ErrorCode::StorageCorrupted => "Data file is damaged",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A number that does not belong to any [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown error code {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|code| code.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
