//! [`AppError`] and the [`ApiResponse`] envelope

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Failure of a ledger operation
///
/// `details` carries the offending values (CNI, event id, CSV row) so a
/// front end can point at them without parsing `message`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Error carrying the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    // Registry

    pub fn member_not_found(member_id: i64) -> Self {
        Self::with_message(
            ErrorCode::MemberNotFound,
            format!("Member {member_id} not found"),
        )
        .with_detail("member_id", member_id)
    }

    pub fn duplicate_cni(cni: impl Into<String>) -> Self {
        Self::new(ErrorCode::MemberCniExists).with_detail("cni", cni.into())
    }

    // Ledger

    pub fn event_not_found(event_id: i64) -> Self {
        Self::with_message(ErrorCode::EventNotFound, format!("Event {event_id} not found"))
            .with_detail("event_id", event_id)
    }

    pub fn participant_not_found(event_id: i64, member_id: i64) -> Self {
        Self::with_message(
            ErrorCode::ParticipantNotFound,
            format!("Member {member_id} is not enrolled in event {event_id}"),
        )
        .with_detail("event_id", event_id)
        .with_detail("member_id", member_id)
    }

    pub fn already_enrolled(event_id: i64, member_id: i64) -> Self {
        Self::new(ErrorCode::ParticipantAlreadyEnrolled)
            .with_detail("event_id", event_id)
            .with_detail("member_id", member_id)
    }

    // Transfer

    /// Unusable CSV input
    pub fn import_format(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ImportHeaderInvalid, msg)
    }

    // Auth

    /// Blank mandatory input, `field` is echoed in the details
    pub fn required(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::with_message(ErrorCode::RequiredField, format!("{field} must not be blank"))
            .with_detail("field", field)
    }

    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    // System

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ConfigError, msg)
    }
}

/// Envelope shown to an administrator or member for every outcome
///
/// `code` is 0 on success. Failures leave `data` empty and copy the error's
/// `details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: Some(ErrorCode::Success.code()),
            message: ErrorCode::Success.message().to_string(),
            data: Some(data),
            details: None,
        }
    }

    /// Unknown codes render as 500
    pub fn http_status(&self) -> StatusCode {
        match self.code {
            None => StatusCode::OK,
            Some(code) => ErrorCode::try_from(code)
                .map(|c| c.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(err: &AppError) -> Self {
        err.clone().into()
    }
}

impl<T> From<AppError> for ApiResponse<T> {
    fn from(err: AppError) -> Self {
        if err.category() == ErrorCategory::System {
            tracing::error!(code = %err.code, message = %err.message, "System error");
        }

        Self {
            code: Some(err.code.code()),
            message: err.message,
            data: None,
            details: err.details,
        }
    }
}

impl<T> From<AppResult<T>> for ApiResponse<T> {
    fn from(result: AppResult<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => err.into(),
        }
    }
}
