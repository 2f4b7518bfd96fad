//! Status codes for front ends that speak HTTP

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    pub fn http_status(&self) -> StatusCode {
        use ErrorCode::*;

        match self {
            Success => StatusCode::OK,
            MemberNotFound | EventNotFound | ParticipantNotFound => StatusCode::NOT_FOUND,
            MemberCniExists | ParticipantAlreadyEnrolled => StatusCode::CONFLICT,
            NotAuthenticated | InvalidCredentials | TokenInvalid => StatusCode::UNAUTHORIZED,
            RequiredField | MemberNameRequired | EventNameRequired | ImportHeaderInvalid
            | BackupInvalid => StatusCode::BAD_REQUEST,
            InternalError | DatabaseError | ConfigError | StorageCorrupted => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
