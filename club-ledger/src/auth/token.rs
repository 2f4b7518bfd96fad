use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use shared::{AppError, AppResult};
use thiserror::Error;

use super::credentials::CredentialsProvider;
use crate::security_log;

/// Token decoding errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token is not valid base64")]
    Encoding,

    #[error("Token payload is not an identifier/secret pair")]
    Malformed,

    #[error("Token credentials rejected")]
    Rejected,
}

/// Login result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Authenticated administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub identifier: String,
}

/// Administrator authentication
///
/// Tokens are `base64("identifier:secret")` and are verified by decoding
/// and re-checking the pair. They carry no signature and never expire;
/// anyone holding one holds the secret.
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn CredentialsProvider>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn CredentialsProvider>) -> Self {
        Self { provider }
    }

    /// Check the pair and issue a token
    pub fn login(&self, identifier: &str, secret: &str) -> AppResult<LoginResponse> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(AppError::required("identifier"));
        }
        if secret.is_empty() {
            return Err(AppError::required("secret"));
        }

        if !self.provider.check(identifier, secret) {
            security_log!("WARN", "login_failed", identifier = identifier);
            return Err(AppError::invalid_credentials());
        }

        security_log!("INFO", "login_success", identifier = identifier);
        Ok(LoginResponse {
            token: encode_token(identifier, secret),
        })
    }

    /// Decode a token and re-check its pair
    pub fn verify_token(&self, token: &str) -> AppResult<AdminIdentity> {
        self.decode_and_check(token).map_err(|e| {
            security_log!("WARN", "token_rejected", error = e.to_string());
            AppError::invalid_token(e.to_string())
        })
    }

    fn decode_and_check(&self, token: &str) -> Result<AdminIdentity, TokenError> {
        let (identifier, secret) = decode_token(token)?;
        if !self.provider.check(&identifier, &secret) {
            return Err(TokenError::Rejected);
        }
        Ok(AdminIdentity { identifier })
    }

    /// Gate for mutating calls: read `Authorization` and verify the token
    ///
    /// Accepts `Bearer <token>` as well as a bare token.
    pub fn authorize(&self, headers: &HeaderMap) -> AppResult<AdminIdentity> {
        let header = headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|h| !h.is_empty());

        let Some(header) = header else {
            security_log!("WARN", "auth_missing", header = "Authorization");
            return Err(AppError::unauthorized());
        };

        self.verify_token(Self::extract_from_header(header))
    }

    /// Strip the `Bearer ` prefix, if any
    pub fn extract_from_header(header: &str) -> &str {
        header.strip_prefix("Bearer ").unwrap_or(header).trim()
    }
}

pub fn encode_token(identifier: &str, secret: &str) -> String {
    STANDARD.encode(format!("{}:{}", identifier, secret))
}

fn decode_token(token: &str) -> Result<(String, String), TokenError> {
    let bytes = STANDARD
        .decode(token.trim())
        .map_err(|_| TokenError::Encoding)?;
    let text = String::from_utf8(bytes).map_err(|_| TokenError::Malformed)?;
    let (identifier, secret) = text.split_once(':').ok_or(TokenError::Malformed)?;
    if identifier.is_empty() || secret.is_empty() {
        return Err(TokenError::Malformed);
    }
    Ok((identifier.to_string(), secret.to_string()))
}
