//! Administrator authentication
//!
//! - [`CredentialsProvider`] - injectable identifier/secret check
//! - [`StaticCredentials`] - allow-list provider (from `ADMIN_CREDENTIALS`)
//! - [`AuthService`] - login, token verification, `Authorization` header gate

pub mod credentials;
pub mod token;

pub use credentials::{CredentialsProvider, StaticCredentials};
pub use token::{AdminIdentity, AuthService, LoginResponse, TokenError, encode_token};
