//! Credentials providers

/// Checks an administrator identifier/secret pair
///
/// Injected into [`AuthService`](super::AuthService) at construction.
pub trait CredentialsProvider: Send + Sync {
    fn check(&self, identifier: &str, secret: &str) -> bool;
}

/// Fixed allow-list of (identifier, secret) pairs
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    pairs: Vec<(String, String)>,
}

impl StaticCredentials {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl CredentialsProvider for StaticCredentials {
    fn check(&self, identifier: &str, secret: &str) -> bool {
        self.pairs
            .iter()
            .any(|(id, s)| id == identifier && s == secret)
    }
}
