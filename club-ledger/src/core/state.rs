use std::sync::Arc;

use http::HeaderMap;
use shared::AppResult;
use tokio::sync::Mutex;

use crate::auth::{AdminIdentity, AuthService, CredentialsProvider, StaticCredentials};
use crate::core::Config;
use crate::db::{LedgerStore, open_store};
use crate::ledger::LedgerService;
use crate::registry::MemberRegistry;

/// Club state - shared handles to every service
///
/// | Field | Type | Meaning |
/// |-------|------|---------|
/// | config | Config | configuration (immutable) |
/// | store | Arc<dyn LedgerStore> | storage backend |
/// | registry | MemberRegistry | member directory |
/// | ledger | LedgerService | events and participants |
/// | auth | AuthService | administrator authentication |
///
/// Cloning is cheap; registry and ledger share one write lock.
#[derive(Clone)]
pub struct ClubState {
    pub config: Config,
    pub store: Arc<dyn LedgerStore>,
    pub registry: MemberRegistry,
    pub ledger: LedgerService,
    pub auth: AuthService,
}

impl ClubState {
    /// Wire the services over an already opened store
    pub fn new(
        config: Config,
        store: Arc<dyn LedgerStore>,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Self {
        let write_lock = Arc::new(Mutex::new(()));
        let registry = MemberRegistry::new(store.clone(), write_lock.clone());
        let ledger = LedgerService::new(store.clone(), registry.clone(), write_lock);

        Self {
            config,
            store,
            registry,
            ledger,
            auth: AuthService::new(credentials),
        }
    }

    /// Open the configured store and build the services
    pub fn initialize(config: &Config) -> AppResult<Self> {
        let store = open_store(config)?;
        let credentials = StaticCredentials::new(config.admin_credentials.clone());
        if credentials.is_empty() {
            tracing::warn!("No administrator credentials configured; every login will fail");
        }

        tracing::info!(
            work_dir = %config.work_dir.display(),
            environment = %config.environment,
            "Club state initialized"
        );
        Ok(Self::new(config.clone(), store, Arc::new(credentials)))
    }

    /// Check the `Authorization` header before a mutating call
    pub fn authorize(&self, headers: &HeaderMap) -> AppResult<AdminIdentity> {
        self.auth.authorize(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::encode_token;
    use crate::core::StorageBackend;
    use http::HeaderValue;
    use shared::models::MemberCreate;

    #[tokio::test]
    async fn test_services_share_one_store() {
        let mut config = Config::with_overrides("unused", StorageBackend::Memory);
        config.admin_credentials = vec![("admin".into(), "password".into())];
        let state = ClubState::initialize(&config).unwrap();

        let member = state
            .registry
            .register(MemberCreate::new("Ali"))
            .await
            .unwrap();
        let event = state.ledger.create_event("Weekly Meeting").await.unwrap();
        let event = state.ledger.enroll(event.id, member.id).await.unwrap();
        assert_eq!(event.participants.len(), 1);
        assert_eq!(state.store.load_members().await.unwrap().len(), 1);

        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", encode_token("admin", "password"));
        headers.insert(http::header::AUTHORIZATION, HeaderValue::from_str(&bearer).unwrap());
        assert_eq!(state.authorize(&headers).unwrap().identifier, "admin");
    }
}
