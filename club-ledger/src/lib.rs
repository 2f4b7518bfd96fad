//! Club Ledger - membership, attendance and points
//!
//! # Modules
//!
//! - **Identity Registry** (`registry`): member directory keyed by CNI
//! - **Participation Ledger** (`ledger`): events and their participant entries
//! - **Aggregation View** (`aggregation`): totals, history, self-service summary
//! - **Import/Export Adapter** (`transfer`): CSV member import, CSV exports, JSON backup
//! - **Storage** (`db`): memory, JSON file and redb backends behind one trait
//! - **Authentication** (`auth`): administrator credentials and bearer tokens
//!
//! ```text
//! club-ledger/src/
//! ├── core/          # config, state
//! ├── db/            # storage backends
//! ├── registry/      # members
//! ├── ledger/        # events, participants
//! ├── aggregation/   # read-only views
//! ├── transfer/      # import/export
//! ├── auth/          # credentials, tokens
//! └── utils/         # logger, error re-exports
//! ```

pub mod aggregation;
pub mod auth;
pub mod core;
pub mod db;
pub mod ledger;
pub mod registry;
pub mod transfer;
pub mod utils;

pub use auth::{AuthService, CredentialsProvider, StaticCredentials};
pub use core::{ClubState, Config, StorageBackend};
pub use db::{JsonFileStore, LedgerStore, MemoryStore, RedbStore, open_store};
pub use ledger::LedgerService;
pub use registry::MemberRegistry;
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - emitted under the "security" target
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load `.env`, read the configuration and start logging
pub fn setup_environment() -> Result<Config, AppError> {
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::debug!(
        backend = %config.storage_backend,
        environment = %config.environment,
        "Environment ready"
    );
    Ok(config)
}
