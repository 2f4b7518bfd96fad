//! Storage collaborator
//!
//! The ledger core is written once against [`LedgerStore`]; each backend is
//! one adapter:
//!
//! | Backend | Type | Persistence |
//! |---------|------|-------------|
//! | `memory` | [`MemoryStore`] | none (process lifetime) |
//! | `json` | [`JsonFileStore`] | single JSON snapshot file |
//! | `redb` | [`RedbStore`] | embedded key/value document store |
//!
//! Saves are idempotent on retry: a record with `id == 0` gets a fresh
//! snowflake id exactly once, any other id is an upsert.

pub mod json_file;
pub mod memory;
pub mod redb_store;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use std::sync::Arc;

use async_trait::async_trait;
use shared::models::{Event, Member};
use shared::{AppError, ErrorCode};
use thiserror::Error;

use crate::core::{Config, StorageBackend};

/// Storage error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupted record: {0}")]
    Corrupted(String),
}

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Corrupted(msg) => AppError::with_message(ErrorCode::StorageCorrupted, msg),
            other => AppError::database(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Load/save contract between the ledger core and a storage backend
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// All members, in storage order
    async fn load_members(&self) -> StoreResult<Vec<Member>>;

    /// All events with their participants, in storage order
    async fn load_events(&self) -> StoreResult<Vec<Event>>;

    /// Insert (id == 0) or replace a member; returns the stored record
    async fn save_member(&self, member: Member) -> StoreResult<Member>;

    /// Insert (id == 0) or replace an event; returns the stored record
    async fn save_event(&self, event: Event) -> StoreResult<Event>;

    /// Delete a member record; returns whether it existed
    async fn delete_member(&self, id: i64) -> StoreResult<bool>;

    /// Save `events` and delete the member in one write; returns whether the
    /// member existed. Nothing is written when the call fails.
    async fn delete_member_cascade(&self, id: i64, events: Vec<Event>) -> StoreResult<bool>;

    /// Delete an event and everything it owns; returns whether it existed
    async fn delete_event(&self, id: i64) -> StoreResult<bool>;

    /// Replace the whole state (backup restore)
    async fn replace_all(&self, members: Vec<Member>, events: Vec<Event>) -> StoreResult<()>;

    async fn load_event(&self, id: i64) -> StoreResult<Option<Event>> {
        Ok(self.load_events().await?.into_iter().find(|e| e.id == id))
    }
}

/// Open the backend selected by the configuration
pub fn open_store(config: &Config) -> Result<Arc<dyn LedgerStore>, AppError> {
    let store: Arc<dyn LedgerStore> = match config.storage_backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Json => Arc::new(JsonFileStore::new(config.data_file_path())),
        StorageBackend::Redb => {
            std::fs::create_dir_all(&config.work_dir)
                .map_err(|e| AppError::config(format!("Cannot create work dir: {}", e)))?;
            Arc::new(RedbStore::open(config.data_file_path())?)
        }
    };
    tracing::info!(backend = %config.storage_backend, "Storage opened");
    Ok(store)
}

pub(crate) fn assign_member_id(member: &mut Member) {
    if member.id == 0 {
        member.id = shared::util::snowflake_id();
    }
}

pub(crate) fn assign_event_id(event: &mut Event) {
    if event.id == 0 {
        event.id = shared::util::snowflake_id();
    }
}

/// Replace the record with the same id in place, or append it.
pub(crate) fn upsert<T, F>(items: &mut Vec<T>, item: T, id_of: F)
where
    F: Fn(&T) -> i64,
{
    let id = id_of(&item);
    match items.iter_mut().find(|existing| id_of(existing) == id) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}
