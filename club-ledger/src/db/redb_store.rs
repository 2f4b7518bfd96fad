//! redb-based document store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `members` | `member_id` | `Member` (JSON) | Identity registry |
//! | `events` | `event_id` | `Event` (JSON, participants embedded) | Participation ledger |
//!
//! Records come back in key order. Snowflake ids are time-ordered, so this
//! matches creation order for everything saved through the store.
//!
//! # Durability
//!
//! redb commits are persistent as soon as `commit()` returns (copy-on-write
//! with an atomic root swap), so the file is consistent after a power loss.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::{Event, Member};

use super::{LedgerStore, StoreError, StoreResult, assign_event_id, assign_member_id};

/// Table for members: key = member id, value = JSON-serialized Member
const MEMBERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("members");

/// Table for events: key = event id, value = JSON-serialized Event
const EVENTS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("events");

/// Ledger storage backed by redb
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, throwaway sessions)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(MEMBERS_TABLE)?;
            let _ = write_txn.open_table(EVENTS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    fn load_all<T: DeserializeOwned>(
        &self,
        definition: TableDefinition<i64, &[u8]>,
    ) -> StoreResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(definition)?;

        let mut records = Vec::new();
        for result in table.iter()? {
            let (key, value) = result?;
            let record = serde_json::from_slice(value.value()).map_err(|e| {
                StoreError::Corrupted(format!("record {}: {}", key.value(), e))
            })?;
            records.push(record);
        }
        Ok(records)
    }

    fn put<T: Serialize>(
        &self,
        definition: TableDefinition<i64, &[u8]>,
        id: i64,
        record: &T,
    ) -> StoreResult<()> {
        let bytes = serde_json::to_vec(record)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(definition)?;
            table.insert(id, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove(&self, definition: TableDefinition<i64, &[u8]>, id: i64) -> StoreResult<bool> {
        let txn = self.db.begin_write()?;
        let existed = {
            let mut table = txn.open_table(definition)?;
            table.remove(id)?.is_some()
        };
        txn.commit()?;
        Ok(existed)
    }
}

#[async_trait]
impl LedgerStore for RedbStore {
    async fn load_members(&self) -> StoreResult<Vec<Member>> {
        self.load_all(MEMBERS_TABLE)
    }

    async fn load_events(&self) -> StoreResult<Vec<Event>> {
        self.load_all(EVENTS_TABLE)
    }

    async fn save_member(&self, mut member: Member) -> StoreResult<Member> {
        assign_member_id(&mut member);
        self.put(MEMBERS_TABLE, member.id, &member)?;
        Ok(member)
    }

    async fn save_event(&self, mut event: Event) -> StoreResult<Event> {
        assign_event_id(&mut event);
        self.put(EVENTS_TABLE, event.id, &event)?;
        Ok(event)
    }

    async fn delete_member(&self, id: i64) -> StoreResult<bool> {
        self.remove(MEMBERS_TABLE, id)
    }

    async fn delete_member_cascade(&self, id: i64, events: Vec<Event>) -> StoreResult<bool> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(EVENTS_TABLE)?;
            for event in &events {
                let bytes = serde_json::to_vec(event)?;
                table.insert(event.id, bytes.as_slice())?;
            }
        }
        let existed = {
            let mut table = txn.open_table(MEMBERS_TABLE)?;
            table.remove(id)?.is_some()
        };
        txn.commit()?;
        Ok(existed)
    }

    async fn delete_event(&self, id: i64) -> StoreResult<bool> {
        self.remove(EVENTS_TABLE, id)
    }

    async fn replace_all(&self, members: Vec<Member>, events: Vec<Event>) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        txn.delete_table(MEMBERS_TABLE)?;
        txn.delete_table(EVENTS_TABLE)?;
        {
            let mut table = txn.open_table(MEMBERS_TABLE)?;
            for mut member in members {
                assign_member_id(&mut member);
                let bytes = serde_json::to_vec(&member)?;
                table.insert(member.id, bytes.as_slice())?;
            }
        }
        {
            let mut table = txn.open_table(EVENTS_TABLE)?;
            for mut event in events {
                assign_event_id(&mut event);
                let bytes = serde_json::to_vec(&event)?;
                table.insert(event.id, bytes.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }

    async fn load_event(&self, id: i64) -> StoreResult<Option<Event>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS_TABLE)?;
        match table.get(id)? {
            Some(guard) => {
                let event = serde_json::from_slice(guard.value())
                    .map_err(|e| StoreError::Corrupted(format!("event {}: {}", id, e)))?;
                Ok(Some(event))
            }
            None => Ok(None),
        }
    }
}
