//! Single-file JSON store
//!
//! The whole ledger lives in one document:
//!
//! ```json
//! { "members": [ ... ], "events": [ ... ] }
//! ```
//!
//! Every save rewrites the file through a sibling temp file and a rename,
//! so a crash mid-write leaves the previous snapshot intact.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared::models::{Event, Member};

use super::{
    LedgerStore, StoreError, StoreResult, assign_event_id, assign_member_id, upsert,
};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    events: Vec<Event>,
}

/// JSON snapshot file store
///
/// File access is blocking, so every call runs on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    inner: Arc<SnapshotFile>,
}

#[derive(Debug)]
struct SnapshotFile {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl SnapshotFile {
    fn read(&self) -> StoreResult<Snapshot> {
        if !self.path.exists() {
            return Ok(Snapshot::default());
        }
        let bytes = fs::read(&self.path)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Snapshot::default());
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            StoreError::Corrupted(format!("{}: {}", self.path.display(), e))
        })
    }

    fn write(&self, snapshot: &Snapshot) -> StoreResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(snapshot)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> StoreResult<Snapshot> {
        let _guard = self.lock.lock();
        self.read()
    }

    fn modify<R>(&self, f: impl FnOnce(&mut Snapshot) -> R) -> StoreResult<R> {
        let _guard = self.lock.lock();
        let mut snapshot = self.read()?;
        let result = f(&mut snapshot);
        self.write(&snapshot)?;
        Ok(result)
    }
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(SnapshotFile {
                path: path.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    async fn blocking<R, F>(&self, f: F) -> StoreResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&SnapshotFile) -> StoreResult<R> + Send + 'static,
    {
        let file = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&file))
            .await
            .map_err(|e| StoreError::Database(format!("snapshot task failed: {e}")))?
    }
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    async fn load_members(&self) -> StoreResult<Vec<Member>> {
        self.blocking(|file| Ok(file.load()?.members)).await
    }

    async fn load_events(&self) -> StoreResult<Vec<Event>> {
        self.blocking(|file| Ok(file.load()?.events)).await
    }

    async fn save_member(&self, mut member: Member) -> StoreResult<Member> {
        assign_member_id(&mut member);
        let stored = member.clone();
        self.blocking(move |file| file.modify(move |s| upsert(&mut s.members, member, |m| m.id)))
            .await?;
        Ok(stored)
    }

    async fn save_event(&self, mut event: Event) -> StoreResult<Event> {
        assign_event_id(&mut event);
        let stored = event.clone();
        self.blocking(move |file| file.modify(move |s| upsert(&mut s.events, event, |e| e.id)))
            .await?;
        Ok(stored)
    }

    async fn delete_member(&self, id: i64) -> StoreResult<bool> {
        self.blocking(move |file| {
            file.modify(|s| {
                let before = s.members.len();
                s.members.retain(|m| m.id != id);
                s.members.len() != before
            })
        })
        .await
    }

    async fn delete_member_cascade(&self, id: i64, events: Vec<Event>) -> StoreResult<bool> {
        self.blocking(move |file| {
            file.modify(move |s| {
                for event in events {
                    upsert(&mut s.events, event, |e| e.id);
                }
                let before = s.members.len();
                s.members.retain(|m| m.id != id);
                s.members.len() != before
            })
        })
        .await
    }

    async fn delete_event(&self, id: i64) -> StoreResult<bool> {
        self.blocking(move |file| {
            file.modify(|s| {
                let before = s.events.len();
                s.events.retain(|e| e.id != id);
                s.events.len() != before
            })
        })
        .await
    }

    async fn replace_all(&self, members: Vec<Member>, events: Vec<Event>) -> StoreResult<()> {
        self.blocking(move |file| {
            file.modify(move |s| {
                s.members = members;
                s.events = events;
            })
        })
        .await
    }
}
