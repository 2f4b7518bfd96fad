//! Identity Registry
//!
//! Member directory keyed by the CNI natural key. CNIs are stored
//! lower-cased and compared case-insensitively; a non-empty CNI is unique.

use std::sync::Arc;

use shared::models::{Member, MemberCreate, MemberUpdate};
use shared::util::{normalize_cni, now_millis};
use shared::{AppError, AppResult, ErrorCode};
use tokio::sync::Mutex;

use crate::db::LedgerStore;

/// Member directory service
#[derive(Clone)]
pub struct MemberRegistry {
    store: Arc<dyn LedgerStore>,
    /// Shared with the ledger: one logical writer at a time
    write_lock: Arc<Mutex<()>>,
}

impl MemberRegistry {
    pub fn new(store: Arc<dyn LedgerStore>, write_lock: Arc<Mutex<()>>) -> Self {
        Self { store, write_lock }
    }

    /// Register a new member
    ///
    /// Fails with `MemberNameRequired` on a blank name and with
    /// `MemberCniExists` when the CNI is already taken; the registry is
    /// unchanged in both cases.
    pub async fn register(&self, candidate: MemberCreate) -> AppResult<Member> {
        if candidate.name.trim().is_empty() {
            return Err(AppError::new(ErrorCode::MemberNameRequired));
        }

        let _guard = self.write_lock.lock().await;
        let members = self.store.load_members().await?;

        if let Some(cni) = candidate.cni_key()
            && members.iter().any(|m| m.matches_cni(&cni))
        {
            tracing::info!(cni = %cni, "Registration rejected: duplicate CNI");
            return Err(AppError::duplicate_cni(cni));
        }

        let member = self
            .store
            .save_member(candidate.into_member(now_millis()))
            .await?;

        tracing::info!(member_id = member.id, name = %member.name, "Member registered");
        Ok(member)
    }

    /// All members, name ascending (case-insensitive), ties by id
    pub async fn list(&self) -> AppResult<Vec<Member>> {
        let mut members = self.store.load_members().await?;
        sort_by_name(&mut members);
        Ok(members)
    }

    /// Case-insensitive exact CNI match
    pub async fn find_by_cni(&self, cni: &str) -> AppResult<Option<Member>> {
        if normalize_cni(cni).is_empty() {
            return Ok(None);
        }
        let members = self.store.load_members().await?;
        Ok(members.into_iter().find(|m| m.matches_cni(cni)))
    }

    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Member>> {
        let members = self.store.load_members().await?;
        Ok(members.into_iter().find(|m| m.id == id))
    }

    /// Like [`find_by_id`](Self::find_by_id) but `MemberNotFound` when absent
    pub async fn get(&self, id: i64) -> AppResult<Member> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::member_not_found(id))
    }

    /// Case-insensitive substring match on name or CNI, name ascending
    pub async fn search(&self, query: &str) -> AppResult<Vec<Member>> {
        let needle = query.trim().to_lowercase();
        let mut members = self.list().await?;
        if needle.is_empty() {
            return Ok(members);
        }
        members.retain(|m| {
            m.name.to_lowercase().contains(&needle)
                || m.cni_key().is_some_and(|c| c.contains(&needle))
        });
        Ok(members)
    }

    /// Edit profile fields, keeping the CNI unique
    pub async fn update(&self, id: i64, update: MemberUpdate) -> AppResult<Member> {
        let _guard = self.write_lock.lock().await;
        let members = self.store.load_members().await?;
        let mut member = members
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| AppError::member_not_found(id))?;

        update.apply_to(&mut member);

        if member.name.is_empty() {
            return Err(AppError::new(ErrorCode::MemberNameRequired));
        }
        if let Some(cni) = member.cni_key()
            && members.iter().any(|m| m.id != id && m.matches_cni(&cni))
        {
            return Err(AppError::duplicate_cni(cni));
        }

        let member = self.store.save_member(member).await?;
        tracing::info!(member_id = id, "Member updated");
        Ok(member)
    }
}

/// Name ascending, case-insensitive; ties broken by id
pub fn sort_by_name(members: &mut [Member]) {
    members.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then(a.id.cmp(&b.id))
    });
}
