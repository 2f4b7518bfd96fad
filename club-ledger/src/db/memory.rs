//! In-process store (no persistence)

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::{Event, Member};

use super::{LedgerStore, StoreResult, assign_event_id, assign_member_id, upsert};

/// Insertion-ordered in-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    members: RwLock<Vec<Member>>,
    events: RwLock<Vec<Event>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn load_members(&self) -> StoreResult<Vec<Member>> {
        Ok(self.members.read().clone())
    }

    async fn load_events(&self) -> StoreResult<Vec<Event>> {
        Ok(self.events.read().clone())
    }

    async fn save_member(&self, mut member: Member) -> StoreResult<Member> {
        assign_member_id(&mut member);
        upsert(&mut *self.members.write(), member.clone(), |m| m.id);
        Ok(member)
    }

    async fn save_event(&self, mut event: Event) -> StoreResult<Event> {
        assign_event_id(&mut event);
        upsert(&mut *self.events.write(), event.clone(), |e| e.id);
        Ok(event)
    }

    async fn delete_member(&self, id: i64) -> StoreResult<bool> {
        let mut members = self.members.write();
        let before = members.len();
        members.retain(|m| m.id != id);
        Ok(members.len() != before)
    }

    async fn delete_member_cascade(&self, id: i64, updated: Vec<Event>) -> StoreResult<bool> {
        let mut events = self.events.write();
        let mut members = self.members.write();
        for event in updated {
            upsert(&mut *events, event, |e| e.id);
        }
        let before = members.len();
        members.retain(|m| m.id != id);
        Ok(members.len() != before)
    }

    async fn delete_event(&self, id: i64) -> StoreResult<bool> {
        let mut events = self.events.write();
        let before = events.len();
        events.retain(|e| e.id != id);
        Ok(events.len() != before)
    }

    async fn replace_all(&self, members: Vec<Member>, events: Vec<Event>) -> StoreResult<()> {
        *self.members.write() = members;
        *self.events.write() = events;
        Ok(())
    }

    async fn load_event(&self, id: i64) -> StoreResult<Option<Event>> {
        Ok(self.events.read().iter().find(|e| e.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::MemberCreate;

    #[tokio::test]
    async fn test_save_assigns_id_and_upserts() {
        let store = MemoryStore::new();
        let saved = store
            .save_member(MemberCreate::new("Ali").into_member(0))
            .await
            .unwrap();
        assert_ne!(saved.id, 0);

        let mut renamed = saved.clone();
        renamed.name = "Ali B".into();
        store.save_member(renamed).await.unwrap();

        let members = store.load_members().await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "Ali B");
    }

    #[tokio::test]
    async fn test_delete_event() {
        let store = MemoryStore::new();
        let event = store.save_event(Event::new("Meeting", 1)).await.unwrap();
        assert!(store.load_event(event.id).await.unwrap().is_some());
        assert!(store.delete_event(event.id).await.unwrap());
        assert!(!store.delete_event(event.id).await.unwrap());
        assert!(store.load_events().await.unwrap().is_empty());
    }
}
