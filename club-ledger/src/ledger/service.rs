use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use shared::models::{
    Event, Member, MemberCreate, Participant, ParticipantUpdate, ParticipationStatus,
    PopulatedEvent, PopulatedParticipant, coerce_points, parse_points, sort_newest_first,
};
use shared::util::now_millis;
use shared::{AppError, AppResult, ErrorCode};
use tokio::sync::Mutex;

use crate::db::LedgerStore;
use crate::registry::MemberRegistry;

/// Participation ledger service
///
/// Every mutation holds the shared write lock across its
/// load-modify-save sequence, so updates from concurrent administrators
/// are serialized instead of lost.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    registry: MemberRegistry,
    write_lock: Arc<Mutex<()>>,
}

impl LedgerService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        registry: MemberRegistry,
        write_lock: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            store,
            registry,
            write_lock,
        }
    }

    pub fn registry(&self) -> &MemberRegistry {
        &self.registry
    }

    // ========== Events ==========

    /// Create an event dated now with no participants
    pub async fn create_event(&self, name: &str) -> AppResult<Event> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::new(ErrorCode::EventNameRequired));
        }

        let _guard = self.write_lock.lock().await;
        let event = self.store.save_event(Event::new(name, now_millis())).await?;
        tracing::info!(event_id = event.id, name = %event.name, "Event created");
        Ok(event)
    }

    /// All events, newest first
    pub async fn list_events(&self) -> AppResult<Vec<Event>> {
        let mut events = self.store.load_events().await?;
        sort_newest_first(&mut events);
        Ok(events)
    }

    pub async fn get_event(&self, event_id: i64) -> AppResult<Event> {
        self.store
            .load_event(event_id)
            .await?
            .ok_or_else(|| AppError::event_not_found(event_id))
    }

    /// Delete an event together with all its participant entries
    pub async fn delete_event(&self, event_id: i64) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        if !self.store.delete_event(event_id).await? {
            return Err(AppError::event_not_found(event_id));
        }
        tracing::info!(event_id, "Event deleted");
        Ok(())
    }

    // ========== Participants ==========

    /// Append an unmarked, zero-point entry for the member
    ///
    /// Rejected with `ParticipantAlreadyEnrolled` when the member already
    /// has an entry; the participant list is left untouched.
    pub async fn enroll(&self, event_id: i64, member_id: i64) -> AppResult<Event> {
        let _guard = self.write_lock.lock().await;
        let mut event = self.get_event(event_id).await?;

        if event.is_enrolled(member_id) {
            return Err(AppError::already_enrolled(event_id, member_id));
        }
        if self.registry.find_by_id(member_id).await?.is_none() {
            return Err(AppError::member_not_found(member_id));
        }

        event.participants.push(Participant::new(member_id));
        let event = self.store.save_event(event).await?;
        tracing::info!(event_id, member_id, "Member enrolled");
        Ok(event)
    }

    /// Remove the member's entry; a member who is not enrolled is not an error
    pub async fn unenroll(&self, event_id: i64, member_id: i64) -> AppResult<Event> {
        let _guard = self.write_lock.lock().await;
        let mut event = self.get_event(event_id).await?;

        if !event.remove_participant(member_id) {
            tracing::debug!(event_id, member_id, "Unenroll: member was not enrolled");
            return Ok(event);
        }

        let event = self.store.save_event(event).await?;
        tracing::info!(event_id, member_id, "Member unenrolled");
        Ok(event)
    }

    /// Set the attendance status; `Absent` zeroes the points in the same save
    pub async fn set_status(
        &self,
        event_id: i64,
        member_id: i64,
        status: ParticipationStatus,
    ) -> AppResult<Event> {
        self.modify_participant(event_id, member_id, |p| p.set_status(status))
            .await
            .inspect(|_| tracing::info!(event_id, member_id, status = %status, "Status set"))
    }

    /// Set the points; an absent participant keeps 0
    pub async fn set_points(&self, event_id: i64, member_id: i64, points: i64) -> AppResult<Event> {
        self.modify_participant(event_id, member_id, |p| p.set_points(points))
            .await
            .inspect(|_| tracing::info!(event_id, member_id, points, "Points set"))
    }

    /// Set the points from raw administrator input; anything that is not an
    /// integer is stored as 0.
    pub async fn set_points_input(
        &self,
        event_id: i64,
        member_id: i64,
        raw: &str,
    ) -> AppResult<Event> {
        self.set_points(event_id, member_id, parse_points(raw)).await
    }

    /// Combined status/points edit; status is applied first so `Absent` wins
    pub async fn update_participant(
        &self,
        event_id: i64,
        member_id: i64,
        update: ParticipantUpdate,
    ) -> AppResult<Event> {
        self.modify_participant(event_id, member_id, |p| {
            if let Some(status) = update.status {
                p.set_status(status);
            }
            if let Some(points) = &update.points {
                p.set_points(coerce_points(points));
            }
        })
        .await
        .inspect(|_| tracing::info!(event_id, member_id, "Participant updated"))
    }

    /// Register a member then enroll them
    ///
    /// A failed registration enrolls nobody. A failed enrollment after a
    /// successful registration leaves the member registered.
    pub async fn enroll_new(&self, event_id: i64, candidate: MemberCreate) -> AppResult<Event> {
        let member = self.registry.register(candidate).await?;
        self.enroll(event_id, member.id).await.inspect_err(|e| {
            tracing::warn!(
                event_id,
                member_id = member.id,
                error = %e,
                "Member registered but enrollment failed; registration kept"
            );
        })
    }

    async fn modify_participant<F>(&self, event_id: i64, member_id: i64, f: F) -> AppResult<Event>
    where
        F: FnOnce(&mut Participant),
    {
        let _guard = self.write_lock.lock().await;
        let mut event = self.get_event(event_id).await?;
        let participant = event
            .participant_mut(member_id)
            .ok_or_else(|| AppError::participant_not_found(event_id, member_id))?;
        f(participant);
        Ok(self.store.save_event(event).await?)
    }

    // ========== Members ==========

    /// Delete a member and every participant entry referring to them
    ///
    /// The edited events and the member deletion go to the store as one
    /// write, so a failure leaves both untouched.
    pub async fn delete_member(&self, member_id: i64) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        if self.registry.find_by_id(member_id).await?.is_none() {
            return Err(AppError::member_not_found(member_id));
        }

        let touched: Vec<Event> = self
            .store
            .load_events()
            .await?
            .into_iter()
            .filter_map(|mut event| event.remove_participant(member_id).then_some(event))
            .collect();
        let removed = touched.len();

        self.store
            .delete_member_cascade(member_id, touched)
            .await
            .inspect_err(|e| tracing::error!(member_id, error = %e, "Member deletion failed"))?;

        tracing::info!(member_id, removed_entries = removed, "Member deleted");
        Ok(())
    }

    // ========== Views & restore ==========

    /// Join each participant with its member record
    ///
    /// Entries whose member no longer exists are left out.
    pub async fn populate(&self, event: &Event) -> AppResult<PopulatedEvent> {
        let members: HashMap<i64, Member> = self
            .store
            .load_members()
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let participants = event
            .participants
            .iter()
            .filter_map(|p| match members.get(&p.member_id) {
                Some(member) => Some(PopulatedParticipant {
                    member: member.clone(),
                    status: p.status,
                    points: p.points,
                }),
                None => {
                    tracing::warn!(
                        event_id = event.id,
                        member_id = p.member_id,
                        "Participant refers to an unknown member"
                    );
                    None
                }
            })
            .collect();

        Ok(PopulatedEvent {
            id: event.id,
            name: event.name.clone(),
            date: event.date,
            participants,
        })
    }

    /// Replace the whole registry and ledger
    ///
    /// Members are checked first: ids and CNIs must be unique (CNIs compared
    /// after normalization, and stored normalized). Incoming events are then
    /// brought back in line with the ledger rules: entries for members outside
    /// the snapshot are dropped, duplicate entries for a member are dropped
    /// (first one kept) and absent entries carry 0 points.
    pub async fn restore(&self, mut members: Vec<Member>, mut events: Vec<Event>) -> AppResult<()> {
        normalize_members(&mut members)?;
        check_event_ids(&events)?;

        let known: HashSet<i64> = members.iter().map(|m| m.id).collect();
        for event in &mut events {
            normalize_participants(event, &known);
        }

        let _guard = self.write_lock.lock().await;
        let (member_count, event_count) = (members.len(), events.len());
        self.store.replace_all(members, events).await?;
        tracing::info!(members = member_count, events = event_count, "Ledger restored");
        Ok(())
    }
}

fn normalize_members(members: &mut [Member]) -> AppResult<()> {
    let mut ids = HashSet::new();
    let mut cnis = HashSet::new();
    for member in members.iter_mut() {
        if !ids.insert(member.id) {
            return Err(AppError::with_message(
                ErrorCode::BackupInvalid,
                format!("Member id {} appears more than once", member.id),
            )
            .with_detail("member_id", member.id));
        }

        member.cni = member.cni_key();
        if let Some(cni) = &member.cni
            && !cnis.insert(cni.clone())
        {
            return Err(AppError::with_message(
                ErrorCode::BackupInvalid,
                format!("CNI {cni} belongs to more than one member"),
            )
            .with_detail("cni", cni.clone()));
        }
    }
    Ok(())
}

fn check_event_ids(events: &[Event]) -> AppResult<()> {
    let mut ids = HashSet::new();
    match events.iter().find(|e| !ids.insert(e.id)) {
        Some(event) => Err(AppError::with_message(
            ErrorCode::BackupInvalid,
            format!("Event id {} appears more than once", event.id),
        )
        .with_detail("event_id", event.id)),
        None => Ok(()),
    }
}

fn normalize_participants(event: &mut Event, known_members: &HashSet<i64>) {
    let before = event.participants.len();
    event
        .participants
        .retain(|p| known_members.contains(&p.member_id));
    let orphans = before - event.participants.len();

    let mut seen = HashSet::new();
    event.participants.retain(|p| seen.insert(p.member_id));
    let duplicates = before - orphans - event.participants.len();

    if orphans > 0 || duplicates > 0 {
        tracing::warn!(
            event_id = event.id,
            orphans,
            duplicates,
            "Dropped participant entries from restored event"
        );
    }
    for p in &mut event.participants {
        if p.status == ParticipationStatus::Absent {
            p.points = 0;
        }
    }
}
