//! Aggregation View
//!
//! Read-only derivations over the registry and the ledger: point totals,
//! per-member history and the self-service summary.

use serde::{Deserialize, Serialize};
use shared::models::{Event, Member, ParticipationStatus};
use shared::{AppError, AppResult, ErrorCode};

use crate::ledger::LedgerService;

/// One event a member took part in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub event_id: i64,
    pub event_name: String,
    pub event_date: i64,
    pub status: ParticipationStatus,
    pub points: i64,
}

/// Present / absent / unmarked entry counts for one member
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceCounts {
    pub present: usize,
    pub absent: usize,
    pub unmarked: usize,
}

impl AttendanceCounts {
    pub fn total(&self) -> usize {
        self.present + self.absent + self.unmarked
    }
}

/// Self-service lookup result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub member: Member,
    pub total_points: i64,
    pub attendance: AttendanceCounts,
    pub history: Vec<HistoryEntry>,
}

/// Sum of the member's points over every event, saturating at the `i64` bounds
pub fn total_points(member_id: i64, events: &[Event]) -> i64 {
    events
        .iter()
        .filter_map(|e| e.participant(member_id))
        .fold(0, |total, p| total.saturating_add(p.points))
}

/// One row per event the member has an entry in, in the given event order
pub fn participation_history(member_id: i64, events: &[Event]) -> Vec<HistoryEntry> {
    events
        .iter()
        .filter_map(|event| {
            event.participant(member_id).map(|p| HistoryEntry {
                event_id: event.id,
                event_name: event.name.clone(),
                event_date: event.date,
                status: p.status,
                points: p.points,
            })
        })
        .collect()
}

/// Total points awarded in one event
pub fn event_points_total(event: &Event) -> i64 {
    event.points_total()
}

pub fn attendance_counts(member_id: i64, events: &[Event]) -> AttendanceCounts {
    events
        .iter()
        .filter_map(|e| e.participant(member_id))
        .fold(AttendanceCounts::default(), |mut counts, p| {
            match p.status {
                ParticipationStatus::Present => counts.present += 1,
                ParticipationStatus::Absent => counts.absent += 1,
                ParticipationStatus::Unmarked => counts.unmarked += 1,
            }
            counts
        })
}

/// Look a member up by CNI and summarize their participation
///
/// History is newest first. Fails with `MemberNotFound` when no member
/// has that CNI.
pub async fn member_summary(ledger: &LedgerService, cni: &str) -> AppResult<MemberSummary> {
    let member = ledger
        .registry()
        .find_by_cni(cni)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::MemberNotFound, "No member with this CNI")
                .with_detail("cni", cni.trim())
        })?;

    let events = ledger.list_events().await?;
    tracing::debug!(member_id = member.id, events = events.len(), "Building member summary");

    Ok(MemberSummary {
        total_points: total_points(member.id, &events),
        attendance: attendance_counts(member.id, &events),
        history: participation_history(member.id, &events),
        member,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Participant;

    fn entry(member_id: i64, status: ParticipationStatus, points: i64) -> Participant {
        let mut p = Participant::new(member_id);
        p.set_status(status);
        p.set_points(points);
        p
    }

    fn sample_events() -> Vec<Event> {
        vec![
            Event {
                id: 3,
                participants: vec![entry(1, ParticipationStatus::Present, 5)],
                ..Event::new("Hackathon", 300)
            },
            Event {
                id: 2,
                participants: vec![
                    entry(2, ParticipationStatus::Present, 10),
                    entry(1, ParticipationStatus::Absent, 7),
                ],
                ..Event::new("Workshop", 200)
            },
            Event {
                id: 1,
                participants: vec![entry(1, ParticipationStatus::Unmarked, 2)],
                ..Event::new("Weekly Meeting", 100)
            },
        ]
    }

    #[test]
    fn test_total_points_ignores_absent_entries() {
        let events = sample_events();
        assert_eq!(total_points(1, &events), 7);
        assert_eq!(total_points(2, &events), 10);
        assert_eq!(total_points(99, &events), 0);
        assert_eq!(total_points(1, &[]), 0);
    }

    #[test]
    fn test_history_follows_event_order() {
        let history = participation_history(1, &sample_events());
        let names: Vec<_> = history.iter().map(|h| h.event_name.as_str()).collect();
        assert_eq!(names, vec!["Hackathon", "Workshop", "Weekly Meeting"]);
        assert_eq!(history[1].status, ParticipationStatus::Absent);
        assert_eq!(history[1].points, 0);

        assert!(participation_history(99, &sample_events()).is_empty());
    }

    #[test]
    fn test_attendance_counts() {
        let counts = attendance_counts(1, &sample_events());
        assert_eq!(
            counts,
            AttendanceCounts {
                present: 1,
                absent: 1,
                unmarked: 1
            }
        );
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_event_points_total() {
        let events = sample_events();
        assert_eq!(event_points_total(&events[1]), 10);
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let huge = |id, member| Event {
            id,
            participants: vec![entry(member, ParticipationStatus::Present, i64::MAX)],
            ..Event::new("Marathon", id)
        };
        let events = vec![huge(1, 1), huge(2, 1)];
        assert_eq!(total_points(1, &events), i64::MAX);

        let mut negative = huge(3, 1);
        negative.participants[0].set_points(i64::MIN);
        assert_eq!(total_points(1, &[negative.clone(), negative]), i64::MIN);

        let mut crowded = huge(4, 1);
        crowded
            .participants
            .push(entry(2, ParticipationStatus::Present, i64::MAX));
        assert_eq!(event_points_total(&crowded), i64::MAX);
    }
}
