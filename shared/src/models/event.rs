//! Event Model

use serde::{Deserialize, Serialize};

use super::participant::{Participant, PopulatedParticipant};

/// Event entity (a session members attend and earn points in)
///
/// `participants` keeps enrollment order and holds at most one entry
/// per member id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    /// Creation time, milliseconds since the Unix epoch
    pub date: i64,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl Event {
    /// Unsaved event with no participants
    pub fn new(name: impl Into<String>, date: i64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            date,
            participants: Vec::new(),
        }
    }

    pub fn participant(&self, member_id: i64) -> Option<&Participant> {
        self.participants.iter().find(|p| p.member_id == member_id)
    }

    pub fn participant_mut(&mut self, member_id: i64) -> Option<&mut Participant> {
        self.participants
            .iter_mut()
            .find(|p| p.member_id == member_id)
    }

    pub fn is_enrolled(&self, member_id: i64) -> bool {
        self.participant(member_id).is_some()
    }

    /// Remove a member's entry; returns whether one was present.
    pub fn remove_participant(&mut self, member_id: i64) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p.member_id != member_id);
        self.participants.len() != before
    }

    /// Sum of all participant points, saturating at the `i64` bounds
    pub fn points_total(&self) -> i64 {
        self.participants
            .iter()
            .fold(0, |total, p| total.saturating_add(p.points))
    }
}

/// Event with participants' member records joined in (read views)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedEvent {
    pub id: i64,
    pub name: String,
    pub date: i64,
    pub participants: Vec<PopulatedParticipant>,
}

/// Newest first by date; ties broken by the newer id.
pub fn sort_newest_first(events: &mut [Event]) {
    events.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParticipationStatus;

    #[test]
    fn test_participant_lookup_and_removal() {
        let mut event = Event::new("Weekly Meeting", 1);
        event.participants.push(Participant::new(1));
        event.participants.push(Participant::new(2));

        assert!(event.is_enrolled(2));
        assert!(!event.is_enrolled(3));

        event
            .participant_mut(2)
            .unwrap()
            .set_status(ParticipationStatus::Present);
        assert_eq!(
            event.participant(2).unwrap().status,
            ParticipationStatus::Present
        );

        assert!(event.remove_participant(1));
        assert!(!event.remove_participant(1));
        assert_eq!(event.participants.len(), 1);
    }

    #[test]
    fn test_points_total() {
        let mut event = Event::new("Workshop", 1);
        let mut a = Participant::new(1);
        a.set_points(4);
        let mut b = Participant::new(2);
        b.set_points(6);
        event.participants = vec![a, b];
        assert_eq!(event.points_total(), 10);

        event.participants[0].set_points(i64::MAX);
        assert_eq!(event.points_total(), i64::MAX);
    }

    #[test]
    fn test_sort_newest_first() {
        let mut events = vec![
            Event { id: 1, ..Event::new("old", 100) },
            Event { id: 3, ..Event::new("new", 300) },
            Event { id: 2, ..Event::new("tie-low", 200) },
            Event { id: 4, ..Event::new("tie-high", 200) },
        ];
        sort_newest_first(&mut events);
        let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["new", "tie-high", "tie-low", "old"]);
    }
}
