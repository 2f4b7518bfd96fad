//! Participant Model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::member::Member;

/// Attendance status of a participant within one event
///
/// Any transition is legal; status stays editable indefinitely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationStatus {
    #[default]
    Unmarked,
    Present,
    Absent,
}

impl ParticipationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unmarked => "unmarked",
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }
}

impl fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown status string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown participation status: {0}")]
pub struct InvalidStatus(pub String);

impl FromStr for ParticipationStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unmarked" => Ok(Self::Unmarked),
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

/// Per-event record joining a member to a status and a point value
///
/// Owned by exactly one event; `member_id` is a non-owning reference.
/// Invariant: `status == Absent` implies `points == 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub member_id: i64,
    #[serde(default)]
    pub status: ParticipationStatus,
    #[serde(default)]
    pub points: i64,
}

impl Participant {
    /// Fresh enrollment: unmarked, 0 points
    pub fn new(member_id: i64) -> Self {
        Self {
            member_id,
            status: ParticipationStatus::Unmarked,
            points: 0,
        }
    }

    /// Set the status; marking absent zeroes the points in the same step.
    pub fn set_status(&mut self, status: ParticipationStatus) {
        self.status = status;
        if status == ParticipationStatus::Absent {
            self.points = 0;
        }
    }

    /// Set the points; an absent participant always keeps 0.
    pub fn set_points(&mut self, points: i64) {
        self.points = if self.status == ParticipationStatus::Absent {
            0
        } else {
            points
        };
    }
}

/// Participant with the referenced member record joined in (read views)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedParticipant {
    pub member: Member,
    pub status: ParticipationStatus,
    pub points: i64,
}

/// Combined status/points edit, as sent by an administrator form
///
/// `points` is kept as raw JSON so that garbage input can be coerced
/// rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantUpdate {
    #[serde(default)]
    pub status: Option<ParticipationStatus>,
    #[serde(default)]
    pub points: Option<Value>,
}

/// Coerce administrator text input to points: a trimmed integer, else 0.
pub fn parse_points(raw: &str) -> i64 {
    raw.trim().parse::<i64>().unwrap_or(0)
}

/// Coerce a JSON value to points.
///
/// Integers, integral finite floats and integer strings are accepted;
/// anything else (NaN, fractions, out-of-range, null, objects) becomes 0.
pub fn coerce_points(raw: &Value) -> i64 {
    match raw {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                v
            } else if n.is_u64() {
                0
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                    .map(|f| f as i64)
                    .unwrap_or(0)
            }
        }
        Value::String(s) => parse_points(s),
        _ => 0,
    }
}
