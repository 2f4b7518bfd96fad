use serde::{Deserialize, Serialize};
use shared::models::{Event, Member};
use shared::util::now_millis;
use shared::{AppError, AppResult, ErrorCode};

/// Current backup document version
pub const BACKUP_VERSION: u32 = 1;

/// Full snapshot of the registry and the ledger
///
/// ```json
/// { "version": 1, "exportedAt": 1709640000000, "members": [...], "events": [...] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub exported_at: i64,
    pub members: Vec<Member>,
    pub events: Vec<Event>,
}

fn default_version() -> u32 {
    BACKUP_VERSION
}

impl BackupSnapshot {
    pub fn new(members: Vec<Member>, events: Vec<Event>) -> Self {
        Self {
            version: BACKUP_VERSION,
            exported_at: now_millis(),
            members,
            events,
        }
    }
}

/// Serialize both collections as pretty JSON
pub fn export_all(members: &[Member], events: &[Event]) -> AppResult<String> {
    let snapshot = BackupSnapshot::new(members.to_vec(), events.to_vec());
    serde_json::to_string_pretty(&snapshot)
        .map_err(|e| AppError::internal(format!("Failed to serialize backup: {}", e)))
}

/// Read a backup document
///
/// Fails with `BackupInvalid` on malformed JSON, missing collections, an
/// unsupported version or records without an id.
pub fn parse_backup(text: &str) -> AppResult<BackupSnapshot> {
    let snapshot: BackupSnapshot = serde_json::from_str(text)
        .map_err(|e| AppError::with_message(ErrorCode::BackupInvalid, e.to_string()))?;

    if snapshot.version > BACKUP_VERSION {
        return Err(AppError::with_message(
            ErrorCode::BackupInvalid,
            format!("Unsupported backup version {}", snapshot.version),
        ));
    }
    if snapshot.members.iter().any(|m| m.id == 0) || snapshot.events.iter().any(|e| e.id == 0) {
        return Err(AppError::with_message(
            ErrorCode::BackupInvalid,
            "Backup records must carry an id",
        ));
    }

    Ok(snapshot)
}
