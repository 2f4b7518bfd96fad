//! Import/Export Adapter
//!
//! | Format | Direction | Functions |
//! |--------|-----------|-----------|
//! | member list (CSV) | in | [`parse_import`], [`import_members`] |
//! | participants of one event (CSV) | out / in | [`export_participants`], [`parse_participant_export`] |
//! | participation report (CSV) | out | [`export_participation_report`] |
//! | full backup (JSON) | out / in | [`export_all`], [`parse_backup`] |
//!
//! Everything here works on text; reading and writing files is the caller's job.

pub mod backup;
pub mod csv;
pub mod export;
pub mod import;

pub use backup::{BACKUP_VERSION, BackupSnapshot, export_all, parse_backup};
pub use export::{
    ParticipantRow, export_file_name, export_participants, export_participation_report,
    parse_participant_export, report_file_name,
};
pub use import::{
    ImportCandidate, ImportReport, ParsedImport, SkipReason, SkippedRow, import_members,
    parse_import,
};

use shared::AppResult;

use crate::ledger::LedgerService;

/// Snapshot the current registry and ledger as a backup document
pub async fn backup(ledger: &LedgerService) -> AppResult<String> {
    let members = ledger.registry().list().await?;
    let events = ledger.list_events().await?;
    tracing::info!(members = members.len(), events = events.len(), "Exporting backup");
    export_all(&members, &events)
}

/// Replace the registry and ledger with a backup document
///
/// A document whose members share an id or a CNI is refused with
/// `BackupInvalid` and the current data is kept.
pub async fn restore(ledger: &LedgerService, text: &str) -> AppResult<BackupSnapshot> {
    let snapshot = parse_backup(text)?;
    ledger
        .restore(snapshot.members.clone(), snapshot.events.clone())
        .await?;
    Ok(snapshot)
}

/// Participant export of one event, with its download file name
pub async fn export_event(ledger: &LedgerService, event_id: i64) -> AppResult<(String, String)> {
    let event = ledger.get_event(event_id).await?;
    let members = ledger.registry().list().await?;
    Ok((export_file_name(&event), export_participants(&event, &members)))
}
