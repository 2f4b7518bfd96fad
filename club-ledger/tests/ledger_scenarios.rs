//! End-to-end ledger scenarios, run against every storage backend
//!
//! Each scenario builds a fresh `ClubState` per backend (memory, JSON file,
//! redb file) and must behave identically on all of them.

use club_ledger::aggregation::{member_summary, participation_history, total_points};
use club_ledger::transfer::{
    self, export_participants, import_members, parse_participant_export,
};
use club_ledger::{ClubState, Config, StorageBackend};
use shared::ErrorCode;
use shared::models::{MemberCreate, ParticipationStatus};
use tempfile::TempDir;

const BACKENDS: [StorageBackend; 3] = [
    StorageBackend::Memory,
    StorageBackend::Json,
    StorageBackend::Redb,
];

fn open(backend: StorageBackend) -> (ClubState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::with_overrides(dir.path(), backend);
    config.admin_credentials = vec![("admin".into(), "password".into())];
    let state = ClubState::initialize(&config).unwrap();
    (state, dir)
}

#[tokio::test]
async fn weekly_meeting_points_follow_attendance() {
    for backend in BACKENDS {
        let (state, _dir) = open(backend);
        let ledger = &state.ledger;

        let event = ledger.create_event("Weekly Meeting").await.unwrap();
        let ali = state
            .registry
            .register(MemberCreate::new("Ali").with_cni("X1"))
            .await
            .unwrap();

        let event = ledger.enroll(event.id, ali.id).await.unwrap();
        assert_eq!(event.participants.len(), 1, "{backend}");
        let p = &event.participants[0];
        assert_eq!((p.status, p.points), (ParticipationStatus::Unmarked, 0));

        ledger
            .set_status(event.id, ali.id, ParticipationStatus::Present)
            .await
            .unwrap();
        ledger.set_points(event.id, ali.id, 5).await.unwrap();
        let events = ledger.list_events().await.unwrap();
        assert_eq!(total_points(ali.id, &events), 5, "{backend}");

        let event = ledger
            .set_status(event.id, ali.id, ParticipationStatus::Absent)
            .await
            .unwrap();
        assert_eq!(event.participants[0].points, 0, "{backend}");
        let events = ledger.list_events().await.unwrap();
        assert_eq!(total_points(ali.id, &events), 0, "{backend}");

        let history = participation_history(ali.id, &events);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event_name, "Weekly Meeting");
        assert_eq!(history[0].status, ParticipationStatus::Absent);
    }
}

#[tokio::test]
async fn duplicate_cni_leaves_registry_unchanged() {
    for backend in BACKENDS {
        let (state, _dir) = open(backend);
        state
            .registry
            .register(MemberCreate::new("Ali").with_cni("AB12"))
            .await
            .unwrap();

        let err = state
            .registry
            .register(MemberCreate::new("Someone else").with_cni("ab12"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MemberCniExists, "{backend}");
        assert_eq!(state.registry.list().await.unwrap().len(), 1, "{backend}");
    }
}

#[tokio::test]
async fn double_enrollment_keeps_a_single_entry() {
    for backend in BACKENDS {
        let (state, _dir) = open(backend);
        let event = state.ledger.create_event("Workshop").await.unwrap();
        let sara = state
            .registry
            .register(MemberCreate::new("Sara"))
            .await
            .unwrap();

        state.ledger.enroll(event.id, sara.id).await.unwrap();
        let err = state.ledger.enroll(event.id, sara.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ParticipantAlreadyEnrolled);

        let event = state.ledger.get_event(event.id).await.unwrap();
        let entries = event
            .participants
            .iter()
            .filter(|p| p.member_id == sara.id)
            .count();
        assert_eq!(entries, 1, "{backend}");
    }
}

#[tokio::test]
async fn unenrolling_a_stranger_is_a_no_op() {
    for backend in BACKENDS {
        let (state, _dir) = open(backend);
        let event = state.ledger.create_event("Hackathon").await.unwrap();
        let after = state.ledger.unenroll(event.id, 12345).await.unwrap();
        assert_eq!(after, event, "{backend}");
    }
}

#[tokio::test]
async fn non_numeric_points_are_stored_as_zero() {
    for backend in BACKENDS {
        let (state, _dir) = open(backend);
        let event = state.ledger.create_event("Quiz").await.unwrap();
        let event = state
            .ledger
            .enroll_new(event.id, MemberCreate::new("Youssef"))
            .await
            .unwrap();
        let member_id = event.participants[0].member_id;

        for raw in ["ten", "NaN", "3.7", "", "1e3"] {
            state.ledger.set_points(event.id, member_id, 8).await.unwrap();
            let event = state
                .ledger
                .set_points_input(event.id, member_id, raw)
                .await
                .unwrap();
            assert_eq!(event.participants[0].points, 0, "{backend} {raw:?}");
        }
    }
}

#[tokio::test]
async fn import_batch_with_duplicate_row() {
    for backend in BACKENDS {
        let (state, _dir) = open(backend);
        let csv = "Nom complet,CNI,Niveau scolaire\n\
                   Ali Ben,X1,Bac\n\
                   Ali Copy,x1,Bac\n\
                   Sara Alaoui,K2,Master\n";

        let report = import_members(&state.registry, csv).await.unwrap();
        assert_eq!((report.imported, report.skipped), (2, 1), "{backend}");
        assert_eq!(report.skipped_rows[0].row, 2);
        assert_eq!(state.registry.list().await.unwrap().len(), 2);

        let report = import_members(&state.registry, csv).await.unwrap();
        assert_eq!((report.imported, report.skipped), (0, 3), "{backend}");
    }
}

#[tokio::test]
async fn participant_export_reads_back() {
    for backend in BACKENDS {
        let (state, _dir) = open(backend);
        let ledger = &state.ledger;
        let event = ledger.create_event("Weekly Meeting").await.unwrap();
        let event = ledger
            .enroll_new(event.id, MemberCreate::new("Ali, \"A\"").with_cni("A1"))
            .await
            .unwrap();
        let event = ledger
            .enroll_new(event.id, MemberCreate::new("Brahim").with_cni("B1"))
            .await
            .unwrap();
        let (a, b) = (event.participants[0].member_id, event.participants[1].member_id);

        ledger
            .set_status(event.id, a, ParticipationStatus::Present)
            .await
            .unwrap();
        ledger.set_points(event.id, a, 10).await.unwrap();
        let event = ledger
            .set_status(event.id, b, ParticipationStatus::Absent)
            .await
            .unwrap();

        let members = state.registry.list().await.unwrap();
        let rows = parse_participant_export(&export_participants(&event, &members)).unwrap();
        let tuples: Vec<_> = rows
            .into_iter()
            .map(|r| (r.name, r.status, r.points))
            .collect();
        assert_eq!(
            tuples,
            vec![
                ("Ali, \"A\"".to_string(), ParticipationStatus::Present, 10),
                ("Brahim".to_string(), ParticipationStatus::Absent, 0),
            ],
            "{backend}"
        );
    }
}

#[tokio::test]
async fn backup_restores_into_another_backend() {
    let (source, _src_dir) = open(StorageBackend::Json);
    let event = source.ledger.create_event("Weekly Meeting").await.unwrap();
    let event = source
        .ledger
        .enroll_new(event.id, MemberCreate::new("Ali").with_cni("X1"))
        .await
        .unwrap();
    let ali = event.participants[0].member_id;
    source
        .ledger
        .set_status(event.id, ali, ParticipationStatus::Present)
        .await
        .unwrap();
    source.ledger.set_points(event.id, ali, 7).await.unwrap();

    let json = transfer::backup(&source.ledger).await.unwrap();

    let (target, _dst_dir) = open(StorageBackend::Redb);
    target
        .ledger
        .enroll_new(
            target.ledger.create_event("Stale").await.unwrap().id,
            MemberCreate::new("Stale member"),
        )
        .await
        .unwrap();
    transfer::restore(&target.ledger, &json).await.unwrap();

    let summary = member_summary(&target.ledger, "X1").await.unwrap();
    assert_eq!(summary.member.id, ali);
    assert_eq!(summary.total_points, 7);
    assert_eq!(target.registry.list().await.unwrap().len(), 1);
    assert_eq!(target.ledger.list_events().await.unwrap().len(), 1);
}

#[tokio::test]
async fn file_backends_survive_reopen() {
    for backend in [StorageBackend::Json, StorageBackend::Redb] {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_overrides(dir.path(), backend);

        let event_id = {
            let state = ClubState::initialize(&config).unwrap();
            let event = state.ledger.create_event("Persisted").await.unwrap();
            state
                .ledger
                .enroll_new(event.id, MemberCreate::new("Sara").with_cni("S1"))
                .await
                .unwrap()
                .id
        };

        let state = ClubState::initialize(&config).unwrap();
        let event = state.ledger.get_event(event_id).await.unwrap();
        assert_eq!(event.participants.len(), 1, "{backend}");
        assert!(state.registry.find_by_cni("s1").await.unwrap().is_some());
    }
}

#[tokio::test]
async fn largest_point_values_do_not_overflow_totals() {
    for backend in BACKENDS {
        let (state, _dir) = open(backend);
        let ali = state
            .registry
            .register(MemberCreate::new("Ali").with_cni("X1"))
            .await
            .unwrap();

        for name in ["Marathon", "Relay"] {
            let event = state.ledger.create_event(name).await.unwrap();
            state.ledger.enroll(event.id, ali.id).await.unwrap();
            state
                .ledger
                .set_status(event.id, ali.id, ParticipationStatus::Present)
                .await
                .unwrap();
            state
                .ledger
                .set_points_input(event.id, ali.id, "9223372036854775807")
                .await
                .unwrap();
        }

        let events = state.ledger.list_events().await.unwrap();
        assert_eq!(total_points(ali.id, &events), i64::MAX, "{backend}");
        let summary = member_summary(&state.ledger, "x1").await.unwrap();
        assert_eq!(summary.total_points, i64::MAX, "{backend}");
    }
}

#[tokio::test]
async fn backup_with_shared_cni_is_refused() {
    let backup = r#"{
        "version": 1,
        "members": [
            {"id": 1, "name": "Ali", "cni": "X1"},
            {"id": 2, "name": "Ali again", "cni": "x1"}
        ],
        "events": []
    }"#;

    for backend in BACKENDS {
        let (state, _dir) = open(backend);
        state
            .registry
            .register(MemberCreate::new("Current").with_cni("C1"))
            .await
            .unwrap();

        let err = transfer::restore(&state.ledger, backup).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BackupInvalid, "{backend}");

        let members = state.registry.list().await.unwrap();
        assert_eq!(members.len(), 1, "{backend}");
        assert_eq!(members[0].name, "Current");
    }
}

#[tokio::test]
async fn restored_cnis_are_found_case_insensitively() {
    let backup = r#"{
        "members": [{"id": 7, "name": "Sara", "cni": " AB99 "}],
        "events": [{
            "id": 3, "name": "Weekly Meeting", "date": 1000,
            "participants": [
                {"memberId": 7, "status": "present", "points": 4},
                {"memberId": 8, "status": "present", "points": 9}
            ]
        }]
    }"#;

    for backend in BACKENDS {
        let (state, _dir) = open(backend);
        transfer::restore(&state.ledger, backup).await.unwrap();

        let sara = state.registry.find_by_cni("ab99").await.unwrap().unwrap();
        assert_eq!(sara.cni.as_deref(), Some("ab99"), "{backend}");

        let event = state.ledger.get_event(3).await.unwrap();
        assert_eq!(event.participants.len(), 1, "{backend}");
        assert_eq!(event.points_total(), 4, "{backend}");
    }
}

#[tokio::test]
async fn self_service_lookup_for_unknown_cni() {
    let (state, _dir) = open(StorageBackend::Memory);
    let err = member_summary(&state.ledger, "nobody").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::MemberNotFound);
    assert!(state.ledger.list_events().await.unwrap().is_empty());
}
