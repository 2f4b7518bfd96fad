use std::collections::HashMap;

use shared::models::{Event, Member, ParticipationStatus};
use shared::util::format_date;
use shared::{AppError, AppResult};

use super::csv::{escape_field, find_column, join_record, parse_records, quote_field};
use super::import::{COL_CNI, COL_CNE, COL_NAME, COL_SCHOOL_LEVEL, COL_WHATSAPP};

pub const COL_STATUS: &str = "Status";
pub const COL_POINTS: &str = "Points";
pub const COL_ACTIVITY: &str = "Activity";

/// Header of the per-event participant export
pub const PARTICIPANT_HEADER: [&str; 7] = [
    COL_NAME,
    COL_CNI,
    COL_CNE,
    COL_SCHOOL_LEVEL,
    COL_WHATSAPP,
    COL_STATUS,
    COL_POINTS,
];

/// Header of the all-events participation report
pub const REPORT_HEADER: [&str; 6] = [
    COL_NAME,
    COL_CNI,
    COL_SCHOOL_LEVEL,
    COL_WHATSAPP,
    COL_ACTIVITY,
    COL_POINTS,
];

/// One row of a participant export, read back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRow {
    pub name: String,
    pub cni: Option<String>,
    pub cne: Option<String>,
    pub school_level: Option<String>,
    pub whatsapp: Option<String>,
    pub status: ParticipationStatus,
    pub points: i64,
}

fn index_members(members: &[Member]) -> HashMap<i64, &Member> {
    members.iter().map(|m| (m.id, m)).collect()
}

fn opt(value: &Option<String>) -> String {
    value.as_deref().map(escape_field).unwrap_or_default()
}

/// One row per participant, in enrollment order
///
/// Member fields are resolved against `members`; entries whose member is
/// unknown are left out. The name is always quoted.
pub fn export_participants(event: &Event, members: &[Member]) -> String {
    let by_id = index_members(members);
    let mut lines = vec![join_record(PARTICIPANT_HEADER)];

    for p in &event.participants {
        let Some(member) = by_id.get(&p.member_id) else {
            tracing::warn!(event_id = event.id, member_id = p.member_id, "Export: unknown member");
            continue;
        };
        lines.push(join_record([
            quote_field(&member.name),
            opt(&member.cni),
            opt(&member.cne),
            opt(&member.school_level),
            opt(&member.whatsapp),
            p.status.to_string(),
            p.points.to_string(),
        ]));
    }

    lines.join("\n")
}

/// Read a participant export back into rows
///
/// Columns are located by header name; an unknown status fails the parse,
/// non-numeric points read as 0.
pub fn parse_participant_export(text: &str) -> AppResult<Vec<ParticipantRow>> {
    let mut records = parse_records(text).into_iter();
    let header = records
        .next()
        .ok_or_else(|| AppError::import_format("Export file is empty"))?;

    let find = |wanted: &str| find_column(&header, wanted);
    let column = |wanted: &str| {
        find(wanted)
            .ok_or_else(|| AppError::import_format(format!("Missing column \"{}\"", wanted)))
    };

    let name = column(COL_NAME)?;
    let status = column(COL_STATUS)?;
    let points = column(COL_POINTS)?;
    let (cni, cne, level, whatsapp) = (
        find(COL_CNI),
        find(COL_CNE),
        find(COL_SCHOOL_LEVEL),
        find(COL_WHATSAPP),
    );

    let get = |record: &[String], index: Option<usize>| {
        shared::util::non_blank(index.and_then(|i| record.get(i)).map(String::as_str))
    };

    records
        .map(|record| {
            let status_text = get(&record, Some(status)).unwrap_or_default();
            let status = status_text.parse::<ParticipationStatus>().map_err(|e| {
                AppError::import_format(e.to_string()).with_detail("value", status_text.clone())
            })?;
            Ok(ParticipantRow {
                name: get(&record, Some(name)).unwrap_or_default(),
                cni: get(&record, cni),
                cne: get(&record, cne),
                school_level: get(&record, level),
                whatsapp: get(&record, whatsapp),
                status,
                points: shared::models::parse_points(
                    &get(&record, Some(points)).unwrap_or_default(),
                ),
            })
        })
        .collect()
}

/// All participant entries across all events, in the given event order
pub fn export_participation_report(members: &[Member], events: &[Event]) -> String {
    let by_id = index_members(members);
    let mut lines = vec![join_record(REPORT_HEADER)];

    for event in events {
        for p in &event.participants {
            let Some(member) = by_id.get(&p.member_id) else {
                continue;
            };
            lines.push(join_record([
                quote_field(&member.name),
                opt(&member.cni),
                opt(&member.school_level),
                opt(&member.whatsapp),
                escape_field(&event.name),
                p.points.to_string(),
            ]));
        }
    }

    lines.join("\n")
}

/// `Participants_<event name, whitespace runs as _>.csv`
pub fn export_file_name(event: &Event) -> String {
    let name = event.name.split_whitespace().collect::<Vec<_>>().join("_");
    format!("Participants_{}.csv", name)
}

/// `club_participation_report_<YYYY-MM-DD>.csv`
pub fn report_file_name(now_millis: i64) -> String {
    format!("club_participation_report_{}.csv", format_date(now_millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{MemberCreate, Participant};

    fn member(id: i64, create: MemberCreate) -> Member {
        Member {
            id,
            ..create.into_member(0)
        }
    }

    fn fixture() -> (Vec<Member>, Event) {
        let members = vec![
            member(1, MemberCreate::new("Ali, \"the\" Great").with_cni("X1")),
            member(2, MemberCreate::new("Sara").with_whatsapp("0611")),
        ];
        let mut a = Participant::new(1);
        a.set_status(ParticipationStatus::Present);
        a.set_points(10);
        let mut b = Participant::new(2);
        b.set_status(ParticipationStatus::Absent);
        let event = Event {
            id: 9,
            participants: vec![a, b, Participant::new(3)],
            ..Event::new("Weekly  Meeting", 0)
        };
        (members, event)
    }

    #[test]
    fn test_export_participants_layout() {
        let (members, event) = fixture();
        let text = export_participants(&event, &members);
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Nom complet,CNI,CNE,Niveau scolaire,Numéro WhatsApp,Status,Points"
        );
        assert_eq!(lines[1], "\"Ali, \"\"the\"\" Great\",x1,,,,present,10");
        assert_eq!(lines[2], "\"Sara\",,,,0611,absent,0");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_participant_export_reads_back() {
        let (members, event) = fixture();
        let rows = parse_participant_export(&export_participants(&event, &members)).unwrap();
        let tuples: Vec<_> = rows
            .iter()
            .map(|r| (r.name.as_str(), r.status, r.points))
            .collect();
        assert_eq!(
            tuples,
            vec![
                ("Ali, \"the\" Great", ParticipationStatus::Present, 10),
                ("Sara", ParticipationStatus::Absent, 0),
            ]
        );
        assert_eq!(rows[1].whatsapp.as_deref(), Some("0611"));
    }

    #[test]
    fn test_parse_rejects_unknown_status() {
        let err = parse_participant_export("Nom complet,Status,Points\nAli,late,3\n").unwrap_err();
        assert_eq!(err.code, shared::ErrorCode::ImportHeaderInvalid);
    }

    #[test]
    fn test_parse_accepts_upper_case_accented_headers() {
        let text = "NOM COMPLET,NUMÉRO WHATSAPP,STATUS,POINTS\nAli,0611,present,4\n";
        let rows = parse_participant_export(text).unwrap();
        assert_eq!(rows[0].whatsapp.as_deref(), Some("0611"));
        assert_eq!(rows[0].points, 4);
    }

    #[test]
    fn test_participation_report() {
        let (members, event) = fixture();
        let text = export_participation_report(&members, &[event]);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Nom complet,CNI,Niveau scolaire,Numéro WhatsApp,Activity,Points");
        assert_eq!(lines[1], "\"Ali, \"\"the\"\" Great\",x1,,,Weekly  Meeting,10");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_file_names() {
        let (_, event) = fixture();
        assert_eq!(export_file_name(&event), "Participants_Weekly_Meeting.csv");
        assert_eq!(
            report_file_name(1_709_640_000_000),
            "club_participation_report_2024-03-05.csv"
        );
    }
}
