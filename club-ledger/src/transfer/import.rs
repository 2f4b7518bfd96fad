use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use shared::{AppError, AppResult};
use shared::models::{Member, MemberCreate};
use shared::util::{non_blank, normalize_cni};

use super::csv::{find_column, parse_records};
use crate::registry::MemberRegistry;

/// Header names, matched trimmed and case-insensitively
pub const COL_NAME: &str = "Nom complet";
pub const COL_CNI: &str = "CNI";
pub const COL_CNE: &str = "CNE";
pub const COL_SCHOOL_LEVEL: &str = "Niveau scolaire";
pub const COL_WHATSAPP: &str = "Numéro WhatsApp";

/// Why a data row was not imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "message", rename_all = "snake_case")]
pub enum SkipReason {
    EmptyName,
    /// CNI already seen earlier in the same file
    DuplicateInBatch,
    /// CNI already registered
    DuplicateInRegistry,
    /// Registration refused the row
    Rejected(String),
}

/// A skipped data row; `row` is 1-based and counts data rows only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: SkipReason,
}

/// A data row ready for registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCandidate {
    pub row: usize,
    pub member: MemberCreate,
}

/// Result of parsing an import file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedImport {
    pub candidates: Vec<ImportCandidate>,
    pub skipped: Vec<SkippedRow>,
}

/// Outcome of a bulk import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub skipped_rows: Vec<SkippedRow>,
}

struct Columns {
    name: usize,
    cni: Option<usize>,
    cne: Option<usize>,
    school_level: Option<usize>,
    whatsapp: Option<usize>,
}

impl Columns {
    fn from_header(header: &[String]) -> AppResult<Self> {
        let find = |wanted: &str| find_column(header, wanted);

        let name = find(COL_NAME).ok_or_else(|| {
            AppError::import_format(format!("Missing required column \"{}\"", COL_NAME))
        })?;

        Ok(Self {
            name,
            cni: find(COL_CNI),
            cne: find(COL_CNE),
            school_level: find(COL_SCHOOL_LEVEL),
            whatsapp: find(COL_WHATSAPP),
        })
    }
}

fn cell(record: &[String], index: Option<usize>) -> Option<String> {
    index.and_then(|i| non_blank(record.get(i).map(String::as_str)))
}

/// Parse an import file against the current registry
///
/// Fails only when the header has no name column. Rows with an empty name
/// or a CNI already seen (in this file or in `existing`) are skipped.
pub fn parse_import(text: &str, existing: &[Member]) -> AppResult<ParsedImport> {
    let mut records = parse_records(text).into_iter();
    let header = records
        .next()
        .ok_or_else(|| AppError::import_format("Import file is empty"))?;
    let columns = Columns::from_header(&header)?;

    let registered: HashSet<String> = existing.iter().filter_map(Member::cni_key).collect();
    let mut seen = HashSet::new();
    let mut parsed = ParsedImport::default();

    for (index, record) in records.enumerate() {
        let row = index + 1;
        let skip = |reason| SkippedRow { row, reason };

        let Some(name) = cell(&record, Some(columns.name)) else {
            parsed.skipped.push(skip(SkipReason::EmptyName));
            continue;
        };

        let cni = cell(&record, columns.cni).map(|c| normalize_cni(&c));
        if let Some(cni) = &cni {
            if registered.contains(cni) {
                parsed.skipped.push(skip(SkipReason::DuplicateInRegistry));
                continue;
            }
            if !seen.insert(cni.clone()) {
                parsed.skipped.push(skip(SkipReason::DuplicateInBatch));
                continue;
            }
        }

        parsed.candidates.push(ImportCandidate {
            row,
            member: MemberCreate {
                name,
                cni,
                cne: cell(&record, columns.cne),
                school_level: cell(&record, columns.school_level),
                whatsapp: cell(&record, columns.whatsapp),
            },
        });
    }

    Ok(parsed)
}

/// Parse and register a batch of members
///
/// Rows are registered one by one; a row the registry refuses is reported
/// as skipped and the batch carries on.
pub async fn import_members(registry: &MemberRegistry, text: &str) -> AppResult<ImportReport> {
    let existing = registry.list().await?;
    let parsed = parse_import(text, &existing)?;

    let mut report = ImportReport {
        skipped_rows: parsed.skipped,
        ..Default::default()
    };

    for ImportCandidate { row, member } in parsed.candidates {
        match registry.register(member).await {
            Ok(_) => report.imported += 1,
            Err(e) => {
                tracing::warn!(row, error = %e, "Import row rejected");
                report.skipped_rows.push(SkippedRow {
                    row,
                    reason: SkipReason::Rejected(e.message),
                });
            }
        }
    }
    report.skipped_rows.sort_by_key(|s| s.row);

    for skipped in &report.skipped_rows {
        tracing::debug!(row = skipped.row, reason = ?skipped.reason, "Import row skipped");
    }
    report.skipped = report.skipped_rows.len();

    tracing::info!(
        imported = report.imported,
        skipped = report.skipped,
        "Member import finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorCode;

    #[test]
    fn test_missing_name_column_is_a_format_error() {
        let err = parse_import("CNI,CNE\nX1,Y1\n", &[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ImportHeaderInvalid);

        let err = parse_import("", &[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ImportHeaderInvalid);
    }

    #[test]
    fn test_header_matching_is_case_insensitive() {
        let text = " nom COMPLET ,cni,niveau scolaire,NUMÉRO WHATSAPP\nAli,X1,Bac,0600\n";
        let parsed = parse_import(text, &[]).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        let ali = &parsed.candidates[0].member;
        assert_eq!(ali.cni.as_deref(), Some("x1"));
        assert_eq!(ali.school_level.as_deref(), Some("Bac"));
        assert_eq!(ali.whatsapp.as_deref(), Some("0600"));
        assert_eq!(ali.cne, None);
    }

    #[test]
    fn test_skips_empty_names_and_duplicates() {
        let existing = vec![Member {
            id: 1,
            ..MemberCreate::new("Old").with_cni("R1").into_member(0)
        }];
        let text = "Nom complet,CNI\nAli,X1\nAli bis,x1\n ,Z9\nRegistered,r1\nNo Cni,\n";
        let parsed = parse_import(text, &existing).unwrap();

        let names: Vec<_> = parsed.candidates.iter().map(|c| c.member.name.as_str()).collect();
        assert_eq!(names, vec!["Ali", "No Cni"]);
        assert_eq!(
            parsed.skipped,
            vec![
                SkippedRow { row: 2, reason: SkipReason::DuplicateInBatch },
                SkippedRow { row: 3, reason: SkipReason::EmptyName },
                SkippedRow { row: 4, reason: SkipReason::DuplicateInRegistry },
            ]
        );
    }

    #[test]
    fn test_quoted_names_with_commas() {
        let parsed = parse_import("Nom complet,CNI\n\"Alaoui, Sara\",K1\n", &[]).unwrap();
        assert_eq!(parsed.candidates[0].member.name, "Alaoui, Sara");
    }
}
