//! club-ledger command line
//!
//! Administrator front end over the library: bulk import, exports,
//! backups and quick lookups against the configured store.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use club_ledger::aggregation::{event_points_total, member_summary};
use club_ledger::transfer::{
    self, export_participation_report, import_members, report_file_name,
};
use club_ledger::{ApiResponse, AppError, ClubState, Config, StorageBackend, setup_environment};
use serde::Serialize;
use shared::models::ParticipationStatus;
use shared::util::{format_date, now_millis};

#[derive(Parser)]
#[command(name = "club-ledger")]
#[command(about = "Club membership, attendance and points ledger")]
struct Cli {
    /// Directory holding the data file (overrides WORK_DIR)
    #[arg(long, env = "WORK_DIR", global = true)]
    work_dir: Option<PathBuf>,

    /// memory, json or redb (overrides STORAGE_BACKEND)
    #[arg(long, env = "STORAGE_BACKEND", global = true)]
    backend: Option<StorageBackend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import members from a CSV file ("Nom complet" column required)
    Import { file: PathBuf },

    /// Export the participants of one event as CSV
    ExportEvent {
        event_id: i64,
        /// Directory to write Participants_<event>.csv into (stdout otherwise)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Export every participant entry across all events as CSV
    Report {
        /// Directory to write the dated report into (stdout otherwise)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Write a full JSON backup
    Backup {
        /// File to write (stdout otherwise)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Replace all data with a JSON backup
    Restore { file: PathBuf },

    /// Show a member's points and participation history
    History { cni: String },

    /// List events, newest first
    Events,

    /// List members, optionally filtered by name or CNI
    Members {
        #[arg(long)]
        search: Option<String>,
    },

    /// Create an event dated now
    CreateEvent { name: String },

    /// Enroll a registered member into an event
    Enroll { event_id: i64, member_id: i64 },

    /// Set a participant's status and, optionally, points
    Mark {
        event_id: i64,
        member_id: i64,
        status: ParticipationStatus,
        #[arg(long)]
        points: Option<String>,
    },

    /// Check administrator credentials and print a bearer token
    Login { identifier: String, secret: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventLine {
    id: i64,
    date: String,
    name: String,
    participants: usize,
    total_points: i64,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<AppError>() {
            Some(app) => {
                let body = ApiResponse::<()>::from(app.clone());
                eprintln!(
                    "{}",
                    serde_json::to_string_pretty(&body).unwrap_or_else(|_| app.to_string())
                );
            }
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = setup_environment()?;
    apply_overrides(&mut config, cli.work_dir, cli.backend);

    let state = ClubState::initialize(&config)?;
    let ledger = &state.ledger;

    match cli.command {
        Commands::Import { file } => {
            let text = read_text(&file)?;
            let report = import_members(&state.registry, &text).await?;
            print_json(&report)?;
        }
        Commands::ExportEvent { event_id, out } => {
            let (file_name, csv) = transfer::export_event(ledger, event_id).await?;
            emit(out.map(|dir| dir.join(file_name)), &csv)?;
        }
        Commands::Report { out } => {
            let members = state.registry.list().await?;
            let events = ledger.list_events().await?;
            let csv = export_participation_report(&members, &events);
            emit(out.map(|dir| dir.join(report_file_name(now_millis()))), &csv)?;
        }
        Commands::Backup { out } => {
            let json = transfer::backup(ledger).await?;
            emit(out, &json)?;
        }
        Commands::Restore { file } => {
            let snapshot = transfer::restore(ledger, &read_text(&file)?).await?;
            println!(
                "Restored {} members and {} events",
                snapshot.members.len(),
                snapshot.events.len()
            );
        }
        Commands::History { cni } => {
            let summary = member_summary(ledger, &cni).await?;
            print_json(&summary)?;
        }
        Commands::Events => {
            let lines: Vec<_> = ledger
                .list_events()
                .await?
                .iter()
                .map(|e| EventLine {
                    id: e.id,
                    date: format_date(e.date),
                    name: e.name.clone(),
                    participants: e.participants.len(),
                    total_points: event_points_total(e),
                })
                .collect();
            print_json(&lines)?;
        }
        Commands::Members { search } => {
            let members = match search {
                Some(query) => state.registry.search(&query).await?,
                None => state.registry.list().await?,
            };
            print_json(&members)?;
        }
        Commands::CreateEvent { name } => {
            print_json(&ledger.create_event(&name).await?)?;
        }
        Commands::Enroll {
            event_id,
            member_id,
        } => {
            print_json(&ledger.enroll(event_id, member_id).await?)?;
        }
        Commands::Mark {
            event_id,
            member_id,
            status,
            points,
        } => {
            let mut event = ledger.set_status(event_id, member_id, status).await?;
            if let Some(raw) = points {
                event = ledger.set_points_input(event_id, member_id, &raw).await?;
            }
            print_json(&event)?;
        }
        Commands::Login { identifier, secret } => {
            let response = state.auth.login(&identifier, &secret)?;
            println!("Bearer {}", response.token);
        }
    }

    Ok(())
}

fn apply_overrides(
    config: &mut Config,
    work_dir: Option<PathBuf>,
    backend: Option<StorageBackend>,
) {
    if let Some(dir) = work_dir {
        config.work_dir = dir;
    }
    if let Some(backend) = backend {
        config.storage_backend = backend;
    }
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))
}

/// Write to a file when a path is given, stdout otherwise
fn emit(path: Option<PathBuf>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(&path, content)
                .with_context(|| format!("Cannot write {}", path.display()))?;
            tracing::info!(path = %path.display(), "File written");
            println!("{}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
