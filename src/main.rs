use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

mod config;
mod error;
mod event_log;
mod logging;
mod models;
mod projections;
mod report;

#[cfg(test)]
mod tests;

use config::SegmentationConfig;
use error::ReportError;
use logging::LogFormat;
use models::Session;
use projections::{find_session, SessionProjector};

/// Session and level reports from raw play events.
/// Never modifies the event file; all state is derived from it.
#[derive(Parser, Debug)]
#[command(name = "play-session-report", version)]
struct Cli {
    /// TOML file overriding segmentation thresholds
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormatChoice,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Project every child's events into sessions and levels
    Sessions {
        /// Event file: JSON array or one JSON object per line
        events: PathBuf,

        /// Only this child
        #[arg(long)]
        child: Option<String>,

        /// One line per session instead of JSON
        #[arg(long)]
        summary: bool,
    },
    /// Emotion tracking report for one session
    Report {
        /// Event file: JSON array or one JSON object per line
        events: PathBuf,

        #[arg(long)]
        child: String,

        /// `session-N` or `N`
        #[arg(long)]
        session: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level, cli.log_format.into());

    let config = load_config(cli.config.as_deref())?;
    let projector = SessionProjector::new(config);

    match cli.command {
        Command::Sessions {
            events,
            child,
            summary,
        } => {
            let by_child = project_file(&projector, &events)?;
            let selected = select_child(by_child, child.as_deref())?;

            if summary {
                print!("{}", summary_rows(&selected));
            } else {
                println!("{}", serde_json::to_string_pretty(&selected)?);
            }
        }
        Command::Report {
            events,
            child,
            session,
        } => {
            let by_child = project_file(&projector, &events)?;
            let sessions = by_child
                .get(&child)
                .ok_or_else(|| ReportError::UnknownChild(child.clone()))?;
            let found = find_session(sessions, &session).ok_or_else(|| {
                ReportError::UnknownSession {
                    child: child.clone(),
                    session: session.clone(),
                }
            })?;

            let report = report::build_report(&child, found);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SegmentationConfig> {
    match path {
        Some(path) => SegmentationConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(SegmentationConfig::default()),
    }
}

fn project_file(
    projector: &SessionProjector,
    path: &Path,
) -> Result<BTreeMap<String, Vec<Session>>> {
    let events = event_log::read_events(path)
        .with_context(|| format!("Failed to load events from {}", path.display()))?;
    info!(events = events.len(), "projecting sessions");
    Ok(projector.project_by_child(events))
}

/// Narrow to one child, if asked.
fn select_child(
    mut by_child: BTreeMap<String, Vec<Session>>,
    child: Option<&str>,
) -> Result<BTreeMap<String, Vec<Session>>, ReportError> {
    let Some(child) = child else {
        return Ok(by_child);
    };

    let sessions = by_child
        .remove(child)
        .ok_or_else(|| ReportError::UnknownChild(child.to_string()))?;
    Ok(BTreeMap::from([(child.to_string(), sessions)]))
}

/// Dashboard-style rows: child header, then one row per session.
fn summary_rows(by_child: &BTreeMap<String, Vec<Session>>) -> String {
    let mut out = String::new();
    for (child, sessions) in by_child {
        out.push_str(&format!("{}\n", child));
        if sessions.is_empty() {
            out.push_str("  No sessions\n");
        }
        for session in sessions {
            out.push_str(&format!(
                "  {}  Score: {}  Emotion: {}\n",
                session.name, session.total_score, session.dominant_emotion
            ));
        }
    }
    out
}
