//! Admin CLI command definitions and handlers.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use justlog_core::entry::{Entry, EntryType, LogEntryRequest};
use justlog_core::storage::{CredentialRepository, EntryRepository, TimeWindow};
use justlog_core::tools::TOOLS;

/// justlog - food, exercise and weight log storage
#[derive(Debug, Parser)]
#[command(name = "justlog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Table name (overrides JUSTLOG_TABLE).
    #[arg(long, global = true)]
    pub table: Option<String>,

    /// Endpoint override, e.g. http://localhost:8000 (overrides AWS_ENDPOINT_URL).
    #[arg(long, global = true)]
    pub endpoint_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Issue a new API key, replacing any existing one. Prints the key once.
    IssueKey {
        #[arg(long)]
        user: String,
    },
    /// Print the user an API key belongs to.
    ResolveKey {
        #[arg(long)]
        key: String,
    },
    /// Revoke the user's API key.
    RevokeKey {
        #[arg(long)]
        user: String,
    },
    /// Append a log entry.
    Log(LogArgs),
    /// List entries of one type, newest first, as JSON.
    Query(QueryArgs),
    /// Delete one entry by sort id.
    Delete {
        #[arg(long)]
        user: String,
        #[arg(long)]
        sort_id: String,
    },
    /// Create the table (local development).
    CreateTable,
    /// Print the AI tool catalogue as JSON.
    Tools,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long = "type")]
    pub entry_type: EntryType,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub calories: Option<f64>,
    #[arg(long)]
    pub protein: Option<f64>,
    #[arg(long)]
    pub carbs: Option<f64>,
    #[arg(long)]
    pub fat: Option<f64>,
    #[arg(long)]
    pub fiber: Option<f64>,
    #[arg(long)]
    pub caffeine: Option<f64>,
    #[arg(long)]
    pub cholesterol: Option<f64>,
    #[arg(long)]
    pub calories_burned: Option<f64>,
    #[arg(long)]
    pub duration_minutes: Option<f64>,
    #[arg(long)]
    pub weight: Option<f64>,
    #[arg(long)]
    pub unit: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// RFC3339 timestamp (default: now).
    #[arg(long)]
    pub timestamp: Option<String>,
}

impl From<LogArgs> for LogEntryRequest {
    fn from(args: LogArgs) -> Self {
        Self {
            description: args.description,
            calories: args.calories,
            protein: args.protein,
            carbs: args.carbs,
            fat: args.fat,
            fiber: args.fiber,
            caffeine: args.caffeine,
            cholesterol: args.cholesterol,
            calories_burned: args.calories_burned,
            duration_minutes: args.duration_minutes,
            weight: args.weight,
            unit: args.unit,
            notes: args.notes,
            timestamp: args.timestamp,
        }
    }
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[arg(long)]
    pub user: String,
    #[arg(long = "type")]
    pub entry_type: EntryType,
    /// First day, YYYY-MM-DD (default: today, UTC).
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last day, YYYY-MM-DD, included in full (default: today, UTC).
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

/// An entry as printed by `query`, with the sort id needed to delete it.
#[derive(Debug, Serialize)]
struct EntryOutput<'a> {
    sk: String,
    #[serde(flatten)]
    entry: &'a Entry,
}

/// Run one command against a store and return what to print.
///
/// `create-table` is backend-specific and handled by the binary.
pub async fn execute<R>(command: Commands, repo: &R, now: DateTime<Utc>) -> Result<String>
where
    R: CredentialRepository + EntryRepository,
{
    match command {
        Commands::IssueKey { user } => {
            let key = repo.issue_api_key(&user).await?;
            Ok(key.into_inner())
        }
        Commands::ResolveKey { key } => match repo.resolve_api_key(&key).await {
            Ok(user_id) => Ok(user_id),
            Err(err) => {
                tracing::debug!(error = %err, "API key rejected");
                bail!("unauthorized")
            }
        },
        Commands::RevokeKey { user } => {
            repo.revoke_api_key(&user).await?;
            Ok(format!("Revoked API key for {user}"))
        }
        Commands::Log(args) => {
            let user = args.user.clone();
            let entry_type = args.entry_type;
            let entry = LogEntryRequest::from(args).into_entry(&user, entry_type, now)?;
            repo.append_entry(&entry).await?;
            Ok(entry.sort_id())
        }
        Commands::Query(args) => {
            let window = TimeWindow::for_days(args.from, args.to, now.date_naive())?;
            let entries = repo
                .query_entries(&args.user, args.entry_type, window)
                .await?;
            let output: Vec<_> = entries
                .iter()
                .map(|entry| EntryOutput {
                    sk: entry.sort_id(),
                    entry,
                })
                .collect();
            serde_json::to_string_pretty(&output).context("Failed to serialize entries")
        }
        Commands::Delete { user, sort_id } => {
            repo.delete_entry(&user, &sort_id).await?;
            Ok(format!("Deleted {sort_id}"))
        }
        Commands::Tools => {
            serde_json::to_string_pretty(TOOLS).context("Failed to serialize tools")
        }
        Commands::CreateTable => bail!("create-table requires the DynamoDB backend"),
    }
}
