use anyhow::Result;
use chrono::{NaiveDateTime, Weekday};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod builder;
mod cadence;
mod commands;
mod config;
mod csv_import;
mod data;
mod error;
mod payload;
mod status;

use data::Cadence;
use status::BuilderVariant;

#[derive(Parser)]
#[command(name = "listingdesk")]
#[command(about = "Listingdesk CLI - contact CSV imports and market report schedule building", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview a contacts CSV import
    Import {
        /// CSV file with an email column
        #[arg(long)]
        file: PathBuf,

        /// File of already-known emails, one per line
        #[arg(long)]
        existing: Option<PathBuf>,

        /// Treat rows without any name as errors
        #[arg(long)]
        require_name: bool,

        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Create a new builder state file from defaults
    Init {
        /// Defaults file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Where to write the state (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Change fields of a builder state file
    Edit {
        /// Builder state file
        #[arg(long)]
        state: PathBuf,

        /// field=value assignment, repeatable
        #[arg(long = "set")]
        assignments: Vec<String>,

        /// Add a contact recipient by id
        #[arg(long = "add-contact")]
        add_contacts: Vec<String>,

        /// Add a group recipient by id
        #[arg(long = "add-group")]
        add_groups: Vec<String>,

        /// Add a manual email recipient
        #[arg(long = "add-email")]
        add_emails: Vec<String>,

        /// Remove a recipient: contact:<id>, group:<id> or email:<address>
        #[arg(long = "remove")]
        remove: Vec<String>,

        #[arg(long, value_enum, default_value = "schedule")]
        variant: BuilderVariant,

        /// Reference time for the next-run summary (default: now)
        #[arg(long)]
        now: Option<NaiveDateTime>,
    },

    /// Show section statuses and whether the form can be submitted
    Status {
        /// Builder state file
        #[arg(long)]
        state: PathBuf,

        #[arg(long, value_enum, default_value = "schedule")]
        variant: BuilderVariant,

        /// Reference time for the next-run summary (default: now)
        #[arg(long)]
        now: Option<NaiveDateTime>,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Compute the next run of a cadence
    NextRun {
        #[arg(long, value_enum)]
        cadence: Cadence,

        /// Target weekday for weekly cadence (mon, tue, ...)
        #[arg(long)]
        day_of_week: Option<Weekday>,

        /// Target day for monthly cadence
        #[arg(long)]
        day_of_month: Option<u32>,

        #[arg(long, default_value_t = 9)]
        hour: u32,

        #[arg(long, default_value_t = 0)]
        minute: u32,

        /// Reference time (default: now)
        #[arg(long)]
        now: Option<NaiveDateTime>,
    },

    /// Print the request body the builder would submit
    Payload {
        /// Builder state file
        #[arg(long)]
        state: PathBuf,

        #[arg(long, value_enum, default_value = "schedule")]
        variant: BuilderVariant,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Import {
            file,
            existing,
            require_name,
            format,
        } => {
            tracing::info!(file = %file.display(), format = %format, "Importing contacts");
            commands::import_csv(&file, existing.as_deref(), require_name, &format)?;
        }
        Commands::Init { config, output } => {
            tracing::info!("Creating builder state");
            commands::init_state(config.as_deref(), output.as_deref())?;
        }
        Commands::Edit {
            state,
            assignments,
            add_contacts,
            add_groups,
            add_emails,
            remove,
            variant,
            now,
        } => {
            tracing::info!(state = %state.display(), "Editing builder state");
            let edits = commands::EditRequest {
                assignments: &assignments,
                add_contacts: &add_contacts,
                add_groups: &add_groups,
                add_emails: &add_emails,
                remove: &remove,
            };
            commands::edit_state(&state, &edits, variant, commands::resolve_now(now))?;
        }
        Commands::Status {
            state,
            variant,
            now,
            format,
        } => {
            tracing::info!(state = %state.display(), variant = ?variant, "Showing status");
            commands::show_status(&state, variant, commands::resolve_now(now), &format)?;
        }
        Commands::NextRun {
            cadence,
            day_of_week,
            day_of_month,
            hour,
            minute,
            now,
        } => {
            tracing::info!(cadence = ?cadence, "Computing next run");
            let request = commands::NextRunRequest {
                cadence,
                day_of_week,
                day_of_month,
                hour,
                minute,
            };
            commands::next_run(&request, commands::resolve_now(now))?;
        }
        Commands::Payload { state, variant } => {
            tracing::info!(state = %state.display(), variant = ?variant, "Building payload");
            commands::show_payload(&state, variant)?;
        }
    }

    Ok(())
}
