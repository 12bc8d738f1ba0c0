use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use noticeboard_search::MatchMode;
use tracing_subscriber::EnvFilter;

mod commands;
mod input;

const DEFAULT_STORE_PATH: &str = "noticeboard.json";

#[derive(Parser)]
#[command(name = "noticeboard")]
#[command(about = "Validation and search indexing for notices, users and profiles", long_about = None)]
struct Cli {
    /// JSON snapshot used by import, update, get and search.
    #[arg(long, global = true, default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize and validate records without storing them.
    Validate {
        kind: String,
        /// JSON object or array of objects; stdin when omitted.
        file: Option<PathBuf>,
    },
    /// Print the canonical form of an email address.
    NormalizeEmail { email: String },
    /// Build the search document of a record.
    Index {
        kind: String,
        file: Option<PathBuf>,
        /// Print a tsvector literal instead of JSON.
        #[arg(long)]
        tsvector: bool,
    },
    /// Print registered schemas.
    Schema { kind: Option<String> },
    /// Create records in the store.
    Import { kind: String, file: Option<PathBuf> },
    /// Apply a JSON patch object to a stored record.
    Update { kind: String, id: String, file: Option<PathBuf> },
    /// Print a stored record.
    Get { kind: String, id: String },
    /// Ranked search over stored notices.
    Search {
        query: String,
        #[arg(short, long, default_value = "and")]
        mode: MatchMode,
        #[arg(short, long)]
        college: Option<String>,
        #[arg(long = "hashtag")]
        hashtags: Vec<String>,
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(short, long)]
        offset: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = cli.store;

    match cli.command {
        Commands::Validate { kind, file } => commands::records::run_validate(&kind, file.as_deref()),
        Commands::NormalizeEmail { email } => commands::records::run_normalize_email(&email),
        Commands::Index { kind, file, tsvector } => {
            commands::records::run_index(&kind, file.as_deref(), tsvector)
        },
        Commands::Schema { kind } => commands::records::run_schema(kind.as_deref()),
        Commands::Import { kind, file } => {
            commands::store::run_import(&store, &kind, file.as_deref()).await
        },
        Commands::Update { kind, id, file } => {
            commands::store::run_update(&store, &kind, &id, file.as_deref()).await
        },
        Commands::Get { kind, id } => commands::store::run_get(&store, &kind, &id).await,
        Commands::Search { query, mode, college, hashtags, limit, offset } => {
            let args = commands::store::SearchArgs { query, mode, college, hashtags, limit, offset };
            commands::store::run_search(&store, args).await
        },
    }
}
