use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

mod commands;
mod config;
mod logging;

use config::Config;

#[derive(Debug, Parser)]
#[command(name = "bandshare", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the database (default: ~/.local/share/bandshare/bandshare.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    ///
    /// Each migration runs in its own transaction and is recorded in the
    /// schema_migrations table, so running this again is a no-op.
    Migrate {
        /// Stop after this migration version
        #[arg(long)]
        to: Option<u32>,
    },
    /// List every migration and whether it has been applied
    Migrations,
    /// Show the schema version and row counts for each table
    Status {
        /// Print the counts as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-validate every stored record
    ///
    /// Runs the same checks an insert would (required fields, lengths,
    /// ranges, uniqueness and references) and reports the records that
    /// fail. Exits with an error if any record is invalid.
    Check,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print one value, or the whole config file
    Get {
        /// Dotted key, e.g. logging.level
        key: Option<String>,
    },
    /// Set a value in the config file
    Set { key: String, value: String },
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file if it doesn't exist
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Config commands skip logging setup and never touch the database.
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(),
            ConfigAction::Get { key } => commands::config::get_config(key),
            ConfigAction::Set { key, value } => commands::config::set_config(&key, &value),
            ConfigAction::Path => commands::config::show_path(),
            ConfigAction::Example => commands::config::show_example(),
            ConfigAction::Init => commands::config::init_config(),
        },
        Commands::Migrate { to } => commands::run_migrate(&prepare(cli.db)?, to),
        Commands::Migrations => commands::list_migrations(&prepare(cli.db)?),
        Commands::Status { json } => commands::show_status(&prepare(cli.db)?, json),
        Commands::Check => commands::run_check(&prepare(cli.db)?),
    }
}

/// Load configuration, install logging and make sure the database
/// directory exists. Returns the database path.
fn prepare(db: Option<PathBuf>) -> Result<PathBuf> {
    let config = Config::load_with_db_path(db)?;
    logging::setup(&config.logging)?;

    let db_path = config.database_path;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    Ok(db_path)
}
