//! Atelier CLI - trigger surface for the gallery mirror.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::history::{OutputFormat, ScopeArg};
use crate::commands::run::RunArgs;
use crate::commands::schedule::ScheduleArgs;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(version)]
#[command(about = "Incremental mirror of a gallery-management API")]
#[command(
    long_about = "Atelier pulls artworks, artists and contacts from a gallery-management API \
into a local database. Runs are recorded in a ledger so incremental runs only fetch what \
changed since the last completed one, and records still missing detail are retried on \
every run."
)]
#[command(after_long_help = r#"EXAMPLES
    Mirror everything once:
        $ atelier run all

    Fetch only what changed since the last completed artworks run:
        $ atelier run artworks --mode incremental

    Resume a paused full run:
        $ atelier run contacts --resume-offset 400

    Keep the mirror fresh every hour:
        $ atelier schedule all --every-minutes 60

    Show the last runs:
        $ atelier history --limit 5

CONFIGURATION
    Atelier reads configuration from:
      1. ~/.config/atelier/config.toml (or $XDG_CONFIG_HOME/atelier/config.toml)
      2. ./atelier.toml
      3. Environment variables (ATELIER_ prefix, `__` between section and key)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    ATELIER_DATABASE__URL        Database connection string (default: ~/.local/state/atelier/atelier.db)
    ATELIER_UPSTREAM__BASE_URL   Gallery API root
    ATELIER_UPSTREAM__API_KEY    Gallery API bearer key
    ATELIER_SYNC__PAGE_SIZE      Records per list page (default: 100)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sync and record it in the ledger
    Run(RunArgs),
    /// Run syncs periodically until Ctrl+C
    Schedule(ScheduleArgs),
    /// Show recent runs from the ledger
    History {
        /// Only runs of this scope
        #[arg(short, long, value_enum)]
        entity: Option<ScopeArg>,

        /// Number of runs to show
        #[arg(short, long, default_value_t = 20)]
        limit: u64,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
        /// Write the script to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate man page(s)
    Man {
        /// Directory for one page per subcommand (main page to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show applied and pending migrations
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    shutdown::setup_shutdown_handler();

    // Progress bars own the terminal; structured logs are for everything else.
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("atelier=info,atelier_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config = config::Config::load();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Completions { shell, output } => {
            commands::meta::handle_completions(*shell, output.clone())?;
            return Ok(());
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(());
        }
        _ => {}
    }

    let database_url = config
        .database_url()
        .ok_or("Could not determine a database URL; set [database] url or ATELIER_DATABASE__URL")?;

    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "Database path '{}' is relative - behavior depends on current directory. \
                 Consider using an absolute path.",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
    }

    match cli.command {
        Commands::Run(args) => {
            commands::run::handle_run(args, &config, &database_url).await?;
        }
        Commands::Schedule(args) => {
            commands::schedule::handle_schedule(args, &config, &database_url).await?;
        }
        Commands::History {
            entity,
            limit,
            output,
        } => {
            commands::history::handle_history(entity, limit, output, &database_url).await?;
        }
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Completions { .. } | Commands::Man { .. } => {}
    }

    Ok(())
}
