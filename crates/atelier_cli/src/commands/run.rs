use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use console::Term;

use atelier::connect_and_migrate;
use atelier::sync::SyncTarget;

use crate::commands::shared::{
    ModeArg, TargetArg, gallery_client, print_report, run_once, sync_options,
};
use crate::config::Config;

/// Arguments of `atelier run`.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RunArgs {
    /// What to sync
    #[arg(value_enum)]
    pub target: TargetArg,

    /// Sync mode
    #[arg(short, long, value_enum, default_value_t = ModeArg::Full)]
    pub mode: ModeArg,

    /// Explicit incremental cutoff (RFC 3339); overrides the ledger
    #[arg(long, value_parser = parse_since)]
    pub since: Option<DateTime<Utc>>,

    /// Start a full run at this offset (from a paused run's hint)
    #[arg(long)]
    pub resume_offset: Option<u64>,

    /// Start even if another run of the same scope looks live
    #[arg(long)]
    pub force: bool,

    /// Pause the run after this many seconds (default from config or 300)
    #[arg(short, long)]
    pub deadline_secs: Option<u64>,
}

fn parse_since(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

pub(crate) async fn handle_run(
    args: RunArgs,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let is_tty = Term::stdout().is_term();
    let target = SyncTarget::from(args.target);
    let options = sync_options(
        &config.sync,
        args.mode,
        args.since,
        args.resume_offset,
        args.force,
    );
    let deadline =
        Duration::from_secs(args.deadline_secs.unwrap_or(config.sync.run_deadline_secs));

    let client = gallery_client(config)?;
    let db = Arc::new(connect_and_migrate(database_url).await?);

    if is_tty {
        println!("Syncing {} ({})...", target, options.mode);
    }

    let report = run_once(
        Arc::new(client),
        db,
        target,
        &options,
        "cli",
        deadline,
        config.sync.heartbeat(),
    )
    .await?;

    print_report(&report, is_tty);
    Ok(())
}
