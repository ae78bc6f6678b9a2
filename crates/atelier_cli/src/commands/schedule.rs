//! Periodic runs until Ctrl+C.

use std::sync::Arc;
use std::time::Duration;

use console::Term;
use tokio::time::MissedTickBehavior;

use atelier::connect_and_migrate;
use atelier::sync::SyncTarget;
use atelier::upstream::GalleryApi;

use crate::commands::shared::{
    ModeArg, TargetArg, gallery_client, print_report, run_once, sync_options,
};
use crate::config::Config;
use crate::shutdown::is_shutdown_requested;

/// Arguments of `atelier schedule`.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ScheduleArgs {
    /// What to sync on every tick
    #[arg(value_enum, default_value_t = TargetArg::All)]
    pub target: TargetArg,

    /// Sync mode
    #[arg(short, long, value_enum, default_value_t = ModeArg::Incremental)]
    pub mode: ModeArg,

    /// Minutes between runs (default from config or 120)
    #[arg(short, long)]
    pub every_minutes: Option<u64>,

    /// Pause each run after this many seconds (default from config or 1800)
    #[arg(short, long)]
    pub deadline_secs: Option<u64>,
}

async fn wait_for_shutdown() {
    while !is_shutdown_requested() {
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

pub(crate) async fn handle_schedule(
    args: ScheduleArgs,
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let is_tty = Term::stdout().is_term();
    let target = SyncTarget::from(args.target);
    let options = sync_options(&config.sync, args.mode, None, None, false);
    let every = args
        .every_minutes
        .map(|m| Duration::from_secs(m.max(1) * 60))
        .unwrap_or_else(|| config.sync.schedule_every());
    let deadline = Duration::from_secs(
        args.deadline_secs
            .unwrap_or(config.sync.schedule_deadline_secs),
    );

    let api: Arc<dyn GalleryApi> = Arc::new(gallery_client(config)?);
    let db = Arc::new(connect_and_migrate(database_url).await?);

    tracing::info!(
        scope = target.scope(),
        mode = %options.mode,
        every_secs = every.as_secs(),
        deadline_secs = deadline.as_secs(),
        "Scheduler started"
    );
    if is_tty {
        println!(
            "Syncing {} every {} minutes. Press Ctrl+C to stop.",
            target,
            every.as_secs() / 60
        );
    }

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = wait_for_shutdown() => break,
        }

        match run_once(
            Arc::clone(&api),
            Arc::clone(&db),
            target,
            &options,
            "schedule",
            deadline,
            config.sync.heartbeat(),
        )
        .await
        {
            Ok(report) => print_report(&report, is_tty),
            // A failed tick is recorded in the ledger; the next one retries.
            Err(e) => tracing::error!(error = %e, "Scheduled run failed"),
        }

        if is_shutdown_requested() {
            break;
        }
    }

    tracing::info!("Scheduler stopped");
    Ok(())
}
