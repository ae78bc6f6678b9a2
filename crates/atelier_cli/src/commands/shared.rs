//! Pieces shared by `run` and `schedule`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use console::style;
use sea_orm::DatabaseConnection;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use atelier::entity::sync_status::SyncStatus;
use atelier::http::ReqwestTransport;
use atelier::retry::RetryConfig;
use atelier::sync::{
    DetailBatchOptions, RunReport, SyncContext, SyncMode, SyncOptions, SyncTarget,
    progress_channel, relay_with_heartbeat, run_sync,
};
use atelier::upstream::{ApiRateLimiter, EntityKind, GalleryApi, GalleryClient};

use crate::config::{Config, SyncConfig};
use crate::progress::ProgressReporter;
use crate::shutdown::is_shutdown_requested;

/// How often the stop watcher checks for Ctrl+C.
const SHUTDOWN_POLL: Duration = Duration::from_millis(250);

/// Per-record errors printed after a run.
const MAX_PRINTED_ERRORS: usize = 10;

/// What to sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TargetArg {
    Artworks,
    Artists,
    Contacts,
    All,
}

impl From<TargetArg> for SyncTarget {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Artworks => SyncTarget::Entity(EntityKind::Artworks),
            TargetArg::Artists => SyncTarget::Entity(EntityKind::Artists),
            TargetArg::Contacts => SyncTarget::Entity(EntityKind::Contacts),
            TargetArg::All => SyncTarget::All,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum ModeArg {
    #[default]
    Full,
    Incremental,
}

impl From<ModeArg> for SyncMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Full => SyncMode::Full,
            ModeArg::Incremental => SyncMode::Incremental,
        }
    }
}

/// Engine options from config plus per-invocation flags.
pub(crate) fn sync_options(
    config: &SyncConfig,
    mode: ModeArg,
    since: Option<DateTime<Utc>>,
    resume_offset: Option<u64>,
    force: bool,
) -> SyncOptions {
    let mut options = match SyncMode::from(mode) {
        SyncMode::Full => SyncOptions::full(),
        SyncMode::Incremental => SyncOptions::incremental(),
    }
    .with_page_size(config.page_size)
    .with_detail(DetailBatchOptions {
        concurrency: config.detail_concurrency.max(1),
        delay: Duration::from_millis(config.detail_delay_ms),
        retry: RetryConfig::new(
            config.max_detail_attempts,
            Duration::from_millis(config.backoff_base_ms),
        ),
    })
    .with_force(force);

    options.lease = chrono::Duration::minutes(config.lease_minutes.max(1));
    if let Some(since) = since {
        options = options.with_cutoff(since);
    }
    if let Some(offset) = resume_offset {
        options = options.with_resume_offset(offset);
    }
    options
}

/// Build the HTTP client from `[upstream]`.
pub(crate) fn gallery_client(config: &Config) -> Result<GalleryClient, Box<dyn std::error::Error>> {
    let base_url = config.upstream.base_url.as_deref().ok_or(
        "No upstream base URL configured. Set [upstream] base_url or ATELIER_UPSTREAM__BASE_URL.",
    )?;
    let api_key = config.upstream.api_key.as_deref().ok_or(
        "No API key configured. Set [upstream] api_key or ATELIER_UPSTREAM__API_KEY.",
    )?;

    let transport = ReqwestTransport::with_timeout(Duration::from_secs(
        config.upstream.timeout_secs.max(1),
    ))?;
    let limiter = match config.upstream.requests_per_second {
        0 => None,
        rps => Some(ApiRateLimiter::new(rps)),
    };

    Ok(GalleryClient::new_with_transport(
        base_url,
        api_key,
        limiter,
        Arc::new(transport),
    )?)
}

/// Set `flag` when `deadline` passes or Ctrl+C is pressed.
fn spawn_stop_watcher(flag: Arc<AtomicBool>, deadline: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let expires = tokio::time::sleep(deadline);
        tokio::pin!(expires);
        let mut poll = tokio::time::interval(SHUTDOWN_POLL);

        loop {
            tokio::select! {
                _ = &mut expires => {
                    tracing::warn!(
                        deadline_secs = deadline.as_secs(),
                        "Deadline reached, pausing run"
                    );
                    break;
                }
                _ = poll.tick() => {
                    if is_shutdown_requested() {
                        break;
                    }
                }
            }
        }
        flag.store(true, Ordering::SeqCst);
    })
}

/// Run one ledger-wrapped sync with a deadline, rendering its progress.
pub(crate) async fn run_once(
    api: Arc<dyn GalleryApi>,
    db: Arc<DatabaseConnection>,
    target: SyncTarget,
    options: &SyncOptions,
    triggered_by: &str,
    deadline: Duration,
    heartbeat: Duration,
) -> Result<RunReport, Box<dyn std::error::Error>> {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let ctx = SyncContext::builder()
        .api(api)
        .database(db)
        .stop_flag(Arc::clone(&stop_flag))
        .build()?;
    let watcher = spawn_stop_watcher(stop_flag, deadline);

    let reporter = Arc::new(ProgressReporter::new());
    let (callback, progress_rx) = progress_channel();
    let (events_tx, mut events_rx) = mpsc::channel(64);
    let relay = tokio::spawn(relay_with_heartbeat(progress_rx, heartbeat, events_tx));
    let consumer = {
        let reporter = Arc::clone(&reporter);
        tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                reporter.handle_stream(event);
            }
        })
    };

    let result = run_sync(&ctx, target, options, triggered_by, Some(&callback)).await;

    // Closing the callback ends the relay, which ends the consumer.
    drop(callback);
    if let Err(e) = relay.await {
        tracing::warn!(error = %e, "Progress relay task failed");
    }
    if let Err(e) = consumer.await {
        tracing::warn!(error = %e, "Progress consumer task failed");
    }
    watcher.abort();
    reporter.finish();

    Ok(result?)
}

/// Print a finished run.
pub(crate) fn print_report(report: &RunReport, is_tty: bool) {
    if !is_tty {
        tracing::info!(
            run_id = %report.run_id,
            scope = %report.scope,
            status = %report.status,
            processed = report.processed,
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            errors = report.errors.len(),
            "Sync run finished"
        );
        for error in report.errors.iter().take(MAX_PRINTED_ERRORS) {
            tracing::warn!(error = %error, "Record error");
        }
        return;
    }

    println!();
    let headline = format!(
        "{}: {} processed ({} new, {} updated, {} unchanged)",
        report.scope, report.processed, report.created, report.updated, report.skipped
    );
    if report.status == SyncStatus::Completed && report.errors.is_empty() {
        println!("{} {}", style("✓").green().bold(), headline);
    } else {
        println!("{} {} [{}]", style("!").yellow().bold(), headline, report.status);
    }

    if !report.errors.is_empty() {
        eprintln!(
            "{}",
            style(format!("Record errors ({} total):", report.errors.len())).yellow()
        );
        for error in report.errors.iter().take(MAX_PRINTED_ERRORS) {
            eprintln!("  - {error}");
        }
        if report.errors.len() > MAX_PRINTED_ERRORS {
            eprintln!("  ... and {} more", report.errors.len() - MAX_PRINTED_ERRORS);
        }
    }

    if let Some(resume) = resume_hint(report) {
        println!("{resume}");
    }
}

/// A `--resume-offset` hint for a paused full single-entity run.
fn resume_hint(report: &RunReport) -> Option<String> {
    if report.mode != SyncMode::Full {
        return None;
    }
    match report.entities.as_slice() {
        [(entity, result)] if result.interrupted && result.last_offset > 0 => Some(format!(
            "Paused. Resume with: atelier run {entity} --resume-offset {}",
            result.last_offset
        )),
        _ => None,
    }
}
