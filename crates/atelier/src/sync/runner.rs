//! Ledger-wrapped sync runs.

use chrono::Utc;
use uuid::Uuid;

use super::context::SyncContext;
use super::engine::{resolve_cutoff, sync_all, sync_kind};
use super::error::{Result, SyncError};
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::types::{AllSyncResult, SyncMode, SyncOptions, SyncResult, SyncTarget};
use crate::entity::sync_status::SyncStatus;
use crate::store::ledger::{self, RunOutcome};
use crate::upstream::EntityKind;

/// What a finished run wrote to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub scope: String,
    pub mode: SyncMode,
    /// `completed`, or `cancelled` when a pause stopped the run.
    pub status: SyncStatus,
    pub processed: u64,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: Vec<String>,
    /// Per-entity results in run order.
    pub entities: Vec<(EntityKind, SyncResult)>,
}

fn outcome_for(totals: &SyncResult) -> RunOutcome {
    RunOutcome {
        status: if totals.interrupted {
            SyncStatus::Cancelled
        } else {
            SyncStatus::Completed
        },
        processed: totals.processed,
        created: totals.created,
        updated: totals.updated,
        error: ledger::summarize_errors(&totals.errors),
    }
}

fn failure_outcome(err: &SyncError) -> RunOutcome {
    let (processed, created, updated) = err.partial_counts();
    RunOutcome {
        processed,
        created,
        updated,
        ..RunOutcome::failed(err.to_string())
    }
}

/// Run `target` and record it in the ledger.
///
/// Stale `running` rows of the scope are expired first. A live one makes
/// the call fail with [`SyncError::AlreadyRunning`] unless
/// [`SyncOptions::force`] is set. A run-level failure is written as
/// `error` and then returned.
#[tracing::instrument(skip(ctx, options, on_progress), fields(scope = target.scope()))]
pub async fn run_sync(
    ctx: &SyncContext,
    target: SyncTarget,
    options: &SyncOptions,
    triggered_by: &str,
    on_progress: Option<&ProgressCallback>,
) -> Result<RunReport> {
    let scope = target.scope();

    let expired = ledger::expire_stale_runs(ctx.db(), scope, options.lease).await?;
    if expired > 0 {
        tracing::warn!(expired, "Expired abandoned runs");
        emit(
            on_progress,
            SyncProgress::Warning {
                message: format!("expired {expired} abandoned {scope} run(s)"),
            },
        );
    }

    if !options.force {
        if let Some(active) = ledger::find_active_run(ctx.db(), scope, options.lease).await? {
            return Err(SyncError::AlreadyRunning {
                scope: scope.to_string(),
                run_id: active.id,
                started_at: active.started_at.with_timezone(&Utc),
            });
        }
    }

    let run = ledger::start_run(ctx.db(), scope, Some(triggered_by)).await?;
    tracing::info!(run_id = %run.id, mode = %options.mode, "Sync run started");

    let result = match target {
        SyncTarget::All => sync_all(ctx, options, on_progress).await,
        SyncTarget::Entity(kind) => run_entity(ctx, kind, options, on_progress).await,
    };

    match result {
        Ok(all) => {
            let totals = all.totals();
            let outcome = outcome_for(&totals);
            ledger::finish_run(ctx.db(), run.id, &outcome).await?;
            tracing::info!(
                run_id = %run.id,
                status = %outcome.status,
                processed = totals.processed,
                errors = totals.errors.len(),
                "Sync run finished"
            );
            Ok(RunReport {
                run_id: run.id,
                scope: scope.to_string(),
                mode: options.mode,
                status: outcome.status,
                processed: totals.processed,
                created: totals.created,
                updated: totals.updated,
                skipped: totals.skipped,
                errors: totals.errors,
                entities: all.entities,
            })
        }
        Err(err) => {
            tracing::error!(run_id = %run.id, error = %err, "Sync run failed");
            if let Err(ledger_err) =
                ledger::finish_run(ctx.db(), run.id, &failure_outcome(&err)).await
            {
                tracing::error!(
                    run_id = %run.id,
                    error = %ledger_err,
                    "Could not record failed run"
                );
            }
            Err(err)
        }
    }
}

async fn run_entity(
    ctx: &SyncContext,
    kind: EntityKind,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<AllSyncResult> {
    let cutoff = resolve_cutoff(ctx, kind.as_str(), options).await?;
    let result = sync_kind(ctx, kind, options, cutoff, on_progress).await?;
    Ok(AllSyncResult {
        interrupted: result.interrupted,
        entities: vec![(kind, result)],
    })
}
