//! Sync run ledger operations.
//!
//! A row is inserted as `running` when a run starts and finalized exactly
//! once. The latest `completed` row of a scope supplies the incremental
//! cutoff for the next run of that scope.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::entity::sync_log::{ActiveModel, Column, Entity as SyncLog, Model};
use crate::entity::sync_status::{SyncDirection, SyncStatus};

use super::errors::{Result, StoreError};
use super::mirror::to_db_time;

/// At most this many per-record errors are kept in a ledger summary.
pub const MAX_SUMMARIZED_ERRORS: usize = 10;

/// Final state written to a ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: SyncStatus,
    pub processed: u64,
    pub created: u64,
    pub updated: u64,
    pub error: Option<String>,
}

impl RunOutcome {
    /// A run-fatal failure with no counts.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: SyncStatus::Error,
            processed: 0,
            created: 0,
            updated: 0,
            error: Some(message.into()),
        }
    }
}

fn count(n: u64) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Insert a `running` row for `scope`.
pub async fn start_run<C: ConnectionTrait>(
    db: &C,
    scope: &str,
    triggered_by: Option<&str>,
) -> Result<Model> {
    if scope.is_empty() {
        return Err(StoreError::InvalidInput {
            message: "ledger scope is empty".to_string(),
        });
    }

    let row = ActiveModel {
        id: Set(Uuid::new_v4()),
        entity_type: Set(scope.to_string()),
        direction: Set(SyncDirection::Pull),
        status: Set(SyncStatus::Running),
        records_processed: Set(0),
        records_created: Set(0),
        records_updated: Set(0),
        error: Set(None),
        started_at: Set(to_db_time(Utc::now())),
        completed_at: Set(None),
        triggered_by: Set(triggered_by.map(str::to_string)),
    };

    Ok(row.insert(db).await?)
}

/// Finalize a run. Only rows still `running` are updated, so a row is
/// never finalized twice.
pub async fn finish_run<C: ConnectionTrait>(db: &C, id: Uuid, outcome: &RunOutcome) -> Result<()> {
    if outcome.status == SyncStatus::Running {
        return Err(StoreError::InvalidInput {
            message: "cannot finish a run as running".to_string(),
        });
    }

    let patch = ActiveModel {
        status: Set(outcome.status),
        records_processed: Set(count(outcome.processed)),
        records_created: Set(count(outcome.created)),
        records_updated: Set(count(outcome.updated)),
        error: Set(outcome.error.clone()),
        completed_at: Set(Some(to_db_time(Utc::now()))),
        ..Default::default()
    };

    let result = SyncLog::update_many()
        .set(patch)
        .filter(Column::Id.eq(id))
        .filter(Column::Status.eq(SyncStatus::Running))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(StoreError::NotFound {
            context: format!("running sync_logs id={id}"),
        });
    }
    Ok(())
}

/// `completed_at` of the most recent completed run of `scope`.
pub async fn last_completed_at<C: ConnectionTrait>(
    db: &C,
    scope: &str,
) -> Result<Option<DateTime<Utc>>> {
    let latest: Option<Option<DateTime<FixedOffset>>> = SyncLog::find()
        .select_only()
        .column(Column::CompletedAt)
        .filter(Column::EntityType.eq(scope))
        .filter(Column::Status.eq(SyncStatus::Completed))
        .filter(Column::CompletedAt.is_not_null())
        .order_by_desc(Column::CompletedAt)
        .into_tuple()
        .one(db)
        .await?;

    Ok(latest.flatten().map(|t| t.with_timezone(&Utc)))
}

/// A `running` row of `scope` started within `lease`, if any.
pub async fn find_active_run<C: ConnectionTrait>(
    db: &C,
    scope: &str,
    lease: Duration,
) -> Result<Option<Model>> {
    let since = to_db_time(Utc::now() - lease);
    Ok(SyncLog::find()
        .filter(Column::EntityType.eq(scope))
        .filter(Column::Status.eq(SyncStatus::Running))
        .filter(Column::StartedAt.gt(since))
        .order_by_desc(Column::StartedAt)
        .one(db)
        .await?)
}

/// Mark `running` rows older than `lease` as errored. Returns how many.
///
/// Such rows belong to runs that died without finalizing.
pub async fn expire_stale_runs<C: ConnectionTrait>(
    db: &C,
    scope: &str,
    lease: Duration,
) -> Result<u64> {
    let before = to_db_time(Utc::now() - lease);
    let patch = ActiveModel {
        status: Set(SyncStatus::Error),
        error: Set(Some("abandoned: run never finished".to_string())),
        completed_at: Set(Some(to_db_time(Utc::now()))),
        ..Default::default()
    };

    let result = SyncLog::update_many()
        .set(patch)
        .filter(Column::EntityType.eq(scope))
        .filter(Column::Status.eq(SyncStatus::Running))
        .filter(Column::StartedAt.lte(before))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Newest runs first, optionally restricted to one scope.
pub async fn recent_runs<C: ConnectionTrait>(
    db: &C,
    scope: Option<&str>,
    limit: u64,
) -> Result<Vec<Model>> {
    let mut query = SyncLog::find();
    if let Some(scope) = scope {
        query = query.filter(Column::EntityType.eq(scope));
    }
    Ok(query
        .order_by_desc(Column::StartedAt)
        .limit(limit)
        .all(db)
        .await?)
}

/// Collapse per-record errors into `"{n} errors: e1; e2; ..."`, keeping the
/// first ten.
pub fn summarize_errors(errors: &[String]) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    let shown = errors
        .iter()
        .take(MAX_SUMMARIZED_ERRORS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ");
    Some(format!("{} errors: {}", errors.len(), shown))
}
