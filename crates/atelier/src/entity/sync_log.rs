//! Sync run ledger.
//!
//! One row per run: inserted as `running` when the run starts and updated
//! exactly once when it ends. The most recent `completed` row per
//! `entity_type` is the cutoff for the next incremental run of that scope.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sync_status::{SyncDirection, SyncStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// `artworks`, `artists`, `contacts` or `all`.
    pub entity_type: String,
    pub direction: SyncDirection,
    pub status: SyncStatus,
    pub records_processed: i32,
    pub records_created: i32,
    pub records_updated: i32,
    /// Summary of per-record errors, or the run-fatal error.
    #[sea_orm(column_type = "Text", nullable)]
    pub error: Option<String>,
    pub started_at: DateTimeWithTimeZone,
    pub completed_at: Option<DateTimeWithTimeZone>,
    /// Who asked for the run (`cli`, `schedule`, a user id, ...).
    pub triggered_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Wall-clock duration, if the run has finished.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|end| end - self.started_at)
    }
}
