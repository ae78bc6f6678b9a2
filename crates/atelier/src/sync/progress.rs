//! Progress events emitted during sync runs.

use chrono::{DateTime, Utc};

use super::types::SyncMode;
use crate::upstream::EntityKind;

/// Coarse phase of an entity sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Fetching,
    Upserting,
    Detailing,
    Done,
}

impl SyncPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncPhase::Fetching => "fetching",
            SyncPhase::Upserting => "upserting",
            SyncPhase::Detailing => "detailing",
            SyncPhase::Done => "done",
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress events emitted during a sync run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// Starting to page through an entity's listing.
    FetchingRecords {
        entity: EntityKind,
        mode: SyncMode,
        /// Records changed at or before this instant are skipped.
        cutoff: Option<DateTime<Utc>>,
        start_offset: u64,
    },

    /// Fetched one list page.
    FetchedPage {
        entity: EntityKind,
        /// Page number (1-indexed).
        page: u32,
        count: usize,
        total_so_far: usize,
        /// Collection size reported by the API.
        total: u64,
    },

    /// Listing finished and the cutoff filter applied.
    FetchComplete {
        entity: EntityKind,
        fetched: usize,
        candidates: usize,
        skipped: usize,
    },

    /// Running upsert counters.
    Upserting {
        entity: EntityKind,
        processed: usize,
        total: usize,
        created: u64,
        updated: u64,
    },

    /// A record failed to upsert; the run continues.
    UpsertError {
        entity: EntityKind,
        id: i64,
        error: String,
    },

    /// Starting the detail phase.
    DetailingRecords { entity: EntityKind, total: usize },

    /// Running detail counter.
    Detailing {
        entity: EntityKind,
        done: usize,
        total: usize,
    },

    /// A detail fetch or write failed; the run continues.
    DetailError {
        entity: EntityKind,
        id: i64,
        error: String,
    },

    /// A combined run moved on to the next entity.
    StartingEntity {
        entity: EntityKind,
        /// 1-indexed position in the combined run.
        position: usize,
        of: usize,
    },

    /// An entity finished.
    EntityComplete {
        entity: EntityKind,
        processed: u64,
        created: u64,
        updated: u64,
        skipped: u64,
        errors: usize,
    },

    /// A pause request was honored.
    Paused { entity: EntityKind },

    /// Non-fatal warning.
    Warning { message: String },
}

impl SyncProgress {
    /// The entity the event belongs to, if any.
    pub fn entity(&self) -> Option<EntityKind> {
        match self {
            SyncProgress::FetchingRecords { entity, .. }
            | SyncProgress::FetchedPage { entity, .. }
            | SyncProgress::FetchComplete { entity, .. }
            | SyncProgress::Upserting { entity, .. }
            | SyncProgress::UpsertError { entity, .. }
            | SyncProgress::DetailingRecords { entity, .. }
            | SyncProgress::Detailing { entity, .. }
            | SyncProgress::DetailError { entity, .. }
            | SyncProgress::StartingEntity { entity, .. }
            | SyncProgress::EntityComplete { entity, .. }
            | SyncProgress::Paused { entity } => Some(*entity),
            SyncProgress::Warning { .. } => None,
        }
    }

    /// The phase the event reports on, if it belongs to one.
    pub fn phase(&self) -> Option<SyncPhase> {
        match self {
            SyncProgress::FetchingRecords { .. }
            | SyncProgress::FetchedPage { .. }
            | SyncProgress::FetchComplete { .. } => Some(SyncPhase::Fetching),
            SyncProgress::Upserting { .. } | SyncProgress::UpsertError { .. } => {
                Some(SyncPhase::Upserting)
            }
            SyncProgress::DetailingRecords { .. }
            | SyncProgress::Detailing { .. }
            | SyncProgress::DetailError { .. } => Some(SyncPhase::Detailing),
            SyncProgress::EntityComplete { .. } => Some(SyncPhase::Done),
            SyncProgress::StartingEntity { .. }
            | SyncProgress::Paused { .. }
            | SyncProgress::Warning { .. } => None,
        }
    }
}

/// Callback for progress updates during sync operations.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

/// Whether a running counter should be reported at `done` of `total`.
#[inline]
pub(crate) fn should_report(done: usize, total: usize) -> bool {
    done == total || done % super::types::PROGRESS_EVERY == 0
}
