use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::types::SyncResult;
use crate::store::StoreError;
use crate::upstream::{EntityKind, UpstreamError};

/// Run-level sync failures. Per-record failures never surface here; they
/// are collected in [`SyncResult::errors`].
#[derive(Debug, Error)]
pub enum SyncError {
    /// A list page could not be fetched.
    #[error("{entity} listing failed: {source}")]
    Upstream {
        entity: EntityKind,
        #[source]
        source: UpstreamError,
    },

    /// Snapshot, backlog or ledger query failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Another run of the same scope holds the lease.
    #[error("a {scope} sync is already running (run {run_id}, started {started_at})")]
    AlreadyRunning {
        scope: String,
        run_id: Uuid,
        started_at: DateTime<Utc>,
    },

    /// An entity failed during a combined run; later entities were skipped.
    #[error("sync of all entities aborted at {entity}: {source}")]
    Aborted {
        entity: EntityKind,
        completed: Vec<(EntityKind, SyncResult)>,
        #[source]
        source: Box<SyncError>,
    },
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Counts that were committed before the failure.
    pub fn partial_counts(&self) -> (u64, u64, u64) {
        match self {
            SyncError::Aborted { completed, .. } => completed.iter().fold((0, 0, 0), |acc, (_, r)| {
                (acc.0 + r.processed, acc.1 + r.created, acc.2 + r.updated)
            }),
            _ => (0, 0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aborted_reports_partial_counts_and_cause() {
        let err = SyncError::Aborted {
            entity: EntityKind::Artists,
            completed: vec![(
                EntityKind::Artworks,
                SyncResult {
                    processed: 5,
                    created: 3,
                    updated: 2,
                    ..SyncResult::default()
                },
            )],
            source: Box::new(SyncError::Upstream {
                entity: EntityKind::Artists,
                source: UpstreamError::Api {
                    status: 500,
                    message: "down".into(),
                },
            }),
        };

        assert_eq!(err.partial_counts(), (5, 3, 2));
        let msg = err.to_string();
        assert!(msg.contains("aborted at artists"));
        assert!(msg.contains("API error (500): down"));
    }
}
