use std::sync::Mutex;

use chrono::{DateTime, Utc};

use atelier::sync::{SyncPhase, SyncProgress};
use atelier::upstream::EntityKind;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter {
    /// Last entity and phase seen, reported with each heartbeat.
    current: Mutex<Option<(EntityKind, SyncPhase)>>,
}

impl LoggingReporter {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    pub fn current(&self) -> Option<(EntityKind, SyncPhase)> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn heartbeat(&self, at: DateTime<Utc>) {
        match self.current() {
            Some((entity, phase)) if phase != SyncPhase::Done => {
                tracing::info!(
                    at = %at.to_rfc3339(),
                    entity = %entity,
                    phase = %phase,
                    "Still working"
                );
            }
            _ => tracing::debug!(at = %at.to_rfc3339(), "Heartbeat"),
        }
    }

    pub fn handle(&self, event: SyncProgress) {
        if let (Some(entity), Some(phase)) = (event.entity(), event.phase()) {
            *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some((entity, phase));
        }

        match event {
            SyncProgress::FetchingRecords {
                entity,
                mode,
                cutoff,
                start_offset,
            } => {
                tracing::info!(
                    entity = %entity,
                    mode = %mode,
                    cutoff = ?cutoff,
                    start_offset,
                    "Fetching records"
                );
            }

            SyncProgress::FetchedPage {
                entity,
                page,
                count,
                total_so_far,
                total,
            } => {
                tracing::debug!(entity = %entity, page, count, total_so_far, total, "Fetched page");
            }

            SyncProgress::FetchComplete {
                entity,
                fetched,
                candidates,
                skipped,
            } => {
                tracing::info!(entity = %entity, fetched, candidates, skipped, "Fetch complete");
            }

            SyncProgress::Upserting {
                entity,
                processed,
                total,
                created,
                updated,
            } => {
                tracing::debug!(entity = %entity, processed, total, created, updated, "Upserting");
            }

            SyncProgress::UpsertError { entity, id, error } => {
                tracing::warn!(entity = %entity, id, error = %error, "Failed to save record");
            }

            SyncProgress::DetailingRecords { entity, total } => {
                tracing::info!(entity = %entity, total, "Fetching details");
            }

            SyncProgress::Detailing {
                entity,
                done,
                total,
            } => {
                tracing::debug!(entity = %entity, done, total, "Detailing");
            }

            SyncProgress::DetailError { entity, id, error } => {
                tracing::warn!(entity = %entity, id, error = %error, "Failed to fetch detail");
            }

            SyncProgress::StartingEntity {
                entity,
                position,
                of,
            } => {
                tracing::info!(entity = %entity, position, of, "Starting entity");
            }

            SyncProgress::EntityComplete {
                entity,
                processed,
                created,
                updated,
                skipped,
                errors,
            } => {
                tracing::info!(
                    entity = %entity,
                    processed,
                    created,
                    updated,
                    skipped,
                    errors,
                    "Entity complete"
                );
            }

            SyncProgress::Paused { entity } => {
                tracing::warn!(entity = %entity, "Paused");
            }

            SyncProgress::Warning { message } => {
                tracing::warn!(message = %message, "Warning");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
