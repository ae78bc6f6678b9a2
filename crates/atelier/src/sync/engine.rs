//! Entity orchestration: fetch, upsert, detail.
//!
//! One entity sync walks the upstream listing, upserts every candidate in
//! its own transaction, then fetches details for the records it just wrote
//! plus every row still missing detail. Record-level failures are collected
//! as strings; only list-page failures and store queries abort the run.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use chrono::{DateTime, Utc};

use super::context::SyncContext;
use super::detail::{detail_error, fetch_details};
use super::entities::{Artists, Artworks, Contacts, MirroredEntity};
use super::error::{Result, SyncError};
use super::pagination::{PageRequest, fetch_all_pages, retain_newer_than};
use super::progress::{ProgressCallback, SyncProgress, emit, should_report};
use super::types::{AllSyncResult, SyncMode, SyncOptions, SyncResult};
use crate::store::{Upserted, ledger};
use crate::upstream::{EntityKind, RemoteRecord, SortOrder};

/// Cutoff for a run of `scope`: explicit option first, then the ledger.
/// Full runs have none.
pub async fn resolve_cutoff(
    ctx: &SyncContext,
    scope: &str,
    options: &SyncOptions,
) -> Result<Option<DateTime<Utc>>> {
    if options.mode == SyncMode::Full {
        return Ok(None);
    }
    if let Some(cutoff) = options.cutoff {
        return Ok(Some(cutoff));
    }
    Ok(ledger::last_completed_at(ctx.db(), scope).await?)
}

/// Processed ids first (in order), then backlog ids not already listed.
fn detail_targets(processed: &[i64], backlog: Vec<i64>) -> Vec<i64> {
    let mut seen: HashSet<i64> = processed.iter().copied().collect();
    let mut ids = processed.to_vec();
    ids.extend(backlog.into_iter().filter(|id| seen.insert(*id)));
    ids
}

/// Sync one entity, resolving the cutoff from its own ledger scope.
pub async fn sync_entity<E: MirroredEntity>(
    ctx: &SyncContext,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<SyncResult> {
    let cutoff = resolve_cutoff(ctx, E::KIND.as_str(), options).await?;
    sync_entity_with_cutoff::<E>(ctx, options, cutoff, on_progress).await
}

pub async fn sync_artworks(
    ctx: &SyncContext,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<SyncResult> {
    sync_entity::<Artworks>(ctx, options, on_progress).await
}

pub async fn sync_artists(
    ctx: &SyncContext,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<SyncResult> {
    sync_entity::<Artists>(ctx, options, on_progress).await
}

pub async fn sync_contacts(
    ctx: &SyncContext,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<SyncResult> {
    sync_entity::<Contacts>(ctx, options, on_progress).await
}

/// Dispatch on a runtime entity kind with an already-resolved cutoff.
pub(crate) async fn sync_kind(
    ctx: &SyncContext,
    kind: EntityKind,
    options: &SyncOptions,
    cutoff: Option<DateTime<Utc>>,
    on_progress: Option<&ProgressCallback>,
) -> Result<SyncResult> {
    match kind {
        EntityKind::Artworks => {
            sync_entity_with_cutoff::<Artworks>(ctx, options, cutoff, on_progress).await
        }
        EntityKind::Artists => {
            sync_entity_with_cutoff::<Artists>(ctx, options, cutoff, on_progress).await
        }
        EntityKind::Contacts => {
            sync_entity_with_cutoff::<Contacts>(ctx, options, cutoff, on_progress).await
        }
    }
}

#[tracing::instrument(skip_all, fields(entity = %E::KIND, mode = %options.mode))]
async fn sync_entity_with_cutoff<E: MirroredEntity>(
    ctx: &SyncContext,
    options: &SyncOptions,
    cutoff: Option<DateTime<Utc>>,
    on_progress: Option<&ProgressCallback>,
) -> Result<SyncResult> {
    let entity = E::KIND;
    let stop_flag = Some(ctx.stop_flag().as_ref());
    let mut result = SyncResult::default();

    // ─── Fetching ────────────────────────────────────────────────────────────

    // Without a cutoff an incremental run has nothing to stop on, so it
    // walks the listing like a full run.
    let (order, start_offset) = match cutoff {
        Some(_) => (SortOrder::Desc, 0),
        None if options.mode == SyncMode::Full => {
            (SortOrder::Asc, options.resume_offset.unwrap_or(0))
        }
        None => (SortOrder::Asc, 0),
    };
    let request = PageRequest {
        order,
        page_size: options.page_size,
        start_offset,
        cutoff,
    };

    emit(
        on_progress,
        SyncProgress::FetchingRecords {
            entity,
            mode: options.mode,
            cutoff,
            start_offset,
        },
    );
    tracing::info!(?cutoff, start_offset, "Fetching records");

    let api = ctx.api().as_ref();
    let fetched = fetch_all_pages(
        entity,
        &request,
        |params| async move { E::list(api, &params).await },
        stop_flag,
        on_progress,
    )
    .await
    .map_err(|source| SyncError::Upstream { entity, source })?;

    // Advances only as fetched records are stored.
    result.last_offset = start_offset;
    let fetched_count = fetched.items.len();
    let mut candidates = fetched.items;
    if let Some(cutoff) = cutoff {
        result.skipped = retain_newer_than(&mut candidates, cutoff) as u64;
    }

    emit(
        on_progress,
        SyncProgress::FetchComplete {
            entity,
            fetched: fetched_count,
            candidates: candidates.len(),
            skipped: result.skipped as usize,
        },
    );

    if fetched.interrupted {
        emit(on_progress, SyncProgress::Paused { entity });
        result.interrupted = true;
        return Ok(finish(entity, result, on_progress));
    }

    // ─── Upserting ───────────────────────────────────────────────────────────

    let mut existing = E::existing_ids(ctx.db()).await?;
    let synced_at = Utc::now();
    let total = candidates.len();
    let mut processed_ids = Vec::with_capacity(total);

    for (index, record) in candidates.iter().enumerate() {
        if ctx.stop_flag().load(Ordering::SeqCst) {
            tracing::info!(done = index, total, "Pause requested, stopping upserts");
            emit(on_progress, SyncProgress::Paused { entity });
            result.interrupted = true;
            result.last_offset = start_offset + index as u64;
            break;
        }

        let id = record.id();
        match E::upsert(ctx.db(), record, synced_at).await {
            Ok(()) => {
                match Upserted::classify(&existing, id) {
                    Upserted::Created => result.created += 1,
                    Upserted::Updated => result.updated += 1,
                }
                existing.insert(id);
                result.processed += 1;
                processed_ids.push(id);
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "Upsert failed");
                emit(
                    on_progress,
                    SyncProgress::UpsertError {
                        entity,
                        id,
                        error: e.to_string(),
                    },
                );
                result.errors.push(format!("{} {}: {}", entity.label(), id, e));
            }
        }

        if should_report(index + 1, total) {
            emit(
                on_progress,
                SyncProgress::Upserting {
                    entity,
                    processed: index + 1,
                    total,
                    created: result.created,
                    updated: result.updated,
                },
            );
        }
    }

    if result.interrupted {
        return Ok(finish(entity, result, on_progress));
    }
    result.last_offset = fetched.next_offset;

    // ─── Detailing ───────────────────────────────────────────────────────────

    let backlog = E::detail_backlog(ctx.db()).await?;
    let targets = detail_targets(&processed_ids, backlog);

    if !targets.is_empty() {
        emit(
            on_progress,
            SyncProgress::DetailingRecords {
                entity,
                total: targets.len(),
            },
        );
        tracing::info!(total = targets.len(), "Fetching details");

        let api = Arc::clone(ctx.api());
        let batch = fetch_details(
            entity,
            &targets,
            &options.detail,
            move |id| {
                let api = Arc::clone(&api);
                async move { E::detail(api.as_ref(), id).await }
            },
            stop_flag,
            on_progress,
        )
        .await;

        result.errors.extend(batch.errors);

        let fetched_at = Utc::now();
        for id in &targets {
            let Some(detail) = batch.details.get(id) else {
                continue;
            };
            if let Err(e) = E::apply_detail(ctx.db(), *id, detail, fetched_at).await {
                tracing::warn!(id, error = %e, "Applying detail failed");
                emit(
                    on_progress,
                    SyncProgress::DetailError {
                        entity,
                        id: *id,
                        error: e.to_string(),
                    },
                );
                result.errors.push(detail_error(entity, *id, &e));
            }
        }

        if batch.interrupted {
            emit(on_progress, SyncProgress::Paused { entity });
            result.interrupted = true;
        }
    }

    Ok(finish(entity, result, on_progress))
}

fn finish(
    entity: EntityKind,
    result: SyncResult,
    on_progress: Option<&ProgressCallback>,
) -> SyncResult {
    tracing::info!(
        %entity,
        processed = result.processed,
        created = result.created,
        updated = result.updated,
        skipped = result.skipped,
        errors = result.errors.len(),
        interrupted = result.interrupted,
        "Entity sync finished"
    );
    emit(
        on_progress,
        SyncProgress::EntityComplete {
            entity,
            processed: result.processed,
            created: result.created,
            updated: result.updated,
            skipped: result.skipped,
            errors: result.errors.len(),
        },
    );
    result
}

/// Sync artworks, then artists, then contacts with one mode and cutoff.
///
/// The cutoff comes from the `"all"` ledger scope unless supplied. The first
/// entity that fails aborts the rest; a pause stops the sequence cleanly.
#[tracing::instrument(skip_all, fields(mode = %options.mode))]
pub async fn sync_all(
    ctx: &SyncContext,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<AllSyncResult> {
    let cutoff = resolve_cutoff(ctx, "all", options).await?;
    let mut all = AllSyncResult::default();
    let of = EntityKind::ALL.len();

    for (index, kind) in EntityKind::ALL.into_iter().enumerate() {
        if ctx.is_stopped() {
            emit(on_progress, SyncProgress::Paused { entity: kind });
            all.interrupted = true;
            break;
        }

        emit(
            on_progress,
            SyncProgress::StartingEntity {
                entity: kind,
                position: index + 1,
                of,
            },
        );

        match sync_kind(ctx, kind, options, cutoff, on_progress).await {
            Ok(result) => {
                let paused = result.interrupted;
                all.entities.push((kind, result));
                if paused {
                    all.interrupted = true;
                    break;
                }
            }
            Err(source) => {
                tracing::error!(entity = %kind, error = %source, "Entity sync failed, aborting");
                return Err(SyncError::Aborted {
                    entity: kind,
                    completed: all.entities,
                    source: Box::new(source),
                });
            }
        }
    }

    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_targets_put_processed_first_without_duplicates() {
        assert_eq!(detail_targets(&[5, 2], vec![1, 2, 9]), vec![5, 2, 1, 9]);
        assert_eq!(detail_targets(&[], vec![3]), vec![3]);
        assert!(detail_targets(&[], Vec::new()).is_empty());
    }
}
