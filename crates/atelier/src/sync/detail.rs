//! Bounded-concurrency detail fetching.
//!
//! Ids are processed in fixed-width chunks. Every fetch in a chunk runs
//! concurrently and the chunk settles completely (successes and failures)
//! before a fixed delay and the next chunk. Each fetch goes through the
//! retry executor, so a throttled id backs off on its own without failing
//! its neighbours.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinSet;

use super::progress::{ProgressCallback, SyncProgress, emit, should_report};
use crate::retry::{RetryConfig, with_backoff};
use crate::upstream::{self, EntityKind, UpstreamError};

/// Default number of concurrent detail fetches per chunk.
pub const DEFAULT_DETAIL_CONCURRENCY: usize = 2;

/// Default pause between chunks.
pub const DEFAULT_DETAIL_DELAY: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetailBatchOptions {
    /// Chunk width.
    pub concurrency: usize,
    /// Sleep between chunks (not after the last).
    pub delay: Duration,
    pub retry: RetryConfig,
}

impl Default for DetailBatchOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_DETAIL_CONCURRENCY,
            delay: DEFAULT_DETAIL_DELAY,
            retry: RetryConfig::default(),
        }
    }
}

/// Details fetched by [`fetch_details`].
#[derive(Debug)]
pub struct DetailBatch<D> {
    pub details: HashMap<i64, D>,
    /// `"{Label} detail: #{id} {reason}"` per failed id.
    pub errors: Vec<String>,
    /// Chunks were skipped after a pause request.
    pub interrupted: bool,
}

impl<D> Default for DetailBatch<D> {
    fn default() -> Self {
        Self {
            details: HashMap::new(),
            errors: Vec::new(),
            interrupted: false,
        }
    }
}

pub(crate) fn detail_error(entity: EntityKind, id: i64, reason: impl std::fmt::Display) -> String {
    format!("{} detail: #{} {}", entity.label(), id, reason)
}

/// Fetch details for `ids`, `options.concurrency` at a time.
///
/// Never fails as a whole: per-id failures are collected in
/// [`DetailBatch::errors`].
pub async fn fetch_details<D, F, Fut>(
    entity: EntityKind,
    ids: &[i64],
    options: &DetailBatchOptions,
    fetch: F,
    stop_flag: Option<&AtomicBool>,
    on_progress: Option<&ProgressCallback>,
) -> DetailBatch<D>
where
    D: Send + 'static,
    F: Fn(i64) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = upstream::Result<D>> + Send + 'static,
{
    let mut batch = DetailBatch::default();
    let total = ids.len();
    let width = options.concurrency.max(1);
    let mut done = 0usize;

    for (index, chunk) in ids.chunks(width).enumerate() {
        if stop_flag.is_some_and(|f| f.load(Ordering::SeqCst)) {
            tracing::info!(%entity, done, total, "Pause requested, skipping remaining details");
            batch.interrupted = true;
            break;
        }
        if index > 0 && !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }

        let mut join_set: JoinSet<(i64, Result<D, crate::retry::RetryError<UpstreamError>>)> =
            JoinSet::new();
        for &id in chunk {
            let fetch = fetch.clone();
            let retry = options.retry;
            join_set.spawn(async move {
                let label = format!("{} {}", entity.label(), id);
                let result = with_backoff(
                    &retry,
                    &label,
                    || fetch(id),
                    UpstreamError::is_rate_limited,
                )
                .await;
                (id, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((id, Ok(detail))) => {
                    batch.details.insert(id, detail);
                }
                Ok((id, Err(e))) => {
                    tracing::warn!(%entity, id, error = %e, "Detail fetch failed");
                    emit(
                        on_progress,
                        SyncProgress::DetailError {
                            entity,
                            id,
                            error: e.to_string(),
                        },
                    );
                    batch.errors.push(detail_error(entity, id, &e));
                }
                Err(join_err) => {
                    tracing::error!(%entity, error = %join_err, "Detail task failed");
                    batch
                        .errors
                        .push(format!("{} detail: task failed: {}", entity.label(), join_err));
                }
            }

            done += 1;
            if should_report(done, total) {
                emit(on_progress, SyncProgress::Detailing { entity, done, total });
            }
        }
    }

    batch
}
