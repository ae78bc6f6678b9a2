//! Offset pagination over the upstream list endpoints.
//!
//! Pages are requested one at a time, sorted by `updated_at`, and
//! accumulated in arrival order. The walk ends when the API reports no
//! further pages, when a page comes back empty, when an incremental walk
//! reaches a page that is entirely at or before the cutoff, or when a pause
//! is requested. Page errors propagate unchanged; retrying list pages is the
//! caller's business.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use super::progress::{ProgressCallback, SyncProgress, emit};
use crate::upstream::{self, EntityKind, ListParams, Page, RemoteRecord, SortOrder};

/// Where and how to walk a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub order: SortOrder,
    pub page_size: u64,
    pub start_offset: u64,
    /// Enables early stop on stale pages.
    pub cutoff: Option<DateTime<Utc>>,
}

/// Records accumulated by [`fetch_all_pages`].
#[derive(Debug, Clone)]
pub struct FetchedPages<T> {
    pub items: Vec<T>,
    /// Offset the next page would have been requested at.
    pub next_offset: u64,
    pub pages: u32,
    /// Stopped on a page entirely at or before the cutoff.
    pub stopped_early: bool,
    /// Stopped because a pause was requested.
    pub interrupted: bool,
}

/// Whether every record on the page changed at or before `cutoff`.
///
/// An empty page is stale.
pub fn page_is_stale<T: RemoteRecord>(items: &[T], cutoff: DateTime<Utc>) -> bool {
    items.iter().all(|item| item.updated_at() <= cutoff)
}

/// Keep records changed strictly after `cutoff`. Returns how many were
/// dropped.
pub fn retain_newer_than<T: RemoteRecord>(items: &mut Vec<T>, cutoff: DateTime<Utc>) -> usize {
    let before = items.len();
    items.retain(|item| item.updated_at() > cutoff);
    before - items.len()
}

/// Walk a listing page by page.
///
/// `fetch_page` is called with `{offset, limit, order}`; the offset starts
/// at `request.start_offset` and advances by the page size.
pub async fn fetch_all_pages<T, F, Fut>(
    entity: EntityKind,
    request: &PageRequest,
    mut fetch_page: F,
    stop_flag: Option<&AtomicBool>,
    on_progress: Option<&ProgressCallback>,
) -> upstream::Result<FetchedPages<T>>
where
    T: RemoteRecord,
    F: FnMut(ListParams) -> Fut,
    Fut: Future<Output = upstream::Result<Page<T>>>,
{
    let page_size = request.page_size.max(1);
    let mut fetched = FetchedPages {
        items: Vec::new(),
        next_offset: request.start_offset,
        pages: 0,
        stopped_early: false,
        interrupted: false,
    };

    loop {
        if stop_flag.is_some_and(|f| f.load(Ordering::SeqCst)) {
            tracing::info!(
                %entity,
                offset = fetched.next_offset,
                "Pause requested, stopping pagination"
            );
            fetched.interrupted = true;
            break;
        }

        let params = ListParams::new(fetched.next_offset, page_size, request.order);
        let page = fetch_page(params).await?;

        if page.data.is_empty() {
            tracing::debug!(%entity, offset = fetched.next_offset, "Empty page, listing exhausted");
            break;
        }

        fetched.pages += 1;
        let count = page.data.len();
        let stale = request
            .cutoff
            .is_some_and(|cutoff| page_is_stale(&page.data, cutoff));
        let has_more = page.pagination.has_more;

        fetched.items.extend(page.data);
        fetched.next_offset += page_size;

        emit(
            on_progress,
            SyncProgress::FetchedPage {
                entity,
                page: fetched.pages,
                count,
                total_so_far: fetched.items.len(),
                total: page.pagination.total,
            },
        );

        if stale {
            tracing::debug!(%entity, page = fetched.pages, "Page entirely before cutoff, stopping");
            fetched.stopped_early = true;
            break;
        }
        if !has_more {
            break;
        }
    }

    Ok(fetched)
}
