//! Sync engine: paginated fetch, upsert, detail enrichment and run ledger.
//!
//! [`run_sync`] is the usual entry point. It wraps [`sync_entity`] or
//! [`sync_all`] in a ledger row so the next incremental run knows where to
//! start from.

mod context;
mod detail;
mod engine;
mod entities;
mod error;
mod pagination;
mod progress;
mod runner;
mod stream;
mod types;

pub use context::{SyncContext, SyncContextBuilder, SyncContextError};
pub use detail::{
    DEFAULT_DETAIL_CONCURRENCY, DEFAULT_DETAIL_DELAY, DetailBatch, DetailBatchOptions,
    fetch_details,
};
pub use engine::{
    resolve_cutoff, sync_all, sync_artists, sync_artworks, sync_contacts, sync_entity,
};
pub use entities::{Artists, Artworks, Contacts, MirroredEntity};
pub use error::{Result, SyncError};
pub use pagination::{FetchedPages, PageRequest, fetch_all_pages, page_is_stale, retain_newer_than};
pub use progress::{ProgressCallback, SyncPhase, SyncProgress, emit};
pub use runner::{RunReport, run_sync};
pub use stream::{DEFAULT_HEARTBEAT, StreamEvent, progress_channel, relay_with_heartbeat};
pub use types::{
    AllSyncResult, DEFAULT_LEASE_MINUTES, DEFAULT_PAGE_SIZE, PROGRESS_EVERY, SyncMode, SyncOptions,
    SyncResult, SyncTarget,
};
