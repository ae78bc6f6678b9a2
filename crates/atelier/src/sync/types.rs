//! Sync modes, options and results.

use chrono::{DateTime, Duration, Utc};

use super::detail::DetailBatchOptions;
use crate::upstream::{EntityKind, SortOrder};

/// Default page size for list requests.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Progress is reported every this many records (and on the last one).
pub const PROGRESS_EVERY: usize = 10;

/// A `running` ledger row younger than this blocks a new run of its scope.
pub const DEFAULT_LEASE_MINUTES: i64 = 30;

/// How records are selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Walk the whole collection oldest-change first.
    #[default]
    Full,
    /// Walk newest-change first and stop once pages fall behind the cutoff.
    Incremental,
}

impl SyncMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncMode::Full => "full",
            SyncMode::Incremental => "incremental",
        }
    }

    /// Listing order for this mode.
    pub fn order(self) -> SortOrder {
        match self {
            SyncMode::Full => SortOrder::Asc,
            SyncMode::Incremental => SortOrder::Desc,
        }
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(SyncMode::Full),
            "incremental" => Ok(SyncMode::Incremental),
            other => Err(format!("unknown sync mode: {other}")),
        }
    }
}

/// What a run covers. Also names its ledger scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTarget {
    Entity(EntityKind),
    All,
}

impl SyncTarget {
    /// Ledger `entity_type` for this target.
    pub fn scope(self) -> &'static str {
        match self {
            SyncTarget::Entity(kind) => kind.as_str(),
            SyncTarget::All => "all",
        }
    }
}

impl std::fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.scope())
    }
}

impl std::str::FromStr for SyncTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(SyncTarget::All);
        }
        s.parse().map(SyncTarget::Entity)
    }
}

/// Options for a sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub mode: SyncMode,
    /// Explicit incremental cutoff. When `None`, the ledger supplies it.
    pub cutoff: Option<DateTime<Utc>>,
    /// Offset to start a full run from. Ignored in incremental mode.
    pub resume_offset: Option<u64>,
    pub page_size: u64,
    pub detail: DetailBatchOptions,
    /// Window in which a `running` ledger row counts as live.
    pub lease: Duration,
    /// Start even if another run of the same scope looks live.
    pub force: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            mode: SyncMode::Full,
            cutoff: None,
            resume_offset: None,
            page_size: DEFAULT_PAGE_SIZE,
            detail: DetailBatchOptions::default(),
            lease: Duration::minutes(DEFAULT_LEASE_MINUTES),
            force: false,
        }
    }
}

impl SyncOptions {
    pub fn full() -> Self {
        Self::default()
    }

    pub fn incremental() -> Self {
        Self {
            mode: SyncMode::Incremental,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_cutoff(mut self, cutoff: DateTime<Utc>) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    #[must_use]
    pub fn with_resume_offset(mut self, offset: u64) -> Self {
        self.resume_offset = Some(offset);
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: DetailBatchOptions) -> Self {
        self.detail = detail;
        self
    }

    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Outcome of syncing one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Records upserted successfully (`created + updated`).
    pub processed: u64,
    pub created: u64,
    pub updated: u64,
    /// Fetched records at or before the cutoff.
    pub skipped: u64,
    /// Per-record failures, list or detail phase.
    pub errors: Vec<String>,
    /// Listing offset to resume a full run from. Past the last fetched page
    /// when every fetched record was handled; otherwise the offset of the
    /// first record that was not.
    pub last_offset: u64,
    /// The run stopped early on a pause request.
    pub interrupted: bool,
}

/// Outcome of syncing every entity in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllSyncResult {
    pub entities: Vec<(EntityKind, SyncResult)>,
    pub interrupted: bool,
}

impl AllSyncResult {
    pub fn get(&self, kind: EntityKind) -> Option<&SyncResult> {
        self.entities.iter().find(|(k, _)| *k == kind).map(|(_, r)| r)
    }

    /// Counts summed across entities.
    pub fn totals(&self) -> SyncResult {
        let mut total = SyncResult {
            interrupted: self.interrupted,
            ..SyncResult::default()
        };
        for (_, r) in &self.entities {
            total.processed += r.processed;
            total.created += r.created;
            total.updated += r.updated;
            total.skipped += r.skipped;
            total.errors.extend(r.errors.iter().cloned());
        }
        total
    }
}
