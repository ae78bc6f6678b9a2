//! Atelier - an incremental mirror of a gallery-management API.
//!
//! This library pulls artworks, artists and contacts from an upstream gallery
//! API into a local relational database. It classifies created/updated rows,
//! tolerates per-record failures, backs off on upstream rate limiting,
//! enriches rows with per-record detail payloads under a bounded concurrency
//! limit, and records every run in a ledger that drives incremental cutoffs.
//!
//! # Features
//!
//! - `sqlite` / `postgres` - Database drivers for sea-orm.
//! - `migrate` - Enables the embedded migrator. When enabled, you can use
//!   [`connect_and_migrate`] to bring the schema up to date on connection.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use atelier::{connect_and_migrate, upstream::GalleryClient};
//! use atelier::sync::{SyncContext, SyncOptions, SyncTarget, run_sync};
//!
//! let db = connect_and_migrate("sqlite://atelier.db?mode=rwc").await?;
//! let client = GalleryClient::new("https://api.gallery.example/v1", "key", None)?;
//!
//! let ctx = SyncContext::builder()
//!     .api(Arc::new(client))
//!     .database(Arc::new(db))
//!     .build()?;
//!
//! let report = run_sync(&ctx, SyncTarget::All, &SyncOptions::incremental(), "cron", None).await?;
//! println!("{} processed, {} created", report.processed, report.created);
//! ```

pub mod db;
pub mod entity;
pub mod http;
pub mod retry;
pub mod store;
pub mod sync;
pub mod upstream;

#[cfg(feature = "migrate")]
pub mod migration;

pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use entity::prelude::*;
pub use store::StoreError;
pub use upstream::{GalleryApi, GalleryClient, UpstreamError};
pub use sync::{RunReport, SyncContext, SyncError, SyncOptions, SyncTarget, run_sync};
