//! Sync context: the upstream API, the store handle and the pause flag.
//!
//! # Example
//!
//! ```ignore
//! use atelier::sync::SyncContext;
//!
//! let ctx = SyncContext::builder()
//!     .api(Arc::new(client))
//!     .database(Arc::new(db))
//!     .stop_flag(Arc::clone(&pause))
//!     .build()?;
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use sea_orm::DatabaseConnection;

use crate::upstream::GalleryApi;

/// Error type for sync context construction.
#[derive(Debug, thiserror::Error)]
pub enum SyncContextError {
    /// Missing required field in builder.
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },
}

/// Builder for [`SyncContext`].
#[derive(Default)]
pub struct SyncContextBuilder {
    api: Option<Arc<dyn GalleryApi>>,
    database: Option<Arc<DatabaseConnection>>,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl SyncContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the upstream API.
    pub fn api(mut self, api: Arc<dyn GalleryApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Set the database connection.
    pub fn database(mut self, db: Arc<DatabaseConnection>) -> Self {
        self.database = Some(db);
        self
    }

    /// Share a pause flag with the caller (e.g. a Ctrl+C handler).
    pub fn stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    /// Build the context.
    ///
    /// # Errors
    ///
    /// Returns `SyncContextError::MissingField` if the API or database is not set.
    pub fn build(self) -> Result<SyncContext, SyncContextError> {
        let api = self
            .api
            .ok_or(SyncContextError::MissingField { field: "api" })?;
        let db = self
            .database
            .ok_or(SyncContextError::MissingField { field: "database" })?;

        Ok(SyncContext {
            api,
            db,
            stop_flag: self.stop_flag.unwrap_or_default(),
        })
    }
}

/// Everything a run needs besides its options.
#[derive(Clone)]
pub struct SyncContext {
    api: Arc<dyn GalleryApi>,
    db: Arc<DatabaseConnection>,
    stop_flag: Arc<AtomicBool>,
}

impl SyncContext {
    pub fn builder() -> SyncContextBuilder {
        SyncContextBuilder::new()
    }

    pub fn api(&self) -> &Arc<dyn GalleryApi> {
        &self.api
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    pub fn stop_flag(&self) -> &Arc<AtomicBool> {
        &self.stop_flag
    }

    /// Ask the run to stop at its next checkpoint.
    pub fn request_stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Clear a previous pause request (e.g. between scheduled runs).
    pub fn reset_stop(&self) {
        self.stop_flag.store(false, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{
        ArtistDetail, ArtworkDetail, ContactDetail, ListParams, Page, RemoteArtist,
        RemoteArtwork, RemoteContact, Result as UpstreamResult,
    };
    use async_trait::async_trait;
    use sea_orm::{DatabaseBackend, MockDatabase};

    struct NoApi;

    #[async_trait]
    impl GalleryApi for NoApi {
        async fn list_artworks(&self, p: &ListParams) -> UpstreamResult<Page<RemoteArtwork>> {
            Ok(Page::last(Vec::new(), p.offset))
        }
        async fn get_artwork(&self, _id: i64) -> UpstreamResult<ArtworkDetail> {
            Ok(ArtworkDetail::default())
        }
        async fn list_artists(&self, p: &ListParams) -> UpstreamResult<Page<RemoteArtist>> {
            Ok(Page::last(Vec::new(), p.offset))
        }
        async fn get_artist(&self, _id: i64) -> UpstreamResult<ArtistDetail> {
            Ok(ArtistDetail::default())
        }
        async fn list_contacts(&self, p: &ListParams) -> UpstreamResult<Page<RemoteContact>> {
            Ok(Page::last(Vec::new(), p.offset))
        }
        async fn get_contact(&self, _id: i64) -> UpstreamResult<ContactDetail> {
            Ok(ContactDetail::default())
        }
    }

    fn mock_db() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Sqlite).into_connection())
    }

    #[test]
    fn build_requires_api_and_database() {
        let err = SyncContext::builder()
            .database(mock_db())
            .build()
            .err()
            .expect("missing api");
        assert!(matches!(err, SyncContextError::MissingField { field: "api" }));

        let err = SyncContext::builder()
            .api(Arc::new(NoApi))
            .build()
            .err()
            .expect("missing database");
        assert!(matches!(err, SyncContextError::MissingField { field: "database" }));
    }

    #[test]
    fn stop_flag_is_shared_with_caller() {
        let flag = Arc::new(AtomicBool::new(false));
        let ctx = SyncContext::builder()
            .api(Arc::new(NoApi))
            .database(mock_db())
            .stop_flag(Arc::clone(&flag))
            .build()
            .expect("context");

        assert!(!ctx.is_stopped());
        flag.store(true, Ordering::SeqCst);
        assert!(ctx.is_stopped());
        ctx.reset_stop();
        assert!(!flag.load(Ordering::SeqCst));
        ctx.request_stop();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn clones_share_connection_and_pause_flag() {
        let db = mock_db();
        let ctx = SyncContext::builder()
            .api(Arc::new(NoApi))
            .database(Arc::clone(&db))
            .build()
            .expect("context");
        let copy = ctx.clone();

        assert!(std::ptr::eq(ctx.db(), copy.db()));
        assert!(std::ptr::eq(ctx.db(), db.as_ref()));
        copy.request_stop();
        assert!(ctx.is_stopped());
    }
}
