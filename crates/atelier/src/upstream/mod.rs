//! Upstream gallery API: typed records, the [`GalleryApi`] seam, and the
//! HTTP-backed [`GalleryClient`].

mod client;
mod error;
mod rate_limit;
mod types;

use async_trait::async_trait;

pub use client::{DEFAULT_TIMEOUT, GalleryClient};
pub use error::{Result, UpstreamError, is_rate_limited_message};
pub use rate_limit::{ApiRateLimiter, DEFAULT_RPS};
pub use types::{
    ArtistDetail, ArtistRef, ArtworkDetail, ContactDetail, EntityKind, ListParams, Page,
    Pagination, RemoteArtist, RemoteArtwork, RemoteContact, RemoteRecord, SortOrder,
};

/// Read operations the sync engine needs from the gallery API.
///
/// Implementations must be shareable across the detail batcher's tasks.
#[async_trait]
pub trait GalleryApi: Send + Sync {
    async fn list_artworks(&self, params: &ListParams) -> Result<Page<RemoteArtwork>>;

    async fn get_artwork(&self, id: i64) -> Result<ArtworkDetail>;

    async fn list_artists(&self, params: &ListParams) -> Result<Page<RemoteArtist>>;

    async fn get_artist(&self, id: i64) -> Result<ArtistDetail>;

    async fn list_contacts(&self, params: &ListParams) -> Result<Page<RemoteContact>>;

    async fn get_contact(&self, id: i64) -> Result<ContactDetail>;
}
