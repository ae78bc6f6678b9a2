//! The three mirrored entities, expressed through one trait so the
//! orchestrator is written once.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

use crate::store::{self, artists, artworks, contacts};
use crate::upstream::{
    self, ArtistDetail, ArtworkDetail, ContactDetail, EntityKind, GalleryApi, ListParams, Page,
    RemoteArtist, RemoteArtwork, RemoteContact, RemoteRecord,
};

/// An upstream collection mirrored into a local table.
#[async_trait]
pub trait MirroredEntity: Send + Sync + 'static {
    type Remote: RemoteRecord + Send + Sync + 'static;
    type Detail: Send + Sync + 'static;

    const KIND: EntityKind;

    async fn list(
        api: &dyn GalleryApi,
        params: &ListParams,
    ) -> upstream::Result<Page<Self::Remote>>;

    async fn detail(api: &dyn GalleryApi, id: i64) -> upstream::Result<Self::Detail>;

    async fn existing_ids(db: &DatabaseConnection) -> store::Result<HashSet<i64>>;

    async fn detail_backlog(db: &DatabaseConnection) -> store::Result<Vec<i64>>;

    async fn upsert(
        db: &DatabaseConnection,
        remote: &Self::Remote,
        synced_at: DateTime<Utc>,
    ) -> store::Result<()>;

    async fn apply_detail(
        db: &DatabaseConnection,
        id: i64,
        detail: &Self::Detail,
        fetched_at: DateTime<Utc>,
    ) -> store::Result<()>;
}

pub struct Artworks;
pub struct Artists;
pub struct Contacts;

#[async_trait]
impl MirroredEntity for Artworks {
    type Remote = RemoteArtwork;
    type Detail = ArtworkDetail;

    const KIND: EntityKind = EntityKind::Artworks;

    async fn list(
        api: &dyn GalleryApi,
        params: &ListParams,
    ) -> upstream::Result<Page<RemoteArtwork>> {
        api.list_artworks(params).await
    }

    async fn detail(api: &dyn GalleryApi, id: i64) -> upstream::Result<ArtworkDetail> {
        api.get_artwork(id).await
    }

    async fn existing_ids(db: &DatabaseConnection) -> store::Result<HashSet<i64>> {
        artworks::existing_ids(db).await
    }

    async fn detail_backlog(db: &DatabaseConnection) -> store::Result<Vec<i64>> {
        artworks::detail_backlog(db).await
    }

    async fn upsert(
        db: &DatabaseConnection,
        remote: &RemoteArtwork,
        synced_at: DateTime<Utc>,
    ) -> store::Result<()> {
        artworks::upsert(db, remote, synced_at).await
    }

    async fn apply_detail(
        db: &DatabaseConnection,
        id: i64,
        detail: &ArtworkDetail,
        fetched_at: DateTime<Utc>,
    ) -> store::Result<()> {
        artworks::apply_detail(db, id, detail, fetched_at).await
    }
}

#[async_trait]
impl MirroredEntity for Artists {
    type Remote = RemoteArtist;
    type Detail = ArtistDetail;

    const KIND: EntityKind = EntityKind::Artists;

    async fn list(
        api: &dyn GalleryApi,
        params: &ListParams,
    ) -> upstream::Result<Page<RemoteArtist>> {
        api.list_artists(params).await
    }

    async fn detail(api: &dyn GalleryApi, id: i64) -> upstream::Result<ArtistDetail> {
        api.get_artist(id).await
    }

    async fn existing_ids(db: &DatabaseConnection) -> store::Result<HashSet<i64>> {
        artists::existing_ids(db).await
    }

    async fn detail_backlog(db: &DatabaseConnection) -> store::Result<Vec<i64>> {
        artists::detail_backlog(db).await
    }

    async fn upsert(
        db: &DatabaseConnection,
        remote: &RemoteArtist,
        synced_at: DateTime<Utc>,
    ) -> store::Result<()> {
        artists::upsert(db, remote, synced_at).await
    }

    async fn apply_detail(
        db: &DatabaseConnection,
        id: i64,
        detail: &ArtistDetail,
        fetched_at: DateTime<Utc>,
    ) -> store::Result<()> {
        artists::apply_detail(db, id, detail, fetched_at).await
    }
}

#[async_trait]
impl MirroredEntity for Contacts {
    type Remote = RemoteContact;
    type Detail = ContactDetail;

    const KIND: EntityKind = EntityKind::Contacts;

    async fn list(
        api: &dyn GalleryApi,
        params: &ListParams,
    ) -> upstream::Result<Page<RemoteContact>> {
        api.list_contacts(params).await
    }

    async fn detail(api: &dyn GalleryApi, id: i64) -> upstream::Result<ContactDetail> {
        api.get_contact(id).await
    }

    async fn existing_ids(db: &DatabaseConnection) -> store::Result<HashSet<i64>> {
        contacts::existing_ids(db).await
    }

    async fn detail_backlog(db: &DatabaseConnection) -> store::Result<Vec<i64>> {
        contacts::detail_backlog(db).await
    }

    async fn upsert(
        db: &DatabaseConnection,
        remote: &RemoteContact,
        synced_at: DateTime<Utc>,
    ) -> store::Result<()> {
        contacts::upsert(db, remote, synced_at).await
    }

    async fn apply_detail(
        db: &DatabaseConnection,
        id: i64,
        detail: &ContactDetail,
        fetched_at: DateTime<Utc>,
    ) -> store::Result<()> {
        contacts::apply_detail(db, id, detail, fetched_at).await
    }
}
