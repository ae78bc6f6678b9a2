//! Artwork mirror writes.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
    sea_query::OnConflict,
};

use crate::entity::artwork::{ActiveModel, Column, Entity as Artwork};
use crate::entity::artwork_artist::{
    ActiveModel as JunctionActiveModel, Column as JunctionColumn, Entity as ArtworkArtist,
};
use crate::entity::artwork_extended::{
    ActiveModel as ExtendedActiveModel, Column as ExtendedColumn, Entity as ArtworkExtended,
};
use crate::upstream::{ArtistRef, ArtworkDetail, RemoteArtwork};

use super::errors::{Result, StoreError};
use super::mirror::{self, to_db_time};

/// Snapshot of every mirrored artwork id.
pub async fn existing_ids<C: ConnectionTrait>(db: &C) -> Result<HashSet<i64>> {
    mirror::all_ids::<Artwork, _>(db, Column::Id).await
}

/// Artwork ids still owed a detail fetch.
pub async fn detail_backlog<C: ConnectionTrait>(db: &C) -> Result<Vec<i64>> {
    mirror::ids_missing_detail::<Artwork, _>(db, Column::Id, Column::DetailSyncedAt).await
}

/// List-level projection of an artwork. Detail columns stay `NotSet`.
fn list_model(remote: &RemoteArtwork, synced_at: DateTime<Utc>) -> ActiveModel {
    let names = mirror::json_strings(
        unique_credits(&remote.artists).filter_map(|a| a.name.as_deref()),
    );

    ActiveModel {
        id: Set(remote.id),
        title: Set(remote.title.clone()),
        year: Set(remote.year.clone()),
        medium: Set(remote.medium.clone()),
        dimensions: Set(remote.dimensions.clone()),
        price: Set(remote.price),
        currency: Set(remote.currency.clone()),
        status: Set(remote.status.clone()),
        inventory_number: Set(remote.inventory_number.clone()),
        image_url: Set(remote.image_url.clone()),
        artist_names: Set(names),
        remote_created_at: Set(remote.created_at.map(to_db_time)),
        remote_updated_at: Set(to_db_time(remote.updated_at)),
        synced_at: Set(to_db_time(synced_at)),
        images: NotSet,
        statistics: NotSet,
        description: NotSet,
        provenance: NotSet,
        exhibition_history: NotSet,
        notes: NotSet,
        detail_synced_at: NotSet,
    }
}

/// Conflict on id overwrites the list projection only.
pub(crate) fn list_on_conflict() -> OnConflict {
    OnConflict::column(Column::Id)
        .update_columns([
            Column::Title,
            Column::Year,
            Column::Medium,
            Column::Dimensions,
            Column::Price,
            Column::Currency,
            Column::Status,
            Column::InventoryNumber,
            Column::ImageUrl,
            Column::ArtistNames,
            Column::RemoteCreatedAt,
            Column::RemoteUpdatedAt,
            Column::SyncedAt,
        ])
        .to_owned()
}

/// Credits in upstream order; the first occurrence of an artist wins.
fn unique_credits(artists: &[ArtistRef]) -> impl Iterator<Item = &ArtistRef> {
    let mut seen = HashSet::new();
    artists.iter().filter(move |a| seen.insert(a.id))
}

fn junction_models(artwork_id: i64, artists: &[ArtistRef]) -> Vec<JunctionActiveModel> {
    unique_credits(artists)
        .enumerate()
        .map(|(position, artist)| JunctionActiveModel {
            artwork_id: Set(artwork_id),
            artist_id: Set(artist.id),
            artist_name: Set(artist.name.clone()),
            position: Set(position as i32),
        })
        .collect()
}

/// Upsert one artwork with its artist credits and extension row, atomically.
pub async fn upsert(
    db: &DatabaseConnection,
    remote: &RemoteArtwork,
    synced_at: DateTime<Utc>,
) -> Result<()> {
    if remote.title.trim().is_empty() {
        return Err(StoreError::InvalidInput {
            message: "title is empty".to_string(),
        });
    }

    let txn = db.begin().await?;

    Artwork::insert(list_model(remote, synced_at))
        .on_conflict(list_on_conflict())
        .exec_without_returning(&txn)
        .await?;

    // Replace the credit set so removed artists disappear.
    ArtworkArtist::delete_many()
        .filter(JunctionColumn::ArtworkId.eq(remote.id))
        .exec(&txn)
        .await?;
    let credits = junction_models(remote.id, &remote.artists);
    if !credits.is_empty() {
        ArtworkArtist::insert_many(credits)
            .exec_without_returning(&txn)
            .await?;
    }

    ArtworkExtended::insert(ExtendedActiveModel {
        artwork_id: Set(remote.id),
        created_at: Set(to_db_time(synced_at)),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(ExtendedColumn::ArtworkId)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;

    txn.commit().await?;
    Ok(())
}

/// Write detail fields and stamp `detail_synced_at`.
pub async fn apply_detail(
    db: &DatabaseConnection,
    id: i64,
    detail: &ArtworkDetail,
    fetched_at: DateTime<Utc>,
) -> Result<()> {
    let patch = ActiveModel {
        images: Set(detail.images.clone()),
        statistics: Set(detail.statistics.clone()),
        description: Set(detail.description.clone()),
        provenance: Set(detail.provenance.clone()),
        exhibition_history: Set(detail.exhibition_history.clone()),
        notes: Set(detail.notes.clone()),
        detail_synced_at: Set(Some(to_db_time(fetched_at))),
        ..Default::default()
    };

    let result = Artwork::update_many()
        .set(patch)
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(StoreError::not_found("artworks", id));
    }
    Ok(())
}
