//! Artist mirror writes.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
    sea_query::OnConflict,
};

use crate::entity::artist::{ActiveModel, Column, Entity as Artist};
use crate::entity::artist_extended::{
    ActiveModel as ExtendedActiveModel, Column as ExtendedColumn, Entity as ArtistExtended,
};
use crate::upstream::{ArtistDetail, RemoteArtist};

use super::errors::{Result, StoreError};
use super::mirror::{self, to_db_time};

pub async fn existing_ids<C: ConnectionTrait>(db: &C) -> Result<HashSet<i64>> {
    mirror::all_ids::<Artist, _>(db, Column::Id).await
}

pub async fn detail_backlog<C: ConnectionTrait>(db: &C) -> Result<Vec<i64>> {
    mirror::ids_missing_detail::<Artist, _>(db, Column::Id, Column::DetailSyncedAt).await
}

fn list_model(remote: &RemoteArtist, synced_at: DateTime<Utc>) -> ActiveModel {
    ActiveModel {
        id: Set(remote.id),
        first_name: Set(remote.first_name.clone()),
        last_name: Set(remote.last_name.clone()),
        name: Set(remote.name()),
        nationality: Set(remote.nationality.clone()),
        birth_year: Set(remote.birth_year),
        death_year: Set(remote.death_year),
        website: Set(remote.website.clone()),
        remote_created_at: Set(remote.created_at.map(to_db_time)),
        remote_updated_at: Set(to_db_time(remote.updated_at)),
        synced_at: Set(to_db_time(synced_at)),
        biography: NotSet,
        images: NotSet,
        statistics: NotSet,
        notes: NotSet,
        detail_synced_at: NotSet,
    }
}

pub(crate) fn list_on_conflict() -> OnConflict {
    OnConflict::column(Column::Id)
        .update_columns([
            Column::FirstName,
            Column::LastName,
            Column::Name,
            Column::Nationality,
            Column::BirthYear,
            Column::DeathYear,
            Column::Website,
            Column::RemoteCreatedAt,
            Column::RemoteUpdatedAt,
            Column::SyncedAt,
        ])
        .to_owned()
}

/// Upsert one artist and ensure its extension row, atomically.
pub async fn upsert(
    db: &DatabaseConnection,
    remote: &RemoteArtist,
    synced_at: DateTime<Utc>,
) -> Result<()> {
    if remote.name().is_empty() {
        return Err(StoreError::InvalidInput {
            message: "artist has no name".to_string(),
        });
    }

    let txn = db.begin().await?;

    Artist::insert(list_model(remote, synced_at))
        .on_conflict(list_on_conflict())
        .exec_without_returning(&txn)
        .await?;

    ArtistExtended::insert(ExtendedActiveModel {
        artist_id: Set(remote.id),
        created_at: Set(to_db_time(synced_at)),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(ExtendedColumn::ArtistId)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(&txn)
    .await?;

    txn.commit().await?;
    Ok(())
}

pub async fn apply_detail(
    db: &DatabaseConnection,
    id: i64,
    detail: &ArtistDetail,
    fetched_at: DateTime<Utc>,
) -> Result<()> {
    let patch = ActiveModel {
        biography: Set(detail.biography.clone()),
        images: Set(detail.images.clone()),
        statistics: Set(detail.statistics.clone()),
        notes: Set(detail.notes.clone()),
        detail_synced_at: Set(Some(to_db_time(fetched_at))),
        ..Default::default()
    };

    let result = Artist::update_many()
        .set(patch)
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(StoreError::not_found("artists", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, QueryTrait};

    fn remote(id: i64) -> RemoteArtist {
        RemoteArtist {
            id,
            first_name: Some("Agnes".into()),
            last_name: Some("Martin".into()),
            display_name: None,
            nationality: Some("US".into()),
            birth_year: Some(1912),
            death_year: Some(2004),
            website: None,
            created_at: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn list_projection_resolves_display_name() {
        assert_eq!(list_model(&remote(1), Utc::now()).name, Set("Agnes Martin".to_string()));
    }

    #[test]
    fn list_upsert_keeps_biography() {
        let sql = Artist::insert(list_model(&remote(1), Utc::now()))
            .on_conflict(list_on_conflict())
            .build(DatabaseBackend::Postgres)
            .to_string();
        let update_clause = sql.split("DO UPDATE SET").nth(1).expect("update clause");
        assert!(!update_clause.contains("\"biography\""));
        assert!(!update_clause.contains("\"detail_synced_at\""));
    }

    #[tokio::test]
    async fn nameless_artist_is_rejected_before_touching_the_db() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let mut artist = remote(1);
        artist.first_name = None;
        artist.last_name = None;

        let err = upsert(&db, &artist, Utc::now()).await.expect_err("invalid");
        assert!(matches!(err, StoreError::InvalidInput { .. }));
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn apply_detail_reports_missing_rows() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let err = apply_detail(&db, 99, &ArtistDetail::default(), Utc::now())
            .await
            .expect_err("no row");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
