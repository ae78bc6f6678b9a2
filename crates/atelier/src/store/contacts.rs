//! Contact mirror writes.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
    sea_query::OnConflict,
};

use crate::entity::contact::{ActiveModel, Column, Entity as Contact};
use crate::entity::contact_extended::{
    ActiveModel as ExtendedActiveModel, Column as ExtendedColumn, Entity as ContactExtended,
};
use crate::upstream::{ContactDetail, RemoteContact};

use super::errors::{Result, StoreError};
use super::mirror::{self, to_db_time};

pub async fn existing_ids<C: ConnectionTrait>(db: &C) -> Result<HashSet<i64>> {
    mirror::all_ids::<Contact, _>(db, Column::Id).await
}

pub async fn detail_backlog<C: ConnectionTrait>(db: &C) -> Result<Vec<i64>> {
    mirror::ids_missing_detail::<Contact, _>(db, Column::Id, Column::DetailSyncedAt).await
}

fn list_model(remote: &RemoteContact, synced_at: DateTime<Utc>) -> ActiveModel {
    ActiveModel {
        id: Set(remote.id),
        first_name: Set(remote.first_name.clone()),
        last_name: Set(remote.last_name.clone()),
        email: Set(remote.email.as_deref().map(|e| e.trim().to_lowercase())),
        phone: Set(remote.phone.clone()),
        company: Set(remote.company.clone()),
        city: Set(remote.city.clone()),
        country: Set(remote.country.clone()),
        tags: Set(mirror::json_strings(remote.tags.iter().map(String::as_str))),
        remote_created_at: Set(remote.created_at.map(to_db_time)),
        remote_updated_at: Set(to_db_time(remote.updated_at)),
        synced_at: Set(to_db_time(synced_at)),
        notes: NotSet,
        activities: NotSet,
        statistics: NotSet,
        detail_synced_at: NotSet,
    }
}

pub(crate) fn list_on_conflict() -> OnConflict {
    OnConflict::column(Column::Id)
        .update_columns([
            Column::FirstName,
            Column::LastName,
            Column::Email,
            Column::Phone,
            Column::Company,
            Column::City,
            Column::Country,
            Column::Tags,
            Column::RemoteCreatedAt,
            Column::RemoteUpdatedAt,
            Column::SyncedAt,
        ])
        .to_owned()
}

/// Upsert one contact and ensure its extension row, atomically.
pub async fn upsert(
    db: &DatabaseConnection,
    remote: &RemoteContact,
    synced_at: DateTime<Utc>,
) -> Result<()> {
    let txn = db.begin().await?;

    Contact::insert(list_model(remote, synced_at))
        .on_conflict(list_on_conflict())
        .exec_without_returning(&txn)
        .await?;

    ContactExtended::insert(ExtendedActiveModel {
        contact_id: Set(remote.id),
        created_at: Set(to_db_time(synced_at)),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(ExtendedColumn::ContactId)
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
    detail: &ContactDetail,
    fetched_at: DateTime<Utc>,
) -> Result<()> {
    let patch = ActiveModel {
        notes: Set(detail.notes.clone()),
        activities: Set(detail.activities.clone()),
        statistics: Set(detail.statistics.clone()),
        detail_synced_at: Set(Some(to_db_time(fetched_at))),
        ..Default::default()
    };

    let result = Contact::update_many()
        .set(patch)
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(StoreError::not_found("contacts", id));
    }
    Ok(())
}
