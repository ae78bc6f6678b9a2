//! Helpers shared by the per-entity mirror tables.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use super::errors::Result;

/// Whether an upsert inserted a new row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Created,
    Updated,
}

impl Upserted {
    /// Classify by membership in the id snapshot taken before upserting.
    pub fn classify(existing: &HashSet<i64>, id: i64) -> Self {
        if existing.contains(&id) {
            Upserted::Updated
        } else {
            Upserted::Created
        }
    }
}

pub(crate) fn to_db_time(t: DateTime<Utc>) -> DateTime<FixedOffset> {
    t.fixed_offset()
}

/// Every id in a mirror table.
pub(crate) async fn all_ids<E, C>(db: &C, id_col: E::Column) -> Result<HashSet<i64>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let ids: Vec<i64> = E::find()
        .select_only()
        .column(id_col)
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}

/// Ids whose detail fields were never fetched, oldest id first.
pub(crate) async fn ids_missing_detail<E, C>(
    db: &C,
    id_col: E::Column,
    detail_col: E::Column,
) -> Result<Vec<i64>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    Ok(E::find()
        .select_only()
        .column(id_col)
        .filter(detail_col.is_null())
        .order_by_asc(id_col)
        .into_tuple()
        .all(db)
        .await?)
}

/// JSON array of strings.
pub(crate) fn json_strings<'a>(items: impl IntoIterator<Item = &'a str>) -> serde_json::Value {
    serde_json::Value::Array(
        items
            .into_iter()
            .map(|s| serde_json::Value::String(s.to_string()))
            .collect(),
    )
}
