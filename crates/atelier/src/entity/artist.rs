//! Artist entity - local mirror of upstream artists.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "artists")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    // ─── List Projection ─────────────────────────────────────────────────────
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Resolved display name (upstream display name or "first last").
    pub name: String,
    pub nationality: Option<String>,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub website: Option<String>,
    pub remote_created_at: Option<DateTimeWithTimeZone>,
    pub remote_updated_at: DateTimeWithTimeZone,

    // ─── Detail Fields ───────────────────────────────────────────────────────
    #[sea_orm(column_type = "Text", nullable)]
    pub biography: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub images: Option<Json>,
    #[sea_orm(column_type = "Json", nullable)]
    pub statistics: Option<Json>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    // ─── Tracking ────────────────────────────────────────────────────────────
    pub synced_at: DateTimeWithTimeZone,
    pub detail_synced_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::artist_extended::Entity")]
    Extended,
}

impl Related<super::artist_extended::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Extended.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
