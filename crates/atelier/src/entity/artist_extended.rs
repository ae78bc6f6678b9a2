//! Companion row for artists holding enrichment data the sync never writes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "artists_extended")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub artist_id: i64,
    #[sea_orm(column_type = "Text", nullable)]
    pub ai_summary: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub embedding: Option<Json>,
    pub enriched_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::artist::Entity",
        from = "Column::ArtistId",
        to = "super::artist::Column::Id",
        on_delete = "Cascade"
    )]
    Artist,
}

impl Related<super::artist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Artist.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
