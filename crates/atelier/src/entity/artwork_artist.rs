//! Junction between artworks and the artists credited on them.
//!
//! `artist_id` deliberately has no foreign key: artworks sync before artists,
//! so the artist row may not exist yet.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "artwork_artists")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub artwork_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub artist_id: i64,
    pub artist_name: Option<String>,
    /// Credit order on the artwork (0-based).
    pub position: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::artwork::Entity",
        from = "Column::ArtworkId",
        to = "super::artwork::Column::Id",
        on_delete = "Cascade"
    )]
    Artwork,
}

impl Related<super::artwork::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Artwork.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
