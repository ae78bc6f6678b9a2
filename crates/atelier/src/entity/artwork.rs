//! Artwork entity - local mirror of upstream artworks.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Artwork mirror row, keyed by the upstream id.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "artworks")]
pub struct Model {
    /// Upstream artwork id (stable across syncs).
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    // ─── List Projection ─────────────────────────────────────────────────────
    pub title: String,
    /// Free-form year ("1962", "c. 1910").
    pub year: Option<String>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    #[sea_orm(column_type = "Double", nullable)]
    pub price: Option<f64>,
    pub currency: Option<String>,
    /// Inventory status (available, sold, on hold, ...).
    pub status: Option<String>,
    pub inventory_number: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,
    /// Display names of associated artists, in upstream order.
    #[sea_orm(column_type = "Json")]
    pub artist_names: Json,
    pub remote_created_at: Option<DateTimeWithTimeZone>,
    pub remote_updated_at: DateTimeWithTimeZone,

    // ─── Detail Fields ───────────────────────────────────────────────────────
    #[sea_orm(column_type = "Json", nullable)]
    pub images: Option<Json>,
    #[sea_orm(column_type = "Json", nullable)]
    pub statistics: Option<Json>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub provenance: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub exhibition_history: Option<Json>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    // ─── Tracking ────────────────────────────────────────────────────────────
    /// Set on every list-level upsert.
    pub synced_at: DateTimeWithTimeZone,
    /// Set only when detail fields were fetched; `None` keeps the row in the
    /// detail backlog.
    pub detail_synced_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::artwork_extended::Entity")]
    Extended,
    #[sea_orm(has_many = "super::artwork_artist::Entity")]
    ArtworkArtists,
}

impl Related<super::artwork_extended::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Extended.def()
    }
}

impl Related<super::artwork_artist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ArtworkArtists.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the detail phase still owes this row a fetch.
    pub fn needs_detail(&self) -> bool {
        self.detail_synced_at.is_none()
    }
}
