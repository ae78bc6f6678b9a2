//! Contact entity - local mirror of upstream contacts (collectors, buyers,
//! institutions).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contacts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    // ─── List Projection ─────────────────────────────────────────────────────
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub tags: Json,
    pub remote_created_at: Option<DateTimeWithTimeZone>,
    pub remote_updated_at: DateTimeWithTimeZone,

    // ─── Detail Fields ───────────────────────────────────────────────────────
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[sea_orm(column_type = "Json", nullable)]
    pub activities: Option<Json>,
    #[sea_orm(column_type = "Json", nullable)]
    pub statistics: Option<Json>,

    // ─── Tracking ────────────────────────────────────────────────────────────
    pub synced_at: DateTimeWithTimeZone,
    pub detail_synced_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::contact_extended::Entity")]
    Extended,
}

impl Related<super::contact_extended::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Extended.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
