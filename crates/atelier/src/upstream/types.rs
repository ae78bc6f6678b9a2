//! Gallery API data types.
//!
//! Only the fields the mirror stores are modeled; unknown fields are ignored
//! so upstream additions don't break deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// The three mirrored upstream resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Artworks,
    Artists,
    Contacts,
}

impl EntityKind {
    /// All entities in the order a combined run syncs them.
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Artworks,
        EntityKind::Artists,
        EntityKind::Contacts,
    ];

    /// Collection path segment and ledger `entity_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Artworks => "artworks",
            EntityKind::Artists => "artists",
            EntityKind::Contacts => "contacts",
        }
    }

    /// Singular label used in per-record error strings.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Artworks => "Artwork",
            EntityKind::Artists => "Artist",
            EntityKind::Contacts => "Contact",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "artworks" | "artwork" => Ok(EntityKind::Artworks),
            "artists" | "artist" => Ok(EntityKind::Artists),
            "contacts" | "contact" => Ok(EntityKind::Contacts),
            other => Err(format!("unknown entity: {other}")),
        }
    }
}

/// Sort direction on `updated_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Query for one list page. Sorting is always by `updated_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub offset: u64,
    pub limit: u64,
    pub order: SortOrder,
}

impl ListParams {
    pub fn new(offset: u64, limit: u64, order: SortOrder) -> Self {
        Self {
            offset,
            limit,
            order,
        }
    }
}

/// Pagination block of a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
    pub has_more: bool,
}

/// One page of a list endpoint: `{ data, pagination }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    /// A page that ends the listing.
    pub fn last(data: Vec<T>, offset: u64) -> Self {
        let len = data.len() as u64;
        Self {
            data,
            pagination: Pagination {
                total: offset + len,
                offset,
                limit: len,
                has_more: false,
            },
        }
    }
}

/// Detail endpoints wrap the record in `{ data }`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

/// Identity and change stamp shared by every list record.
pub trait RemoteRecord {
    fn id(&self) -> i64;
    fn updated_at(&self) -> DateTime<Utc>;
}

/// Accept `"1962"`, `1962` or `null`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

// ─── Artworks ────────────────────────────────────────────────────────────────

/// Artist credit embedded in an artwork.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArtistRef {
    pub id: i64,
    #[serde(default, alias = "display_name")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteArtwork {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    /// Inventory status (available, sold, ...).
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub inventory_number: Option<String>,
    /// Primary image URL.
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl RemoteRecord for RemoteArtwork {
    fn id(&self) -> i64 {
        self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Fields only the detail endpoint returns.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ArtworkDetail {
    #[serde(default)]
    pub images: Option<serde_json::Value>,
    #[serde(default)]
    pub statistics: Option<serde_json::Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub provenance: Option<String>,
    #[serde(default)]
    pub exhibition_history: Option<serde_json::Value>,
    #[serde(default)]
    pub notes: Option<String>,
}

// ─── Artists ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteArtist {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub death_year: Option<i32>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl RemoteArtist {
    /// Display name, falling back to "first last".
    pub fn name(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl RemoteRecord for RemoteArtist {
    fn id(&self) -> i64 {
        self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ArtistDetail {
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub images: Option<serde_json::Value>,
    #[serde(default)]
    pub statistics: Option<serde_json::Value>,
    #[serde(default)]
    pub notes: Option<String>,
}

// ─── Contacts ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteContact {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl RemoteRecord for RemoteContact {
    fn id(&self) -> i64 {
        self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ContactDetail {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub activities: Option<serde_json::Value>,
    #[serde(default)]
    pub statistics: Option<serde_json::Value>,
}
