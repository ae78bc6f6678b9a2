//! Shared fixtures: an in-memory database and a scripted gallery API.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use atelier::connect_and_migrate;
use atelier::retry::RetryConfig;
use atelier::sync::{DetailBatchOptions, SyncContext, SyncOptions};
use atelier::upstream::{
    self, ArtistDetail, ArtistRef, ArtworkDetail, ContactDetail, EntityKind, GalleryApi,
    ListParams, Page, Pagination, RemoteArtist, RemoteArtwork, RemoteContact, RemoteRecord,
    SortOrder, UpstreamError,
};
use chrono::{DateTime, TimeZone, Utc};

/// Fixed origin for record timestamps.
pub fn ts(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

pub fn artwork(id: i64, updated_at: DateTime<Utc>) -> RemoteArtwork {
    RemoteArtwork {
        id,
        title: format!("Artwork {id}"),
        year: Some("1962".to_string()),
        medium: Some("Oil on canvas".to_string()),
        dimensions: None,
        price: Some(1200.0),
        currency: Some("EUR".to_string()),
        status: Some("available".to_string()),
        inventory_number: Some(format!("INV-{id}")),
        image_url: None,
        artists: vec![ArtistRef {
            id: 100 + id,
            name: Some(format!("Painter {id}")),
        }],
        created_at: Some(updated_at),
        updated_at,
    }
}

pub fn artist(id: i64, updated_at: DateTime<Utc>) -> RemoteArtist {
    RemoteArtist {
        id,
        first_name: Some("Ada".to_string()),
        last_name: Some(format!("Painter{id}")),
        display_name: None,
        nationality: None,
        birth_year: Some(1901),
        death_year: None,
        website: None,
        created_at: None,
        updated_at,
    }
}

pub fn contact(id: i64, updated_at: DateTime<Utc>) -> RemoteContact {
    RemoteContact {
        id,
        first_name: Some("Grace".to_string()),
        last_name: None,
        email: Some(format!("Collector{id}@Example.com")),
        phone: None,
        company: None,
        city: Some("Lisbon".to_string()),
        country: None,
        tags: vec!["collector".to_string()],
        created_at: None,
        updated_at,
    }
}

#[derive(Default)]
struct State {
    artworks: Vec<RemoteArtwork>,
    artists: Vec<RemoteArtist>,
    contacts: Vec<RemoteContact>,
    list_calls: Vec<(EntityKind, ListParams)>,
    detail_calls: Vec<(EntityKind, i64)>,
    failing_lists: HashSet<EntityKind>,
    failing_details: HashSet<(EntityKind, i64)>,
    throttled: HashMap<(EntityKind, i64), u32>,
}

/// Gallery API backed by in-memory collections.
///
/// Listing sorts by `updated_at` (ties by id) and slices by offset and
/// limit the way the real endpoint does.
#[derive(Default)]
pub struct FakeGallery {
    state: Mutex<State>,
}

fn page_of<T: RemoteRecord + Clone>(items: &[T], params: &ListParams) -> Page<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by_key(|r| (r.updated_at(), r.id()));
    if params.order == SortOrder::Desc {
        sorted.reverse();
    }
    let total = sorted.len() as u64;
    let start = params.offset.min(total) as usize;
    let end = (params.offset + params.limit).min(total) as usize;
    Page {
        data: sorted[start..end].to_vec(),
        pagination: Pagination {
            total,
            offset: params.offset,
            limit: params.limit,
            has_more: (end as u64) < total,
        },
    }
}

impl FakeGallery {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_artworks(&self, records: impl IntoIterator<Item = RemoteArtwork>) {
        self.state.lock().unwrap().artworks.extend(records);
    }

    pub fn add_artists(&self, records: impl IntoIterator<Item = RemoteArtist>) {
        self.state.lock().unwrap().artists.extend(records);
    }

    pub fn add_contacts(&self, records: impl IntoIterator<Item = RemoteContact>) {
        self.state.lock().unwrap().contacts.extend(records);
    }

    pub fn fail_list(&self, kind: EntityKind) {
        self.state.lock().unwrap().failing_lists.insert(kind);
    }

    pub fn fail_detail(&self, kind: EntityKind, id: i64) {
        self.state.lock().unwrap().failing_details.insert((kind, id));
    }

    pub fn heal(&self) {
        let mut state = self.state.lock().unwrap();
        state.failing_lists.clear();
        state.failing_details.clear();
    }

    /// Answer the next `times` detail calls for `id` with a 429.
    pub fn throttle_detail(&self, kind: EntityKind, id: i64, times: u32) {
        self.state.lock().unwrap().throttled.insert((kind, id), times);
    }

    pub fn list_calls(&self) -> Vec<(EntityKind, ListParams)> {
        self.state.lock().unwrap().list_calls.clone()
    }

    pub fn detail_calls(&self, kind: EntityKind) -> Vec<i64> {
        self.state
            .lock()
            .unwrap()
            .detail_calls
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, id)| *id)
            .collect()
    }

    pub fn clear_calls(&self) {
        let mut state = self.state.lock().unwrap();
        state.list_calls.clear();
        state.detail_calls.clear();
    }

    fn begin_list(&self, kind: EntityKind, params: &ListParams) -> upstream::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.list_calls.push((kind, *params));
        if state.failing_lists.contains(&kind) {
            return Err(UpstreamError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn begin_detail(&self, kind: EntityKind, id: i64) -> upstream::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.detail_calls.push((kind, id));
        if let Some(left) = state.throttled.get_mut(&(kind, id)) {
            if *left > 0 {
                *left -= 1;
                return Err(UpstreamError::RateLimited { retry_after: None });
            }
        }
        if state.failing_details.contains(&(kind, id)) {
            return Err(UpstreamError::Api {
                status: 500,
                message: format!("detail {id} exploded"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GalleryApi for FakeGallery {
    async fn list_artworks(&self, params: &ListParams) -> upstream::Result<Page<RemoteArtwork>> {
        self.begin_list(EntityKind::Artworks, params)?;
        Ok(page_of(&self.state.lock().unwrap().artworks, params))
    }

    async fn get_artwork(&self, id: i64) -> upstream::Result<ArtworkDetail> {
        self.begin_detail(EntityKind::Artworks, id)?;
        Ok(ArtworkDetail {
            description: Some(format!("About artwork {id}")),
            provenance: Some("Private collection".to_string()),
            ..ArtworkDetail::default()
        })
    }

    async fn list_artists(&self, params: &ListParams) -> upstream::Result<Page<RemoteArtist>> {
        self.begin_list(EntityKind::Artists, params)?;
        Ok(page_of(&self.state.lock().unwrap().artists, params))
    }

    async fn get_artist(&self, id: i64) -> upstream::Result<ArtistDetail> {
        self.begin_detail(EntityKind::Artists, id)?;
        Ok(ArtistDetail {
            biography: Some(format!("Biography {id}")),
            ..ArtistDetail::default()
        })
    }

    async fn list_contacts(&self, params: &ListParams) -> upstream::Result<Page<RemoteContact>> {
        self.begin_list(EntityKind::Contacts, params)?;
        Ok(page_of(&self.state.lock().unwrap().contacts, params))
    }

    async fn get_contact(&self, id: i64) -> upstream::Result<ContactDetail> {
        self.begin_detail(EntityKind::Contacts, id)?;
        Ok(ContactDetail {
            notes: Some(format!("Met contact {id}")),
            ..ContactDetail::default()
        })
    }
}

/// Context over a fresh in-memory database.
pub async fn setup(api: &Arc<FakeGallery>) -> SyncContext {
    let db = connect_and_migrate("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    SyncContext::builder()
        .api(Arc::clone(api) as Arc<dyn GalleryApi>)
        .database(Arc::new(db))
        .build()
        .expect("context")
}

/// Small pages, no inter-chunk delay and millisecond backoff.
pub fn fast(options: SyncOptions) -> SyncOptions {
    options.with_page_size(2).with_detail(DetailBatchOptions {
        concurrency: 2,
        delay: Duration::ZERO,
        retry: RetryConfig::new(3, Duration::from_millis(1)),
    })
}
