//! HTTP client for the gallery API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use super::GalleryApi;
use super::error::{Result, UpstreamError};
use super::rate_limit::ApiRateLimiter;
use super::types::{
    ArtistDetail, ArtworkDetail, ContactDetail, DataEnvelope, EntityKind, ListParams, Page,
    RemoteArtist, RemoteArtwork, RemoteContact,
};
use crate::http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

/// Request timeout used by [`GalleryClient::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Gallery API client authenticating with a bearer key.
#[derive(Clone)]
pub struct GalleryClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    api_key: String,
    rate_limiter: Option<ApiRateLimiter>,
}

impl GalleryClient {
    /// Create a client over a reqwest transport.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, e.g. `https://api.gallery.example/v1`
    /// * `api_key` - Bearer key
    /// * `rate_limiter` - Optional proactive pacing
    pub fn new(
        base_url: &str,
        api_key: &str,
        rate_limiter: Option<ApiRateLimiter>,
    ) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(DEFAULT_TIMEOUT)
            .map_err(|e| UpstreamError::Config(e.to_string()))?;
        Self::new_with_transport(base_url, api_key, rate_limiter, Arc::new(transport))
    }

    pub fn new_with_transport(
        base_url: &str,
        api_key: &str,
        rate_limiter: Option<ApiRateLimiter>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/');
        Url::parse(base_url)
            .map_err(|e| UpstreamError::Config(format!("invalid base URL {base_url:?}: {e}")))?;
        if api_key.trim().is_empty() {
            return Err(UpstreamError::Config("API key is empty".to_string()));
        }

        Ok(Self {
            transport,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            rate_limiter,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, entity: EntityKind, params: &ListParams) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, entity.as_str()))
            .map_err(|e| UpstreamError::Config(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("offset", &params.offset.to_string())
            .append_pair("limit", &params.limit.to_string())
            .append_pair("sort", "updated_at")
            .append_pair("order", params.order.as_str());
        Ok(url)
    }

    fn record_url(&self, entity: EntityKind, id: i64) -> Result<Url> {
        Url::parse(&format!("{}/{}/{}", self.base_url, entity.as_str(), id))
            .map_err(|e| UpstreamError::Config(e.to_string()))
    }

    /// Authenticated GET that decodes a JSON body.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let request = HttpRequest::get(url.as_str())
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key));

        tracing::trace!(url = %url, "GET");
        let response = self.transport.send(request).await?;
        check_status(&response)?;

        Ok(serde_json::from_slice(&response.body)?)
    }

    async fn list<T: DeserializeOwned>(
        &self,
        entity: EntityKind,
        params: &ListParams,
    ) -> Result<Page<T>> {
        let url = self.collection_url(entity, params)?;
        self.get(url).await
    }

    async fn detail<T: DeserializeOwned>(&self, entity: EntityKind, id: i64) -> Result<T> {
        let url = self.record_url(entity, id)?;
        let envelope: DataEnvelope<T> = self.get(url).await?;
        Ok(envelope.data)
    }
}

/// Map non-2xx responses to typed errors.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }

    if response.status == 429 {
        let retry_after = response
            .header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(UpstreamError::RateLimited { retry_after });
    }

    Err(UpstreamError::Api {
        status: response.status,
        message: response.text(),
    })
}

#[async_trait]
impl GalleryApi for GalleryClient {
    async fn list_artworks(&self, params: &ListParams) -> Result<Page<RemoteArtwork>> {
        self.list(EntityKind::Artworks, params).await
    }

    async fn get_artwork(&self, id: i64) -> Result<ArtworkDetail> {
        self.detail(EntityKind::Artworks, id).await
    }

    async fn list_artists(&self, params: &ListParams) -> Result<Page<RemoteArtist>> {
        self.list(EntityKind::Artists, params).await
    }

    async fn get_artist(&self, id: i64) -> Result<ArtistDetail> {
        self.detail(EntityKind::Artists, id).await
    }

    async fn list_contacts(&self, params: &ListParams) -> Result<Page<RemoteContact>> {
        self.list(EntityKind::Contacts, params).await
    }

    async fn get_contact(&self, id: i64) -> Result<ContactDetail> {
        self.detail(EntityKind::Contacts, id).await
    }
}
