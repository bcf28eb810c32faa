//! Gateway HTTP client
//!
//! `POST {base}/filter`, `POST {base}/getProperty`, `POST {base}/getProperties`
//! with a static `App-Key` header. All calls carry the configured timeout.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use realty_config::GatewaySettings;
use realty_core::{Listing, ListingDetail};

use crate::query::GatewayQuery;
use crate::GatewayError;

/// Listing gateway seam
#[async_trait]
pub trait ListingGateway: Send + Sync {
    /// Filtered search. Results are raw; callers must run `local_refilter`.
    async fn search(&self, query: &GatewayQuery) -> Result<Vec<Listing>, GatewayError>;

    /// Full detail for one listing.
    async fn get_by_id(&self, id: u64) -> Result<ListingDetail, GatewayError>;

    /// One page of the full catalog (1-based page index).
    async fn fetch_page(&self, page: usize, limit: usize) -> Result<Vec<Listing>, GatewayError>;
}

/// Client for the Estaty-style property API.
pub struct EstatyClient {
    settings: GatewaySettings,
    client: Client,
}

impl EstatyClient {
    pub fn new(settings: GatewaySettings) -> Result<Self, GatewayError> {
        if settings.api_key.is_empty() {
            return Err(GatewayError::Configuration(
                "Gateway API key is not set".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            "App-Key",
            HeaderValue::from_str(&settings.api_key)
                .map_err(|e| GatewayError::Configuration(format!("Invalid API key: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(settings.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { settings, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.settings.base_url.trim_end_matches('/'))
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, GatewayError> {
        let response = self.client.post(self.url(path)).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ListingGateway for EstatyClient {
    async fn search(&self, query: &GatewayQuery) -> Result<Vec<Listing>, GatewayError> {
        let response: FilterResponse = self.post_json("filter", query).await?;
        tracing::debug!(count = response.properties.len(), "Gateway filter results");
        Ok(response.properties)
    }

    async fn get_by_id(&self, id: u64) -> Result<ListingDetail, GatewayError> {
        let response: PropertyResponse = self.post_json("getProperty", &IdRequest { id }).await?;
        response.property.ok_or(GatewayError::NotFound(id))
    }

    async fn fetch_page(&self, page: usize, limit: usize) -> Result<Vec<Listing>, GatewayError> {
        let response: FilterResponse = self
            .post_json("getProperties", &PageRequest { page, limit })
            .await?;
        Ok(response.properties)
    }
}

#[derive(Debug, Serialize)]
struct IdRequest {
    id: u64,
}

#[derive(Debug, Serialize)]
struct PageRequest {
    page: usize,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct FilterResponse {
    #[serde(default)]
    properties: Vec<Listing>,
}

#[derive(Debug, Deserialize)]
struct PropertyResponse {
    #[serde(default)]
    property: Option<ListingDetail>,
}
