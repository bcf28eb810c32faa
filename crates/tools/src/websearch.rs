//! Best-effort web search

use async_trait::async_trait;
use serde::Deserialize;

use realty_config::ToolsSettings;

use crate::ToolError;

/// One search result
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "content")]
    pub snippet: String,
    #[serde(default)]
    pub url: String,
}

/// Web search seam
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchSnippet>, ToolError>;
}

/// Disabled search: always returns nothing.
pub struct NoSearch;

#[async_trait]
impl WebSearch for NoSearch {
    async fn search(&self, _query: &str) -> Result<Vec<SearchSnippet>, ToolError> {
        Ok(Vec::new())
    }
}

/// SearX-style JSON search endpoint (`GET {url}?q=...&format=json`).
pub struct HttpSearch {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpSearch {
    pub fn new(endpoint: String, settings: &ToolsSettings) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ToolError::Search(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { endpoint, client })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchSnippet>,
}

#[async_trait]
impl WebSearch for HttpSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchSnippet>, ToolError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("format", "json")])
            .send()
            .await
            .map_err(|e| ToolError::Search(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ToolError::Search(format!(
                "search endpoint returned HTTP {}",
                response.status()
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Search(e.to_string()))?;
        Ok(parsed.results)
    }
}
