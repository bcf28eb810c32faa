//! Property-listing gateway
//!
//! Thin client for the third-party property API plus the parts the gateway
//! cannot be trusted with:
//! - `local_refilter`: the gateway's own filter semantics are unreliable for
//!   sale status, district and price, so every remote result set is re-checked
//!   locally; delivery year and area range are local-only filters.
//! - `CatalogCache` + `spawn_catalog_refresher`: daily full-catalog fetch,
//!   paginated until an under-sized page signals end-of-data.

pub mod cache;
pub mod client;
pub mod query;
pub mod refilter;

pub use cache::{refresh_catalog, spawn_catalog_refresher, CatalogCache};
pub use client::{EstatyClient, ListingGateway};
pub use query::{CodeOrName, GatewayQuery};
pub use refilter::local_refilter;

use thiserror::Error;

/// Gateway errors
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Gateway returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),

    #[error("Listing {0} not found")]
    NotFound(u64),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Network(err.to_string())
    }
}
