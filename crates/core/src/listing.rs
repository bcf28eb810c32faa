//! Listing wire types
//!
//! Shapes match the property gateway's JSON. Most fields are optional because
//! the gateway omits anything it has no data for; code that reads them must
//! tolerate absence.

use serde::{Deserialize, Serialize};

/// A nested `{id, name}` object as the gateway returns for district, city,
/// sales status and developer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl NamedRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }

    /// Lowercased name, or empty string when absent.
    pub fn name_lower(&self) -> String {
        self.name.as_deref().unwrap_or_default().to_lowercase()
    }
}

/// Listing summary as returned by `/filter` and `/getProperties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub district: Option<NamedRef>,
    #[serde(default)]
    pub city: Option<NamedRef>,
    #[serde(default)]
    pub low_price: Option<f64>,
    #[serde(default)]
    pub high_price: Option<f64>,
    #[serde(default)]
    pub min_area: Option<f64>,
    #[serde(default)]
    pub max_area: Option<f64>,
    #[serde(default)]
    pub sales_status: Option<NamedRef>,
    /// Unix timestamp in seconds, as a string. The gateway is inconsistent
    /// about this field; keep it raw and parse on demand.
    #[serde(default)]
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub developer: Option<NamedRef>,
    #[serde(default)]
    pub facilities: Vec<NamedRef>,
    #[serde(default)]
    pub cover: Option<String>,
}

impl Listing {
    pub fn title_lower(&self) -> String {
        self.title.as_deref().unwrap_or_default().to_lowercase()
    }

    pub fn district_name(&self) -> Option<&str> {
        self.district.as_ref().and_then(|d| d.name.as_deref())
    }

    pub fn sales_status_name(&self) -> Option<&str> {
        self.sales_status.as_ref().and_then(|s| s.name.as_deref())
    }

    /// Delivery date as a unix timestamp, if present and parseable.
    pub fn delivery_timestamp(&self) -> Option<i64> {
        self.delivery_date.as_deref()?.trim().parse().ok()
    }
}

/// Full listing detail from `/getProperty`.
///
/// The summary fields are flattened in; everything else the gateway sends
/// (description, payment plans, gallery, ...) is kept in `extra` so the
/// summarizer prompt can see the complete payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingDetail {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
