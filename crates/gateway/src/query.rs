//! Gateway query translation
//!
//! Builds the `/filter` request body from session filters, resolving names to
//! provider codes through the code tables. Unresolved names are sent verbatim
//! (the gateway ignores values it cannot map; the local re-filter compensates).

use serde::Serialize;

use realty_config::{CodeTables, TableMatch};
use realty_core::SearchFilters;

/// A value the gateway accepts either as a numeric code or as a raw name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CodeOrName {
    Code(u32),
    Name(String),
}

impl CodeOrName {
    fn from_match(m: TableMatch, raw: &str) -> Self {
        match m {
            TableMatch::Code { code, .. } => Self::Code(code),
            TableMatch::Unmatched => Self::Name(raw.to_string()),
        }
    }
}

/// `/filter` request body.
///
/// `property_status` is pinned to off-plan inventory; that is the only stock
/// this product sells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<CodeOrName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<CodeOrName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apartment_type: Option<CodeOrName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<CodeOrName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer: Option<CodeOrName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub facilities: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_delivery: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guarantee_rental_guarantee: Option<bool>,
    pub property_status: Vec<&'static str>,
}

impl GatewayQuery {
    /// Translate session filters into a gateway query.
    ///
    /// Delivery year and area bounds are deliberately absent: the gateway does
    /// not support them and they are applied by `local_refilter`.
    pub fn from_filters(filters: &SearchFilters, tables: &CodeTables) -> Self {
        let city = filters
            .city
            .as_deref()
            .map(|c| CodeOrName::from_match(tables.resolve_city(c), c));
        let district = filters
            .district
            .as_deref()
            .map(|d| CodeOrName::from_match(tables.resolve_district(d), d));
        let apartment_type = filters
            .apartment_type
            .as_deref()
            .map(|t| CodeOrName::from_match(tables.resolve_apartment_type(t), t));
        let developer = filters
            .developer
            .as_deref()
            .map(|d| CodeOrName::from_match(tables.resolve_developer(d), d));
        // The gateway keys bedroom counts ("studio", "2", ...) like any other
        // coded table; an unmapped count goes through as its label.
        let bedrooms = filters.bedrooms.map(|n| {
            let label = n.to_string();
            CodeOrName::from_match(tables.resolve_bedrooms(&label), &label)
        });
        let facilities = filters
            .facilities
            .iter()
            .filter_map(|f| tables.resolve_facility(f).code())
            .collect();
        let post_delivery = filters.payment_timing.and_then(|t| match t {
            realty_core::PaymentTiming::AfterDelivery => Some(true),
            realty_core::PaymentTiming::BeforeDelivery => Some(false),
            realty_core::PaymentTiming::Unresolved => None,
        });

        Self {
            city,
            district,
            property_type: filters.property_type.clone(),
            apartment_type,
            bedrooms,
            min_price: filters.min_price,
            max_price: filters.max_price,
            developer,
            facilities,
            post_delivery,
            guarantee_rental_guarantee: filters.rental_guarantee,
            property_status: vec!["Off Plan"],
        }
    }
}
