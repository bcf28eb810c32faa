//! Defensive local re-filtering
//!
//! The gateway's filter semantics are unreliable for sale status, district
//! and price, so every remote result set is re-checked here. Delivery year
//! and area range are not supported remotely at all and exist only as local
//! filters. When a constraint is active and the listing lacks the data to
//! judge it, the listing is dropped.

use chrono::{DateTime, Datelike};

use realty_core::{Listing, SearchFilters};

const SELLABLE_STATUSES: [&str; 2] = ["available", "pre launch"];

/// Re-apply `filters` to listings the gateway already claims to have filtered.
pub fn local_refilter(listings: Vec<Listing>, filters: &SearchFilters) -> Vec<Listing> {
    let district = filters.district.as_deref().map(str::to_lowercase);

    listings
        .into_iter()
        .filter(|listing| {
            sellable(listing)
                && district_matches(listing, district.as_deref())
                && price_matches(listing, filters)
                && delivery_year_matches(listing, filters.delivery_year)
                && area_matches(listing, filters)
        })
        .collect()
}

fn sellable(listing: &Listing) -> bool {
    let status = listing
        .sales_status_name()
        .unwrap_or_default()
        .to_lowercase();
    SELLABLE_STATUSES.contains(&status.as_str())
}

fn district_matches(listing: &Listing, wanted: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => listing
            .district_name()
            .is_some_and(|d| d.to_lowercase() == wanted),
    }
}

fn price_matches(listing: &Listing, filters: &SearchFilters) -> bool {
    if filters.min_price.is_none() && filters.max_price.is_none() {
        return true;
    }
    let Some(low_price) = listing.low_price else {
        return false;
    };
    filters.max_price.map_or(true, |max| low_price <= max)
        && filters.min_price.map_or(true, |min| low_price >= min)
}

/// Delivered no later than the requested year.
fn delivery_year_matches(listing: &Listing, wanted: Option<i32>) -> bool {
    match wanted {
        None => true,
        Some(year) => listing
            .delivery_timestamp()
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .is_some_and(|dt| dt.year() <= year),
    }
}

/// The listing's area range must intersect the requested range.
fn area_matches(listing: &Listing, filters: &SearchFilters) -> bool {
    if filters.area_min.is_none() && filters.area_max.is_none() {
        return true;
    }
    let (Some(listing_min), listing_max) = (listing.min_area, listing.max_area) else {
        return false;
    };
    let listing_max = listing_max.unwrap_or(listing_min);
    filters.area_max.map_or(true, |max| listing_min <= max)
        && filters.area_min.map_or(true, |min| listing_max >= min)
}
