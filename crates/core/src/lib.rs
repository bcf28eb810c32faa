//! Core types for the realty chat agent
//!
//! This crate provides the foundational types shared by all other crates:
//! - Listing wire types as returned by the property gateway
//! - Accumulated per-session search filters
//! - Intent tags and classification results

pub mod filters;
pub mod intent;
pub mod listing;

pub use filters::{PaymentTiming, SearchFilters};
pub use intent::{Classification, DetailKind, IntentTag};
pub use listing::{Listing, ListingDetail, NamedRef};
