//! Accumulated search filters
//!
//! One `SearchFilters` lives in each session and is the union of every
//! constraint the user has stated and not yet invalidated. All fields are
//! optional; the extractor owns the merge rules that mutate this struct.

use serde::{Deserialize, Serialize};

/// Payment timing for installment plans.
///
/// `Unresolved` is the sentinel set when the user asked for installments but
/// did not say whether before or after delivery; the next turn resolves it by
/// a literal before/after match on the raw message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTiming {
    BeforeDelivery,
    AfterDelivery,
    Unresolved,
}

/// Per-session search constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub city: Option<String>,
    pub district: Option<String>,
    pub property_type: Option<String>,
    pub apartment_type: Option<String>,
    pub bedrooms: Option<u32>,
    /// User explicitly said bedrooms don't matter; suppresses the follow-up
    /// question without setting a value.
    #[serde(default)]
    pub bedrooms_any: bool,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// User explicitly said budget doesn't matter.
    #[serde(default)]
    pub price_any: bool,
    pub area_min: Option<f64>,
    pub area_max: Option<f64>,
    pub developer: Option<String>,
    pub delivery_year: Option<i32>,
    pub payment_plan: Option<bool>,
    pub payment_timing: Option<PaymentTiming>,
    pub rental_guarantee: Option<bool>,
    #[serde(default)]
    pub facilities: Vec<String>,
    pub sale_status: Option<String>,
}

impl SearchFilters {
    /// True when no constraint is active. "Any" markers count as activity:
    /// the user said something about that field.
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.district.is_none()
            && self.property_type.is_none()
            && self.apartment_type.is_none()
            && self.bedrooms.is_none()
            && !self.bedrooms_any
            && self.min_price.is_none()
            && self.max_price.is_none()
            && !self.price_any
            && self.area_min.is_none()
            && self.area_max.is_none()
            && self.developer.is_none()
            && self.delivery_year.is_none()
            && self.payment_plan.is_none()
            && self.payment_timing.is_none()
            && self.rental_guarantee.is_none()
            && self.facilities.is_empty()
            && self.sale_status.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
