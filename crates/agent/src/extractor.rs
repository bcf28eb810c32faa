//! Filter extraction and the merge rules
//!
//! The model produces an `ExtractionPayload` for the current message only;
//! `merge_payload` folds it into the session's accumulated filters. The rules
//! run in a fixed order because later rules read state the earlier ones may
//! have cleared (a scope change wipes everything before prices land).

use std::sync::Arc;

use serde::Deserialize;

use realty_core::{PaymentTiming, SearchFilters};
use realty_llm::{decode_json, LlmBackend, LlmError, Message};

use crate::prompts;

/// Spread applied to a single approximate price figure.
const APPROX_PRICE_BAND: f64 = 0.10;
/// Spread applied to a single approximate area figure.
const APPROX_AREA_BAND: f64 = 0.20;

/// What the model extracted from one message. Every field is "mentioned in
/// this message" — absence means the message said nothing about it, not that
/// the user has no such constraint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionPayload {
    #[serde(default)]
    pub new_search: bool,
    pub city: Option<String>,
    pub district: Option<String>,
    pub property_type: Option<String>,
    pub apartment_type: Option<String>,
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bedrooms_no_preference: bool,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub approx_price: Option<f64>,
    #[serde(default)]
    pub price_no_preference: bool,
    pub area_min: Option<f64>,
    pub area_max: Option<f64>,
    pub approx_area: Option<f64>,
    pub developer: Option<String>,
    pub delivery_year: Option<i32>,
    pub payment_plan: Option<bool>,
    pub payment_timing: Option<String>,
    pub rental_guarantee: Option<bool>,
    #[serde(default)]
    pub facilities: Vec<String>,
    pub sale_status: Option<String>,
}

/// Follow-up questions the agent asks before searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    Bedrooms,
    Budget,
    PaymentTiming,
}

impl FollowUp {
    pub fn question(&self) -> &'static str {
        match self {
            Self::Bedrooms => "چند خوابه مد نظرتان است؟ (اگر فرقی ندارد بفرمایید «فرقی نداره»)",
            Self::Budget => "حداکثر بودجه شما چقدر است؟ (به درهم؛ اگر محدودیتی ندارید بفرمایید)",
            Self::PaymentTiming => {
                "پرداخت اقساط را قبل از تحویل ملک ترجیح می‌دهید یا بعد از تحویل؟"
            }
        }
    }
}

/// Result of one extraction turn.
#[derive(Debug)]
pub struct Extraction {
    /// Questions that must be answered before the first gateway call.
    pub questions: Vec<FollowUp>,
    /// The message started a fresh search and wiped earlier filters.
    pub reset_applied: bool,
}

type MergeRule = fn(&mut SearchFilters, &ExtractionPayload, &str) -> bool;

/// Ordered merge rules. Each returns true when it reset the filters, which
/// only the first rule ever does.
const MERGE_RULES: &[MergeRule] = &[
    new_search_reset,
    scope_fields,
    price_bounds,
    area_bounds,
    bedrooms,
    delivery,
    payment,
    facilities,
    sale_status,
];

/// Fold one message's payload into the session filters. Returns whether the
/// accumulated state was reset by a scope change.
pub fn merge_payload(
    filters: &mut SearchFilters,
    payload: &ExtractionPayload,
    raw_message: &str,
) -> bool {
    let mut reset = false;
    for rule in MERGE_RULES {
        reset |= rule(filters, payload, raw_message);
    }
    reset
}

/// An explicit new search, or a changed district/city/property type, starts
/// from a clean slate. Refining the same scope never clears anything.
fn new_search_reset(filters: &mut SearchFilters, payload: &ExtractionPayload, _raw: &str) -> bool {
    let changed = |stored: &Option<String>, new: &Option<String>| match (stored, new) {
        (Some(old), Some(new)) => !old.eq_ignore_ascii_case(new),
        _ => false,
    };

    if payload.new_search
        || changed(&filters.district, &payload.district)
        || changed(&filters.city, &payload.city)
        || changed(&filters.property_type, &payload.property_type)
    {
        filters.clear();
        return true;
    }
    false
}

fn scope_fields(filters: &mut SearchFilters, payload: &ExtractionPayload, _raw: &str) -> bool {
    if payload.city.is_some() {
        filters.city = payload.city.clone();
    }
    if payload.district.is_some() {
        filters.district = payload.district.clone();
    }
    if payload.property_type.is_some() {
        filters.property_type = payload.property_type.clone();
    }
    if payload.apartment_type.is_some() {
        filters.apartment_type = payload.apartment_type.clone();
    }
    if payload.developer.is_some() {
        filters.developer = payload.developer.clone();
    }
    false
}

/// Price merging. A lone approximate figure becomes a band; a new one-sided
/// bound invalidates the stored opposite bound, because "under 2M" after
/// "over 3M" means the user moved the whole range, not narrowed it.
fn price_bounds(filters: &mut SearchFilters, payload: &ExtractionPayload, _raw: &str) -> bool {
    if payload.price_no_preference {
        filters.min_price = None;
        filters.max_price = None;
        filters.price_any = true;
        return false;
    }

    if let Some(approx) = payload.approx_price {
        filters.min_price = Some(approx * (1.0 - APPROX_PRICE_BAND));
        filters.max_price = Some(approx * (1.0 + APPROX_PRICE_BAND));
        filters.price_any = false;
        return false;
    }

    match (payload.min_price, payload.max_price) {
        (Some(min), Some(max)) => {
            filters.min_price = Some(min);
            filters.max_price = Some(max);
        }
        (Some(min), None) => {
            filters.min_price = Some(min);
            filters.max_price = None;
        }
        (None, Some(max)) => {
            filters.max_price = Some(max);
            filters.min_price = None;
        }
        (None, None) => return false,
    }
    filters.price_any = false;
    false
}

fn area_bounds(filters: &mut SearchFilters, payload: &ExtractionPayload, _raw: &str) -> bool {
    if let Some(approx) = payload.approx_area {
        filters.area_min = Some(approx * (1.0 - APPROX_AREA_BAND));
        filters.area_max = Some(approx * (1.0 + APPROX_AREA_BAND));
        return false;
    }
    if payload.area_min.is_some() {
        filters.area_min = payload.area_min;
    }
    if payload.area_max.is_some() {
        filters.area_max = payload.area_max;
    }
    false
}

fn bedrooms(filters: &mut SearchFilters, payload: &ExtractionPayload, _raw: &str) -> bool {
    if payload.bedrooms_no_preference {
        filters.bedrooms = None;
        filters.bedrooms_any = true;
    } else if let Some(count) = payload.bedrooms {
        filters.bedrooms = Some(count);
        filters.bedrooms_any = false;
    }
    false
}

fn delivery(filters: &mut SearchFilters, payload: &ExtractionPayload, _raw: &str) -> bool {
    if payload.delivery_year.is_some() {
        filters.delivery_year = payload.delivery_year;
    }
    false
}

/// Payment plan and timing. An unresolved timing waits as a sentinel until a
/// later message literally says before or after delivery.
fn payment(filters: &mut SearchFilters, payload: &ExtractionPayload, raw: &str) -> bool {
    if payload.payment_plan.is_some() {
        filters.payment_plan = payload.payment_plan;
    }
    if payload.rental_guarantee.is_some() {
        filters.rental_guarantee = payload.rental_guarantee;
    }

    if let Some(timing) = payload.payment_timing.as_deref() {
        filters.payment_timing = match timing {
            "before_delivery" => Some(PaymentTiming::BeforeDelivery),
            "after_delivery" => Some(PaymentTiming::AfterDelivery),
            "unresolved" => Some(PaymentTiming::Unresolved),
            _ => filters.payment_timing,
        };
    }

    if filters.payment_timing == Some(PaymentTiming::Unresolved) {
        if let Some(resolved) = timing_from_text(raw) {
            filters.payment_timing = Some(resolved);
        }
    }
    false
}

/// Literal before/after match on the raw message, in both languages.
fn timing_from_text(raw: &str) -> Option<PaymentTiming> {
    let lower = raw.to_lowercase();
    if lower.contains("قبل از تحویل") || lower.contains("before delivery") {
        Some(PaymentTiming::BeforeDelivery)
    } else if lower.contains("بعد از تحویل") || lower.contains("after delivery") {
        Some(PaymentTiming::AfterDelivery)
    } else {
        None
    }
}

fn facilities(filters: &mut SearchFilters, payload: &ExtractionPayload, _raw: &str) -> bool {
    for facility in &payload.facilities {
        let lower = facility.to_lowercase();
        if !filters.facilities.iter().any(|f| f.to_lowercase() == lower) {
            filters.facilities.push(facility.clone());
        }
    }
    false
}

fn sale_status(filters: &mut SearchFilters, payload: &ExtractionPayload, _raw: &str) -> bool {
    if payload.sale_status.is_some() {
        filters.sale_status = payload.sale_status.clone();
    }
    false
}

/// Questions still required before the filters are searchable. Bedrooms and
/// budget gate the first gateway call; an unresolved payment timing must be
/// pinned down too.
pub fn gate(filters: &SearchFilters) -> Vec<FollowUp> {
    let mut questions = Vec::new();
    if filters.bedrooms.is_none() && !filters.bedrooms_any {
        questions.push(FollowUp::Bedrooms);
    }
    if filters.max_price.is_none() && !filters.price_any {
        questions.push(FollowUp::Budget);
    }
    if filters.payment_timing == Some(PaymentTiming::Unresolved) {
        questions.push(FollowUp::PaymentTiming);
    }
    questions
}

pub struct FilterExtractor {
    llm: Arc<dyn LlmBackend>,
}

impl FilterExtractor {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self { llm }
    }

    /// Extract from one message and merge into the session filters.
    pub async fn extract(
        &self,
        filters: &mut SearchFilters,
        message: &str,
    ) -> Result<Extraction, LlmError> {
        let messages = [Message::system(prompts::EXTRACT), Message::user(message)];
        let raw = self.llm.complete(&messages).await?;
        let payload: ExtractionPayload = decode_json(&raw)?;

        let reset_applied = merge_payload(filters, &payload, message);
        let questions = gate(filters);
        tracing::debug!(
            reset = reset_applied,
            open_questions = questions.len(),
            "Merged extraction payload"
        );
        Ok(Extraction {
            questions,
            reset_applied,
        })
    }
}
