//! Turning listings into chat replies
//!
//! Pages of listings are summarized by the model, three at a time and
//! concurrently, but always presented in gateway order. A failed summary
//! degrades to a locally formatted card; the page is never lost to one bad
//! model call.

use std::sync::Arc;

use chrono::{Datelike, TimeZone, Utc};
use futures::future::join_all;

use realty_core::{DetailKind, Listing, ListingDetail};
use realty_llm::{LlmBackend, Message};

use crate::memory::SessionMemory;
use crate::{prompts, replies};

const MONTHS: &[&str] = &[
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub struct ResponseComposer {
    llm: Arc<dyn LlmBackend>,
    page_size: usize,
}

impl ResponseComposer {
    pub fn new(llm: Arc<dyn LlmBackend>, page_size: usize) -> Self {
        Self { llm, page_size }
    }

    /// Render the next page of the session's results and advance the cursor.
    pub async fn compose_page(&self, memory: &mut SessionMemory) -> String {
        if memory.last_shown.is_empty() {
            return replies::NOTHING_FOUND.to_string();
        }
        if memory.page_cursor >= memory.last_shown.len() {
            return replies::ALL_SHOWN.to_string();
        }

        let offset = memory.page_cursor;
        let page: Vec<Listing> = memory.current_page(self.page_size).to_vec();

        let summaries = join_all(
            page.iter()
                .enumerate()
                .map(|(i, listing)| self.summarize(offset + i + 1, listing)),
        )
        .await;

        memory.advance_cursor(page.len());

        let mut body = summaries.join("<br><br>");
        body.push_str(replies::FOOTER);
        body
    }

    /// One listing card. Numbering is global across pages so "ملک ۵" stays
    /// meaningful after a "show more".
    async fn summarize(&self, number: usize, listing: &Listing) -> String {
        let facts = listing_facts(listing);
        let messages = [
            Message::system(prompts::SUMMARIZE),
            Message::user(format!("شماره {number}\n{facts}")),
        ];
        match self.llm.complete(&messages).await {
            Ok(summary) => format!("<b>{number}.</b> {summary}"),
            Err(e) => {
                tracing::warn!(listing = listing.id, error = %e, "Summary failed, using plain card");
                format!("<b>{number}.</b> {}", plain_card(listing))
            }
        }
    }

    /// Aspect-focused answer about one listing's full detail.
    pub async fn detail(
        &self,
        detail: &ListingDetail,
        kind: Option<DetailKind>,
        question: &str,
    ) -> String {
        let focus = match kind {
            Some(DetailKind::Price) => "Focus on price and price per square meter.",
            Some(DetailKind::Features) => "Focus on features, facilities and finish.",
            Some(DetailKind::Location) => "Focus on location, district and surroundings.",
            Some(DetailKind::Payment) => "Focus on the payment plan and installments.",
            None => "",
        };
        let data = serde_json::to_string(detail).unwrap_or_default();
        let system = format!(
            "{}\n{focus}\n\nListing link: {}\n\nListing data:\n{data}",
            prompts::DETAIL,
            listing_url(detail.listing.id)
        );
        let messages = [Message::system(system), Message::user(question)];
        match self.llm.complete(&messages).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(listing = detail.listing.id, error = %e, "Detail reply failed");
                format!(
                    "{}<br>{}",
                    plain_card(&detail.listing),
                    listing_url(detail.listing.id)
                )
            }
        }
    }

    pub async fn compare(&self, a: &ListingDetail, b: &ListingDetail, question: &str) -> String {
        let data_a = serde_json::to_string(a).unwrap_or_default();
        let data_b = serde_json::to_string(b).unwrap_or_default();
        let system = format!(
            "{}\n\nListing A ({}):\n{data_a}\n\nListing B ({}):\n{data_b}",
            prompts::COMPARE,
            listing_url(a.listing.id),
            listing_url(b.listing.id)
        );
        let messages = [Message::system(system), Message::user(question)];
        match self.llm.complete(&messages).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "Compare reply failed");
                format!(
                    "{}<br><br>{}",
                    plain_card(&a.listing),
                    plain_card(&b.listing)
                )
            }
        }
    }

    pub async fn purchase(&self, listing: &Listing, message: &str) -> String {
        let system = format!(
            "{}\n\nListing: {}\nLink: {}",
            prompts::PURCHASE,
            listing.title.as_deref().unwrap_or("(untitled)"),
            listing_url(listing.id)
        );
        let messages = [Message::system(system), Message::user(message)];
        match self.llm.complete(&messages).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(listing = listing.id, error = %e, "Purchase reply failed");
                format!(
                    "برای ادامه خرید «{}» با کارشناسان ترونست در تماس باشید: {}",
                    listing.title.as_deref().unwrap_or(""),
                    listing_url(listing.id)
                )
            }
        }
    }
}

/// Facts block handed to the summarizer prompt.
fn listing_facts(listing: &Listing) -> String {
    let mut lines = vec![
        format!("Title: {}", listing.title.as_deref().unwrap_or("(untitled)")),
        format!("Link: {}", listing_url(listing.id)),
    ];
    if let Some(district) = listing.district_name() {
        lines.push(format!("District: {district}"));
    }
    match (listing.low_price, listing.high_price) {
        (Some(low), Some(high)) => {
            lines.push(format!("Price: AED {} - {}", format_price(low), format_price(high)))
        }
        (Some(low), None) => lines.push(format!("Price from: AED {}", format_price(low))),
        _ => {}
    }
    if let (Some(min), Some(max)) = (listing.min_area, listing.max_area) {
        lines.push(format!("Area: {min:.0} - {max:.0} m²"));
    }
    if let Some(date) = listing.delivery_timestamp().and_then(delivery_month_year) {
        lines.push(format!("Delivery: {date}"));
    }
    if let Some(developer) = listing.developer.as_ref().and_then(|d| d.name.as_deref()) {
        lines.push(format!("Developer: {developer}"));
    }
    if !listing.facilities.is_empty() {
        let names: Vec<&str> = listing
            .facilities
            .iter()
            .filter_map(|f| f.name.as_deref())
            .collect();
        lines.push(format!("Facilities: {}", names.join(", ")));
    }
    lines.join("\n")
}

/// Local fallback card when the model is unavailable.
fn plain_card(listing: &Listing) -> String {
    let title = listing.title.as_deref().unwrap_or("(untitled)");
    let mut card = format!(
        "<b><a href=\"{}\">{title}</a></b>",
        listing_url(listing.id)
    );
    if let Some(district) = listing.district_name() {
        card.push_str(&format!("<br>{district}"));
    }
    if let Some(low) = listing.low_price {
        card.push_str(&format!("<br>از AED {}", format_price(low)));
    }
    if let Some(date) = listing.delivery_timestamp().and_then(delivery_month_year) {
        card.push_str(&format!("<br>تحویل: {date}"));
    }
    card
}

pub fn listing_url(id: u64) -> String {
    format!("https://www.trunest.ae/property/{id}")
}

/// "Month Year" for a delivery timestamp. The provider pins dates to the
/// very end of a month, so day 25 or later reads as the next month.
pub fn delivery_month_year(timestamp: i64) -> Option<String> {
    let date = Utc.timestamp_opt(timestamp, 0).single()?;
    let (mut month, mut year) = (date.month(), date.year());
    if date.day() >= 25 {
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    Some(format!("{} {year}", MONTHS[(month - 1) as usize]))
}

/// Thousands-separated integer rendering of a price.
pub fn format_price(value: f64) -> String {
    let whole = value.round() as i64;
    let digits = whole.abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if whole < 0 {
        format!("-{out}")
    } else {
        out
    }
}
