//! The conversation state machine
//!
//! One `handle` call per user message. The engine never returns an error:
//! every remote failure or unparseable model reply degrades to a fixed reply
//! and leaves the session intact for the next turn.
//!
//! Turn order: eviction sweep, greeting short-circuit, the continue-vs-reset
//! confirmation protocol, classification, reset handling, the confirmation
//! gate for filter-bearing intents, then dispatch.

use std::sync::Arc;
use std::time::Duration;

use realty_config::{CodeTables, SearchSettings};
use realty_core::{Classification, DetailKind, IntentTag, Listing, SearchFilters};
use realty_gateway::{local_refilter, CatalogCache, GatewayError, GatewayQuery, ListingGateway};
use realty_llm::LlmBackend;
use realty_tools::{MarketAdvisor, WebSearch};

use crate::classifier::IntentClassifier;
use crate::composer::{format_price, ResponseComposer};
use crate::extractor::{FilterExtractor, FollowUp};
use crate::memory::{PendingTurn, SessionManager, SessionMemory};
use crate::{reference, replies};

pub struct ChatEngine {
    classifier: IntentClassifier,
    extractor: FilterExtractor,
    composer: ResponseComposer,
    advisor: MarketAdvisor,
    gateway: Arc<dyn ListingGateway>,
    tables: Arc<CodeTables>,
    sessions: SessionManager,
    catalog: CatalogCache,
    search: SearchSettings,
}

impl ChatEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        llm: Arc<dyn LlmBackend>,
        web_search: Arc<dyn WebSearch>,
        gateway: Arc<dyn ListingGateway>,
        tables: Arc<CodeTables>,
        catalog: CatalogCache,
        search: SearchSettings,
        session_ttl: Duration,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(llm.clone()),
            extractor: FilterExtractor::new(llm.clone()),
            composer: ResponseComposer::new(llm.clone(), search.page_size),
            advisor: MarketAdvisor::new(llm, web_search),
            gateway,
            tables,
            sessions: SessionManager::new(session_ttl),
            catalog,
            search,
        }
    }

    /// Process one message and produce the reply. Infallible by contract.
    pub async fn handle(&self, session_id: &str, message: &str) -> String {
        self.sessions.evict_idle();

        let session = self.sessions.get_or_create(session_id);
        let mut memory = session.lock().await;
        let message = message.trim();

        if replies::is_greeting(message) {
            return replies::random_greeting().to_string();
        }

        if memory.pending_confirmation.is_some() {
            return self.resume_confirmation(&mut memory, message).await;
        }

        // The district-suggestion reply ends with "send me a district name";
        // a message naming one of the offered districts needs no model call.
        if memory.previous_intent == Some(IntentTag::DistrictSearch) {
            let picked = pick_suggested_district(&memory, message, self.search.fuzzy_threshold);
            if let Some(district) = picked {
                memory.suggested_districts.clear();
                memory.filters.district = Some(district);
                memory.previous_intent = Some(IntentTag::Search);
                return self.present_results(&mut memory).await;
            }
        }

        let mut classification = match self.classifier.classify(message, &memory).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "Classification failed");
                return replies::CLARIFY.to_string();
            }
        };

        // While follow-up questions are open, a terse answer ("2", "فرقی
        // نداره") rarely classifies as the flow that asked it. Any label
        // short of an explicit reset or another filter-bearing request is
        // routed back to that flow.
        if !memory.pending_questions.is_empty()
            && !classification.intent.is_sensitive()
            && classification.intent != IntentTag::Reset
            && !classification.reset_requested
        {
            if let Some(previous) = memory.previous_intent.filter(|i| i.is_sensitive()) {
                classification.intent = previous;
                classification.detail_requested = None;
            }
        }
        tracing::info!(session = session_id, intent = %classification.intent, "Turn");

        if classification.intent == IntentTag::Reset || classification.reset_requested {
            // An explicit reset ends the turn with the fixed acknowledgement;
            // nothing else runs until the user restates what they want.
            memory.clear_filters();
            return replies::RESET_ACK.to_string();
        }

        if classification.intent.is_sensitive()
            && !memory.filters.is_empty()
            && memory.pending_questions.is_empty()
        {
            memory.pending_confirmation = Some(PendingTurn {
                message: message.to_string(),
                classification,
            });
            return replies::CONFIRM_CONTINUE_OR_RESET.to_string();
        }

        self.dispatch(&mut memory, message, &classification).await
    }

    /// The turn after the continue-vs-reset prompt. Reset wins over continue;
    /// anything else re-asks. The stashed turn was classified when it came
    /// in, so resolution dispatches it directly.
    async fn resume_confirmation(&self, memory: &mut SessionMemory, message: &str) -> String {
        if replies::is_reset_phrase(message) {
            memory.clear_filters();
        } else if !replies::is_continue_phrase(message) {
            return replies::CONFIRM_CONTINUE_OR_RESET.to_string();
        }

        let stashed = match memory.pending_confirmation.take() {
            Some(stashed) => stashed,
            None => return replies::CLARIFY.to_string(),
        };
        self.dispatch(memory, &stashed.message, &stashed.classification)
            .await
    }

    async fn dispatch(
        &self,
        memory: &mut SessionMemory,
        message: &str,
        classification: &Classification,
    ) -> String {
        if classification.intent != IntentTag::Unknown {
            memory.previous_intent = Some(classification.intent);
        }
        match classification.intent {
            IntentTag::Greeting => replies::random_greeting().to_string(),
            IntentTag::Search => self.search_flow(memory, message, false).await,
            IntentTag::AvailabilityCheck => self.search_flow(memory, message, true).await,
            IntentTag::More => self.composer.compose_page(memory).await,
            IntentTag::Details => {
                self.details_flow(memory, message, classification.detail_requested)
                    .await
            }
            IntentTag::Market => match self.advisor.market_trends(message).await {
                Ok(answer) => answer,
                Err(e) => {
                    tracing::warn!(error = %e, "Market answer failed");
                    replies::TRY_AGAIN.to_string()
                }
            },
            IntentTag::BuyingGuide => match self.advisor.buying_guide(message).await {
                Ok(answer) => answer,
                Err(e) => {
                    tracing::warn!(error = %e, "Buying-guide answer failed");
                    replies::TRY_AGAIN.to_string()
                }
            },
            IntentTag::Compare => self.compare_flow(memory, message).await,
            IntentTag::Purchase => self.purchase_flow(memory, message).await,
            IntentTag::DistrictSearch => self.district_flow(memory, message).await,
            IntentTag::PropertyPrice => self.price_flow(memory, message).await,
            IntentTag::Reset => {
                memory.clear_filters();
                replies::RESET_ACK.to_string()
            }
            IntentTag::Unknown => replies::CLARIFY.to_string(),
        }
    }

    /// Search and availability check. Availability always queries even with
    /// open questions; a plain search asks them first.
    async fn search_flow(
        &self,
        memory: &mut SessionMemory,
        message: &str,
        availability: bool,
    ) -> String {
        let extraction = match self.extractor.extract(&mut memory.filters, message).await {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!(error = %e, "Filter extraction failed");
                return replies::CLARIFY_RESTATE.to_string();
            }
        };

        if !availability && !extraction.questions.is_empty() {
            memory.pending_questions = extraction.questions;
            return follow_up_text(&memory.pending_questions);
        }
        if !availability {
            memory.pending_questions.clear();
            return self.present_results(memory).await;
        }

        // A failed gateway call is indistinguishable from no matches here.
        let kept = self.query_and_refilter(&memory.filters).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Gateway search failed");
            Vec::new()
        });
        if kept.is_empty() {
            return replies::NOT_AVAILABLE.to_string();
        }
        let count = kept.len();
        memory.remember_listings(kept);
        let page = self.composer.compose_page(memory).await;
        format!("✅ بله، {count} مورد موجود است:<br><br>{page}")
    }

    /// Query with the session's current filters and present the first page.
    async fn present_results(&self, memory: &mut SessionMemory) -> String {
        let kept = self.query_and_refilter(&memory.filters).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Gateway search failed");
            Vec::new()
        });
        if kept.is_empty() {
            return replies::NOTHING_FOUND.to_string();
        }

        let count = kept.len();
        memory.remember_listings(kept);
        let page = self.composer.compose_page(memory).await;
        format!("🏠 {count} ملک مطابق جستجوی شما پیدا شد:<br><br>{page}")
    }

    async fn details_flow(
        &self,
        memory: &mut SessionMemory,
        message: &str,
        kind: Option<DetailKind>,
    ) -> String {
        let Some(id) = reference::resolve(memory, message, self.search.fuzzy_threshold) else {
            return replies::WHICH_LISTING.to_string();
        };

        match self.gateway.get_by_id(id).await {
            Ok(detail) => {
                memory.last_referenced = Some(id);
                self.composer.detail(&detail, kind, message).await
            }
            Err(e) => {
                tracing::warn!(listing = id, error = %e, "Detail fetch failed");
                replies::COULD_NOT_FIND.to_string()
            }
        }
    }

    async fn compare_flow(&self, memory: &mut SessionMemory, message: &str) -> String {
        let pair = reference::resolve_pair(memory, message, self.search.fuzzy_threshold)
            .or_else(|| self.pair_from_catalog(message));
        let Some((first, second)) = pair else {
            return replies::NEED_TWO_LISTINGS.to_string();
        };

        let (a, b) = tokio::join!(self.gateway.get_by_id(first), self.gateway.get_by_id(second));
        match (a, b) {
            (Ok(a), Ok(b)) => {
                memory.last_referenced = Some(first);
                self.composer.compare(&a, &b, message).await
            }
            (a, b) => {
                tracing::warn!(
                    first_err = a.is_err(),
                    second_err = b.is_err(),
                    "Compare fetch failed"
                );
                replies::COULD_NOT_FIND.to_string()
            }
        }
    }

    async fn purchase_flow(&self, memory: &mut SessionMemory, message: &str) -> String {
        let id = reference::resolve(memory, message, self.search.fuzzy_threshold)
            .or_else(|| self.id_from_catalog(message));
        let Some(id) = id else {
            return replies::WHICH_LISTING.to_string();
        };
        memory.last_referenced = Some(id);

        if let Some(listing) = memory.last_shown.iter().find(|l| l.id == id).cloned() {
            return self.composer.purchase(&listing, message).await;
        }
        match self.gateway.get_by_id(id).await {
            Ok(detail) => self.composer.purchase(&detail.listing, message).await,
            Err(e) => {
                tracing::warn!(listing = id, error = %e, "Purchase fetch failed");
                replies::COULD_NOT_FIND.to_string()
            }
        }
    }

    /// "Which areas suit me?" — search without a district constraint, then
    /// rank districts by how many matches they hold.
    async fn district_flow(&self, memory: &mut SessionMemory, message: &str) -> String {
        if let Err(e) = self.extractor.extract(&mut memory.filters, message).await {
            tracing::warn!(error = %e, "Filter extraction failed");
            return replies::CLARIFY_RESTATE.to_string();
        }

        let mut scoped = memory.filters.clone();
        scoped.district = None;
        let kept = match self.query_and_refilter(&scoped).await {
            Ok(kept) => kept,
            Err(e) => {
                tracing::warn!(error = %e, "District aggregation failed");
                return replies::TRY_AGAIN.to_string();
            }
        };
        if kept.is_empty() {
            return replies::NOTHING_FOUND.to_string();
        }

        let mut counts: Vec<(String, usize)> = Vec::new();
        for listing in &kept {
            let Some(name) = listing.district_name() else {
                continue;
            };
            match counts.iter_mut().find(|(n, _)| n.as_str() == name) {
                Some((_, count)) => *count += 1,
                None => counts.push((name.to_string(), 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(self.search.district_suggestions);

        memory.suggested_districts = counts.iter().map(|(n, _)| n.clone()).collect();

        let mut reply = String::from("🗺️ مناسب‌ترین مناطق برای شما:");
        for (i, (name, count)) in counts.iter().enumerate() {
            reply.push_str(&format!("<br><b>{}.</b> {name} ({count} ملک)", i + 1));
        }
        reply.push_str("<br><br>نام منطقه را بفرستید تا املاک آن را نشان دهم.");
        reply
    }

    /// Typical price range for the stated criteria.
    async fn price_flow(&self, memory: &mut SessionMemory, message: &str) -> String {
        if let Err(e) = self.extractor.extract(&mut memory.filters, message).await {
            tracing::warn!(error = %e, "Filter extraction failed");
            return replies::CLARIFY_RESTATE.to_string();
        }

        let kept = match self.query_and_refilter(&memory.filters).await {
            Ok(kept) => kept,
            Err(e) => {
                tracing::warn!(error = %e, "Price aggregation failed");
                return replies::TRY_AGAIN.to_string();
            }
        };
        let prices: Vec<f64> = kept.iter().filter_map(|l| l.low_price).collect();
        if prices.is_empty() {
            return replies::NOTHING_FOUND.to_string();
        }

        let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        format!(
            "💰 برای این مشخصات، قیمت‌ها از <b>AED {}</b> شروع می‌شوند و تا \
             <b>AED {}</b> می‌رسند ({} ملک بررسی شد).",
            format_price(min),
            format_price(max),
            prices.len()
        )
    }

    /// Remote search plus the defensive local pass.
    async fn query_and_refilter(
        &self,
        filters: &SearchFilters,
    ) -> Result<Vec<Listing>, GatewayError> {
        let query = GatewayQuery::from_filters(filters, &self.tables);
        let listings = self.gateway.search(&query).await?;
        Ok(local_refilter(listings, filters))
    }

    fn id_from_catalog(&self, message: &str) -> Option<u64> {
        let catalog = self.catalog.get()?;
        reference::find_titles_in_text(&catalog, message)
            .into_iter()
            .next()
    }

    fn pair_from_catalog(&self, message: &str) -> Option<(u64, u64)> {
        let catalog = self.catalog.get()?;
        let found = reference::find_titles_in_text(&catalog, message);
        match found.as_slice() {
            [a, b, ..] if a != b => Some((*a, *b)),
            _ => None,
        }
    }
}

/// Match the message against the districts offered by the last
/// district-suggestion turn, by containment or fuzzy similarity.
fn pick_suggested_district(
    memory: &SessionMemory,
    message: &str,
    threshold: f64,
) -> Option<String> {
    let lower = message.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    memory
        .suggested_districts
        .iter()
        .find(|district| {
            let wanted = district.to_lowercase();
            lower.contains(&wanted) || realty_config::similarity(&lower, &wanted) >= threshold
        })
        .cloned()
}

fn follow_up_text(questions: &[FollowUp]) -> String {
    let mut text = String::from("برای جستجوی دقیق‌تر چند سوال دارم:");
    for (i, question) in questions.iter().enumerate() {
        text.push_str(&format!("<br><b>{}.</b> {}", i + 1, question.question()));
    }
    text
}
