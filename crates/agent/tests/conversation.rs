//! End-to-end conversation tests with scripted model and gateway stubs
//!
//! The scripted LLM routes on the system prompt: classification and
//! extraction calls pop pre-seeded JSON payloads, everything else gets a
//! fixed completion. The gateway stub records every query it receives.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use realty_agent::{replies, ChatEngine};
use realty_config::{CodeTables, SearchSettings};
use realty_core::{Listing, ListingDetail, NamedRef};
use realty_gateway::{CatalogCache, GatewayError, GatewayQuery, ListingGateway};
use realty_llm::{LlmBackend, LlmError, Message};
use realty_tools::NoSearch;

struct ScriptedLlm {
    classify: Mutex<VecDeque<&'static str>>,
    extract: Mutex<VecDeque<&'static str>>,
}

impl ScriptedLlm {
    fn new(classify: Vec<&'static str>, extract: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            classify: Mutex::new(classify.into()),
            extract: Mutex::new(extract.into()),
        })
    }
}

#[async_trait]
impl LlmBackend for ScriptedLlm {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let system = messages.first().map(|m| m.content.as_str()).unwrap_or("");
        if system.starts_with("You classify") {
            let next = self.classify.lock().unwrap().pop_front();
            return Ok(next.expect("classification script exhausted").to_string());
        }
        if system.starts_with("You extract") {
            let next = self.extract.lock().unwrap().pop_front();
            return Ok(next.expect("extraction script exhausted").to_string());
        }
        Ok("canned completion".to_string())
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

struct StubGateway {
    results: Vec<Listing>,
    fail_search: bool,
    searches: AtomicUsize,
    last_detail_id: AtomicU64,
}

impl StubGateway {
    fn with_results(results: Vec<Listing>) -> Arc<Self> {
        Arc::new(Self {
            results,
            fail_search: false,
            searches: AtomicUsize::new(0),
            last_detail_id: AtomicU64::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            results: Vec::new(),
            fail_search: true,
            searches: AtomicUsize::new(0),
            last_detail_id: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl ListingGateway for StubGateway {
    async fn search(&self, _query: &GatewayQuery) -> Result<Vec<Listing>, GatewayError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail_search {
            return Err(GatewayError::Network("down".into()));
        }
        Ok(self.results.clone())
    }

    async fn get_by_id(&self, id: u64) -> Result<ListingDetail, GatewayError> {
        self.last_detail_id.store(id, Ordering::SeqCst);
        self.results
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .map(|listing| ListingDetail {
                listing,
                extra: Default::default(),
            })
            .ok_or(GatewayError::NotFound(id))
    }

    async fn fetch_page(&self, _page: usize, _limit: usize) -> Result<Vec<Listing>, GatewayError> {
        Ok(Vec::new())
    }
}

fn listing(id: u64, title: &str) -> Listing {
    Listing {
        id,
        title: Some(title.to_string()),
        district: Some(NamedRef::named("Business Bay")),
        sales_status: Some(NamedRef::named("Available")),
        low_price: Some(1_500_000.0),
        ..Default::default()
    }
}

fn engine(llm: Arc<ScriptedLlm>, gateway: Arc<StubGateway>) -> ChatEngine {
    ChatEngine::new(
        llm,
        Arc::new(NoSearch),
        gateway,
        Arc::new(CodeTables::empty(0.7)),
        CatalogCache::new(),
        SearchSettings::default(),
        Duration::from_secs(1800),
    )
}

const SEARCH: &str = r#"{"intent": "search"}"#;

#[tokio::test]
async fn incomplete_search_asks_follow_ups_without_querying() {
    let llm = ScriptedLlm::new(vec![SEARCH], vec![r#"{"district": "Business Bay"}"#]);
    let gateway = StubGateway::with_results(vec![listing(1, "Marina Vista")]);
    let engine = engine(llm, gateway.clone());

    let reply = engine.handle("s1", "یه آپارتمان تو بیزینس بی می‌خوام").await;
    assert!(reply.contains("چند خوابه"));
    assert!(reply.contains("بودجه"));
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn answered_follow_ups_run_the_search_with_carried_filters() {
    let llm = ScriptedLlm::new(
        vec![SEARCH, SEARCH],
        vec![
            r#"{"district": "Business Bay"}"#,
            r#"{"bedrooms": 2, "max_price": 2000000}"#,
        ],
    );
    let gateway = StubGateway::with_results(vec![listing(1, "Marina Vista"), listing(2, "Creek Edge")]);
    let engine = engine(llm, gateway.clone());

    let first = engine.handle("s1", "آپارتمان تو بیزینس بی").await;
    assert!(first.contains("چند خوابه"));

    let second = engine.handle("s1", "دو خوابه تا دو میلیون").await;
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 1);
    assert!(second.contains("2 ملک"));
    assert!(second.contains("Marina Vista") || second.contains("canned completion"));
    assert!(second.contains(replies::FOOTER));
}

#[tokio::test]
async fn terse_answer_classified_unknown_continues_the_search() {
    let llm = ScriptedLlm::new(
        vec![SEARCH, r#"{"intent": "unknown"}"#],
        vec![
            r#"{"district": "Business Bay"}"#,
            r#"{"bedrooms": 2, "max_price": 2000000}"#,
        ],
    );
    let gateway = StubGateway::with_results(vec![listing(1, "Marina Vista")]);
    let engine = engine(llm, gateway.clone());

    let first = engine.handle("s1", "آپارتمان تو بیزینس بی").await;
    assert!(first.contains("چند خوابه"));

    // "۲ تا دو میلیون" classifies as unknown; with questions open it must be
    // treated as an answer to the search that asked them.
    let second = engine.handle("s1", "۲ تا دو میلیون").await;
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 1);
    assert!(second.contains("1 ملک"));
}

#[tokio::test]
async fn no_preference_answer_satisfies_the_gate() {
    let llm = ScriptedLlm::new(
        vec![SEARCH, r#"{"intent": "unknown"}"#],
        vec![
            r#"{"district": "Business Bay"}"#,
            r#"{"bedrooms_no_preference": true, "price_no_preference": true}"#,
        ],
    );
    let gateway = StubGateway::with_results(vec![listing(1, "Marina Vista")]);
    let engine = engine(llm, gateway.clone());

    engine.handle("s1", "آپارتمان تو بیزینس بی").await;
    let reply = engine.handle("s1", "فرقی نداره").await;
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 1);
    assert!(reply.contains("1 ملک"));
}

#[tokio::test]
async fn answer_misread_as_details_still_continues_the_search() {
    // A bare "۲" can plausibly be labeled as a listing reference; with
    // follow-up questions open it is an answer to them.
    let llm = ScriptedLlm::new(
        vec![SEARCH, r#"{"intent": "details"}"#],
        vec![
            r#"{"district": "Business Bay"}"#,
            r#"{"bedrooms": 2, "max_price": 2000000}"#,
        ],
    );
    let gateway = StubGateway::with_results(vec![listing(1, "Marina Vista")]);
    let engine = engine(llm, gateway.clone());

    let first = engine.handle("s1", "آپارتمان تو بیزینس بی").await;
    assert!(first.contains("چند خوابه"));

    let second = engine.handle("s1", "۲ تا دو میلیون").await;
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 1);
    assert!(second.contains("1 ملک"));
    assert_ne!(second, replies::WHICH_LISTING);
}

#[tokio::test]
async fn reset_flag_ends_the_turn_with_the_acknowledgement() {
    let llm = ScriptedLlm::new(
        vec![
            SEARCH,
            r#"{"intent": "search", "reset_requested": true}"#,
            SEARCH,
        ],
        vec![
            r#"{"district": "Business Bay", "bedrooms": 2, "max_price": 2000000}"#,
            r#"{"district": "Dubai Marina"}"#,
        ],
    );
    let gateway = StubGateway::with_results(vec![listing(1, "Marina Vista")]);
    let engine = engine(llm, gateway.clone());

    engine.handle("s1", "دو خوابه تو بیزینس بی تا دو میلیون").await;
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 1);

    // The flag clears memory and acknowledges; no search runs this turn.
    let second = engine.handle("s1", "همه رو پاک کن و تو دبی مارینا بگرد").await;
    assert_eq!(second, replies::RESET_ACK);
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 1);

    // The old bedrooms/budget are gone, so the next search re-asks them.
    let third = engine.handle("s1", "آپارتمان تو دبی مارینا").await;
    assert!(third.contains("چند خوابه"));
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn district_suggestion_reply_scopes_the_search() {
    let llm = ScriptedLlm::new(
        vec![r#"{"intent": "district_search"}"#],
        vec![r#"{"bedrooms": 2, "max_price": 2000000}"#],
    );
    let gateway =
        StubGateway::with_results(vec![listing(1, "Marina Vista"), listing(2, "Creek Edge")]);
    let engine = engine(llm, gateway.clone());

    let first = engine
        .handle("s1", "کدوم منطقه برای من مناسبه؟ دو خوابه تا دو میلیون")
        .await;
    assert!(first.contains("Business Bay"));

    // Naming an offered district skips classification entirely: the scripts
    // are exhausted, so any model call here would panic.
    let second = engine.handle("s1", "Business Bay").await;
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 2);
    assert!(second.contains("2 ملک"));
}

#[tokio::test]
async fn price_range_respects_stated_bounds() {
    let llm = ScriptedLlm::new(
        vec![r#"{"intent": "property_price"}"#],
        vec![r#"{"district": "Business Bay", "max_price": 2000000}"#],
    );
    let mut pricey = listing(2, "Creek Edge");
    pricey.low_price = Some(2_500_000.0);
    let gateway = StubGateway::with_results(vec![listing(1, "Marina Vista"), pricey]);
    let engine = engine(llm, gateway.clone());

    let reply = engine
        .handle("s1", "قیمت دو خوابه تو بیزینس بی تا دو میلیون چنده؟")
        .await;
    // The stated budget stays in the query, so the over-budget listing is
    // excluded from the reported range.
    assert!(reply.contains("1,500,000"));
    assert!(!reply.contains("2,500,000"));
}

#[tokio::test]
async fn new_sensitive_request_hits_the_confirmation_gate() {
    // Two classification entries only: resolving the gate must reuse the
    // stashed classification, so a third classify call would panic here.
    let llm = ScriptedLlm::new(
        vec![SEARCH, SEARCH],
        vec![
            r#"{"district": "Business Bay", "bedrooms": 2, "max_price": 2000000}"#,
            r#"{"max_price": 1800000}"#,
        ],
    );
    let gateway = StubGateway::with_results(vec![listing(1, "Marina Vista")]);
    let engine = engine(llm, gateway.clone());

    let first = engine.handle("s1", "دو خوابه تو بیزینس بی تا دو میلیون").await;
    assert!(first.contains("1 ملک"));
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 1);

    // Filters are populated and no questions open: the gate must fire and
    // nothing may be queried.
    let second = engine.handle("s1", "ارزون‌ترش رو بگرد").await;
    assert_eq!(second, replies::CONFIRM_CONTINUE_OR_RESET);
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 1);

    // "Continue" replays the stashed message against the kept filters.
    let third = engine.handle("s1", "ادامه").await;
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 2);
    assert!(third.contains("1 ملک"));
}

#[tokio::test]
async fn reset_answer_to_the_gate_starts_clean() {
    let llm = ScriptedLlm::new(
        vec![SEARCH, SEARCH],
        vec![
            r#"{"district": "Business Bay", "bedrooms": 2, "max_price": 2000000}"#,
            r#"{"district": "Dubai Marina"}"#,
        ],
    );
    let gateway = StubGateway::with_results(vec![listing(1, "Marina Vista")]);
    let engine = engine(llm, gateway.clone());

    engine.handle("s1", "دو خوابه تو بیزینس بی تا دو میلیون").await;
    let gate = engine.handle("s1", "تو دبی مارینا بگرد").await;
    assert_eq!(gate, replies::CONFIRM_CONTINUE_OR_RESET);

    // After a reset the old bedrooms/budget are gone, so the stashed search
    // must re-ask the follow-ups instead of querying.
    let reply = engine.handle("s1", "از اول شروع کن").await;
    assert!(reply.contains("چند خوابه"));
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn show_more_pages_through_stored_results() {
    let llm = ScriptedLlm::new(
        vec![SEARCH, r#"{"intent": "more"}"#, r#"{"intent": "more"}"#],
        vec![r#"{"district": "Business Bay", "bedrooms": 2, "max_price": 2000000}"#],
    );
    let results: Vec<Listing> = (1..=5).map(|i| listing(i, &format!("Tower {i}"))).collect();
    let gateway = StubGateway::with_results(results);
    let engine = engine(llm, gateway.clone());

    let first = engine.handle("s1", "دو خوابه بیزینس بی تا دو میلیون").await;
    assert!(first.contains("<b>1.</b>"));
    assert!(!first.contains("<b>4.</b>"));

    let second = engine.handle("s1", "املاک دیگه رو نشونم بده").await;
    assert!(second.contains("<b>4.</b>"));
    assert!(second.contains("<b>5.</b>"));
    // Pagination reads the stored results; no second gateway call.
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 1);

    let third = engine.handle("s1", "بازم").await;
    assert_eq!(third, replies::ALL_SHOWN);
}

#[tokio::test]
async fn details_resolve_persian_ordinals() {
    let llm = ScriptedLlm::new(
        vec![
            SEARCH,
            r#"{"intent": "details", "detail_requested": "price"}"#,
        ],
        vec![r#"{"district": "Business Bay", "bedrooms": 2, "max_price": 2000000}"#],
    );
    let gateway = StubGateway::with_results(vec![listing(11, "Marina Vista"), listing(22, "Creek Edge")]);
    let engine = engine(llm, gateway.clone());

    engine.handle("s1", "دو خوابه بیزینس بی تا دو میلیون").await;
    let reply = engine.handle("s1", "قیمت ملک ۲ چنده؟").await;
    assert_eq!(gateway.last_detail_id.load(Ordering::SeqCst), 22);
    assert!(!reply.is_empty());
}

#[tokio::test]
async fn gateway_failure_degrades_to_nothing_found() {
    let llm = ScriptedLlm::new(
        vec![SEARCH],
        vec![r#"{"district": "Business Bay", "bedrooms": 2, "max_price": 2000000}"#],
    );
    let engine = engine(llm, StubGateway::failing());

    let reply = engine.handle("s1", "دو خوابه بیزینس بی تا دو میلیون").await;
    assert_eq!(reply, replies::NOTHING_FOUND);
}

#[tokio::test]
async fn availability_check_reports_absence() {
    let llm = ScriptedLlm::new(
        vec![r#"{"intent": "availability_check"}"#],
        vec![r#"{"district": "Business Bay"}"#],
    );
    let gateway = StubGateway::with_results(Vec::new());
    let engine = engine(llm, gateway.clone());

    // Availability checks query immediately, open questions or not.
    let reply = engine.handle("s1", "الان تو بیزینس بی چیزی موجوده؟").await;
    assert_eq!(reply, replies::NOT_AVAILABLE);
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn explicit_reset_intent_acknowledges() {
    let llm = ScriptedLlm::new(
        vec![SEARCH, r#"{"intent": "reset", "reset_requested": true}"#],
        vec![r#"{"district": "Business Bay", "bedrooms": 2, "max_price": 2000000}"#],
    );
    let gateway = StubGateway::with_results(vec![listing(1, "Marina Vista")]);
    let engine = engine(llm, gateway);

    engine.handle("s1", "دو خوابه بیزینس بی تا دو میلیون").await;
    let reply = engine.handle("s1", "همه رو پاک کن از اول").await;
    assert_eq!(reply, replies::RESET_ACK);
}

#[tokio::test]
async fn greetings_never_reach_the_model() {
    // Empty scripts: any model call would panic the test.
    let llm = ScriptedLlm::new(vec![], vec![]);
    let engine = engine(llm, StubGateway::with_results(Vec::new()));

    let reply = engine.handle("s1", "سلام").await;
    assert!(!reply.is_empty());
}

#[tokio::test]
async fn unparseable_classification_asks_for_clarity() {
    let llm = ScriptedLlm::new(vec!["no json here"], vec![]);
    let engine = engine(llm, StubGateway::with_results(Vec::new()));

    let reply = engine.handle("s1", "؟؟؟").await;
    assert_eq!(reply, replies::CLARIFY);
}

#[tokio::test]
async fn sessions_do_not_leak_between_ids() {
    let llm = ScriptedLlm::new(
        vec![SEARCH, SEARCH],
        vec![
            r#"{"district": "Business Bay", "bedrooms": 2, "max_price": 2000000}"#,
            r#"{"district": "Business Bay"}"#,
        ],
    );
    let gateway = StubGateway::with_results(vec![listing(1, "Marina Vista")]);
    let engine = engine(llm, gateway.clone());

    engine.handle("alice", "دو خوابه بیزینس بی تا دو میلیون").await;

    // A fresh session with only a district must get the follow-ups, not the
    // other session's completed filters.
    let reply = engine.handle("bob", "آپارتمان تو بیزینس بی").await;
    assert!(reply.contains("چند خوابه"));
    assert_eq!(gateway.searches.load(Ordering::SeqCst), 1);
}
