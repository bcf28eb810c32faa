//! Per-session memory and the session store
//!
//! Every piece of conversational state is keyed by an explicit session id.
//! Mutation happens under a per-session `tokio::sync::Mutex`, so one writer
//! at a time per conversation; idle sessions are evicted after a TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;

use realty_core::{Classification, IntentTag, Listing, SearchFilters};

use crate::extractor::FollowUp;

/// A turn held back by the continue-vs-reset question: the raw message plus
/// its classification, so resolution re-dispatches without another model call.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub message: String,
    pub classification: Classification,
}

/// All state carried across the turns of one conversation.
#[derive(Debug, Default)]
pub struct SessionMemory {
    /// Union of stated-and-still-valid search constraints.
    pub filters: SearchFilters,
    /// Last classified intent, for follow-up continuation.
    pub previous_intent: Option<IntentTag>,
    /// Turn stashed while the continue-vs-reset question is open.
    pub pending_confirmation: Option<PendingTurn>,
    /// Listings most recently presented, in presentation order. Replaced
    /// wholesale on every new search, only paginated on "show more".
    pub last_shown: Vec<Listing>,
    /// Offset into `last_shown` for the next page.
    pub page_cursor: usize,
    /// Lowercased title -> listing id, accumulated over everything ever shown
    /// in this session. Grows until the session is evicted.
    pub name_to_id: HashMap<String, u64>,
    /// Fallback for detail requests with no resolvable reference.
    pub last_referenced: Option<u64>,
    /// Follow-up questions still waiting for an answer.
    pub pending_questions: Vec<FollowUp>,
    /// Districts offered by the last district-suggestion turn.
    pub suggested_districts: Vec<String>,
}

impl SessionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the presented result set and index its titles.
    pub fn remember_listings(&mut self, listings: Vec<Listing>) {
        for listing in &listings {
            let title = listing.title_lower();
            if !title.is_empty() {
                self.name_to_id.insert(title, listing.id);
            }
        }
        self.last_shown = listings;
        self.page_cursor = 0;
    }

    /// The next page of `last_shown`, without advancing the cursor.
    pub fn current_page(&self, page_size: usize) -> &[Listing] {
        let start = self.page_cursor.min(self.last_shown.len());
        let end = (start + page_size).min(self.last_shown.len());
        &self.last_shown[start..end]
    }

    pub fn advance_cursor(&mut self, shown: usize) {
        self.page_cursor = (self.page_cursor + shown).min(self.last_shown.len());
    }

    /// Clears filter-related state only. Previous intent, shown listings and
    /// the name index survive a reset.
    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.pending_questions.clear();
        self.suggested_districts.clear();
    }
}

struct SessionEntry {
    memory: Arc<Mutex<SessionMemory>>,
    last_seen: parking_lot::Mutex<Instant>,
}

/// In-memory session store with TTL eviction.
pub struct SessionManager {
    sessions: DashMap<String, Arc<SessionEntry>>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Fetch or create the session, refreshing its activity timestamp.
    pub fn get_or_create(&self, id: &str) -> Arc<Mutex<SessionMemory>> {
        let entry = self
            .sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                Arc::new(SessionEntry {
                    memory: Arc::new(Mutex::new(SessionMemory::new())),
                    last_seen: parking_lot::Mutex::new(Instant::now()),
                })
            })
            .clone();
        *entry.last_seen.lock() = Instant::now();
        entry.memory.clone()
    }

    /// Drop sessions idle longer than the TTL. Called opportunistically on
    /// each turn; the map is small enough that a full sweep is fine.
    pub fn evict_idle(&self) {
        let ttl = self.ttl;
        self.sessions
            .retain(|_, entry| entry.last_seen.lock().elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: u64, title: &str) -> Listing {
        Listing {
            id,
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn remember_listings_replaces_and_indexes() {
        let mut memory = SessionMemory::new();
        memory.remember_listings(vec![listing(1, "Marina Vista"), listing(2, "Creek Edge")]);
        memory.advance_cursor(2);

        memory.remember_listings(vec![listing(3, "Sobha One")]);
        assert_eq!(memory.last_shown.len(), 1);
        assert_eq!(memory.page_cursor, 0, "cursor resets on a new search");
        // Old titles stay resolvable.
        assert_eq!(memory.name_to_id.get("marina vista"), Some(&1));
        assert_eq!(memory.name_to_id.get("sobha one"), Some(&3));
    }

    #[test]
    fn paging_walks_disjoint_slices() {
        let mut memory = SessionMemory::new();
        memory.remember_listings((1..=7).map(|i| listing(i, &format!("P{i}"))).collect());

        let first: Vec<u64> = memory.current_page(3).iter().map(|l| l.id).collect();
        memory.advance_cursor(first.len());
        let second: Vec<u64> = memory.current_page(3).iter().map(|l| l.id).collect();
        memory.advance_cursor(second.len());
        let third: Vec<u64> = memory.current_page(3).iter().map(|l| l.id).collect();

        assert_eq!(first, vec![1, 2, 3]);
        assert_eq!(second, vec![4, 5, 6]);
        assert_eq!(third, vec![7]);
    }

    #[test]
    fn clear_filters_keeps_history() {
        let mut memory = SessionMemory::new();
        memory.filters.district = Some("Business Bay".into());
        memory.previous_intent = Some(IntentTag::Search);
        memory.remember_listings(vec![listing(1, "Marina Vista")]);
        memory.pending_questions = vec![FollowUp::Bedrooms];

        memory.clear_filters();
        assert!(memory.filters.is_empty());
        assert!(memory.pending_questions.is_empty());
        assert_eq!(memory.previous_intent, Some(IntentTag::Search));
        assert_eq!(memory.last_shown.len(), 1);
        assert!(!memory.name_to_id.is_empty());
    }

    #[tokio::test]
    async fn manager_keys_sessions_separately() {
        let manager = SessionManager::new(Duration::from_secs(60));
        let a = manager.get_or_create("a");
        let b = manager.get_or_create("b");

        a.lock().await.filters.bedrooms = Some(2);
        assert!(b.lock().await.filters.bedrooms.is_none());
        assert_eq!(manager.len(), 2);

        // Same id returns the same memory.
        let a2 = manager.get_or_create("a");
        assert_eq!(a2.lock().await.filters.bedrooms, Some(2));
    }

    #[tokio::test]
    async fn eviction_drops_idle_sessions() {
        let manager = SessionManager::new(Duration::from_millis(0));
        manager.get_or_create("a");
        std::thread::sleep(Duration::from_millis(5));
        manager.evict_idle();
        assert!(manager.is_empty());
    }
}
