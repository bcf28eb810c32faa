//! Full-catalog cache
//!
//! A background task refreshes the complete listing catalog on a fixed
//! interval, paginating `/getProperties` until a short page signals
//! end-of-data. The loop owns the refresh end to end, so runs can never
//! overlap regardless of how long a refresh takes.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;

use realty_config::CatalogSettings;
use realty_core::Listing;

use crate::client::ListingGateway;
use crate::GatewayError;

/// Shared, cheaply clonable catalog snapshot.
#[derive(Clone, Default)]
pub struct CatalogCache {
    inner: Arc<RwLock<Option<Arc<Vec<Listing>>>>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, if a refresh has completed at least once.
    pub fn get(&self) -> Option<Arc<Vec<Listing>>> {
        self.inner.read().clone()
    }

    pub fn set(&self, listings: Vec<Listing>) {
        *self.inner.write() = Some(Arc::new(listings));
    }

    pub fn is_populated(&self) -> bool {
        self.inner.read().is_some()
    }
}

/// Fetch the entire catalog, page by page, until an under-sized page.
pub async fn refresh_catalog(
    gateway: &dyn ListingGateway,
    page_size: usize,
) -> Result<Vec<Listing>, GatewayError> {
    let mut all = Vec::new();
    let mut page = 1;

    loop {
        let batch = gateway.fetch_page(page, page_size).await?;
        let batch_len = batch.len();
        all.extend(batch);
        if batch_len < page_size {
            break;
        }
        page += 1;
    }

    Ok(all)
}

/// Spawn the periodic refresher. The first refresh runs immediately.
pub fn spawn_catalog_refresher(
    gateway: Arc<dyn ListingGateway>,
    cache: CatalogCache,
    settings: CatalogSettings,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(settings.refresh_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match refresh_catalog(gateway.as_ref(), settings.page_size).await {
                Ok(listings) => {
                    tracing::info!(count = listings.len(), "Catalog cache refreshed");
                    cache.set(listings);
                }
                Err(e) => {
                    // Keep serving the previous snapshot.
                    tracing::warn!(error = %e, "Catalog refresh failed");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::GatewayQuery;
    use async_trait::async_trait;
    use realty_core::ListingDetail;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct PagedGateway {
        total: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ListingGateway for PagedGateway {
        async fn search(&self, _query: &GatewayQuery) -> Result<Vec<Listing>, GatewayError> {
            Ok(Vec::new())
        }

        async fn get_by_id(&self, id: u64) -> Result<ListingDetail, GatewayError> {
            Err(GatewayError::NotFound(id))
        }

        async fn fetch_page(&self, page: usize, limit: usize) -> Result<Vec<Listing>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let start = (page - 1) * limit;
            let end = (start + limit).min(self.total);
            Ok((start..end)
                .map(|i| Listing {
                    id: i as u64,
                    ..Default::default()
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn refresh_paginates_until_short_page() {
        let gateway = PagedGateway {
            total: 25,
            calls: AtomicUsize::new(0),
        };
        let listings = refresh_catalog(&gateway, 10).await.unwrap();
        assert_eq!(listings.len(), 25);
        // 10 + 10 + 5: the short third page stops the loop.
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exact_multiple_needs_one_empty_page() {
        let gateway = PagedGateway {
            total: 20,
            calls: AtomicUsize::new(0),
        };
        let listings = refresh_catalog(&gateway, 10).await.unwrap();
        assert_eq!(listings.len(), 20);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn cache_starts_unpopulated() {
        let cache = CatalogCache::new();
        assert!(!cache.is_populated());
        assert!(cache.get().is_none());

        cache.set(vec![Listing::default()]);
        assert!(cache.is_populated());
        assert_eq!(cache.get().unwrap().len(), 1);
    }
}
