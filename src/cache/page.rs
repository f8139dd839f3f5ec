//! Page cache keyed by `(page, size)` with a staleness window
//!
//! A fresh entry is served from memory, filtered down to the records the
//! entity cache still holds. A missing or stale entry triggers one batch
//! fetch of the page's identifier window and is replaced wholesale.
//!
//! Concurrent misses for the same key each refetch unless
//! `coalesce_refetches` is enabled, in which case one caller fetches and the
//! others wait for its entry.

use crate::cache::{
    config::CacheConfig,
    entity::EntityCache,
    entry::PageCacheEntry,
    types::{CacheStats, PageKey},
};
use crate::error::Result;
use crate::fetcher::EntityFetcher;
use crate::pagination::PageWindow;
use crate::record::EnrichedRecord;
use crate::registry::IdentifierRegistry;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

pub struct PageCache {
    config: CacheConfig,
    registry: Arc<IdentifierRegistry>,
    fetcher: Arc<EntityFetcher>,
    entity_cache: Arc<EntityCache>,

    entries: RwLock<HashMap<PageKey, PageCacheEntry>>,

    /// Per-key refetch locks, only used when coalescing
    inflight: Mutex<HashMap<PageKey, Arc<Mutex<()>>>>,

    hits: AtomicU64,
    misses: AtomicU64,
    refetches: AtomicU64,
    coalesced: AtomicU64,
}

impl PageCache {
    pub fn new(
        config: CacheConfig,
        registry: Arc<IdentifierRegistry>,
        fetcher: Arc<EntityFetcher>,
        entity_cache: Arc<EntityCache>,
    ) -> Self {
        Self {
            config,
            registry,
            fetcher,
            entity_cache,
            entries: RwLock::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            refetches: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
        }
    }

    /// Records for a validated window, from cache or a fresh batch fetch
    pub async fn get_page(&self, window: &PageWindow) -> Result<Vec<EnrichedRecord>> {
        self.get_page_at(window, Utc::now()).await
    }

    /// Same as [`PageCache::get_page`] with an explicit clock reading
    pub async fn get_page_at(&self, window: &PageWindow, now: DateTime<Utc>) -> Result<Vec<EnrichedRecord>> {
        let key = PageKey::new(window.page, window.size);

        if let Some(records) = self.fresh_records(key, now).await {
            self.count(&self.hits);
            info!("Using cached data for page {}", key);
            return Ok(self.entity_cache.retain_cached(&records).await);
        }
        self.count(&self.misses);

        if !self.config.coalesce_refetches {
            return self.refetch(key, window, now).await;
        }

        let lock = self.inflight_lock(key).await;
        let result = {
            let _guard = lock.lock().await;

            // Someone else may have refetched while we waited.
            match self.fresh_records(key, now).await {
                Some(records) => {
                    self.count(&self.coalesced);
                    debug!("Page {} refetched by a concurrent request", key);
                    Ok(self.entity_cache.retain_cached(&records).await)
                }
                None => self.refetch(key, window, now).await,
            }
        };
        self.release_inflight(key, lock).await;

        result
    }

    async fn fresh_records(&self, key: PageKey, now: DateTime<Utc>) -> Option<Vec<EnrichedRecord>> {
        let entries = self.entries.read().await;
        entries
            .get(&key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.records.clone())
    }

    async fn refetch(&self, key: PageKey, window: &PageWindow, now: DateTime<Utc>) -> Result<Vec<EnrichedRecord>> {
        let ids = self.registry.slice(window.from_index, window.to_index)?;
        info!("Fetching page {} from upstream ({} account holders)", key, ids.len());

        let records = self.fetcher.fetch_many(ids).await;
        self.count(&self.refetches);

        let entry = PageCacheEntry::new(key, records.clone(), now, self.config.ttl_with_jitter());
        self.entries.write().await.insert(key, entry);

        Ok(records)
    }

    async fn inflight_lock(&self, key: PageKey) -> Arc<Mutex<()>> {
        let mut inflight = self.inflight.lock().await;
        inflight.entry(key).or_default().clone()
    }

    async fn release_inflight(&self, key: PageKey, lock: Arc<Mutex<()>>) {
        let mut inflight = self.inflight.lock().await;
        drop(lock);
        // Clones are only handed out under this mutex
        if inflight.get(&key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            inflight.remove(&key);
        }
    }

    fn count(&self, counter: &AtomicU64) {
        if self.config.enable_metrics {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// When the cached entry for `key` was fetched, if any
    pub async fn fetched_at(&self, key: PageKey) -> Option<DateTime<Utc>> {
        self.entries.read().await.get(&key).map(|entry| entry.fetched_at)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub(crate) async fn record_stats(&self, stats: &mut CacheStats) {
        stats.page_hits = self.hits.load(Ordering::Relaxed);
        stats.page_misses = self.misses.load(Ordering::Relaxed);
        stats.page_refetches = self.refetches.load(Ordering::Relaxed);
        stats.page_coalesced = self.coalesced.load(Ordering::Relaxed);
        stats.page_entries = self.len().await;
    }
}
