//! Per-identifier cache of enriched records
//!
//! Records never expire here. Every successful fetch, whether for a page or
//! a single lookup, overwrites the identifier's slot. Without a configured
//! bound the cache grows with the number of distinct identifiers fetched,
//! which the fixed registry keeps finite.

use crate::cache::{config::CacheConfig, types::CacheStats};
use crate::record::EnrichedRecord;
use crate::registry::Identifier;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::debug;

/// Identifier -> last successfully enriched record
pub struct EntityCache {
    store: RwLock<EntityStore>,
    max_entries: Option<usize>,
    enable_metrics: bool,
}

struct EntityStore {
    entries: HashMap<Identifier, EnrichedRecord>,

    /// LRU tracking, only maintained when bounded
    lru_queue: VecDeque<Identifier>,

    hits: u64,
    misses: u64,
    evictions: u64,
}

impl EntityCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            store: RwLock::new(EntityStore {
                entries: HashMap::new(),
                lru_queue: VecDeque::new(),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            max_entries: config.max_entity_entries,
            enable_metrics: config.enable_metrics,
        }
    }

    /// Look up a record, counting the hit or miss
    pub async fn get(&self, id: &str) -> Option<EnrichedRecord> {
        let mut store = self.store.write().await;

        let record = store.entries.get(id).cloned();
        match &record {
            Some(_) => {
                debug!("Entity cache hit: {}", id);
                if self.enable_metrics {
                    store.hits += 1;
                }
                if self.max_entries.is_some() {
                    store.touch(id);
                }
            }
            None => {
                debug!("Entity cache miss: {}", id);
                if self.enable_metrics {
                    store.misses += 1;
                }
            }
        }

        record
    }

    /// Store a record under `id`, replacing any previous one
    pub async fn put(&self, id: Identifier, record: EnrichedRecord) {
        let mut store = self.store.write().await;
        self.put_locked(&mut store, id, record);
    }

    /// Store a batch of records under their own identifiers
    pub async fn put_many(&self, records: &[EnrichedRecord]) {
        let mut store = self.store.write().await;
        for record in records {
            self.put_locked(&mut store, record.id.clone(), record.clone());
        }
    }

    fn put_locked(&self, store: &mut EntityStore, id: Identifier, record: EnrichedRecord) {
        let replaced = store.entries.insert(id.clone(), record).is_some();

        let Some(max_entries) = self.max_entries else {
            return;
        };

        if replaced {
            store.touch(&id);
            return;
        }

        store.lru_queue.push_back(id);
        while store.entries.len() > max_entries {
            let Some(oldest) = store.lru_queue.pop_front() else {
                break;
            };
            debug!("Evicting entity due to max_entity_entries limit: {}", oldest);
            store.entries.remove(&oldest);
            if self.enable_metrics {
                store.evictions += 1;
            }
        }
    }

    /// Check presence without touching statistics or recency
    pub async fn contains(&self, id: &str) -> bool {
        self.store.read().await.entries.contains_key(id)
    }

    /// Keep only the records whose identifier is still cached
    pub async fn retain_cached(&self, records: &[EnrichedRecord]) -> Vec<EnrichedRecord> {
        let store = self.store.read().await;
        records
            .iter()
            .filter(|record| store.entries.contains_key(&record.id))
            .cloned()
            .collect()
    }

    pub async fn remove(&self, id: &str) -> Option<EnrichedRecord> {
        let mut store = self.store.write().await;
        let removed = store.entries.remove(id);
        if removed.is_some() {
            store.lru_queue.retain(|k| k != id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.entries.is_empty()
    }

    pub(crate) async fn record_stats(&self, stats: &mut CacheStats) {
        let store = self.store.read().await;
        stats.entity_hits = store.hits;
        stats.entity_misses = store.misses;
        stats.entity_evictions = store.evictions;
        stats.entity_entries = store.entries.len();
    }
}

impl EntityStore {
    /// Move `id` to the most recently used end
    fn touch(&mut self, id: &str) {
        self.lru_queue.retain(|k| k != id);
        self.lru_queue.push_back(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> EnrichedRecord {
        EnrichedRecord {
            id: id.to_string(),
            account_holder_id: Some(id.to_string()),
            reference: None,
            description: None,
            status: Some("active".to_string()),
            legal_entity_id: None,
            legal_name: None,
            entity_type: None,
            country: None,
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let cache = EntityCache::new(&CacheConfig::default());

        cache.put("AH1".to_string(), record("AH1")).await;
        assert_eq!(cache.get("AH1").await, Some(record("AH1")));
        assert_eq!(cache.get("AH2").await, None);

        let mut stats = CacheStats::default();
        cache.record_stats(&mut stats).await;
        assert_eq!(stats.entity_hits, 1);
        assert_eq!(stats.entity_misses, 1);
        assert_eq!(stats.entity_entries, 1);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_whole_record() {
        let cache = EntityCache::new(&CacheConfig::default());
        cache.put("AH1".to_string(), record("AH1")).await;

        let mut updated = record("AH1");
        updated.status = Some("closed".to_string());
        cache.put("AH1".to_string(), updated.clone()).await;

        assert_eq!(cache.get("AH1").await, Some(updated));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_unbounded_by_default() {
        let cache = EntityCache::new(&CacheConfig::default());
        let records: Vec<_> = (0..1000).map(|i| record(&format!("AH{}", i))).collect();
        cache.put_many(&records).await;
        assert_eq!(cache.len().await, 1000);
    }

    #[tokio::test]
    async fn test_lru_bound() {
        let config = CacheConfig::builder().max_entity_entries(2).build();
        let cache = EntityCache::new(&config);

        cache.put("AH1".to_string(), record("AH1")).await;
        cache.put("AH2".to_string(), record("AH2")).await;

        // AH1 becomes most recently used
        assert!(cache.get("AH1").await.is_some());

        cache.put("AH3".to_string(), record("AH3")).await;
        assert!(cache.contains("AH1").await);
        assert!(!cache.contains("AH2").await);
        assert!(cache.contains("AH3").await);

        let mut stats = CacheStats::default();
        cache.record_stats(&mut stats).await;
        assert_eq!(stats.entity_evictions, 1);
    }

    #[tokio::test]
    async fn test_retain_cached() {
        let cache = EntityCache::new(&CacheConfig::default());
        cache.put_many(&[record("AH1"), record("AH3")]).await;

        let kept = cache
            .retain_cached(&[record("AH1"), record("AH2"), record("AH3")])
            .await;
        let ids: Vec<_> = kept.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["AH1", "AH3"]);
    }
}
