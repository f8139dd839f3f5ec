//! Page cache entry with staleness tracking

use crate::cache::types::PageKey;
use crate::record::EnrichedRecord;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// One cached page: the records fetched for a `(page, size)` key
///
/// Entries are replaced wholesale on refetch, never partially updated.
#[derive(Debug, Clone)]
pub struct PageCacheEntry {
    pub key: PageKey,

    /// Records in registry order; may be shorter than the window
    pub records: Vec<EnrichedRecord>,

    /// When the batch fetch that produced this entry started
    pub fetched_at: DateTime<Utc>,

    /// Staleness window for this entry
    pub ttl: Duration,
}

impl PageCacheEntry {
    pub fn new(key: PageKey, records: Vec<EnrichedRecord>, fetched_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            key,
            records,
            fetched_at,
            ttl,
        }
    }

    /// `now - fetched_at < ttl`
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        // A clock stepping backwards yields a negative age, which counts as fresh.
        match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => now - self.fetched_at < ttl,
            Err(_) => true,
        }
    }

    /// Age of the entry at `now`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }
}
