//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Page cache key: the literal `(page, size)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageKey {
    pub page: usize,
    pub size: usize,
}

impl PageKey {
    pub fn new(page: usize, size: usize) -> Self {
        Self { page, size }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.page, self.size)
    }
}

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CacheStats {
    /// Page requests served from a fresh entry
    pub page_hits: u64,

    /// Page requests that found no entry or a stale one
    pub page_misses: u64,

    /// Upstream batch fetches issued for pages
    pub page_refetches: u64,

    /// Page requests that waited on another caller's refetch
    pub page_coalesced: u64,

    /// Pages currently cached
    pub page_entries: usize,

    /// Single-record lookups served from the entity cache
    pub entity_hits: u64,

    pub entity_misses: u64,

    /// Records dropped by the optional LRU bound
    pub entity_evictions: u64,

    /// Records currently cached
    pub entity_entries: usize,

    /// Primary lookups that failed (record dropped from its batch)
    pub upstream_failures: u64,

    /// Enrichment lookups that failed (record kept without enrichment)
    pub enrichment_failures: u64,
}

impl CacheStats {
    /// Page hit rate as a percentage
    pub fn page_hit_rate(&self) -> f64 {
        rate(self.page_hits, self.page_misses)
    }

    /// Entity hit rate as a percentage
    pub fn entity_hit_rate(&self) -> f64 {
        rate(self.entity_hits, self.entity_misses)
    }
}

fn rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        (hits as f64 / total as f64) * 100.0
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ pages: {} ({} hits, {} misses, {:.2}%), entities: {} ({} hits, {} misses, {:.2}%), upstream failures: {}, enrichment failures: {} }}",
            self.page_entries,
            self.page_hits,
            self.page_misses,
            self.page_hit_rate(),
            self.entity_entries,
            self.entity_hits,
            self.entity_misses,
            self.entity_hit_rate(),
            self.upstream_failures,
            self.enrichment_failures
        )
    }
}
