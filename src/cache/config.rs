//! Configuration for the page and entity caches

use crate::error::{Error, Result};
use crate::pagination::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Staleness window for cached pages: 5 minutes
pub const DEFAULT_PAGE_TTL: Duration = Duration::from_secs(300);

/// Configuration for the account holder caches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum age of a cached page before it is refetched
    pub page_ttl: Duration,

    /// TTL jitter factor (0.0 - 1.0) applied per stored page
    /// 0.0 keeps every page on the exact staleness window
    pub ttl_jitter: f64,

    /// Page size used when a request does not specify one
    pub default_page_size: usize,

    /// Upstream lookups in flight while fetching one page
    pub fetch_concurrency: usize,

    /// Optional LRU bound for the entity cache
    /// `None` keeps every record ever fetched
    pub max_entity_entries: Option<usize>,

    /// Let one caller refetch an expired page while concurrent callers
    /// for the same key wait for its result
    pub coalesce_refetches: bool,

    /// Enable hit/miss counters
    pub enable_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            page_ttl: DEFAULT_PAGE_TTL,
            ttl_jitter: 0.0,
            default_page_size: DEFAULT_PAGE_SIZE,
            // Sequential, in registry order
            fetch_concurrency: 1,
            max_entity_entries: None,
            coalesce_refetches: false,
            enable_metrics: true,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.page_ttl.is_zero() {
            return Err(Error::Config("page_ttl must be greater than 0".to_string()));
        }

        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err(Error::Config(
                "ttl_jitter must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.default_page_size == 0 {
            return Err(Error::Config(
                "default_page_size must be greater than 0".to_string(),
            ));
        }

        if self.fetch_concurrency == 0 {
            return Err(Error::Config(
                "fetch_concurrency must be greater than 0".to_string(),
            ));
        }

        if self.max_entity_entries == Some(0) {
            return Err(Error::Config(
                "max_entity_entries must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Calculate the TTL for a newly stored page with jitter applied
    pub fn ttl_with_jitter(&self) -> Duration {
        if self.ttl_jitter == 0.0 {
            return self.page_ttl;
        }

        let base_secs = self.page_ttl.as_secs_f64();
        let jitter_range = base_secs * self.ttl_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_secs = (base_secs + jitter).max(0.001);

        // Saturate instead of overflowing for TTLs near Duration::MAX
        Duration::try_from_secs_f64(final_secs).unwrap_or(Duration::MAX)
    }

    /// Load configuration from the environment (and `.env` if present)
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            page_ttl: env_parse::<u64>("HOLDER_CACHE_PAGE_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.page_ttl),
            ttl_jitter: env_parse("HOLDER_CACHE_TTL_JITTER")?.unwrap_or(defaults.ttl_jitter),
            default_page_size: env_parse("HOLDER_CACHE_DEFAULT_PAGE_SIZE")?
                .unwrap_or(defaults.default_page_size),
            fetch_concurrency: env_parse("HOLDER_CACHE_FETCH_CONCURRENCY")?
                .unwrap_or(defaults.fetch_concurrency),
            max_entity_entries: env_parse("HOLDER_CACHE_MAX_ENTITY_ENTRIES")?
                .or(defaults.max_entity_entries),
            coalesce_refetches: env_parse("HOLDER_CACHE_COALESCE_REFETCHES")?
                .unwrap_or(defaults.coalesce_refetches),
            enable_metrics: defaults.enable_metrics,
        };

        config.validate()?;
        Ok(config)
    }
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("{}: invalid value {:?}: {}", name, raw, e))),
        Err(_) => Ok(None),
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    page_ttl: Option<Duration>,
    ttl_jitter: Option<f64>,
    default_page_size: Option<usize>,
    fetch_concurrency: Option<usize>,
    max_entity_entries: Option<usize>,
    coalesce_refetches: Option<bool>,
    enable_metrics: Option<bool>,
}

impl CacheConfigBuilder {
    /// Set the page staleness window
    pub fn page_ttl(mut self, ttl: Duration) -> Self {
        self.page_ttl = Some(ttl);
        self
    }

    /// Set TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    pub fn default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = Some(size);
        self
    }

    /// Set the number of concurrent upstream lookups per page
    pub fn fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = Some(concurrency);
        self
    }

    /// Bound the entity cache with LRU eviction
    pub fn max_entity_entries(mut self, max: usize) -> Self {
        self.max_entity_entries = Some(max);
        self
    }

    pub fn coalesce_refetches(mut self, enable: bool) -> Self {
        self.coalesce_refetches = Some(enable);
        self
    }

    /// Enable or disable metrics collection
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = Some(enable);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            page_ttl: self.page_ttl.unwrap_or(defaults.page_ttl),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
            default_page_size: self.default_page_size.unwrap_or(defaults.default_page_size),
            fetch_concurrency: self.fetch_concurrency.unwrap_or(defaults.fetch_concurrency),
            max_entity_entries: self.max_entity_entries.or(defaults.max_entity_entries),
            coalesce_refetches: self
                .coalesce_refetches
                .unwrap_or(defaults.coalesce_refetches),
            enable_metrics: self.enable_metrics.unwrap_or(defaults.enable_metrics),
        }
    }
}
