//! # Page and Entity Caches
//!
//! Two independent in-memory caches sit in front of the upstream services:
//!
//! - **Page cache**: `(page, size)` -> ordered records plus fetch time.
//!   Entries older than the staleness window (5 minutes by default) are
//!   refetched in one batch and replaced wholesale.
//! - **Entity cache**: identifier -> last successfully enriched record, with
//!   no TTL. Every fetch writes to it, including page refetches.
//!
//! The two are not kept in sync. A record refreshed through a single lookup
//! may differ from the copy held by a cached page until that page expires.
//!
//! ## Example
//!
//! ```rust
//! use holder_cache::cache::CacheConfig;
//! use std::time::Duration;
//!
//! let config = CacheConfig::builder()
//!     .page_ttl(Duration::from_secs(300))
//!     .fetch_concurrency(4)
//!     .max_entity_entries(10_000)
//!     .build();
//!
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod entity;
pub mod entry;
pub mod page;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder, DEFAULT_PAGE_TTL};
pub use entity::EntityCache;
pub use entry::PageCacheEntry;
pub use page::PageCache;
pub use types::{CacheStats, PageKey};
