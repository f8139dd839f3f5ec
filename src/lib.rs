//! # Account Holder Cache (holder-cache)
//!
//! A read-through caching layer that pages over a fixed registry of account
//! holder identifiers, fetches each holder from a slow upstream service,
//! enriches it with its legal entity, and serves stable pages with bounded
//! staleness.
//!
//! ## Features
//!
//! - Offset pagination with validated page boundaries
//! - Page cache keyed by `(page, size)` with a 5 minute staleness window
//! - Entity cache for single lookups, filled by every fetch
//! - Enrichment failures degrade to partially populated records
//! - Upstream failures degrade to shorter pages instead of failed requests
//! - Optional refetch coalescing and LRU bound on the entity cache
//!
//! ## Paging
//!
//! ```no_run
//! use holder_cache::{AccountHolderDirectory, IdentifierRegistry};
//! use holder_cache::upstream::memory::{InMemoryAccountHolders, InMemoryLegalEntities};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = IdentifierRegistry::from_env()?;
//!     let directory = AccountHolderDirectory::new(
//!         registry,
//!         Arc::new(InMemoryAccountHolders::new()),
//!         Arc::new(InMemoryLegalEntities::new()),
//!     );
//!
//!     let page = directory.get_page(0, 10).await?;
//!     println!("{} of {} account holders", page.content.len(), page.total_elements);
//!     Ok(())
//! }
//! ```
//!
//! ## Single Lookups
//!
//! ```no_run
//! use holder_cache::{AccountHolderDirectory, CacheConfig, Error, IdentifierRegistry};
//! use holder_cache::upstream::memory::{InMemoryAccountHolders, InMemoryLegalEntities};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let directory = AccountHolderDirectory::with_config(
//!         CacheConfig::from_env()?,
//!         IdentifierRegistry::from_env()?,
//!         Arc::new(InMemoryAccountHolders::new()),
//!         Arc::new(InMemoryLegalEntities::new()),
//!     )?;
//!
//!     match directory.get_one("AH3296422322B25NPSHM827KG").await {
//!         Ok(record) => println!("{:?}", record.legal_name),
//!         Err(Error::NotFound(id)) => println!("no account holder {}", id),
//!         Err(e) => return Err(e.into()),
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod directory;
pub mod error;
pub mod fetcher;
pub mod pagination;
pub mod record;
pub mod registry;
pub mod telemetry;
pub mod upstream;

// Re-export main types for convenience
pub use cache::{CacheConfig, CacheConfigBuilder, CacheStats, EntityCache, PageCache, PageKey};
pub use directory::AccountHolderDirectory;
pub use error::{Error, Result};
pub use fetcher::EntityFetcher;
pub use pagination::{paginate, PageRequest, PageResponse, PageWindow};
pub use record::EnrichedRecord;
pub use registry::{Identifier, IdentifierRegistry};
pub use upstream::{AccountHolderService, LegalEntityService};
