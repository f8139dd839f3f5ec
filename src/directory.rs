//! Account holder directory: the entry point for the request layer
//!
//! Ties the registry, pagination, both caches and the fetcher together and
//! answers the two read operations plus the uncached pass-through lookups.
//! Only [`Error::InvalidRequest`] and [`Error::NotFound`] are meant to be
//! distinguishable by callers; anything else maps to a server error.

use crate::cache::{
    config::CacheConfig, entity::EntityCache, page::PageCache, types::CacheStats,
};
use crate::error::{Error, Result};
use crate::fetcher::EntityFetcher;
use crate::pagination::{paginate, PageRequest, PageResponse};
use crate::record::EnrichedRecord;
use crate::registry::IdentifierRegistry;
use crate::upstream::{AccountHolderService, LegalEntity, LegalEntityService, PaymentInstrumentPage};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Read-through directory of enriched account holders
pub struct AccountHolderDirectory {
    config: CacheConfig,
    registry: Arc<IdentifierRegistry>,
    holders: Arc<dyn AccountHolderService>,
    legal_entities: Arc<dyn LegalEntityService>,
    fetcher: Arc<EntityFetcher>,
    entity_cache: Arc<EntityCache>,
    page_cache: PageCache,
}

impl AccountHolderDirectory {
    /// Create a directory with default cache configuration
    pub fn new(
        registry: IdentifierRegistry,
        holders: Arc<dyn AccountHolderService>,
        legal_entities: Arc<dyn LegalEntityService>,
    ) -> Self {
        Self::build(CacheConfig::default(), registry, holders, legal_entities)
    }

    /// Create a directory with a validated cache configuration
    pub fn with_config(
        config: CacheConfig,
        registry: IdentifierRegistry,
        holders: Arc<dyn AccountHolderService>,
        legal_entities: Arc<dyn LegalEntityService>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, registry, holders, legal_entities))
    }

    fn build(
        config: CacheConfig,
        registry: IdentifierRegistry,
        holders: Arc<dyn AccountHolderService>,
        legal_entities: Arc<dyn LegalEntityService>,
    ) -> Self {
        info!(
            "Initializing account holder directory over {} identifiers with config: {:?}",
            registry.size(),
            config
        );

        let registry = Arc::new(registry);
        let entity_cache = Arc::new(EntityCache::new(&config));
        let fetcher = Arc::new(
            EntityFetcher::new(holders.clone(), legal_entities.clone(), entity_cache.clone())
                .with_concurrency(config.fetch_concurrency),
        );
        let page_cache = PageCache::new(
            config.clone(),
            registry.clone(),
            fetcher.clone(),
            entity_cache.clone(),
        );

        Self {
            config,
            registry,
            holders,
            legal_entities,
            fetcher,
            entity_cache,
            page_cache,
        }
    }

    /// Page `page` of `size` enriched account holders
    ///
    /// Invalid paging parameters fail with [`Error::InvalidRequest`] before
    /// any cache is touched. The content may be shorter than the window when
    /// upstream lookups failed.
    pub async fn get_page(&self, page: i64, size: i64) -> Result<PageResponse> {
        let window = paginate(page, size, self.registry.size())?;

        let content = self.page_cache.get_page(&window).await.map_err(|e| {
            error!("Error fetching account holders page {} (size {}): {}", page, size, e);
            Error::Internal(e.to_string())
        })?;

        info!(
            "Returned page {} of {} (size: {}, total: {})",
            window.page,
            window.total_pages,
            content.len(),
            window.total_elements
        );
        Ok(PageResponse::new(&window, content))
    }

    /// Page request with defaults for missing parameters
    pub async fn get_page_request(&self, request: &PageRequest) -> Result<PageResponse> {
        let (page, size) = request.resolve(self.config.default_page_size);
        self.get_page(page, size).await
    }

    /// One enriched account holder
    ///
    /// Served from the entity cache when present. Otherwise fetched directly,
    /// bypassing the page cache, and stored on success. Any fetch failure is
    /// reported as [`Error::NotFound`].
    pub async fn get_one(&self, id: &str) -> Result<EnrichedRecord> {
        if let Some(record) = self.entity_cache.get(id).await {
            info!("Returning cached account holder: {}", id);
            return Ok(record);
        }

        info!("Fetching account holder from upstream: {}", id);
        match self.fetcher.fetch_one(id).await {
            Ok(record) => {
                self.entity_cache.put(id.to_string(), record.clone()).await;
                Ok(record)
            }
            Err(Error::NotFound(_)) => Err(Error::NotFound(id.to_string())),
            Err(e) => {
                warn!("Failed to fetch account holder {}: {}", id, e);
                Err(Error::NotFound(id.to_string()))
            }
        }
    }

    /// Legal entity straight from the enrichment service, uncached
    pub async fn get_legal_entity(&self, id: &str) -> Result<LegalEntity> {
        self.legal_entities.get_legal_entity(id).await.map_err(|e| {
            error!("Error fetching legal entity {}: {}", id, e);
            Error::Internal(e.to_string())
        })
    }

    /// Payment instruments of a balance account, uncached
    pub async fn get_payment_instruments(&self, balance_account_id: &str) -> Result<PaymentInstrumentPage> {
        self.holders
            .get_payment_instruments(balance_account_id)
            .await
            .map_err(|e| {
                error!(
                    "Error fetching payment instruments for balance account {}: {}",
                    balance_account_id, e
                );
                Error::Internal(e.to_string())
            })
    }

    /// Snapshot of cache statistics
    pub async fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        self.page_cache.record_stats(&mut stats).await;
        self.entity_cache.record_stats(&mut stats).await;
        stats.upstream_failures = self.fetcher.upstream_failures();
        stats.enrichment_failures = self.fetcher.enrichment_failures();
        stats
    }

    pub fn registry(&self) -> &IdentifierRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn page_cache(&self) -> &PageCache {
        &self.page_cache
    }

    pub fn entity_cache(&self) -> &EntityCache {
        &self.entity_cache
    }
}
