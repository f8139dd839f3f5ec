//! Fetches account holders and enriches them with legal entity data
//!
//! A failed enrichment never fails the record: the primary fields are kept
//! and the enrichment fields stay empty. A failed primary lookup drops the
//! identifier from the batch it belongs to.

use crate::cache::entity::EntityCache;
use crate::error::{Error, Result};
use crate::record::EnrichedRecord;
use crate::registry::Identifier;
use crate::upstream::{AccountHolderService, LegalEntityService};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Entity fetcher over the two upstream services
pub struct EntityFetcher {
    holders: Arc<dyn AccountHolderService>,
    legal_entities: Arc<dyn LegalEntityService>,
    entity_cache: Arc<EntityCache>,
    concurrency: usize,
    upstream_failures: AtomicU64,
    enrichment_failures: AtomicU64,
}

impl EntityFetcher {
    pub fn new(
        holders: Arc<dyn AccountHolderService>,
        legal_entities: Arc<dyn LegalEntityService>,
        entity_cache: Arc<EntityCache>,
    ) -> Self {
        Self {
            holders,
            legal_entities,
            entity_cache,
            concurrency: 1,
            upstream_failures: AtomicU64::new(0),
            enrichment_failures: AtomicU64::new(0),
        }
    }

    /// Allow up to `concurrency` upstream lookups in flight in `fetch_many`
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch and enrich one account holder
    ///
    /// Returns [`Error::NotFound`] when the primary service has no such
    /// account holder and [`Error::Upstream`] when the lookup itself fails.
    /// Nothing is cached here.
    pub async fn fetch_one(&self, id: &str) -> Result<EnrichedRecord> {
        let holder = match self.holders.get_account_holder(id).await {
            Ok(Some(holder)) => holder,
            Ok(None) | Err(Error::NotFound(_)) => return Err(Error::NotFound(id.to_string())),
            Err(e) => {
                self.upstream_failures.fetch_add(1, Ordering::Relaxed);
                return Err(Error::Upstream(format!("account holder {}: {}", id, e)));
            }
        };

        let record = EnrichedRecord::from_account_holder(id, &holder);

        let Some(legal_entity_id) = holder.legal_entity_id.as_deref() else {
            return Ok(record);
        };

        match self.legal_entities.get_legal_entity(legal_entity_id).await {
            Ok(entity) => Ok(record.enriched_with(&entity)),
            Err(e) => {
                self.enrichment_failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Failed to fetch legal entity {} for account holder {}: {}",
                    legal_entity_id, id, e
                );
                Ok(record)
            }
        }
    }

    /// Fetch a batch in input order, silently dropping identifiers that are
    /// unknown or fail upstream
    ///
    /// Every record returned is also written to the entity cache.
    pub async fn fetch_many(&self, ids: &[Identifier]) -> Vec<EnrichedRecord> {
        let lookups: Vec<_> = ids
            .iter()
            .map(|id| async move { (id, self.fetch_one(id).await) })
            .collect();
        let outcomes: Vec<(&Identifier, Result<EnrichedRecord>)> = stream::iter(lookups)
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut records = Vec::with_capacity(outcomes.len());
        for (id, outcome) in outcomes {
            match outcome {
                Ok(record) => records.push(record),
                Err(Error::NotFound(_)) => warn!("Account holder {} not found upstream", id),
                Err(e) => warn!("Failed to fetch account holder {}: {}", id, e),
            }
        }

        self.entity_cache.put_many(&records).await;

        info!(
            "Fetched and cached {} of {} account holders",
            records.len(),
            ids.len()
        );
        records
    }

    /// Primary lookups that failed so far
    pub fn upstream_failures(&self) -> u64 {
        self.upstream_failures.load(Ordering::Relaxed)
    }

    /// Enrichment lookups that failed so far
    pub fn enrichment_failures(&self) -> u64 {
        self.enrichment_failures.load(Ordering::Relaxed)
    }
}
