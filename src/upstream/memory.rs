//! In-memory upstream services
//!
//! Seedable stand-ins for the remote services with failure injection,
//! optional latency and call counters. Useful for offline runs and for
//! exercising the caches without a network.

use super::{AccountHolder, AccountHolderService, LegalEntity, LegalEntityService, PaymentInstrumentPage};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Account holder service backed by a map
#[derive(Debug, Default)]
pub struct InMemoryAccountHolders {
    holders: RwLock<HashMap<String, AccountHolder>>,
    instruments: RwLock<HashMap<String, PaymentInstrumentPage>>,
    failing: RwLock<HashSet<String>>,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl InMemoryAccountHolders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Add or replace an account holder, keyed by its `id`
    pub async fn insert(&self, id: impl Into<String>, holder: AccountHolder) {
        self.holders.write().await.insert(id.into(), holder);
    }

    pub async fn remove(&self, id: &str) -> Option<AccountHolder> {
        self.holders.write().await.remove(id)
    }

    pub async fn insert_instruments(&self, balance_account_id: impl Into<String>, page: PaymentInstrumentPage) {
        self.instruments
            .write()
            .await
            .insert(balance_account_id.into(), page);
    }

    /// Make lookups of `id` fail with an upstream error
    pub async fn fail_on(&self, id: impl Into<String>) {
        self.failing.write().await.insert(id.into());
    }

    pub async fn recover(&self, id: &str) {
        self.failing.write().await.remove(id);
    }

    /// Number of `get_account_holder` calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl AccountHolderService for InMemoryAccountHolders {
    async fn get_account_holder(&self, id: &str) -> Result<Option<AccountHolder>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        if self.failing.read().await.contains(id) {
            return Err(Error::Upstream(format!("account holder service unavailable for {}", id)));
        }

        Ok(self.holders.read().await.get(id).cloned())
    }

    async fn get_payment_instruments(&self, balance_account_id: &str) -> Result<PaymentInstrumentPage> {
        self.delay().await;

        if self.failing.read().await.contains(balance_account_id) {
            return Err(Error::Upstream(format!(
                "balance account service unavailable for {}",
                balance_account_id
            )));
        }

        self.instruments
            .read()
            .await
            .get(balance_account_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(balance_account_id.to_string()))
    }
}

/// Legal entity service backed by a map
#[derive(Debug, Default)]
pub struct InMemoryLegalEntities {
    entities: RwLock<HashMap<String, LegalEntity>>,
    failing: RwLock<HashSet<String>>,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl InMemoryLegalEntities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Add or replace a legal entity, keyed by its `id`
    pub async fn insert(&self, entity: LegalEntity) {
        self.entities.write().await.insert(entity.id.clone(), entity);
    }

    pub async fn fail_on(&self, id: impl Into<String>) {
        self.failing.write().await.insert(id.into());
    }

    pub async fn recover(&self, id: &str) {
        self.failing.write().await.remove(id);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LegalEntityService for InMemoryLegalEntities {
    async fn get_legal_entity(&self, id: &str) -> Result<LegalEntity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.read().await.contains(id) {
            return Err(Error::Upstream(format!("legal entity service unavailable for {}", id)));
        }

        self.entities
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}
