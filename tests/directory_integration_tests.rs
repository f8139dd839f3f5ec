//! Integration tests for the account holder directory
//!
//! These tests drive the directory over in-memory upstream services and
//! verify:
//! - Page boundaries and validation
//! - Page cache hits within the staleness window
//! - Refetch after expiry
//! - Entity cache reuse by single lookups
//! - Degraded results on upstream and enrichment failures
//! - Concurrent access

use holder_cache::cache::{CacheConfig, PageKey};
use holder_cache::upstream::memory::{InMemoryAccountHolders, InMemoryLegalEntities};
use holder_cache::upstream::{
    AccountHolder, AccountHolderStatus, Address, Individual, LegalEntity, LegalEntityType, Name,
};
use holder_cache::{AccountHolderDirectory, Error, IdentifierRegistry};
use std::sync::Arc;
use std::time::Duration;

struct Upstreams {
    holders: Arc<InMemoryAccountHolders>,
    legal_entities: Arc<InMemoryLegalEntities>,
}

fn holder(id: &str, status: AccountHolderStatus) -> AccountHolder {
    AccountHolder {
        id: Some(id.to_string()),
        reference: Some(format!("ref-{}", id)),
        description: Some(format!("Account holder {}", id)),
        status: Some(status),
        legal_entity_id: Some(format!("LE-{}", id)),
    }
}

fn person(id: &str, first: &str, last: &str, country: &str) -> LegalEntity {
    LegalEntity {
        id: id.to_string(),
        entity_type: Some(LegalEntityType::Individual),
        individual: Some(Individual {
            name: Name {
                first_name: first.to_string(),
                last_name: last.to_string(),
            },
            residential_address: Some(Address::in_country(country)),
        }),
        ..Default::default()
    }
}

async fn upstreams(ids: &[&str], latency: Option<Duration>) -> Upstreams {
    let holders = match latency {
        Some(latency) => InMemoryAccountHolders::new().with_latency(latency),
        None => InMemoryAccountHolders::new(),
    };
    let holders = Arc::new(holders);
    let legal_entities = Arc::new(InMemoryLegalEntities::new());

    for id in ids {
        holders.insert(*id, holder(id, AccountHolderStatus::Active)).await;
        legal_entities
            .insert(person(&format!("LE-{}", id), "Owner", id, "NL"))
            .await;
    }

    Upstreams {
        holders,
        legal_entities,
    }
}

fn directory(ids: &[&str], upstreams: &Upstreams, config: CacheConfig) -> AccountHolderDirectory {
    AccountHolderDirectory::with_config(
        config,
        IdentifierRegistry::new(ids.iter().copied()).unwrap(),
        upstreams.holders.clone(),
        upstreams.legal_entities.clone(),
    )
    .unwrap()
}

fn content_ids(page: &holder_cache::PageResponse) -> Vec<&str> {
    page.content.iter().map(|r| r.id.as_str()).collect()
}

#[tokio::test]
async fn test_three_identifiers_page_size_two() {
    let ids = ["A", "B", "C"];
    let up = upstreams(&ids, None).await;
    let directory = directory(&ids, &up, CacheConfig::default());

    let first = directory.get_page(0, 2).await.unwrap();
    assert_eq!(content_ids(&first), vec!["A", "B"]);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.total_elements, 3);
    assert!(first.first);
    assert!(!first.last);

    let second = directory.get_page(1, 2).await.unwrap();
    assert_eq!(content_ids(&second), vec!["C"]);
    assert!(!second.first);
    assert!(second.last);

    tokio_test::assert_err!(directory.get_page(-1, 2).await);
    let err = directory.get_page(2, 2).await.unwrap_err();
    assert!(matches!(err, Error::InvalidRequest { .. }));
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_records_are_enriched() {
    let ids = ["A"];
    let up = upstreams(&ids, None).await;
    let directory = directory(&ids, &up, CacheConfig::default());

    let page = directory.get_page(0, 10).await.unwrap();
    let record = &page.content[0];
    assert_eq!(record.account_holder_id.as_deref(), Some("A"));
    assert_eq!(record.reference.as_deref(), Some("ref-A"));
    assert_eq!(record.status.as_deref(), Some("active"));
    assert_eq!(record.legal_entity_id.as_deref(), Some("LE-A"));
    assert_eq!(record.legal_name.as_deref(), Some("Owner A"));
    assert_eq!(record.entity_type.as_deref(), Some("individual"));
    assert_eq!(record.country.as_deref(), Some("NL"));
}

#[tokio::test]
async fn test_repeated_page_within_ttl_is_served_from_cache() {
    let ids = ["A", "B", "C", "D"];
    let up = upstreams(&ids, None).await;
    let directory = directory(&ids, &up, CacheConfig::default());

    let first = directory.get_page(1, 2).await.unwrap();
    let calls = up.holders.calls();
    let second = directory.get_page(1, 2).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(up.holders.calls(), calls);
    assert_eq!(calls, 2);

    let stats = directory.stats().await;
    assert_eq!(stats.page_hits, 1);
    assert_eq!(stats.page_refetches, 1);
}

#[tokio::test]
async fn test_page_refetched_after_ttl() {
    let ids = ["A", "B", "C"];
    let up = upstreams(&ids, None).await;
    let config = CacheConfig::builder()
        .page_ttl(Duration::from_millis(100))
        .ttl_jitter(0.0) // No jitter for predictable tests
        .build();
    let directory = directory(&ids, &up, config);

    directory.get_page(0, 2).await.unwrap();
    let fetched_at = directory.page_cache().fetched_at(PageKey::new(0, 2)).await.unwrap();
    assert_eq!(up.holders.calls(), 2);

    // Wait for expiration
    tokio::time::sleep(Duration::from_millis(150)).await;

    directory.get_page(0, 2).await.unwrap();
    assert_eq!(up.holders.calls(), 4);

    let refetched_at = directory.page_cache().fetched_at(PageKey::new(0, 2)).await.unwrap();
    assert!(refetched_at > fetched_at);
    assert_eq!(directory.stats().await.page_refetches, 2);
}

#[tokio::test]
async fn test_get_one_reuses_page_fetch() {
    let ids = ["A", "B", "C"];
    let up = upstreams(&ids, None).await;
    let directory = directory(&ids, &up, CacheConfig::default());

    let page = directory.get_page(0, 3).await.unwrap();
    let holder_calls = up.holders.calls();
    let entity_calls = up.legal_entities.calls();

    let record = directory.get_one("C").await.unwrap();
    assert_eq!(record, page.content[2]);
    assert_eq!(up.holders.calls(), holder_calls);
    assert_eq!(up.legal_entities.calls(), entity_calls);
}

#[tokio::test]
async fn test_get_one_bypasses_page_cache() {
    let ids = ["A", "B"];
    let up = upstreams(&ids, None).await;
    let directory = directory(&ids, &up, CacheConfig::default());

    let record = directory.get_one("B").await.unwrap();
    assert_eq!(record.id, "B");
    assert!(directory.page_cache().is_empty().await);

    // Second lookup comes from the entity cache
    directory.get_one("B").await.unwrap();
    assert_eq!(up.holders.calls(), 1);
}

#[tokio::test]
async fn test_get_one_not_found_is_not_cached() {
    let ids = ["A"];
    let up = upstreams(&ids, None).await;
    let directory = directory(&ids, &up, CacheConfig::default());

    assert_eq!(
        directory.get_one("nope").await.unwrap_err(),
        Error::NotFound("nope".to_string())
    );
    assert_eq!(
        directory.get_one("nope").await.unwrap_err(),
        Error::NotFound("nope".to_string())
    );
    assert_eq!(up.holders.calls(), 2);
}

#[tokio::test]
async fn test_enrichment_failure_keeps_record() {
    let ids = ["A", "B"];
    let up = upstreams(&ids, None).await;
    up.legal_entities.fail_on("LE-B").await;
    let directory = directory(&ids, &up, CacheConfig::default());

    let page = directory.get_page(0, 2).await.unwrap();
    assert_eq!(content_ids(&page), vec!["A", "B"]);

    let degraded = &page.content[1];
    assert_eq!(degraded.reference.as_deref(), Some("ref-B"));
    assert_eq!(degraded.status.as_deref(), Some("active"));
    assert_eq!(degraded.legal_entity_id, None);
    assert_eq!(degraded.legal_name, None);
    assert_eq!(degraded.country, None);

    // Cached as is
    assert_eq!(directory.get_one("B").await.unwrap(), *degraded);
    assert_eq!(directory.stats().await.enrichment_failures, 1);
}

#[tokio::test]
async fn test_upstream_failure_shrinks_page() {
    let ids = ["A", "B", "C"];
    let up = upstreams(&ids, None).await;
    up.holders.fail_on("B").await;
    let directory = directory(&ids, &up, CacheConfig::default());

    let page = directory.get_page(0, 3).await.unwrap();
    assert_eq!(content_ids(&page), vec!["A", "C"]);
    assert_eq!(page.total_elements, 3);
    assert_eq!(page.size, 3);
    assert!(!directory.entity_cache().contains("B").await);

    // The cached page stays short until it expires
    up.holders.recover("B").await;
    let page = directory.get_page(0, 3).await.unwrap();
    assert_eq!(content_ids(&page), vec!["A", "C"]);

    // A single lookup goes upstream again
    assert_eq!(directory.get_one("B").await.unwrap().id, "B");
    assert_eq!(directory.stats().await.upstream_failures, 1);
}

#[tokio::test]
async fn test_empty_registry() {
    let up = upstreams(&[], None).await;
    let directory = directory(&[], &up, CacheConfig::default());

    for page in [0, 1, 42] {
        let response = directory.get_page(page, 10).await.unwrap();
        assert!(response.content.is_empty());
        assert_eq!(response.total_elements, 0);
        assert_eq!(response.total_pages, 0);
        assert!(response.last);
        assert_eq!(response.first, page == 0);
    }

    assert!(directory.get_page(-1, 10).await.is_err());
    assert_eq!(up.holders.calls(), 0);
}

#[tokio::test]
async fn test_page_and_entity_caches_may_disagree() {
    let ids = ["A", "B", "C"];
    let up = upstreams(&ids, None).await;
    let directory = directory(&ids, &up, CacheConfig::default());

    let before = directory.get_page(0, 2).await.unwrap();
    assert_eq!(before.content[1].status.as_deref(), Some("active"));

    // B changes upstream and is refetched through a different page size
    up.holders.insert("B", holder("B", AccountHolderStatus::Closed)).await;
    directory.get_page(0, 3).await.unwrap();

    let single = directory.get_one("B").await.unwrap();
    assert_eq!(single.status.as_deref(), Some("closed"));

    // The (0, 2) entry keeps its own copy until it expires
    let cached = directory.get_page(0, 2).await.unwrap();
    assert_eq!(cached.content[1].status.as_deref(), Some("active"));
}

#[tokio::test]
async fn test_bounded_entity_cache_trims_cached_pages() {
    let ids = ["A", "B", "C", "D"];
    let up = upstreams(&ids, None).await;
    let config = CacheConfig::builder().max_entity_entries(2).build();
    let directory = directory(&ids, &up, config);

    directory.get_page(0, 2).await.unwrap();
    directory.get_page(1, 2).await.unwrap();

    // A and B were evicted by C and D
    let page = directory.get_page(0, 2).await.unwrap();
    assert!(page.content.is_empty());
    assert_eq!(directory.stats().await.entity_evictions, 2);
}

#[tokio::test]
async fn test_page_response_json() {
    let ids = ["A", "B", "C"];
    let up = upstreams(&ids, None).await;
    let directory = directory(&ids, &up, CacheConfig::default());

    let json = directory.get_page(1, 2).await.unwrap().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["page"], 1);
    assert_eq!(value["size"], 2);
    assert_eq!(value["totalElements"], 3);
    assert_eq!(value["totalPages"], 2);
    assert_eq!(value["first"], false);
    assert_eq!(value["last"], true);
    assert_eq!(value["content"][0]["id"], "C");
    assert_eq!(value["content"][0]["legalName"], "Owner C");
}

#[tokio::test]
async fn test_concurrent_page_access() {
    let ids: Vec<String> = (0..20).map(|i| format!("AH{:02}", i)).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let up = upstreams(&id_refs, None).await;
    let directory = Arc::new(directory(&id_refs, &up, CacheConfig::default()));

    let mut handles = vec![];
    for i in 0..10 {
        let directory = directory.clone();
        handles.push(tokio::spawn(async move {
            let page = directory.get_page(i % 4, 5).await.unwrap();
            assert_eq!(page.content.len(), 5);
            for record in &page.content {
                let single = directory.get_one(&record.id).await.unwrap();
                assert_eq!(single.id, record.id);
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let stats = directory.stats().await;
    assert_eq!(stats.page_entries, 4);
    assert_eq!(stats.entity_entries, 20);
}

#[tokio::test]
async fn test_coalesced_refetch_fetches_once() {
    let ids = ["A", "B", "C"];
    let up = upstreams(&ids, Some(Duration::from_millis(20))).await;
    let config = CacheConfig::builder().coalesce_refetches(true).build();
    let directory = directory(&ids, &up, config);

    let results = futures::future::join_all((0..5).map(|_| directory.get_page(0, 3))).await;
    for result in &results {
        assert_eq!(result.as_ref().unwrap().content.len(), 3);
    }

    assert_eq!(up.holders.calls(), 3);
    assert_eq!(directory.stats().await.page_refetches, 1);
}

#[tokio::test]
async fn test_concurrent_fetch_preserves_order() {
    let ids = ["A", "B", "C", "D", "E"];
    let up = upstreams(&ids, Some(Duration::from_millis(5))).await;
    let config = CacheConfig::builder().fetch_concurrency(5).build();
    let directory = directory(&ids, &up, config);

    let page = directory.get_page(0, 5).await.unwrap();
    assert_eq!(content_ids(&page), vec!["A", "B", "C", "D", "E"]);
}
