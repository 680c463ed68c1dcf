//! Fact Store Integration Tests
//!
//! The shared store exercised the way the pipeline uses it: page facts and
//! extraction facts written across phases, retrieval through the remote
//! mirror, and degradation when the mirror misbehaves. Mirror doubles here
//! implement the public `SemanticIndex` contract from outside the crate.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use covenant::models::fact::categories;
use covenant::services::memory::{KeywordIndex, SemanticIndex, RETRIEVE_LIMIT};
use covenant::{AppError, AppResult, Fact, FactStore};

// ============================================================================
// Mirror doubles
// ============================================================================

/// Mirror that rejects every write but answers searches with nothing
struct WriteRejectingMirror;

#[async_trait]
impl SemanticIndex for WriteRejectingMirror {
    fn name(&self) -> &'static str {
        "write-rejecting"
    }

    async fn upsert(&self, _subject_id: &str, _fact: &Fact) -> AppResult<()> {
        Err(AppError::memory("mirror rejected the write"))
    }

    async fn search(
        &self,
        _subject_id: &str,
        _query: &str,
        _category: Option<&str>,
        _limit: usize,
    ) -> AppResult<Vec<Value>> {
        Ok(Vec::new())
    }
}

/// Mirror that ignores the limit and floods the caller with payloads
struct OverflowingMirror;

#[async_trait]
impl SemanticIndex for OverflowingMirror {
    fn name(&self) -> &'static str {
        "overflowing"
    }

    async fn upsert(&self, _subject_id: &str, _fact: &Fact) -> AppResult<()> {
        Ok(())
    }

    async fn search(
        &self,
        _subject_id: &str,
        _query: &str,
        _category: Option<&str>,
        _limit: usize,
    ) -> AppResult<Vec<Value>> {
        let payloads = (0..20)
            .map(|i| {
                json!({
                    "category": "document",
                    "key": format!("plan:p{}", i + 1),
                    "value": format!("page {} text", i + 1)
                })
            })
            .collect();
        Ok(payloads)
    }
}

/// Mirror that answers with envelope-wrapped payloads, the shape hosted
/// vector backends typically return
struct EnvelopeMirror;

#[async_trait]
impl SemanticIndex for EnvelopeMirror {
    fn name(&self) -> &'static str {
        "envelope"
    }

    async fn upsert(&self, _subject_id: &str, _fact: &Fact) -> AppResult<()> {
        Ok(())
    }

    async fn search(
        &self,
        _subject_id: &str,
        _query: &str,
        _category: Option<&str>,
        _limit: usize,
    ) -> AppResult<Vec<Value>> {
        Ok(vec![json!({
            "content": {"green_share": 0.55, "total_commitment_eur": 120000000},
            "metadata": {"category": "capex", "key": "alignment"}
        })])
    }
}

// ============================================================================
// Pipeline-shaped usage
// ============================================================================

#[tokio::test]
async fn test_phase_writes_stay_isolated_by_category() {
    let store = FactStore::new("acme-industrial");

    store
        .store(
            categories::DOCUMENT,
            "plan:p1",
            json!("Emissions reduction plan, page one."),
            Map::new(),
        )
        .await;
    store
        .store(
            categories::TARGET,
            "kpis",
            json!({"target_value_pct": 40, "target_year": 2030}),
            Map::new(),
        )
        .await;
    store
        .store(
            categories::GOVERNANCE,
            "profile",
            json!({"board_oversight": true}),
            Map::new(),
        )
        .await;

    let targets = store.retrieve("reduction target", Some(categories::TARGET)).await;
    assert_eq!(targets.len(), 1);
    assert!(targets.iter().all(|f| f.category == categories::TARGET));

    let documents = store.retrieve("emissions plan", Some(categories::DOCUMENT)).await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].key, "plan:p1");
}

#[tokio::test]
async fn test_concurrent_writers_all_land() {
    // Phase 4 fans out section drafts that write back concurrently
    let store = Arc::new(FactStore::new("acme-industrial"));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .store(
                        categories::NARRATIVE,
                        "sections",
                        json!({"section_id": format!("section_{}", i)}),
                        Map::new(),
                    )
                    .await;
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.len().await, 6);
    let all = store.all_facts().await;
    assert!(all.iter().all(|f| f.category == categories::NARRATIVE));
}

#[tokio::test]
async fn test_latest_reflects_append_only_rewrites() {
    let store = FactStore::new("acme-industrial");
    store
        .store(categories::TARGET, "kpis", json!({"target_value_pct": 30}), Map::new())
        .await;
    store
        .store(categories::TARGET, "kpis", json!({"target_value_pct": 45}), Map::new())
        .await;

    // Newest wins for readers, but both writes stay in the log
    let latest = store.latest(categories::TARGET, Some("kpis")).await.unwrap();
    assert_eq!(latest.value["target_value_pct"], json!(45));
    assert_eq!(store.all_facts().await.len(), 2);
}

// ============================================================================
// Mirror behavior
// ============================================================================

#[tokio::test]
async fn test_rejected_mirror_writes_never_surface() {
    let store = FactStore::with_remote("acme-industrial", Arc::new(WriteRejectingMirror));

    // store() must succeed and the local log must serve retrieval
    let fact = store
        .store(
            categories::VERIFICATION,
            "status",
            json!({"assured": true, "assurer": "Big Four LLP"}),
            Map::new(),
        )
        .await;
    assert_eq!(fact.category, categories::VERIFICATION);

    let found = store.retrieve("assured", Some(categories::VERIFICATION)).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].value["assurer"], json!("Big Four LLP"));
}

#[tokio::test]
async fn test_overflowing_mirror_capped_at_retrieve_limit() {
    let store = FactStore::with_remote("acme-industrial", Arc::new(OverflowingMirror));

    let facts = store.retrieve("page", Some(categories::DOCUMENT)).await;
    assert_eq!(facts.len(), RETRIEVE_LIMIT);
    assert!(facts.iter().all(|f| f.category == categories::DOCUMENT));
}

#[tokio::test]
async fn test_envelope_payloads_normalized_to_facts() {
    let store = FactStore::with_remote("acme-industrial", Arc::new(EnvelopeMirror));

    let facts = store.retrieve("capital alignment", Some(categories::CAPEX)).await;
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].category, categories::CAPEX);
    assert_eq!(facts[0].key, "alignment");
    assert_eq!(facts[0].value["green_share"], json!(0.55));
}

#[tokio::test]
async fn test_keyword_mirror_round_trip() {
    let store = FactStore::with_remote("acme-industrial", Arc::new(KeywordIndex::new()));

    store
        .store(
            categories::ACHIEVABILITY,
            "assessment",
            json!({"rating": "plausible", "key_risks": ["grid decarbonization pace"]}),
            Map::new(),
        )
        .await;
    store
        .store(
            categories::GOVERNANCE,
            "profile",
            json!({"board_oversight": true}),
            Map::new(),
        )
        .await;

    // Served by the mirror, filtered to the requested category
    let facts = store
        .retrieve("achievability risks", Some(categories::ACHIEVABILITY))
        .await;
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].value["rating"], json!("plausible"));
}
