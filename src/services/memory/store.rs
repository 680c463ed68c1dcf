//! Fact Store
//!
//! Append-only fact log shared across one assessment run, with an optional
//! remote semantic mirror. Writes always land locally first; mirroring is
//! best-effort. Retrieval prefers the remote index and falls back to a
//! keyword scan of the local log, so a pipeline step never observes "no
//! data" purely because remote indexing lags a write made moments earlier.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::fact::Fact;
use crate::services::memory::remote::{normalize_remote_payload, SemanticIndex};
use crate::utils::text::{extract_keywords, keyword_hits};

/// Retrieval result cap
pub const RETRIEVE_LIMIT: usize = 5;

// ============================================================================
// FactStore
// ============================================================================

/// Run-scoped fact store: local append-only log plus optional remote mirror
pub struct FactStore {
    subject_id: String,
    log: RwLock<Vec<Fact>>,
    remote: Option<Arc<dyn SemanticIndex>>,
}

impl FactStore {
    /// Create a local-only store for one assessment subject
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            log: RwLock::new(Vec::new()),
            remote: None,
        }
    }

    /// Create a store that mirrors writes to a remote semantic index
    pub fn with_remote(subject_id: impl Into<String>, remote: Arc<dyn SemanticIndex>) -> Self {
        Self {
            subject_id: subject_id.into(),
            log: RwLock::new(Vec::new()),
            remote: Some(remote),
        }
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    // ========================================================================
    // Write Operations
    // ========================================================================

    /// Append a fact to the local log, then mirror it best-effort.
    ///
    /// The local append is unconditional; a mirroring failure is logged and
    /// swallowed so a flaky remote can never fail a pipeline step.
    pub async fn store(
        &self,
        category: impl Into<String>,
        key: impl Into<String>,
        value: Value,
        metadata: Map<String, Value>,
    ) -> Fact {
        let fact = Fact::new(category, key, value, metadata);

        {
            let mut log = self.log.write().await;
            log.push(fact.clone());
        }

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.upsert(&self.subject_id, &fact).await {
                warn!(
                    backend = remote.name(),
                    category = %fact.category,
                    "Remote mirror write failed, fact kept locally: {}",
                    e
                );
            }
        }

        fact
    }

    /// Append a free-text observation under a category
    pub async fn store_text(&self, category: &str, text: impl Into<String>) -> Fact {
        let fact = Fact::from_raw_text(category, text);

        {
            let mut log = self.log.write().await;
            log.push(fact.clone());
        }

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.upsert(&self.subject_id, &fact).await {
                warn!(
                    backend = remote.name(),
                    category = %fact.category,
                    "Remote mirror write failed, fact kept locally: {}",
                    e
                );
            }
        }

        fact
    }

    // ========================================================================
    // Read Operations
    // ========================================================================

    /// Retrieve facts relevant to a query, most recent first, capped at
    /// [`RETRIEVE_LIMIT`].
    ///
    /// Remote index first when configured; an erroring or empty remote
    /// response falls back to the local keyword scan. When `category` is
    /// supplied no returned fact may carry a different category, whichever
    /// path served the result.
    pub async fn retrieve(&self, query: &str, category: Option<&str>) -> Vec<Fact> {
        if let Some(remote) = &self.remote {
            match remote
                .search(&self.subject_id, query, category, RETRIEVE_LIMIT)
                .await
            {
                Ok(payloads) if !payloads.is_empty() => {
                    let facts: Vec<Fact> = payloads
                        .into_iter()
                        .map(|p| normalize_remote_payload(category, p))
                        .filter(|f| category.map_or(true, |c| f.category == c))
                        .take(RETRIEVE_LIMIT)
                        .collect();
                    if !facts.is_empty() {
                        debug!(
                            backend = remote.name(),
                            count = facts.len(),
                            "Retrieved facts from remote index"
                        );
                        return facts;
                    }
                }
                Ok(_) => {
                    debug!(
                        backend = remote.name(),
                        "Remote index returned no results, scanning local log"
                    );
                }
                Err(e) => {
                    warn!(
                        backend = remote.name(),
                        "Remote retrieval failed, scanning local log: {}",
                        e
                    );
                }
            }
        }

        self.scan_local(query, category).await
    }

    /// Most recent fact in a category, optionally pinned to one key
    pub async fn latest(&self, category: &str, key: Option<&str>) -> Option<Fact> {
        let log = self.log.read().await;
        log.iter()
            .rev()
            .find(|f| f.category == category && key.map_or(true, |k| f.key == k))
            .cloned()
    }

    /// Every fact written this run, in write order
    pub async fn all_facts(&self) -> Vec<Fact> {
        self.log.read().await.clone()
    }

    /// Number of facts written this run
    pub async fn len(&self) -> usize {
        self.log.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.log.read().await.is_empty()
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    /// Keyword scan over the local log, newest first.
    ///
    /// An empty query matches every fact in the category, so callers pulling
    /// "whatever this category holds" still get the most recent entries.
    async fn scan_local(&self, query: &str, category: Option<&str>) -> Vec<Fact> {
        let keywords = extract_keywords(query);
        let query_lower = query.trim().to_lowercase();
        let log = self.log.read().await;

        log.iter()
            .rev()
            .filter(|f| category.map_or(true, |c| f.category == c))
            .filter(|f| {
                if query_lower.is_empty() {
                    return true;
                }
                let text = f.normalized_text();
                text.contains(&query_lower) || keyword_hits(&keywords, &text) > 0
            })
            .take(RETRIEVE_LIMIT)
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for FactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactStore")
            .field("subject_id", &self.subject_id)
            .field("remote", &self.remote.as_ref().map(|r| r.name()))
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
