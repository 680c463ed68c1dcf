//! Remote Semantic Mirror
//!
//! Contract for the optional semantic-search backend that fact writes are
//! mirrored to, plus normalization of the heterogeneous payload shapes such
//! backends return. Remote behavior is always best-effort: the store logs
//! failures and degrades to its local log, it never propagates them.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::models::fact::Fact;
use crate::utils::error::AppResult;
use crate::utils::text::{extract_keywords, keyword_hits};

/// A remote semantic-search backend scoped by subject id
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Backend name for logs and diagnostics
    fn name(&self) -> &'static str;

    /// Mirror one fact under a subject scope
    async fn upsert(&self, subject_id: &str, fact: &Fact) -> AppResult<()>;

    /// Search payloads, most relevant first. Shapes vary per backend; the
    /// caller normalizes through `normalize_remote_payload`.
    async fn search(
        &self,
        subject_id: &str,
        query: &str,
        category: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<Value>>;
}

/// Payload that is already fact-shaped
#[derive(Deserialize)]
struct DirectPayload {
    category: String,
    key: String,
    value: Value,
    #[serde(default)]
    metadata: Map<String, Value>,
}

/// Payload wrapping content under a metadata envelope
#[derive(Deserialize)]
struct WrappedPayload {
    content: Value,
    #[serde(default)]
    metadata: Map<String, Value>,
}

/// Normalize one remote payload to the Fact shape.
///
/// Handles fact-shaped objects, metadata-carrying wrappers, and raw string
/// payloads. Anything unparsable is kept as raw text with empty metadata
/// rather than dropped; `category_hint` scopes such payloads when the query
/// carried a category.
pub fn normalize_remote_payload(category_hint: Option<&str>, payload: Value) -> Fact {
    let fallback_category = category_hint.unwrap_or("unknown");

    if let Ok(direct) = serde_json::from_value::<DirectPayload>(payload.clone()) {
        return Fact::new(direct.category, direct.key, direct.value, direct.metadata);
    }

    if let Ok(wrapped) = serde_json::from_value::<WrappedPayload>(payload.clone()) {
        let category = wrapped
            .metadata
            .get("category")
            .and_then(Value::as_str)
            .unwrap_or(fallback_category)
            .to_string();
        let key = wrapped
            .metadata
            .get("key")
            .and_then(Value::as_str)
            .unwrap_or("raw")
            .to_string();
        return Fact::new(category, key, wrapped.content, wrapped.metadata);
    }

    match payload {
        Value::String(text) => Fact::from_raw_text(fallback_category, text),
        other => Fact::from_raw_text(fallback_category, other.to_string()),
    }
}

/// In-process keyword index implementing the semantic-mirror contract.
///
/// Used for offline runs and tests; relevance is keyword-overlap against the
/// fact's normalized text, recency breaking ties.
#[derive(Default)]
pub struct KeywordIndex {
    entries: RwLock<Vec<(String, Fact)>>,
}

impl KeywordIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SemanticIndex for KeywordIndex {
    fn name(&self) -> &'static str {
        "keyword-index"
    }

    async fn upsert(&self, subject_id: &str, fact: &Fact) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        entries.push((subject_id.to_string(), fact.clone()));
        Ok(())
    }

    async fn search(
        &self,
        subject_id: &str,
        query: &str,
        category: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<Value>> {
        let keywords = extract_keywords(query);
        let entries = self.entries.read().await;

        let mut scored: Vec<(usize, usize, &Fact)> = entries
            .iter()
            .enumerate()
            .filter(|(_, (subject, _))| subject == subject_id)
            .filter(|(_, (_, fact))| category.map_or(true, |c| fact.category == c))
            .filter_map(|(position, (_, fact))| {
                let hits = keyword_hits(&keywords, &fact.normalized_text());
                if hits > 0 {
                    Some((hits, position, fact))
                } else {
                    None
                }
            })
            .collect();

        // Best overlap first, then newest
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));

        scored
            .into_iter()
            .take(limit)
            .map(|(_, _, fact)| serde_json::to_value(fact).map_err(Into::into))
            .collect()
    }
}
