//! Agent Context Assembly
//!
//! Renders stored facts (and optional document excerpts) into the bounded
//! context block an agent sends with its task. Oversized values are
//! truncated deterministically; an oversized block is cut at a fixed
//! character budget rather than failing the call.

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::models::fact::Fact;
use crate::services::memory::FactStore;
use crate::utils::error::AppResult;
use crate::utils::text::truncate_chars;

/// Whole-block character budget
pub const MAX_CONTEXT_CHARS: usize = 12_000;
/// Per-value character budget
pub const MAX_FACT_VALUE_CHARS: usize = 1_200;
/// Document excerpts requested per task
pub const SNIPPET_LIMIT: usize = 5;

/// A content snippet with its similarity score
#[derive(Debug, Clone)]
pub struct ScoredSnippet {
    pub document_id: String,
    pub text: String,
    pub score: f32,
}

/// Similarity-search collaborator used to narrow document content before an
/// agent builds its context. A narrowing filter only; when it fails the
/// agent proceeds on stored facts alone.
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        document_id: Option<&str>,
        limit: usize,
    ) -> AppResult<Vec<ScoredSnippet>>;
}

/// Human-readable rendering of a fact value
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render one category's facts as list lines
fn render_fact_lines(facts: &[Fact]) -> String {
    facts
        .iter()
        .map(|f| {
            format!(
                "- {}: {}",
                f.key,
                truncate_chars(&value_text(&f.value), MAX_FACT_VALUE_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the full context block for a task.
///
/// Pulls the most recent facts per requested category, prepends narrowed
/// document excerpts when a similarity collaborator is supplied, and caps
/// the result at [`MAX_CONTEXT_CHARS`]. Categories with no facts render an
/// explicit marker so the model can tell "absent" from "omitted".
pub async fn assemble_context(
    store: &FactStore,
    categories: &[String],
    task_query: &str,
    similarity: Option<&dyn SimilaritySearch>,
    document_id: Option<&str>,
) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(similarity) = similarity {
        match similarity.search(task_query, document_id, SNIPPET_LIMIT).await {
            Ok(snippets) if !snippets.is_empty() => {
                let lines = snippets
                    .iter()
                    .map(|s| {
                        format!(
                            "- [{:.2}] {}",
                            s.score,
                            truncate_chars(&s.text, MAX_FACT_VALUE_CHARS)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                sections.push(format!("### document excerpts\n{}", lines));
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Similarity narrowing failed, continuing on stored facts: {}", e);
            }
        }
    }

    for category in categories {
        let facts = store.retrieve(task_query, Some(category)).await;
        if facts.is_empty() {
            sections.push(format!("### {}\n(no facts recorded)", category));
        } else {
            sections.push(format!("### {}\n{}", category, render_fact_lines(&facts)));
        }
    }

    truncate_chars(&sections.join("\n\n"), MAX_CONTEXT_CHARS)
}
