//! Agent Core
//!
//! One uniform unit of work: read fact categories, build a bounded context
//! block, call the gateway, recover structured output, write the result
//! back. Concrete agents differ only in their categories, prompt, and
//! fallback payload; the recovery and fallback discipline is identical
//! everywhere, so a failed call degrades the same way in every phase.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::services::agent::context::{assemble_context, SimilaritySearch};
use crate::services::llm::{
    CallAttempt, ChatMessage, ModelGateway, RoleProfile, ServedBy, DEFAULT_CALL_TIMEOUT,
};
use crate::services::memory::FactStore;
use crate::services::recovery::recover;
use crate::utils::error::{AppError, AppResult};

/// Uniform constraints appended to every agent's system instruction
const OUTPUT_CONTRACT: &str = r#"Rules you must follow:
- Use ONLY the information in the supplied context. Do not draw on outside knowledge.
- Where the context does not evidence a field, write "Not evidenced" instead of guessing.
- Respond with a single JSON object and nothing else. No prose before or after it."#;

/// Static description of one agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub name: String,
    pub role: RoleProfile,
    /// Categories read when the caller does not override them
    pub context_categories: Vec<String>,
    /// Categories that must hold at least one fact before the call
    pub required_categories: Vec<String>,
    pub output_category: String,
    pub output_key: String,
    pub system_prompt: String,
    /// Documented payload returned when recovery yields nothing
    pub fallback: Map<String, Value>,
    pub call_timeout: Duration,
}

impl AgentConfig {
    pub fn new(
        name: impl Into<String>,
        role: RoleProfile,
        output_category: impl Into<String>,
        output_key: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            context_categories: Vec::new(),
            required_categories: Vec::new(),
            output_category: output_category.into(),
            output_key: output_key.into(),
            system_prompt: system_prompt.into(),
            fallback: Map::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_context_categories(mut self, categories: &[&str]) -> Self {
        self.context_categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_required_categories(mut self, categories: &[&str]) -> Self {
        self.required_categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_fallback(mut self, fallback: Value) -> Self {
        if let Value::Object(map) = fallback {
            self.fallback = map;
        }
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

/// Outcome of one agent run
#[derive(Debug, Clone)]
pub struct AgentRunResult {
    pub output: Map<String, Value>,
    /// True when the documented fallback payload was returned
    pub fallback_used: bool,
    pub served_by: Option<ServedBy>,
    pub attempts: Vec<CallAttempt>,
}

/// A named unit of work over the shared fact store
pub struct Agent {
    config: AgentConfig,
    store: Arc<FactStore>,
    gateway: Arc<dyn ModelGateway>,
    similarity: Option<Arc<dyn SimilaritySearch>>,
    document_id: Option<String>,
}

impl Agent {
    pub fn new(config: AgentConfig, store: Arc<FactStore>, gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            config,
            store,
            gateway,
            similarity: None,
            document_id: None,
        }
    }

    /// Attach a similarity collaborator for document narrowing
    pub fn with_similarity(mut self, similarity: Arc<dyn SimilaritySearch>) -> Self {
        self.similarity = Some(similarity);
        self
    }

    /// Scope similarity narrowing to one document
    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    /// Override the configured per-call deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run the agent once.
    ///
    /// `context_categories` overrides the configured read set when non-empty.
    /// The only error this returns is data insufficiency on a required
    /// category; provider and recovery failures degrade to the configured
    /// fallback payload. Output is written back only after a successful
    /// recovery, so a failed run never contaminates later readers.
    pub async fn run(
        &self,
        task_description: &str,
        context_categories: &[String],
    ) -> AppResult<AgentRunResult> {
        for category in &self.config.required_categories {
            if self.store.latest(category, None).await.is_none() {
                return Err(AppError::insufficient_data(format!(
                    "Agent '{}' requires at least one '{}' fact",
                    self.config.name, category
                )));
            }
        }

        let categories: &[String] = if context_categories.is_empty() {
            &self.config.context_categories
        } else {
            context_categories
        };

        let context_block = assemble_context(
            &self.store,
            categories,
            task_description,
            self.similarity.as_deref(),
            self.document_id.as_deref(),
        )
        .await;

        let system = format!("{}\n\n{}", self.config.system_prompt, OUTPUT_CONTRACT);
        let task = format!("# Task\n{}\n\n# Context\n{}", task_description, context_block);
        let messages = [ChatMessage::system(system), ChatMessage::user(task)];

        debug!(agent = %self.config.name, categories = categories.len(), "Issuing agent call");
        let reply = self
            .gateway
            .call(self.config.role, &messages, self.config.call_timeout)
            .await;

        let recovered = recover(&reply.text, &self.config.name);
        if recovered.is_empty() {
            warn!(agent = %self.config.name, "Recovery produced nothing, returning fallback payload");
            return Ok(AgentRunResult {
                output: self.config.fallback.clone(),
                fallback_used: true,
                served_by: reply.served_by,
                attempts: reply.attempts,
            });
        }

        let mut metadata = Map::new();
        metadata.insert("agent".into(), Value::String(self.config.name.clone()));
        if let Some(served) = &reply.served_by {
            metadata.insert("tier".into(), Value::String(served.tier.clone()));
            metadata.insert("model".into(), Value::String(served.model.clone()));
        }

        self.store
            .store(
                &self.config.output_category,
                &self.config.output_key,
                Value::Object(recovered.clone()),
                metadata,
            )
            .await;

        info!(
            agent = %self.config.name,
            category = %self.config.output_category,
            "Agent output recovered and stored"
        );

        Ok(AgentRunResult {
            output: recovered,
            fallback_used: false,
            served_by: reply.served_by,
            attempts: reply.attempts,
        })
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.config.name)
            .field("role", &self.config.role)
            .finish()
    }
}
