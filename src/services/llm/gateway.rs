//! LLM Gateway
//!
//! Single entry point for model calls. Tries the primary tier once, then
//! walks the secondary fallback chain in order; a tier is never retried
//! within one call. When every tier fails the gateway returns a sentinel
//! string instead of an error, so "all providers down" flows through the
//! pipeline as ordinary data. Outages, quota exhaustion, and bad keys are
//! steady-state events here, not exceptions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::client::LlmClient;
use super::registry::ProviderRegistry;
use super::types::{ChatMessage, ProviderTier, RoleProfile};

/// Returned in place of model text once every tier has failed
pub const UNAVAILABLE_SENTINEL: &str = "[LLM_UNAVAILABLE] all provider tiers failed";

/// Whether a gateway reply is the all-tiers-failed sentinel
pub fn is_unavailable(text: &str) -> bool {
    text.trim_start().starts_with("[LLM_UNAVAILABLE]")
}

/// Record of a single tier attempt within one call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallAttempt {
    pub tier: String,
    pub model: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    pub started_at: String,
}

impl CallAttempt {
    fn success(tier: &ProviderTier, model: &str, duration_ms: u64, started_at: String) -> Self {
        Self {
            tier: tier.name.clone(),
            model: model.to_string(),
            succeeded: true,
            error: None,
            duration_ms,
            started_at,
        }
    }

    fn failure(
        tier: &ProviderTier,
        model: &str,
        error: String,
        duration_ms: u64,
        started_at: String,
    ) -> Self {
        Self {
            tier: tier.name.clone(),
            model: model.to_string(),
            succeeded: false,
            error: Some(error),
            duration_ms,
            started_at,
        }
    }
}

/// Tier and model that produced a reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServedBy {
    pub tier: String,
    pub model: String,
}

/// Outcome of one gateway call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayReply {
    /// Model text, or the sentinel when no tier answered
    pub text: String,
    /// None when the sentinel was returned
    pub served_by: Option<ServedBy>,
    /// Every tier attempt, in order
    pub attempts: Vec<CallAttempt>,
}

impl GatewayReply {
    pub fn succeeded(&self) -> bool {
        self.served_by.is_some()
    }
}

/// Callable seam over the gateway, so agents and the pipeline can run
/// against scripted doubles in tests
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn call(
        &self,
        role: RoleProfile,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> GatewayReply;
}

/// Gateway over the provider ladder
pub struct LlmGateway {
    registry: Arc<ProviderRegistry>,
    client: LlmClient,
}

impl LlmGateway {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            client: LlmClient::new(),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Issue one call: primary tier first, then the fallback chain.
    ///
    /// Each attempt is independent and timeout-bounded. Failures are marked
    /// against the registry's cooldown policy before moving on.
    pub async fn call(
        &self,
        role: RoleProfile,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> GatewayReply {
        let mut attempts = Vec::new();

        let primary_name = self.registry.primary().map(|t| t.name.clone());
        if let Some(primary) = self.registry.primary() {
            if self.registry.is_available(primary) {
                if let Some(reply) = self
                    .attempt(primary, role, messages, timeout, &mut attempts)
                    .await
                {
                    return reply;
                }
            } else {
                debug!(tier = %primary.name, "Primary tier in cooldown, going straight to chain");
            }
        }

        for tier in self.registry.fallback_chain() {
            if Some(&tier.name) == primary_name.as_ref() {
                continue;
            }
            if !self.registry.is_available(tier) {
                debug!(tier = %tier.name, "Chain tier in cooldown, skipped");
                continue;
            }
            if let Some(reply) = self
                .attempt(tier, role, messages, timeout, &mut attempts)
                .await
            {
                return reply;
            }
        }

        warn!(
            attempts = attempts.len(),
            "All provider tiers failed, returning sentinel"
        );
        GatewayReply {
            text: UNAVAILABLE_SENTINEL.to_string(),
            served_by: None,
            attempts,
        }
    }

    /// One tier attempt; Some on success, None to continue the walk
    async fn attempt(
        &self,
        tier: &ProviderTier,
        role: RoleProfile,
        messages: &[ChatMessage],
        timeout: Duration,
        attempts: &mut Vec<CallAttempt>,
    ) -> Option<GatewayReply> {
        let model = tier.model_for(role);
        let started_at = chrono::Utc::now().to_rfc3339();
        let started = Instant::now();

        match self.client.complete(tier, model, messages, timeout).await {
            Ok(text) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                debug!(tier = %tier.name, model = %model, duration_ms, "Call served");
                attempts.push(CallAttempt::success(tier, model, duration_ms, started_at));
                Some(GatewayReply {
                    text,
                    served_by: Some(ServedBy {
                        tier: tier.name.clone(),
                        model: model.to_string(),
                    }),
                    attempts: std::mem::take(attempts),
                })
            }
            Err(e) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                warn!(tier = %tier.name, model = %model, "Call failed: {}", e);
                attempts.push(CallAttempt::failure(
                    tier,
                    model,
                    e.to_string(),
                    duration_ms,
                    started_at,
                ));
                self.registry.mark_failure(tier, &e);
                None
            }
        }
    }
}

#[async_trait]
impl ModelGateway for LlmGateway {
    async fn call(
        &self,
        role: RoleProfile,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> GatewayReply {
        LlmGateway::call(self, role, messages, timeout).await
    }
}
