//! Provider Tier Registry
//!
//! Builds the ordered provider-tier ladder from whichever credentials are
//! present and tracks per-provider cooldowns across calls within a run.
//! Discovery happens once per run; every agent then observes the same fixed
//! ladder for its lifetime.

use std::env;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info, warn};

use super::types::{ApiDialect, LlmError, ProviderKind, ProviderTier};

/// Credential env vars checked by default discovery
pub const OPENROUTER_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const DEEPSEEK_KEY_VAR: &str = "DEEPSEEK_API_KEY";
pub const GLM_KEY_VAR: &str = "GLM_API_KEY";
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
pub const OLLAMA_URL_VAR: &str = "OLLAMA_BASE_URL";

/// Cooldown after a credential rejection; the key will not fix itself
pub const AUTH_COOLDOWN: Duration = Duration::from_secs(24 * 60 * 60);
/// Cooldown after quota or server trouble; worth retrying soon
pub const QUOTA_COOLDOWN: Duration = Duration::from_secs(60);

/// Credentials resolved from the environment (or built directly in tests)
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    pub openrouter_key: Option<String>,
    pub deepseek_key: Option<String>,
    pub glm_key: Option<String>,
    pub openai_key: Option<String>,
    pub ollama_base_url: Option<String>,
}

impl CredentialSet {
    /// Read the default env vars, treating empty values as absent
    pub fn from_env() -> Self {
        Self {
            openrouter_key: read_var(OPENROUTER_KEY_VAR),
            deepseek_key: read_var(DEEPSEEK_KEY_VAR),
            glm_key: read_var(GLM_KEY_VAR),
            openai_key: read_var(OPENAI_KEY_VAR),
            ollama_base_url: read_var(OLLAMA_URL_VAR),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.openrouter_key.is_none()
            && self.deepseek_key.is_none()
            && self.glm_key.is_none()
            && self.openai_key.is_none()
            && self.ollama_base_url.is_none()
    }
}

fn read_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// ============================================================================
// ProviderRegistry
// ============================================================================

/// Fixed tier ladder plus runtime availability state
pub struct ProviderRegistry {
    primaries: Vec<ProviderTier>,
    chain: Vec<ProviderTier>,
    cooldowns: DashMap<ProviderKind, Instant>,
}

impl ProviderRegistry {
    /// Build the ladder from the environment
    pub fn from_env() -> Self {
        Self::discover(&CredentialSet::from_env())
    }

    /// Build the ladder from an explicit credential set.
    ///
    /// Primary ranking: hosted multi-model tier, then the specialist direct
    /// tier, then self-hosted, then the general cloud tier. The secondary
    /// chain runs free hosted, alternate hosted, then the local safety net.
    pub fn discover(credentials: &CredentialSet) -> Self {
        let mut primaries = Vec::new();
        let mut chain = Vec::new();

        if let Some(key) = &credentials.openrouter_key {
            primaries.push(ProviderTier {
                name: "openrouter".into(),
                kind: ProviderKind::OpenRouter,
                dialect: ApiDialect::OpenAiCompat,
                base_url: "https://openrouter.ai/api/v1".into(),
                api_key: Some(key.clone()),
                model: "deepseek/deepseek-chat".into(),
                reasoning_model: Some("deepseek/deepseek-r1".into()),
                priority: 1,
            });
            chain.push(ProviderTier {
                name: "openrouter-free".into(),
                kind: ProviderKind::OpenRouter,
                dialect: ApiDialect::OpenAiCompat,
                base_url: "https://openrouter.ai/api/v1".into(),
                api_key: Some(key.clone()),
                model: "deepseek/deepseek-chat:free".into(),
                reasoning_model: None,
                priority: 1,
            });
        }

        if let Some(key) = &credentials.deepseek_key {
            primaries.push(ProviderTier {
                name: "deepseek".into(),
                kind: ProviderKind::DeepSeek,
                dialect: ApiDialect::OpenAiCompat,
                base_url: "https://api.deepseek.com".into(),
                api_key: Some(key.clone()),
                model: "deepseek-chat".into(),
                reasoning_model: Some("deepseek-reasoner".into()),
                priority: 2,
            });
        }

        if let Some(key) = &credentials.glm_key {
            chain.push(ProviderTier {
                name: "glm".into(),
                kind: ProviderKind::Glm,
                dialect: ApiDialect::OpenAiCompat,
                base_url: "https://open.bigmodel.cn/api/paas/v4".into(),
                api_key: Some(key.clone()),
                model: "glm-4-flash".into(),
                reasoning_model: None,
                priority: 2,
            });
        }

        if let Some(base_url) = &credentials.ollama_base_url {
            primaries.push(ProviderTier {
                name: "ollama".into(),
                kind: ProviderKind::Ollama,
                dialect: ApiDialect::Ollama,
                base_url: base_url.clone(),
                api_key: None,
                model: "llama3.1".into(),
                reasoning_model: None,
                priority: 3,
            });
            chain.push(ProviderTier {
                name: "ollama-safety".into(),
                kind: ProviderKind::Ollama,
                dialect: ApiDialect::Ollama,
                base_url: base_url.clone(),
                api_key: None,
                model: "llama3.1".into(),
                reasoning_model: None,
                priority: 3,
            });
        }

        if let Some(key) = &credentials.openai_key {
            primaries.push(ProviderTier {
                name: "openai".into(),
                kind: ProviderKind::OpenAI,
                dialect: ApiDialect::OpenAiCompat,
                base_url: "https://api.openai.com/v1".into(),
                api_key: Some(key.clone()),
                model: "gpt-4o-mini".into(),
                reasoning_model: Some("o3-mini".into()),
                priority: 4,
            });
        }

        primaries.sort_by_key(|t| t.priority);
        chain.sort_by_key(|t| t.priority);

        if primaries.is_empty() {
            warn!("No provider credentials found; every call will fall through to the sentinel");
        } else {
            info!(
                primary = %primaries[0].name,
                tiers = primaries.len(),
                chain = chain.len(),
                "Provider ladder built"
            );
        }

        Self {
            primaries,
            chain,
            cooldowns: DashMap::new(),
        }
    }

    /// Highest-priority tier whose credential is present
    pub fn primary(&self) -> Option<&ProviderTier> {
        self.primaries.first()
    }

    /// Secondary chain, walked in order after the primary fails
    pub fn fallback_chain(&self) -> &[ProviderTier] {
        &self.chain
    }

    pub fn has_any_tier(&self) -> bool {
        !self.primaries.is_empty() || !self.chain.is_empty()
    }

    /// Whether a tier's provider is outside any active cooldown
    pub fn is_available(&self, tier: &ProviderTier) -> bool {
        match self.cooldowns.get(&tier.kind) {
            Some(until) => Instant::now() >= *until,
            None => true,
        }
    }

    /// Apply the cooldown policy for a failed call.
    ///
    /// Credential rejections park the provider for the rest of the day;
    /// quota and server errors park it briefly; timeouts and transport
    /// errors are treated as per-call flukes and leave availability alone.
    pub fn mark_failure(&self, tier: &ProviderTier, error: &LlmError) {
        let cooldown = match error {
            LlmError::AuthenticationFailed { .. } => Some(AUTH_COOLDOWN),
            LlmError::RateLimited { .. } | LlmError::ServerError { .. } => Some(QUOTA_COOLDOWN),
            _ => None,
        };

        if let Some(cooldown) = cooldown {
            warn!(
                provider = %tier.kind,
                cooldown_secs = cooldown.as_secs(),
                "Provider parked after failure: {}",
                error
            );
            self.cooldowns.insert(tier.kind, Instant::now() + cooldown);
        } else {
            debug!(provider = %tier.kind, "Transient failure, provider stays available: {}", error);
        }
    }

    /// Clear cooldown state at the start of a run
    pub fn reset_for_run(&self) {
        self.cooldowns.clear();
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("primaries", &self.primaries.iter().map(|t| &t.name).collect::<Vec<_>>())
            .field("chain", &self.chain.iter().map(|t| &t.name).collect::<Vec<_>>())
            .finish()
    }
}
