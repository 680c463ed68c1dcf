//! LLM Gateway Types
//!
//! Core types for provider-tier selection and gateway calls.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default per-call timeout for provider requests
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(180);

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenRouter,
    DeepSeek,
    Glm,
    Ollama,
    OpenAI,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenRouter => write!(f, "openrouter"),
            ProviderKind::DeepSeek => write!(f, "deepseek"),
            ProviderKind::Glm => write!(f, "glm"),
            ProviderKind::Ollama => write!(f, "ollama"),
            ProviderKind::OpenAI => write!(f, "openai"),
        }
    }
}

/// Wire format a tier speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiDialect {
    /// POST {base}/chat/completions with a bearer key
    OpenAiCompat,
    /// POST {base}/api/chat against a local server, no key
    Ollama,
}

/// Message role in a gateway call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A role-tagged instruction in a gateway call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Model-selection profile for an agent's role.
///
/// Reasoning-heavy roles request a tier's stronger model when one exists;
/// extraction and default roles take the tier's standard model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleProfile {
    ReasoningHeavy,
    Extraction,
    Default,
}

impl Default for RoleProfile {
    fn default() -> Self {
        Self::Default
    }
}

impl RoleProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleProfile::ReasoningHeavy => "reasoning_heavy",
            RoleProfile::Extraction => "extraction",
            RoleProfile::Default => "default",
        }
    }
}

/// One callable provider tier: a provider, endpoint, and model pairing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderTier {
    /// Unique tier name ("openrouter", "openrouter-free", "ollama", ...)
    pub name: String,
    pub kind: ProviderKind,
    pub dialect: ApiDialect,
    pub base_url: String,
    /// Resolved credential; None for local tiers
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    pub model: String,
    /// Stronger in-tier model for reasoning-heavy roles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_model: Option<String>,
    /// Ladder rank, lower is tried first
    pub priority: u8,
}

impl ProviderTier {
    /// Model this tier serves for a given role
    pub fn model_for(&self, role: RoleProfile) -> &str {
        match role {
            RoleProfile::ReasoningHeavy => self.reasoning_model.as_deref().unwrap_or(&self.model),
            _ => &self.model,
        }
    }
}

/// Error types for provider calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmError {
    /// Authentication failed (invalid or missing API key)
    AuthenticationFailed { message: String },
    /// Rate limit or quota exceeded
    RateLimited { message: String },
    /// Model not found or not available on the tier
    ModelNotFound { model: String },
    /// Invalid request (bad parameters)
    InvalidRequest { message: String },
    /// Server error from the provider
    ServerError {
        message: String,
        status: Option<u16>,
    },
    /// Network/connection error
    NetworkError { message: String },
    /// The call exceeded its timeout
    Timeout { seconds: u64 },
    /// Response parsing error
    ParseError { message: String },
    /// Provider not reachable (e.g. local server not running)
    ProviderUnavailable { message: String },
    /// Other error
    Other { message: String },
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::AuthenticationFailed { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            LlmError::RateLimited { message } => {
                write!(f, "Rate limited: {}", message)
            }
            LlmError::ModelNotFound { model } => {
                write!(f, "Model not found: {}", model)
            }
            LlmError::InvalidRequest { message } => {
                write!(f, "Invalid request: {}", message)
            }
            LlmError::ServerError { message, status } => {
                if let Some(s) = status {
                    write!(f, "Server error ({}): {}", s, message)
                } else {
                    write!(f, "Server error: {}", message)
                }
            }
            LlmError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            LlmError::Timeout { seconds } => {
                write!(f, "Call timed out after {}s", seconds)
            }
            LlmError::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            LlmError::ProviderUnavailable { message } => {
                write!(f, "Provider unavailable: {}", message)
            }
            LlmError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Result type for provider calls
pub type LlmResult<T> = Result<T, LlmError>;
