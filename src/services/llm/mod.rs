//! LLM Gateway Module
//!
//! Tiered access to hosted and local model providers:
//! - OpenRouter (hosted multi-model)
//! - DeepSeek (hosted specialist)
//! - Ollama (self-hosted)
//! - OpenAI (hosted general)
//! - GLM and free hosted models on the secondary fallback chain

pub mod client;
pub mod gateway;
pub mod registry;
pub mod types;

// Re-export main types
pub use client::{parse_http_error, LlmClient};
pub use gateway::{
    is_unavailable, CallAttempt, GatewayReply, LlmGateway, ModelGateway, ServedBy,
    UNAVAILABLE_SENTINEL,
};
pub use registry::{CredentialSet, ProviderRegistry};
pub use types::*;
