//! Uniform Provider Client
//!
//! One HTTP caller for every tier. All hosted tiers speak the
//! chat-completions dialect with a bearer key; local tiers speak the Ollama
//! chat dialect. The per-call timeout wraps the whole request so a stalled
//! provider is abandoned, not waited on.

use std::time::Duration;

use serde::Deserialize;

use super::types::{ApiDialect, ChatMessage, LlmError, LlmResult, MessageRole, ProviderTier};

/// Sampling temperature for structured-output calls
const DEFAULT_TEMPERATURE: f32 = 0.2;
/// Generation ceiling sent to hosted tiers
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Dialect-aware HTTP client shared by every gateway call
pub struct LlmClient {
    http: reqwest::Client,
}

impl Default for LlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Issue one completion against a tier, bounded by `timeout`
    pub async fn complete(
        &self,
        tier: &ProviderTier,
        model: &str,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> LlmResult<String> {
        match tokio::time::timeout(timeout, self.dispatch(tier, model, messages)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                seconds: timeout.as_secs(),
            }),
        }
    }

    async fn dispatch(
        &self,
        tier: &ProviderTier,
        model: &str,
        messages: &[ChatMessage],
    ) -> LlmResult<String> {
        let body = build_body(tier.dialect, model, messages);
        let url = endpoint_url(tier);

        let mut request = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);

        if tier.dialect == ApiDialect::OpenAiCompat {
            let api_key = tier
                .api_key
                .as_ref()
                .ok_or_else(|| missing_api_key_error(&tier.name))?;
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(map_transport_error)?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, &tier.name));
        }

        extract_text(tier.dialect, &body_text)
    }
}

/// Full endpoint URL for a tier
fn endpoint_url(tier: &ProviderTier) -> String {
    let base = tier.base_url.trim_end_matches('/');
    match tier.dialect {
        ApiDialect::OpenAiCompat => format!("{}/chat/completions", base),
        ApiDialect::Ollama => format!("{}/api/chat", base),
    }
}

/// Whether a model accepts a temperature parameter (o1/o3 reject it)
fn supports_temperature(model: &str) -> bool {
    let model = model.to_lowercase();
    !(model.starts_with("o1") || model.starts_with("o3"))
}

/// Build the request body for a dialect
fn build_body(dialect: ApiDialect, model: &str, messages: &[ChatMessage]) -> serde_json::Value {
    let wire_messages: Vec<serde_json::Value> = messages
        .iter()
        .map(|m| {
            let role = match m.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            serde_json::json!({ "role": role, "content": m.content })
        })
        .collect();

    match dialect {
        ApiDialect::OpenAiCompat => {
            let mut body = serde_json::json!({
                "model": model,
                "messages": wire_messages,
                "max_tokens": DEFAULT_MAX_TOKENS,
                "stream": false,
            });
            if supports_temperature(model) {
                body["temperature"] = serde_json::json!(DEFAULT_TEMPERATURE);
            }
            body
        }
        ApiDialect::Ollama => serde_json::json!({
            "model": model,
            "messages": wire_messages,
            "stream": false,
            "options": { "temperature": DEFAULT_TEMPERATURE },
        }),
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

/// Pull the completion text out of a 200 response body
fn extract_text(dialect: ApiDialect, body_text: &str) -> LlmResult<String> {
    match dialect {
        ApiDialect::OpenAiCompat => {
            let parsed: ChatCompletionResponse =
                serde_json::from_str(body_text).map_err(|e| LlmError::ParseError {
                    message: format!("Failed to parse response: {}", e),
                })?;
            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message)
                .and_then(|m| m.content)
                .ok_or_else(|| LlmError::ParseError {
                    message: "Response carried no message content".into(),
                })
        }
        ApiDialect::Ollama => {
            let parsed: OllamaChatResponse =
                serde_json::from_str(body_text).map_err(|e| LlmError::ParseError {
                    message: format!("Failed to parse response: {}", e),
                })?;
            parsed
                .message
                .map(|m| m.content)
                .ok_or_else(|| LlmError::ParseError {
                    message: "Response carried no message content".into(),
                })
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> LlmError {
    if e.is_connect() {
        LlmError::ProviderUnavailable {
            message: e.to_string(),
        }
    } else {
        LlmError::NetworkError {
            message: e.to_string(),
        }
    }
}

/// Error for a tier that requires a key but has none resolved
pub fn missing_api_key_error(tier_name: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", tier_name),
    }
}

/// Map an HTTP error status to the failure taxonomy
pub fn parse_http_error(status: u16, body: &str, tier_name: &str) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", tier_name),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", tier_name),
        },
        404 => LlmError::ModelNotFound {
            model: body.to_string(),
        },
        429 => LlmError::RateLimited {
            message: body.to_string(),
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama_tier() -> ProviderTier {
        ProviderTier {
            name: "ollama".into(),
            kind: super::super::types::ProviderKind::Ollama,
            dialect: ApiDialect::Ollama,
            base_url: "http://localhost:11434/".into(),
            api_key: None,
            model: "llama3.1".into(),
            reasoning_model: None,
            priority: 3,
        }
    }

    #[test]
    fn test_endpoint_url_strips_trailing_slash() {
        assert_eq!(endpoint_url(&ollama_tier()), "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_build_body_openai_compat() {
        let messages = vec![
            ChatMessage::system("respond in JSON"),
            ChatMessage::user("extract the targets"),
        ];
        let body = build_body(ApiDialect::OpenAiCompat, "deepseek-chat", &messages);

        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!((body["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_build_body_omits_temperature_for_reasoning_models() {
        let messages = vec![ChatMessage::user("think hard")];
        let body = build_body(ApiDialect::OpenAiCompat, "o3-mini", &messages);
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_build_body_ollama() {
        let messages = vec![ChatMessage::user("hello")];
        let body = build_body(ApiDialect::Ollama, "llama3.1", &messages);
        assert_eq!(body["stream"], false);
        assert!((body["options"]["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_extract_text_openai_compat() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}]}"#;
        let text = extract_text(ApiDialect::OpenAiCompat, body).unwrap();
        assert_eq!(text, "{\"a\":1}");
    }

    #[test]
    fn test_extract_text_ollama() {
        let body = r#"{"message":{"role":"assistant","content":"done"},"done":true}"#;
        let text = extract_text(ApiDialect::Ollama, body).unwrap();
        assert_eq!(text, "done");
    }

    #[test]
    fn test_extract_text_empty_choices_is_parse_error() {
        let result = extract_text(ApiDialect::OpenAiCompat, r#"{"choices":[]}"#);
        assert!(matches!(result, Err(LlmError::ParseError { .. })));
    }

    #[test]
    fn test_missing_api_key_error() {
        let err = missing_api_key_error("deepseek");
        match err {
            LlmError::AuthenticationFailed { message } => {
                assert!(message.contains("deepseek"));
            }
            _ => panic!("Expected AuthenticationFailed"),
        }
    }

    #[test]
    fn test_parse_http_error() {
        let err = parse_http_error(401, "unauthorized", "openrouter");
        assert!(matches!(err, LlmError::AuthenticationFailed { .. }));

        let err = parse_http_error(429, "rate limited", "openrouter");
        assert!(matches!(err, LlmError::RateLimited { .. }));

        let err = parse_http_error(500, "internal error", "openrouter");
        assert!(matches!(err, LlmError::ServerError { .. }));

        let err = parse_http_error(404, "no such model", "openrouter");
        assert!(matches!(err, LlmError::ModelNotFound { .. }));

        let err = parse_http_error(418, "teapot", "openrouter");
        assert!(matches!(err, LlmError::Other { .. }));
    }
}
