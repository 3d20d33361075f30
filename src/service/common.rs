//! Common types and utilities for service modules

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::enhancer::Credential;
use crate::error::EnhancementError;
use crate::http_logger::truncate_utf8_safe;

/// Default completion endpoint base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default model used for prompt enhancement
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Output token ceiling for one enhancement
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Sampling temperature for one enhancement
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Chat message exchanged with the completion service
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Provider-neutral completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Black-box text completion provider.
///
/// One call is one attempt; implementations must not retry.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<String, EnhancementError>;
}

/// Extract `error.message` from a provider error body, if present
pub fn provider_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let message = value
        .get("error")
        .and_then(|e| e.get("message").or(Some(e)))
        .and_then(|m| m.as_str())?
        .trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}

/// Map a non-success HTTP status to a typed error
pub fn map_status_error(status: u16, body: &str, provider: &str) -> EnhancementError {
    let detail = provider_error_message(body);
    if detail.is_none() && !body.trim().is_empty() {
        // Raw bodies (HTML error pages etc.) go to the log, never to the user
        warn!(
            "{} API returned status {} with unstructured body: {}",
            provider,
            status,
            truncate_utf8_safe(body.trim(), 500)
        );
    }
    let with_detail = |base: String| match &detail {
        Some(d) => format!("{}: {}", base, d),
        None => base,
    };

    match status {
        401 => EnhancementError::Unauthorized(with_detail(format!(
            "{} API key invalid or expired",
            provider
        ))),
        403 => EnhancementError::Unauthorized(with_detail(format!(
            "{} access denied, API key may be disabled",
            provider
        ))),
        429 => EnhancementError::RateLimited(with_detail(format!(
            "{} rate limit or quota exceeded",
            provider
        ))),
        _ => EnhancementError::Service {
            status,
            // Status is already part of the Display text
            message: detail.unwrap_or_else(|| format!("{} API failed", provider)),
        },
    }
}
