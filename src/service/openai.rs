//! OpenAI-compatible chat completions service

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::enhancer::Credential;
use crate::error::EnhancementError;
use crate::http_logger::{
    extract_response_headers, HttpLogger, HttpRequestLog, HttpResponseLog, REDACTED,
};

use super::common::{map_status_error, CompletionRequest, CompletionService};

const PROVIDER: &str = "OpenAI";

/// User-Agent header value
const USER_AGENT: &str = concat!("prompt-enhancer-rs/", env!("CARGO_PKG_VERSION"));

/// OpenAI API request structure
#[derive(Debug, Serialize)]
struct OpenAIApiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl<'a> From<&'a CompletionRequest> for OpenAIApiRequest<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        Self {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: &m.role,
                    content: &m.content,
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

/// OpenAI API response structure
#[derive(Debug, Deserialize)]
struct OpenAIApiResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

pub(crate) fn build_openai_url(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    let base_url = base_url.strip_suffix("/v1").unwrap_or(base_url);
    format!("{}/v1/chat/completions", base_url)
}

/// Turn a status code and body into the first choice's text, unchanged
pub(crate) fn parse_completion_response(
    status: u16,
    body_text: &str,
) -> Result<String, EnhancementError> {
    if !(200..300).contains(&status) {
        return Err(map_status_error(status, body_text, PROVIDER));
    }

    let api_response: OpenAIApiResponse = serde_json::from_str(body_text).map_err(|e| {
        EnhancementError::MalformedResponse(format!("failed to parse {} response: {}", PROVIDER, e))
    })?;

    api_response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| {
            EnhancementError::MalformedResponse(format!("{} API returned empty response", PROVIDER))
        })
}

/// Chat completions client for any provider speaking the OpenAI wire shape
pub struct OpenAiCompletionService {
    client: Client,
    base_url: String,
    http_logger: Option<Arc<HttpLogger>>,
}

impl OpenAiCompletionService {
    /// Build with the transport's default timeouts
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            http_logger: None,
        }
    }

    pub fn with_http_logger(mut self, logger: Arc<HttpLogger>) -> Self {
        self.http_logger = Some(logger);
        self
    }

    pub fn endpoint_url(&self) -> String {
        build_openai_url(&self.base_url)
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletionService {
    async fn complete(
        &self,
        credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<String, EnhancementError> {
        let payload = OpenAIApiRequest::from(request);
        let url = self.endpoint_url();
        let start_time = Instant::now();

        let request_log = self.http_logger.as_ref().map(|_| HttpRequestLog {
            method: "POST".to_string(),
            url: url.clone(),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
                // The credential itself never enters the log entry
                ("Authorization".to_string(), format!("Bearer {}", REDACTED)),
            ],
            body: serde_json::to_string(&payload).ok(),
        });

        info!("Calling {} API: {} (model {})", PROVIDER, url, request.model);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(credential.expose())
            .json(&payload)
            .send()
            .await;

        let resp = match response {
            Ok(resp) => resp,
            Err(e) => {
                let duration_ms = start_time.elapsed().as_millis() as u64;
                warn!("{} API request failed after {}ms: {}", PROVIDER, duration_ms, e);
                if let (Some(logger), Some(req_log)) = (&self.http_logger, &request_log) {
                    logger.log_exchange(req_log, None, duration_ms, Some(&e.to_string()));
                }
                return Err(EnhancementError::Unreachable(e.to_string()));
            }
        };

        let status = resp.status().as_u16();
        let response_headers = self
            .http_logger
            .as_ref()
            .map(|_| extract_response_headers(&resp));
        let body_text = resp.text().await.map_err(|e| {
            EnhancementError::Unreachable(format!("failed to read response body: {}", e))
        })?;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "{} API call completed in {}ms with status {}",
            PROVIDER, duration_ms, status
        );

        if let (Some(logger), Some(req_log)) = (&self.http_logger, &request_log) {
            let resp_log = HttpResponseLog {
                status,
                headers: response_headers.unwrap_or_default(),
                body: Some(body_text.clone()),
            };
            logger.log_exchange(req_log, Some(&resp_log), duration_ms, None);
        }

        parse_completion_response(status, &body_text)
    }
}
