//! Prompt Enhancer - Core enhancement logic
//!
//! Builds the enhancement instruction from the form inputs and makes exactly
//! one call to the configured completion service.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::EnhancementError;
use crate::service::{
    ChatMessage, CompletionRequest, CompletionService, DEFAULT_MAX_TOKENS, DEFAULT_OPENAI_MODEL,
    DEFAULT_TEMPERATURE,
};

use super::components::{Credential, EnhancementOptions, PromptComponents};
use super::templates::{build_enhancement_prompt, SYSTEM_PROMPT};

/// Fixed request parameters for every enhancement call
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancerSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for EnhancerSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_OPENAI_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl From<&Config> for EnhancerSettings {
    fn from(config: &Config) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Prompt Enhancer
#[derive(Clone)]
pub struct PromptEnhancer {
    service: Arc<dyn CompletionService>,
    settings: EnhancerSettings,
}

impl PromptEnhancer {
    pub fn new(service: Arc<dyn CompletionService>, settings: EnhancerSettings) -> Self {
        Self { service, settings }
    }

    pub fn settings(&self) -> &EnhancerSettings {
        &self.settings
    }

    /// Assemble the system and user messages for one enhancement
    pub fn build_request(
        &self,
        components: &PromptComponents,
        options: &EnhancementOptions,
    ) -> CompletionRequest {
        CompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_enhancement_prompt(components, options)),
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }

    /// Enhance the prompt components into a structured prompt
    ///
    /// # Returns
    /// The provider's first completion text, unmodified
    pub async fn enhance(
        &self,
        credential: &Credential,
        components: &PromptComponents,
        options: &EnhancementOptions,
    ) -> Result<String, EnhancementError> {
        let request = self.build_request(components, options);
        info!(
            "Starting prompt enhancement (length: {}, examples: {}, steps: {})",
            options.response_length, options.include_examples, options.include_steps
        );

        match self.service.complete(credential, &request).await {
            Ok(text) => {
                info!("Enhancement complete ({} chars)", text.len());
                Ok(text)
            }
            Err(e) => {
                warn!("Enhancement failed: {}", e);
                Err(e)
            }
        }
    }
}
