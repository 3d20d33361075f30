//! Completion service boundary and provider clients

pub mod common;
pub(crate) mod openai;

// Re-export commonly used items
pub use common::{
    map_status_error, provider_error_message, ChatMessage, CompletionRequest, CompletionService,
    DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_OPENAI_MODEL, DEFAULT_TEMPERATURE,
};
pub use openai::OpenAiCompletionService;
