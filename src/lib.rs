//! prompt-enhancer library - local Web UI that turns prompt components into a structured prompt

pub mod config;
pub mod enhancer;
pub mod error;
pub mod http_logger;
pub mod service;

// Re-export commonly used types
pub use config::{Config, ConfigOptions};
pub use enhancer::{
    Credential, EnhancementOptions, EnhancerServer, FormSession, PromptComponents,
    PromptEnhancer, ResponseLength,
};
pub use error::{EnhancementError, SubmitError, ValidationError};
