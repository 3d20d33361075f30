//! Prompt Enhancer module
//! Turns role, context and task into a structured prompt through a completion service

pub mod components;
pub mod prompt_enhancer;
pub mod server;
pub mod session;
pub mod templates;

pub use components::{Credential, EnhancementOptions, PromptComponents, ResponseLength};
pub use prompt_enhancer::{EnhancerSettings, PromptEnhancer};
pub use server::EnhancerServer;
pub use session::{DisplayError, ErrorKind, FormSession, PendingSubmission, SessionView};
pub use templates::{build_enhancement_prompt, ENHANCER_UI_HTML, SYSTEM_PROMPT};
