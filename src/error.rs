//! Error types shared by the form session and the completion service

use std::fmt;

use thiserror::Error;

/// Guidance shown next to every transport failure
pub const TRANSPORT_GUIDANCE: &str =
    "Make sure your API key is valid and you have sufficient credits.";

/// A required form input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Credential,
    Role,
    Context,
    Task,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credential => write!(f, "API Key"),
            Self::Role => write!(f, "Role"),
            Self::Context => write!(f, "Context"),
            Self::Task => write!(f, "Task"),
        }
    }
}

/// Local precondition failure; never reaches the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    missing: Vec<MissingField>,
}

impl ValidationError {
    pub fn new(missing: Vec<MissingField>) -> Self {
        Self { missing }
    }

    pub fn missing(&self) -> &[MissingField] {
        &self.missing
    }

    pub fn is_missing(&self, field: MissingField) -> bool {
        self.missing.contains(&field)
    }

    fn missing_components(&self) -> Vec<String> {
        self.missing
            .iter()
            .filter(|f| **f != MissingField::Credential)
            .map(|f| f.to_string())
            .collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let components = self.missing_components();
        let credential = self.is_missing(MissingField::Credential);

        match (credential, components.is_empty()) {
            (true, true) => write!(f, "Please provide your API Key"),
            (true, false) => write!(
                f,
                "Please provide your API Key and fill in all required fields (missing: {})",
                components.join(", ")
            ),
            (false, false) => write!(
                f,
                "Please fill in all required fields (missing: {})",
                components.join(", ")
            ),
            (false, true) => write!(f, "Invalid input"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Failure of the single outbound completion call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnhancementError {
    #[error("Completion service unreachable: {0}")]
    Unreachable(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("Completion service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Unexpected response from completion service: {0}")]
    MalformedResponse(String),
}

impl EnhancementError {
    /// Human-readable description for display
    pub fn description(&self) -> String {
        self.to_string()
    }

    /// Guidance to show alongside the description
    pub fn guidance(&self) -> &'static str {
        TRANSPORT_GUIDANCE
    }
}

/// Why a submit did not produce a result
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("An enhancement request is already in progress")]
    Busy,

    #[error("Error: {0}")]
    Enhancement(#[from] EnhancementError),
}
