//! Form inputs: credential, prompt components and enhancement options

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MissingField, ValidationError};

/// Opaque API key held only in memory for one session.
///
/// `Debug` is redacted so the secret never ends up in logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Raw secret, for building the Authorization header only
    pub fn expose(&self) -> &str {
        self.0.trim()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "Credential(<empty>)")
        } else {
            write!(f, "Credential(<redacted>)")
        }
    }
}

/// Role, context and task as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptComponents {
    pub role: String,
    pub context: String,
    pub task: String,
}

impl PromptComponents {
    pub fn new(
        role: impl Into<String>,
        context: impl Into<String>,
        task: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            context: context.into(),
            task: task.into(),
        }
    }

    /// Fields that are empty or whitespace-only, in form order
    pub fn missing_fields(&self) -> Vec<MissingField> {
        [
            (MissingField::Role, &self.role),
            (MissingField::Context, &self.context),
            (MissingField::Task, &self.task),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

/// Requested response length tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseLength {
    #[default]
    Concise,
    Detailed,
    Comprehensive,
}

impl ResponseLength {
    pub const ALL: [ResponseLength; 3] = [Self::Concise, Self::Detailed, Self::Comprehensive];

    /// Lowercase form used in the instruction text
    pub fn as_lowercase(&self) -> &'static str {
        match self {
            Self::Concise => "concise",
            Self::Detailed => "detailed",
            Self::Comprehensive => "comprehensive",
        }
    }

    /// Parse a select value, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "concise" => Some(Self::Concise),
            "detailed" => Some(Self::Detailed),
            "comprehensive" => Some(Self::Comprehensive),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concise => write!(f, "Concise"),
            Self::Detailed => write!(f, "Detailed"),
            Self::Comprehensive => write!(f, "Comprehensive"),
        }
    }
}

/// Toggles controlling the optional requirement lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancementOptions {
    pub include_examples: bool,
    pub include_steps: bool,
    pub response_length: ResponseLength,
}

impl Default for EnhancementOptions {
    fn default() -> Self {
        Self {
            include_examples: true,
            include_steps: true,
            response_length: ResponseLength::Concise,
        }
    }
}

/// Check the submit preconditions, reporting every missing input at once
pub fn validate(
    credential: &Credential,
    components: &PromptComponents,
) -> Result<(), ValidationError> {
    let mut missing = Vec::new();
    if credential.is_empty() {
        missing.push(MissingField::Credential);
    }
    missing.extend(components.missing_fields());

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(missing))
    }
}
