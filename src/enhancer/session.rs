//! Form session - per-user form state and the submit trigger

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{EnhancementError, SubmitError, ValidationError, TRANSPORT_GUIDANCE};

use super::components::{
    validate, Credential, EnhancementOptions, PromptComponents, ResponseLength,
};
use super::prompt_enhancer::PromptEnhancer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Transport,
}

/// Error as shown to the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DisplayError {
    pub kind: ErrorKind,
    pub message: String,
    pub guidance: Option<String>,
}

impl DisplayError {
    fn validation(err: &ValidationError) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: err.to_string(),
            guidance: None,
        }
    }

    fn transport(err: &EnhancementError) -> Self {
        Self {
            kind: ErrorKind::Transport,
            message: format!("Error: {}", err.description()),
            guidance: Some(TRANSPORT_GUIDANCE.to_string()),
        }
    }
}

/// Inputs captured when a submit is accepted
#[derive(Clone, Debug)]
pub struct PendingSubmission {
    pub credential: Credential,
    pub components: PromptComponents,
    pub options: EnhancementOptions,
}

/// Everything the page needs to paint itself. Never carries the credential.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub role: String,
    pub context: String,
    pub task: String,
    pub include_examples: bool,
    pub include_steps: bool,
    pub response_length: ResponseLength,
    pub credential_provided: bool,
    pub busy: bool,
    pub result: Option<String>,
    pub error: Option<DisplayError>,
}

/// Form state for one user session.
///
/// A failed enhancement keeps the previously displayed result; only a
/// successful one overwrites it.
#[derive(Debug, Default)]
pub struct FormSession {
    credential: Credential,
    components: PromptComponents,
    options: EnhancementOptions,
    result: Option<String>,
    error: Option<DisplayError>,
    busy: bool,
}

impl FormSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_credential(&mut self, credential: Credential) {
        self.credential = credential;
    }

    pub fn set_components(&mut self, components: PromptComponents) {
        self.components = components;
    }

    pub fn set_options(&mut self, options: EnhancementOptions) {
        self.options = options;
    }

    pub fn components(&self) -> &PromptComponents {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut PromptComponents {
        &mut self.components
    }

    pub fn options(&self) -> &EnhancementOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut EnhancementOptions {
        &mut self.options
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn error(&self) -> Option<&DisplayError> {
        self.error.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Validate and mark the session busy.
    ///
    /// On validation failure the error is recorded for display and the
    /// result is left as it was.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission, SubmitError> {
        if self.busy {
            return Err(SubmitError::Busy);
        }

        if let Err(e) = validate(&self.credential, &self.components) {
            debug!("Submit rejected: {}", e);
            self.error = Some(DisplayError::validation(&e));
            return Err(e.into());
        }

        self.busy = true;
        Ok(PendingSubmission {
            credential: self.credential.clone(),
            components: self.components.clone(),
            options: self.options,
        })
    }

    /// Record the outcome of the request started by `begin_submit`
    pub fn finish_submit(
        &mut self,
        outcome: Result<String, EnhancementError>,
    ) -> Result<String, SubmitError> {
        self.busy = false;
        match outcome {
            Ok(text) => {
                self.result = Some(text.clone());
                self.error = None;
                Ok(text)
            }
            Err(e) => {
                self.error = Some(DisplayError::transport(&e));
                Err(SubmitError::Enhancement(e))
            }
        }
    }

    /// Validate, call the enhancer, and store the outcome
    pub async fn submit(&mut self, enhancer: &PromptEnhancer) -> Result<String, SubmitError> {
        let pending = self.begin_submit()?;
        info!("Enhancing prompt...");
        let outcome = enhancer
            .enhance(&pending.credential, &pending.components, &pending.options)
            .await;
        self.finish_submit(outcome)
    }

    /// Render model for the current state
    pub fn view(&self) -> SessionView {
        SessionView {
            role: self.components.role.clone(),
            context: self.components.context.clone(),
            task: self.components.task.clone(),
            include_examples: self.options.include_examples,
            include_steps: self.options.include_steps,
            response_length: self.options.response_length,
            credential_provided: !self.credential.is_empty(),
            busy: self.busy,
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}
