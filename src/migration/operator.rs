// Operator input used when a value cannot be derived from the source resource.

use dialoguer::{theme::ColorfulTheme, Input};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    /// No operator is attached (non-interactive run, MCP server).
    #[error("operator input is not available in non-interactive mode")]
    Unavailable,

    #[error("failed to read operator input: {0}")]
    Terminal(#[from] dialoguer::Error),
}

/// Port through which the converter asks a human for missing values.
pub trait OperatorInput {
    /// Shows `prompt` and returns the answer. An empty answer leaves the field unset.
    fn request(&mut self, prompt: &str) -> Result<String, PromptError>;
}

/// Blocking terminal prompts.
pub struct TerminalOperator {
    theme: ColorfulTheme,
}

impl TerminalOperator {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorInput for TerminalOperator {
    fn request(&mut self, prompt: &str) -> Result<String, PromptError> {
        let answer: String = Input::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(answer.trim().to_string())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

impl OperatorInput for NonInteractive {
    fn request(&mut self, _prompt: &str) -> Result<String, PromptError> {
        Err(PromptError::Unavailable)
    }
}
