//! LLM backend integration
//!
//! Features:
//! - `LlmBackend` trait with an OpenAI-compatible HTTP implementation
//! - Retry with exponential backoff on transient failures
//! - Prompt construction for the travel assistant

pub mod backend;
pub mod prompt;

pub use backend::{FinishReason, GenerationResult, LlmBackend, LlmConfig, MockBackend, OpenAIBackend};
pub use prompt::{Message, PromptBuilder, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Whether a retry could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Network(_) | LlmError::Timeout)
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}
