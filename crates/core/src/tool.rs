//! Tool trait and error types for external data adapters.
//!
//! Tools are the only source of time-sensitive numeric data (forecasts,
//! exchange rates). The dialogue policy never lets the LLM substitute for
//! a failed tool call, so the error kinds here map one-to-one onto
//! user-facing unavailability messages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Tool invocation arguments, as a JSON object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub arguments: Value,
}

impl ToolInput {
    pub fn new(arguments: Value) -> Self {
        Self { arguments }
    }

    /// Fetch a required string argument
    pub fn str_arg(&self, name: &str) -> Result<&str, ToolError> {
        self.arguments
            .get(name)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidArguments(format!("missing argument '{name}'")))
    }

    /// Fetch a required numeric argument
    pub fn f64_arg(&self, name: &str) -> Result<f64, ToolError> {
        self.arguments
            .get(name)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| ToolError::InvalidArguments(format!("missing argument '{name}'")))
    }
}

/// Tool result payload, as a JSON object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub result: Value,
}

impl ToolOutput {
    pub fn new(result: Value) -> Self {
        Self { result }
    }
}

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Location not found: {0}")]
    NotFound(String),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Timeout")]
    Timeout,
}

impl ToolError {
    /// Whether retrying the same call later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ToolError::Upstream(_) | ToolError::Timeout)
    }
}

/// An external data adapter
#[async_trait]
pub trait Tool: Send + Sync {
    /// Registry name
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Per-call deadline; elapsed calls become `ToolError::Timeout`
    fn timeout_secs(&self) -> u64 {
        15
    }

    /// Execute with JSON arguments
    async fn execute(&self, input: ToolInput) -> Result<ToolOutput, ToolError>;
}
