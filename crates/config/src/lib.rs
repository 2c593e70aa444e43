//! Layered configuration for the travel agent
//!
//! Settings come from `config/default` (YAML/TOML), an optional
//! environment-specific file, and `TRAVEL_AGENT__` environment variables,
//! highest priority last.

pub mod settings;

pub use settings::{
    load_settings, LlmSettings, ObservabilityConfig, RuntimeEnvironment, ServerConfig,
    SessionSettings, Settings, ToolSettings,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
