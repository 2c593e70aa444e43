//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Runtime environment enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM backend configuration
    #[serde(default)]
    pub llm: LlmSettings,

    /// Tool adapter configuration
    #[serde(default)]
    pub tools: ToolSettings,

    /// Session lifecycle configuration
    #[serde(default)]
    pub session: SessionSettings,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_llm()?;
        self.validate_tools()?;
        self.validate_session()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if self.environment.is_production()
            && self.server.cors_enabled
            && self.server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured. \
                 This may block legitimate requests."
            );
        }

        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        if self.llm.model.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "llm.model".to_string(),
                message: "Model name cannot be empty".to_string(),
            });
        }

        if self.llm.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_tokens".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".to_string(),
                message: format!("Must be between 0.0 and 2.0, got {}", self.llm.temperature),
            });
        }

        Ok(())
    }

    fn validate_tools(&self) -> Result<(), ConfigError> {
        if self.tools.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tools.timeout_secs".to_string(),
                message: "Must be at least 1 second".to_string(),
            });
        }

        // Open-Meteo only serves forecasts ~16 days out
        if self.tools.forecast_horizon_days == 0 || self.tools.forecast_horizon_days > 16 {
            return Err(ConfigError::InvalidValue {
                field: "tools.forecast_horizon_days".to_string(),
                message: format!(
                    "Must be between 1 and 16, got {}",
                    self.tools.forecast_horizon_days
                ),
            });
        }

        Ok(())
    }

    fn validate_session(&self) -> Result<(), ConfigError> {
        if self.session.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.max_sessions".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.session.max_history_turns < 2 {
            return Err(ConfigError::InvalidValue {
                field: "session.max_history_turns".to_string(),
                message: "Must keep at least one user/assistant exchange".to_string(),
            });
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: default_true(),
            // Empty by default - must be explicitly configured for production
            cors_origins: Vec::new(),
        }
    }
}

/// LLM backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Chat-completions endpoint
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key (set via TRAVEL_AGENT__LLM__API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Max tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Max retries on transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_llm_endpoint() -> String {
    "http://localhost:11434/v1/chat/completions".to_string()
}
fn default_llm_model() -> String {
    "llama3.1:8b".to_string()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_temperature() -> f32 {
    0.7
}
fn default_llm_timeout() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    2
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// Tool adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Open-Meteo geocoding endpoint
    #[serde(default = "default_geocoding_endpoint")]
    pub geocoding_endpoint: String,

    /// Open-Meteo forecast endpoint
    #[serde(default = "default_forecast_endpoint")]
    pub forecast_endpoint: String,

    /// Frankfurter exchange-rate endpoint
    #[serde(default = "default_currency_endpoint")]
    pub currency_endpoint: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,

    /// Forecast horizon supported by the weather API, in days
    #[serde(default = "default_forecast_horizon")]
    pub forecast_horizon_days: u32,
}

fn default_geocoding_endpoint() -> String {
    "https://geocoding-api.open-meteo.com/v1/search".to_string()
}
fn default_forecast_endpoint() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}
fn default_currency_endpoint() -> String {
    "https://api.frankfurter.dev/v1".to_string()
}
fn default_tool_timeout() -> u64 {
    15
}
fn default_forecast_horizon() -> u32 {
    16
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            geocoding_endpoint: default_geocoding_endpoint(),
            forecast_endpoint: default_forecast_endpoint(),
            currency_endpoint: default_currency_endpoint(),
            timeout_secs: default_tool_timeout(),
            forecast_horizon_days: default_forecast_horizon(),
        }
    }
}

/// Session lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Max concurrent sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle session time-to-live in seconds
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,

    /// Cleanup sweep interval in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,

    /// Conversation turns kept per session
    #[serde(default = "default_max_history")]
    pub max_history_turns: usize,
}

fn default_max_sessions() -> usize {
    1000
}
fn default_session_ttl() -> u64 {
    3600
}
fn default_cleanup_interval() -> u64 {
    60
}
fn default_max_history() -> usize {
    12
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            ttl_secs: default_session_ttl(),
            cleanup_interval_secs: default_cleanup_interval(),
            max_history_turns: default_max_history(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (TRAVEL_AGENT_ prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("TRAVEL_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.session.max_history_turns, 12);
        assert_eq!(settings.tools.forecast_horizon_days, 16);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_server_validation() {
        let mut settings = Settings::default();

        settings.server.port = 0;
        assert!(settings.validate().is_err());
        settings.server.port = 8080;

        settings.server.timeout_seconds = 0;
        assert!(settings.validate().is_err());
        settings.server.timeout_seconds = 30;

        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_llm_validation() {
        let mut settings = Settings::default();

        settings.llm.temperature = 3.0;
        assert!(settings.validate().is_err());
        settings.llm.temperature = 0.7;

        settings.llm.model = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_forecast_horizon_bounds() {
        let mut settings = Settings::default();

        settings.tools.forecast_horizon_days = 0;
        assert!(settings.validate().is_err());

        settings.tools.forecast_horizon_days = 30;
        assert!(settings.validate().is_err());

        settings.tools.forecast_horizon_days = 16;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_session_validation() {
        let mut settings = Settings::default();

        settings.session.max_history_turns = 1;
        assert!(settings.validate().is_err());

        settings.session.max_history_turns = 12;
        settings.session.max_sessions = 0;
        assert!(settings.validate().is_err());
    }
}
