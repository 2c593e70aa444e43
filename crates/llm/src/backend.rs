//! LLM backend trait and implementations.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::prompt::{Message, Role};
use crate::LlmError;
use travel_agent_config::LlmSettings;

/// Backend configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Chat-completions endpoint
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// API key, if the endpoint requires one
    pub api_key: Option<String>,
    /// Max tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Per-request timeout
    pub timeout: Duration,
    /// Max retries on transient failures
    pub max_retries: u32,
    /// Initial retry backoff
    pub initial_backoff: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/v1/chat/completions".to_string(),
            model: "llama3.1:8b".to_string(),
            api_key: None,
            max_tokens: 1024,
            temperature: 0.7,
            timeout: Duration::from_secs(60),
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl From<&LlmSettings> for LlmConfig {
    fn from(settings: &LlmSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: Duration::from_secs(settings.timeout_secs),
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// Why generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Error,
}

/// Result of one generation call
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub finish_reason: FinishReason,
    pub model: String,
}

/// Text generation backend
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a completion for the given messages
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError>;

    /// Whether the backend is reachable
    async fn is_available(&self) -> bool;

    /// Model name
    fn model_name(&self) -> &str;
}

// OpenAI-compatible wire format (also served by Ollama's /v1 endpoint)

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: WireResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
}

/// OpenAI-compatible HTTP backend
pub struct OpenAIBackend {
    config: LlmConfig,
    client: reqwest::Client,
}

impl OpenAIBackend {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;

        Ok(Self { config, client })
    }

    async fn generate_once(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: match m.role {
                        Role::System => "system",
                        Role::User => "user",
                        Role::Assistant => "assistant",
                    },
                    content: &m.content,
                })
                .collect(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            stream: false,
        };

        let mut builder = self.client.post(&self.config.endpoint).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!("{status}: {body}")));
            }
            return Err(LlmError::Api(format!("{status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

        let text = choice
            .message
            .content
            .ok_or_else(|| LlmError::InvalidResponse("empty message content".to_string()))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("stop") | None => FinishReason::Stop,
            Some(_) => FinishReason::Stop,
        };

        Ok(GenerationResult {
            text,
            finish_reason,
            model: self.config.model.clone(),
        })
    }
}

#[async_trait]
impl LlmBackend for OpenAIBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let mut backoff = self.config.initial_backoff;
        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            match self.generate_once(messages).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %e,
                        "LLM request failed, retrying after {:?}",
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| LlmError::Generation("retries exhausted".to_string())))
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(&self.config.endpoint)
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .is_ok()
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Canned-response backend for tests and offline development
pub struct MockBackend {
    responses: parking_lot::Mutex<Vec<String>>,
    fallback: String,
    fail: bool,
}

impl MockBackend {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            responses: parking_lot::Mutex::new(Vec::new()),
            fallback: fallback.into(),
            fail: false,
        }
    }

    /// Queue responses returned in order before falling back
    pub fn with_responses(self, responses: Vec<String>) -> Self {
        {
            let mut queue = self.responses.lock();
            *queue = responses;
            queue.reverse();
        }
        self
    }

    /// A backend whose every call fails
    pub fn failing() -> Self {
        Self {
            responses: parking_lot::Mutex::new(Vec::new()),
            fallback: String::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn generate(&self, _messages: &[Message]) -> Result<GenerationResult, LlmError> {
        if self.fail {
            return Err(LlmError::Network("mock backend unavailable".to_string()));
        }

        let text = self
            .responses
            .lock()
            .pop()
            .unwrap_or_else(|| self.fallback.clone());

        Ok(GenerationResult {
            text,
            finish_reason: FinishReason::Stop,
            model: "mock".to_string(),
        })
    }

    async fn is_available(&self) -> bool {
        !self.fail
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Message;

    #[tokio::test]
    async fn test_mock_backend_queue() {
        let backend =
            MockBackend::new("fallback").with_responses(vec!["first".into(), "second".into()]);

        let messages = vec![Message::user("hi")];
        assert_eq!(backend.generate(&messages).await.unwrap().text, "first");
        assert_eq!(backend.generate(&messages).await.unwrap().text, "second");
        assert_eq!(backend.generate(&messages).await.unwrap().text, "fallback");
    }

    #[tokio::test]
    async fn test_mock_backend_failure() {
        let backend = MockBackend::failing();
        let result = backend.generate(&[Message::user("hi")]).await;
        assert!(matches!(result, Err(LlmError::Network(_))));
        assert!(!backend.is_available().await);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(LlmError::Timeout.is_retryable());
        assert!(LlmError::Network("503".into()).is_retryable());
        assert!(!LlmError::Api("400".into()).is_retryable());
        assert!(!LlmError::InvalidResponse("bad json".into()).is_retryable());
    }

    #[test]
    fn test_config_from_settings() {
        let settings = travel_agent_config::LlmSettings::default();
        let config = LlmConfig::from(&settings);
        assert_eq!(config.model, settings.model);
        assert_eq!(config.timeout, Duration::from_secs(settings.timeout_secs));
    }
}
