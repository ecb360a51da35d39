//! LLM Backend implementations
//!
//! A backend turns one prompt into one completion. Transient failures
//! (network errors, 5xx, timeouts) are retried with exponential backoff;
//! 4xx answers are returned immediately.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};

use medibot_config::LlmSettings;

use crate::LlmError;

/// LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model name/ID
    pub model: String,
    /// API endpoint
    pub endpoint: String,
    /// API key (optional)
    pub api_key: Option<String>,
    /// Maximum tokens to generate
    pub max_tokens: usize,
    /// Temperature
    pub temperature: f32,
    /// Top-p sampling
    pub top_p: f32,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum retry attempts for transient failures
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry)
    pub initial_backoff: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::from(&LlmSettings::default())
    }
}

impl From<&LlmSettings> for LlmConfig {
    fn from(settings: &LlmSettings) -> Self {
        Self {
            model: settings.model.clone(),
            endpoint: settings.resolved_endpoint(),
            api_key: settings.api_key.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            top_p: settings.top_p,
            timeout: Duration::from_secs(settings.timeout_seconds),
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
        }
    }
}

/// LLM generation result
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Generated text
    pub text: String,
    /// Total generation time (ms)
    pub total_time_ms: u64,
    /// Finish reason
    pub finish_reason: FinishReason,
}

/// Finish reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    /// Blocked by the provider's safety filters
    Safety,
    Other,
}

/// LLM Backend trait
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a completion for a single prompt
    async fn generate(&self, prompt: &str) -> Result<GenerationResult, LlmError>;

    /// Check if model is available
    async fn is_available(&self) -> bool;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Check if an error is worth another attempt
pub(crate) fn is_retryable(error: &LlmError) -> bool {
    matches!(error, LlmError::Network(_) | LlmError::Timeout)
}

/// Run `attempt` up to `max_retries + 1` times with exponential backoff
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    config: &LlmConfig,
    mut attempt: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut last_error = None;
    let mut backoff = config.initial_backoff;

    for n in 0..=config.max_retries {
        if n > 0 {
            tracing::warn!(
                "LLM request failed, retrying in {:?} (attempt {}/{})",
                backoff,
                n,
                config.max_retries
            );
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }

        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if is_retryable(&e) => last_error = Some(e),
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or_else(|| LlmError::Network("Max retries exceeded".to_string())))
}

/// Map a non-success HTTP status to an error; 5xx are retryable
pub(crate) async fn status_error(response: reqwest::Response) -> LlmError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status.is_server_error() {
        LlmError::Network(format!("Server error {}: {}", status, body))
    } else {
        LlmError::Api(format!("{}: {}", status, body))
    }
}

/// Ollama backend for local development
///
/// Uses the non-streaming `/api/generate` endpoint: one prompt in, one
/// completion out.
#[derive(Clone)]
pub struct OllamaBackend {
    client: Client,
    config: LlmConfig,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Build the API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.endpoint, path)
    }

    fn build_request(&self, prompt: &str) -> OllamaGenerateRequest {
        OllamaGenerateRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: Some(OllamaOptions {
                temperature: Some(self.config.temperature),
                top_p: Some(self.config.top_p),
                num_predict: Some(self.config.max_tokens as i32),
            }),
        }
    }

    /// Execute a single request (used by retry logic)
    async fn execute_request(
        &self,
        request: &OllamaGenerateRequest,
    ) -> Result<OllamaGenerateResponse, LlmError> {
        let response = self
            .client
            .post(self.api_url("/generate"))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn generate(&self, prompt: &str) -> Result<GenerationResult, LlmError> {
        let start = Instant::now();
        let request = self.build_request(prompt);

        let result = retry_with_backoff(&self.config, || self.execute_request(&request)).await?;

        Ok(GenerationResult {
            text: result.response,
            total_time_ms: start.elapsed().as_millis() as u64,
            finish_reason: match result.done_reason.as_deref() {
                Some("length") => FinishReason::Length,
                _ if result.done => FinishReason::Stop,
                _ => FinishReason::Other,
            },
        })
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(self.api_url("/tags"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Ollama API types
#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_retries: u32) -> LlmConfig {
        LlmConfig {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_config_from_settings() {
        let settings = LlmSettings {
            timeout_seconds: 12,
            initial_backoff_ms: 50,
            ..LlmSettings::default()
        };
        let config = LlmConfig::from(&settings);
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.initial_backoff, Duration::from_millis(50));
    }

    #[test]
    fn test_ollama_request_serialization() {
        let backend = OllamaBackend::new(LlmConfig {
            model: "llama3".to_string(),
            ..LlmConfig::default()
        })
        .unwrap();

        let json = serde_json::to_value(backend.build_request("hello")).unwrap();
        assert_eq!(json["model"], "llama3");
        assert_eq!(json["prompt"], "hello");
        assert_eq!(json["stream"], false);
        assert!(json["options"]["num_predict"].is_number());
    }

    #[test]
    fn test_ollama_response_parsing() {
        let body = r#"{"model":"llama3","response":"Hi there","done":true,"done_reason":"stop"}"#;
        let parsed: OllamaGenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.response, "Hi there");
        assert!(parsed.done);
    }

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(&LlmError::Timeout));
        assert!(is_retryable(&LlmError::Network("reset".into())));
        assert!(!is_retryable(&LlmError::Api("400".into())));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_errors() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(&fast_config(2), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(LlmError::Network("reset".into()))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff(&fast_config(1), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Timeout)
        })
        .await;

        assert!(matches!(result, Err(LlmError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff(&fast_config(3), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Api("401".into()))
        })
        .await;

        assert!(matches!(result, Err(LlmError::Api(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
