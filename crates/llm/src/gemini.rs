//! Gemini generateContent backend
//!
//! `POST {endpoint}/models/{model}:generateContent?key=...` with a single
//! user turn. The text parts of the first candidate are concatenated.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::backend::{retry_with_backoff, status_error, FinishReason, GenerationResult, LlmBackend, LlmConfig};
use crate::LlmError;

/// Hosted Gemini backend
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    config: LlmConfig,
    api_key: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend; fails without an API key
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::Configuration("Gemini API key is not set".to_string()))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint, self.config.model
        )
    }

    fn build_request(&self, prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                max_output_tokens: self.config.max_tokens as u32,
            },
        }
    }

    async fn execute_request(&self, request: &GeminiRequest) -> Result<GeminiResponse, LlmError> {
        let response = self
            .client
            .post(self.generate_url())
            .query(&[("key", self.api_key.as_str())])
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
impl LlmBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<GenerationResult, LlmError> {
        let start = Instant::now();
        let request = self.build_request(prompt);

        let response = retry_with_backoff(&self.config, || self.execute_request(&request)).await?;

        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(LlmError::Api(format!("Prompt blocked: {}", reason)));
        }

        let (text, finish_reason) = response.into_text();

        Ok(GenerationResult {
            text,
            total_time_ms: start.elapsed().as_millis() as u64,
            finish_reason,
        })
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/models/{}", self.config.endpoint, self.config.model))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Gemini API types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate; empty when there is none
    fn into_text(self) -> (String, FinishReason) {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return (String::new(), FinishReason::Other);
        };

        let text = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<String>();

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") => FinishReason::Safety,
            _ => FinishReason::Other,
        };

        (text, finish_reason)
    }
}
