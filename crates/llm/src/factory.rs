//! LLM Factory - Provider Abstraction Layer
//!
//! Creates LLM backends from `LlmSettings`.
//!
//! ## Supported Providers
//! - **Gemini**: hosted generateContent API (default)
//! - **Ollama**: local models for development
//!
//! ## Example
//! ```ignore
//! let llm = LlmFactory::create(&settings.llm)?;
//! let reply = llm.complete("hello").await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use medibot_config::{LlmProvider, LlmSettings};
use medibot_core::LanguageModel;

use crate::{
    adapter::CompletionAdapter,
    backend::{LlmBackend, LlmConfig, OllamaBackend},
    gemini::GeminiBackend,
    LlmError,
};

/// Factory for creating LLM backends
pub struct LlmFactory;

impl LlmFactory {
    /// Parse a provider name
    pub fn provider_from_str(s: &str) -> Option<LlmProvider> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Some(LlmProvider::Gemini),
            "ollama" | "local" => Some(LlmProvider::Ollama),
            _ => None,
        }
    }

    /// Create a raw backend for the configured provider
    pub fn create_backend(settings: &LlmSettings) -> Result<Arc<dyn LlmBackend>, LlmError> {
        let config = LlmConfig::from(settings);

        let backend: Arc<dyn LlmBackend> = match settings.provider {
            LlmProvider::Gemini => Arc::new(GeminiBackend::new(config)?),
            LlmProvider::Ollama => Arc::new(OllamaBackend::new(config)?),
        };

        tracing::info!(
            provider = ?settings.provider,
            model = %backend.model_name(),
            "Created LLM backend"
        );

        Ok(backend)
    }

    /// Create a `LanguageModel` with deadline and empty-completion retry
    pub fn create(settings: &LlmSettings) -> Result<Arc<dyn LanguageModel>, LlmError> {
        let backend = Self::create_backend(settings)?;
        Ok(Arc::new(CompletionAdapter::from_arc(
            backend,
            Duration::from_secs(settings.timeout_seconds),
            settings.empty_completion_retries,
        )))
    }
}
