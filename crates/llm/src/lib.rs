//! Language model integration
//!
//! Features:
//! - Hosted Gemini and local Ollama backends with retry and backoff
//! - Provider factory driven by `LlmSettings`
//! - Prompt construction with the marker-line output grammar
//! - `CompletionAdapter` implementing the core `LanguageModel` contract

pub mod adapter;
pub mod backend;
pub mod factory;
pub mod gemini;
pub mod prompt;

pub use adapter::CompletionAdapter;
pub use backend::{FinishReason, GenerationResult, LlmBackend, LlmConfig, OllamaBackend};
pub use factory::LlmFactory;
pub use gemini::GeminiBackend;
pub use prompt::PromptBuilder;

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
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

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for medibot_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout => medibot_core::Error::Timeout("language model".to_string()),
            LlmError::Configuration(msg) => medibot_core::Error::Configuration(msg),
            other => medibot_core::Error::CompletionUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medibot_core::Error;

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            Error::from(LlmError::Timeout),
            Error::Timeout("language model".to_string())
        );
        assert!(matches!(
            Error::from(LlmError::Api("quota".into())),
            Error::CompletionUnavailable(msg) if msg.contains("quota")
        ));
    }
}
