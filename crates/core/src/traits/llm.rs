//! Language model trait

use async_trait::async_trait;

use crate::Result;

/// Hosted text-completion service
///
/// Implementations:
/// - `CompletionAdapter` in `medibot-llm` wrapping a Gemini or Ollama backend
///
/// # Errors
/// - `Error::EmptyCompletion` when the service answers with blank text
/// - `Error::CompletionUnavailable` on transport or service failure
/// - `Error::Timeout` when the call exceeds its deadline
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Complete a single prompt
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Check if the backing service is reachable
    async fn is_available(&self) -> bool {
        true
    }

    /// Model name for logging
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct EchoLlm;

    #[async_trait]
    impl LanguageModel for EchoLlm {
        async fn complete(&self, prompt: &str) -> Result<String> {
            if prompt.trim().is_empty() {
                return Err(Error::EmptyCompletion);
            }
            Ok(prompt.to_uppercase())
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let llm: Box<dyn LanguageModel> = Box::new(EchoLlm);
        assert_eq!(llm.complete("hello").await.unwrap(), "HELLO");
        assert_eq!(llm.complete("  ").await, Err(Error::EmptyCompletion));
        assert!(llm.is_available().await);
        assert_eq!(llm.model_name(), "echo");
    }
}
