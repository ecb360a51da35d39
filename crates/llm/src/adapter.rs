//! Completion adapter
//!
//! Bridges the LlmBackend trait to the core LanguageModel trait, adding the
//! per-call deadline and the bounded retry on blank completions.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

use medibot_core::{Error, LanguageModel, Result};

use crate::backend::LlmBackend;

/// Adapter that wraps an LlmBackend to implement the core LanguageModel trait.
///
/// # Example
///
/// ```ignore
/// let backend = GeminiBackend::new(config)?;
/// let llm: Arc<dyn LanguageModel> = Arc::new(
///     CompletionAdapter::new(backend, Duration::from_secs(30), 1)
/// );
/// ```
pub struct CompletionAdapter {
    backend: Arc<dyn LlmBackend>,
    model_name: String,
    timeout: Duration,
    empty_retries: u32,
}

impl CompletionAdapter {
    /// Create a new adapter wrapping an LlmBackend
    pub fn new<B: LlmBackend + 'static>(backend: B, timeout: Duration, empty_retries: u32) -> Self {
        Self::from_arc(Arc::new(backend), timeout, empty_retries)
    }

    /// Create from an Arc'd backend
    pub fn from_arc(backend: Arc<dyn LlmBackend>, timeout: Duration, empty_retries: u32) -> Self {
        let model_name = backend.model_name().to_string();
        Self {
            backend,
            model_name,
            timeout,
            empty_retries,
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<String> {
        let generation = tokio::time::timeout(self.timeout, self.backend.generate(prompt))
            .await
            .map_err(|_| Error::Timeout("language model".to_string()))??;

        let text = generation.text.trim();
        if text.is_empty() {
            tracing::warn!(
                model = %self.model_name,
                finish_reason = ?generation.finish_reason,
                "Received empty completion"
            );
            return Err(Error::EmptyCompletion);
        }

        Ok(text.to_string())
    }
}

#[async_trait]
impl LanguageModel for CompletionAdapter {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let mut attempts_left = self.empty_retries;

        let result = loop {
            match self.attempt(prompt).await {
                Err(Error::EmptyCompletion) if attempts_left > 0 => {
                    attempts_left -= 1;
                    tracing::debug!(model = %self.model_name, "Retrying after empty completion");
                }
                other => break other,
            }
        };

        metrics::histogram!("medibot_llm_latency_seconds").record(start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            tracing::error!(model = %self.model_name, error = %e, "Language model call failed");
        }
        result
    }

    async fn is_available(&self) -> bool {
        self.backend.is_available().await
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FinishReason, GenerationResult};
    use crate::LlmError;
    use std::sync::Mutex;

    /// Backend answering from a fixed script, one entry per call
    struct Scripted {
        replies: Mutex<Vec<std::result::Result<&'static str, LlmError>>>,
        delay: Duration,
    }

    #[async_trait]
    impl LlmBackend for Scripted {
        async fn generate(&self, _prompt: &str) -> std::result::Result<GenerationResult, LlmError> {
            tokio::time::sleep(self.delay).await;
            let next = self.replies.lock().unwrap().remove(0);
            next.map(|text| GenerationResult {
                text: text.to_string(),
                total_time_ms: 0,
                finish_reason: FinishReason::Stop,
            })
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn adapter(
        replies: Vec<std::result::Result<&'static str, LlmError>>,
        empty_retries: u32,
    ) -> CompletionAdapter {
        CompletionAdapter::new(
            Scripted {
                replies: Mutex::new(replies),
                delay: Duration::ZERO,
            },
            Duration::from_secs(5),
            empty_retries,
        )
    }

    #[tokio::test]
    async fn test_returns_trimmed_text() {
        let llm = adapter(vec![Ok("  Please rate your pain.\n")], 1);
        assert_eq!(llm.complete("hi").await.unwrap(), "Please rate your pain.");
        assert_eq!(llm.model_name(), "scripted");
    }

    #[tokio::test]
    async fn test_retries_one_empty_completion() {
        let llm = adapter(vec![Ok("   "), Ok("Second try")], 1);
        assert_eq!(llm.complete("hi").await.unwrap(), "Second try");
    }

    #[tokio::test]
    async fn test_empty_completion_after_retries() {
        let llm = adapter(vec![Ok(""), Ok("")], 1);
        assert_eq!(llm.complete("hi").await, Err(Error::EmptyCompletion));
    }

    #[tokio::test]
    async fn test_no_retry_when_disabled() {
        let llm = adapter(vec![Ok(""), Ok("unused")], 0);
        assert_eq!(llm.complete("hi").await, Err(Error::EmptyCompletion));
    }

    #[tokio::test]
    async fn test_backend_failure_maps_to_unavailable() {
        let llm = adapter(vec![Err(LlmError::Api("403 forbidden".into()))], 1);
        assert!(matches!(
            llm.complete("hi").await,
            Err(Error::CompletionUnavailable(msg)) if msg.contains("403")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_maps_to_timeout() {
        let llm = CompletionAdapter::new(
            Scripted {
                replies: Mutex::new(vec![Ok("too late")]),
                delay: Duration::from_secs(60),
            },
            Duration::from_secs(1),
            0,
        );
        assert_eq!(
            llm.complete("hi").await,
            Err(Error::Timeout("language model".to_string()))
        );
    }
}
