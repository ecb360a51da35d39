//! Error types shared across the medibot crates

use thiserror::Error;

/// Result alias used by the core traits
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the dialogue core
///
/// Only `Validation` is a client error. Upstream LLM failures (`EmptyCompletion`,
/// `CompletionUnavailable`, `Timeout`) propagate to the HTTP boundary; places
/// failures never reach this type because the lookup adapter absorbs them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("Empty response from language model")]
    EmptyCompletion,

    #[error("Language model unavailable: {0}")]
    CompletionUnavailable(String),

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Reference dataset error: {0}")]
    Dataset(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Missing or empty chat message
    pub fn missing_message() -> Self {
        Error::Validation("Message is required".to_string())
    }

    /// Whether the caller (rather than an upstream service) is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Whether this error came from the language model collaborator
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::EmptyCompletion | Error::CompletionUnavailable(_) | Error::Timeout(_)
        )
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::EmptyCompletion => "empty_completion",
            Error::CompletionUnavailable(_) => "completion_unavailable",
            Error::Timeout(_) => "timeout",
            Error::Dataset(_) => "dataset",
            Error::Configuration(_) => "configuration",
            Error::Internal(_) => "internal",
        }
    }
}
