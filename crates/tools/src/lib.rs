//! Specialist and provider tools for the medical assistant
//!
//! - **Specialists**: keyword-table and dataset-backed resolvers behind the
//!   core `SpecialistResolver` trait
//! - **Places**: Google Places Text Search client and a no-op stub
//! - **Provider lookup**: category normalization, query building and
//!   first-result selection, absorbing every directory failure

pub mod factory;
pub mod places;
pub mod provider_lookup;
pub mod specialists;

pub use factory::{create_places, create_resolver};
pub use places::{GooglePlacesClient, StubPlacesSearch};
pub use provider_lookup::ProviderLookup;
pub use specialists::{
    load_dataset, DatasetResolver, DiseaseRecord, KeywordResolver, RankedDisease, SymptomDataset,
};

use thiserror::Error;

/// Tool errors
#[derive(Error, Debug)]
pub enum ToolsError {
    #[error("Failed to read dataset {path}: {message}")]
    DatasetIo { path: String, message: String },

    #[error("Failed to parse dataset: {0}")]
    DatasetParse(String),

    #[error("Invalid dataset: {0}")]
    DatasetInvalid(String),

    #[error("Places request failed: {0}")]
    PlacesTransport(String),

    #[error("Places request timed out")]
    PlacesTimeout,

    #[error("Places returned status {status}: {message}")]
    PlacesStatus { status: String, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for ToolsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ToolsError::PlacesTimeout
        } else {
            ToolsError::PlacesTransport(err.to_string())
        }
    }
}

impl From<ToolsError> for medibot_core::Error {
    fn from(err: ToolsError) -> Self {
        match err {
            ToolsError::DatasetIo { .. }
            | ToolsError::DatasetParse(_)
            | ToolsError::DatasetInvalid(_) => medibot_core::Error::Dataset(err.to_string()),
            ToolsError::PlacesTimeout => medibot_core::Error::Timeout("places directory".to_string()),
            ToolsError::Configuration(msg) => medibot_core::Error::Configuration(msg),
            other => medibot_core::Error::Internal(other.to_string()),
        }
    }
}
