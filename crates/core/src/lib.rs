//! Core traits and types for the medical assistant chatbot
//!
//! This crate provides foundational types used across all other crates:
//! - Collaborator traits (language model, places directory, specialist resolver)
//! - Domain records (providers, schedule directives, response envelopes)
//! - Error types

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{LanguageModel, PlacesSearch, SpecialistResolver};
pub use types::{
    Coordinates, PlaceResult, ProviderRecord, ResponseEnvelope, ScheduleDirective,
    SpecialistCategory, GENERAL_PHYSICIAN,
};
