//! Collaborator traits for the dialogue core
//!
//! Every external dependency of the dialogue engine sits behind one of these
//! traits so it can be swapped by configuration or mocked in tests.
//!
//! ```text
//! LanguageModel:      prompt text -> completion text
//! PlacesSearch:       query text  -> ranked places
//! SpecialistResolver: symptoms    -> ranked specialist categories
//! ```

mod llm;
mod places;
mod resolver;

pub use llm::LanguageModel;
pub use places::PlacesSearch;
pub use resolver::SpecialistResolver;
