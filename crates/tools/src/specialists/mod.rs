//! Specialist resolution policies
//!
//! Both policies implement the core `SpecialistResolver` trait:
//! - [`KeywordResolver`]: fixed keyword table, never empty (falls back to a
//!   general physician)
//! - [`DatasetResolver`]: weighted match against the symptom/disease
//!   reference dataset, empty when nothing clears the threshold

mod dataset;
mod keyword;

pub use dataset::{
    load_dataset, normalize_symptom, DatasetResolver, DiseaseRecord, RankedDisease,
    SymptomDataset, MAX_SYMPTOM_SLOTS,
};
pub use keyword::KeywordResolver;
