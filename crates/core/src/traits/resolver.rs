//! Specialist resolution trait

use crate::SpecialistCategory;

/// Maps symptom descriptions to specialist categories
///
/// Both resolution policies (keyword table, symptom/disease dataset) implement
/// this trait so the dialogue engine does not care which one is active.
pub trait SpecialistResolver: Send + Sync + 'static {
    /// Ranked, deduplicated specialist categories, most relevant first
    fn resolve(&self, symptoms: &[String]) -> Vec<SpecialistCategory>;

    /// Policy name for logging and health output
    fn policy(&self) -> &'static str;
}
