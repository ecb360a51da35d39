//! Provider lookup
//!
//! Turns a specialist category (plus an optional location) into a places
//! query and keeps the directory's top result. Callers only ever see
//! "found" or "not found": directory errors are logged here and absorbed.

use std::sync::Arc;

use medibot_config::PlacesSettings;
use medibot_core::{Coordinates, PlacesSearch, ProviderRecord};

/// Provider lookup over a places directory
#[derive(Clone)]
pub struct ProviderLookup {
    places: Arc<dyn PlacesSearch>,
    default_location: Option<String>,
    bias_location: Option<Coordinates>,
    radius_meters: Option<u32>,
}

impl ProviderLookup {
    pub fn new(places: Arc<dyn PlacesSearch>) -> Self {
        Self {
            places,
            default_location: None,
            bias_location: None,
            radius_meters: None,
        }
    }

    /// Lookup using the default location and ranking bias from settings
    pub fn from_settings(places: Arc<dyn PlacesSearch>, settings: &PlacesSettings) -> Self {
        Self {
            places,
            default_location: settings
                .default_location
                .clone()
                .filter(|l| !l.trim().is_empty()),
            bias_location: settings.bias_location,
            radius_meters: settings.radius_meters,
        }
    }

    pub fn with_default_location(mut self, location: impl Into<String>) -> Self {
        self.default_location = Some(location.into());
        self
    }

    /// Map category synonyms onto the term the directory indexes
    pub fn normalize_category(category: &str) -> String {
        let category = category.trim().to_lowercase();

        if category.contains("general physician")
            || category.contains("general practitioner")
            || category.contains("primary care")
        {
            return "family doctor".to_string();
        }

        match category.strip_suffix(" specialist") {
            Some(stripped) if !stripped.trim().is_empty() => stripped.trim().to_string(),
            _ => category,
        }
    }

    /// `<category> doctor [near <location> | in <default-location>]`
    pub fn build_query(&self, category: &str, location: Option<&str>) -> String {
        let normalized = Self::normalize_category(category);
        let mut query = if normalized.ends_with("doctor") {
            normalized
        } else {
            format!("{} doctor", normalized)
        };

        match (location.map(str::trim).filter(|l| !l.is_empty()), &self.default_location) {
            (Some(location), _) => query.push_str(&format!(" near {}", location)),
            (None, Some(default)) => query.push_str(&format!(" in {}", default)),
            (None, None) => {}
        }

        query
    }

    /// Top-ranked provider for the category, if any
    pub async fn lookup(&self, category: &str, location: Option<&str>) -> Option<ProviderRecord> {
        let query = self.build_query(category, location);

        match self
            .places
            .search(&query, self.bias_location, self.radius_meters)
            .await
        {
            Ok(results) => {
                let provider = results.into_iter().next().map(ProviderRecord::from);
                if provider.is_none() {
                    tracing::info!(query = %query, "No provider found");
                }
                provider
            }
            Err(e) => {
                tracing::warn!(
                    query = %query,
                    places = %self.places.name(),
                    error = %e,
                    "Provider lookup failed"
                );
                None
            }
        }
    }
}
