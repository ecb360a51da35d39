//! Collaborator construction from settings
//!
//! The resolver is built once at startup; with the dataset policy an
//! unreadable or invalid dataset is a startup error.

use std::sync::Arc;

use medibot_config::{PlacesSettings, ResolverConfig, ResolverPolicy};
use medibot_core::{PlacesSearch, SpecialistResolver};

use crate::places::{GooglePlacesClient, StubPlacesSearch};
use crate::specialists::{load_dataset, DatasetResolver, KeywordResolver};
use crate::ToolsError;

/// Build the configured specialist resolver
pub fn create_resolver(config: &ResolverConfig) -> Result<Arc<dyn SpecialistResolver>, ToolsError> {
    let resolver: Arc<dyn SpecialistResolver> = match config.policy {
        ResolverPolicy::Keyword => Arc::new(KeywordResolver::new()),
        ResolverPolicy::Dataset => {
            let dataset = load_dataset(&config.dataset_path)?;
            Arc::new(DatasetResolver::new(
                dataset,
                config.min_match_ratio,
                config.max_diseases,
            ))
        }
    };

    tracing::info!(policy = resolver.policy(), "Specialist resolver ready");
    Ok(resolver)
}

/// Build the places directory client, falling back to the stub without a key
pub fn create_places(settings: &PlacesSettings) -> Arc<dyn PlacesSearch> {
    match GooglePlacesClient::new(settings) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::warn!(error = %e, "Places directory disabled, using stub");
            Arc::new(StubPlacesSearch::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_keyword_policy() {
        let resolver = create_resolver(&ResolverConfig::default()).unwrap();
        assert_eq!(resolver.policy(), "keyword");
    }

    #[test]
    fn test_dataset_policy_loads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"disease": "Acne", "specialist": "dermatologist", "symptoms": ["skin_rash", "pus_filled_pimples"]}}]"#
        )
        .unwrap();

        let config = ResolverConfig {
            policy: ResolverPolicy::Dataset,
            dataset_path: file.path().display().to_string(),
            ..ResolverConfig::default()
        };
        let resolver = create_resolver(&config).unwrap();
        assert_eq!(resolver.policy(), "dataset");
        assert_eq!(resolver.resolve(&["skin rash".to_string()]), vec!["dermatologist"]);
    }

    #[test]
    fn test_dataset_policy_fails_fast() {
        let config = ResolverConfig {
            policy: ResolverPolicy::Dataset,
            dataset_path: "/nonexistent/dataset.json".to_string(),
            ..ResolverConfig::default()
        };
        assert!(create_resolver(&config).is_err());
    }

    #[test]
    fn test_places_stub_without_key() {
        let places = create_places(&PlacesSettings {
            api_key: None,
            ..PlacesSettings::default()
        });
        assert_eq!(places.name(), "stub");
    }
}
