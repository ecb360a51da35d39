//! Application State
//!
//! Shared state across all handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;

use medibot_agent::{DialogueEngine, SessionStore};
use medibot_config::Settings;
use medibot_core::{LanguageModel, PlacesSearch, SpecialistResolver};
use medibot_tools::ProviderLookup;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub engine: DialogueEngine,
    /// Prometheus handle, `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the dialogue engine from its collaborators
    pub fn new(
        config: Settings,
        llm: Arc<dyn LanguageModel>,
        resolver: Arc<dyn SpecialistResolver>,
        places: Arc<dyn PlacesSearch>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::from_config(&config.dialogue));
        let lookup = ProviderLookup::from_settings(places, &config.places);
        let engine = DialogueEngine::new(llm, resolver, lookup, sessions)
            .with_staleness(Duration::from_secs(config.dialogue.staleness_seconds));

        Self {
            config: Arc::new(config),
            engine,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        self.engine.sessions()
    }

    /// User identifier for requests that carry none
    pub fn default_user_id(&self) -> &str {
        &self.config.dialogue.default_user_id
    }
}
