//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use medibot_core::Coordinates;

use crate::constants::{endpoints, resolver, sessions, timeouts};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Hosted language model
    #[serde(default)]
    pub llm: LlmSettings,

    /// Places directory used for provider lookups
    #[serde(default)]
    pub places: PlacesSettings,

    /// Conversation state and routing
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// Specialist resolution policy
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_llm()?;
        self.validate_dialogue()?;
        self.validate_resolver()?;

        if self.environment.is_strict() {
            if self.llm.provider == LlmProvider::Gemini && self.llm.api_key.is_none() {
                return Err(ConfigError::MissingField("llm.api_key".to_string()));
            }
            if self.places.api_key.is_none() {
                tracing::warn!("places.api_key not set, provider lookups will find nothing");
            }
        }

        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        // Worst case on the delegated path: every LLM attempt, then one places lookup
        let upstream_budget = self.llm.timeout_seconds * (u64::from(self.llm.max_retries) + 1)
            + self.places.timeout_seconds;
        if self.server.request_timeout_seconds < self.llm.timeout_seconds {
            return Err(ConfigError::InvalidValue {
                field: "server.request_timeout_seconds".to_string(),
                message: format!(
                    "Must be at least llm.timeout_seconds ({}), got {}",
                    self.llm.timeout_seconds, self.server.request_timeout_seconds
                ),
            });
        }
        if self.server.request_timeout_seconds < upstream_budget {
            tracing::warn!(
                "server.request_timeout_seconds ({}) is shorter than the worst-case upstream budget ({}s), \
                 slow turns will fail with a timeout error",
                self.server.request_timeout_seconds,
                upstream_budget
            );
        }

        Ok(())
    }

    fn validate_llm(&self) -> Result<(), ConfigError> {
        let llm = &self.llm;

        if llm.model.trim().is_empty() {
            return Err(ConfigError::MissingField("llm.model".to_string()));
        }

        if !(0.0..=2.0).contains(&llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".to_string(),
                message: format!("Must be between 0.0 and 2.0, got {}", llm.temperature),
            });
        }

        if !(0.0..=1.0).contains(&llm.top_p) {
            return Err(ConfigError::InvalidValue {
                field: "llm.top_p".to_string(),
                message: format!("Must be between 0.0 and 1.0, got {}", llm.top_p),
            });
        }

        if llm.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.timeout_seconds".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if llm.empty_completion_retries > 3 {
            return Err(ConfigError::InvalidValue {
                field: "llm.empty_completion_retries".to_string(),
                message: format!("Must be at most 3, got {}", llm.empty_completion_retries),
            });
        }

        Ok(())
    }

    fn validate_dialogue(&self) -> Result<(), ConfigError> {
        let dialogue = &self.dialogue;

        if dialogue.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.max_sessions".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if dialogue.session_idle_ttl_seconds < dialogue.staleness_seconds {
            return Err(ConfigError::InvalidValue {
                field: "dialogue.session_idle_ttl_seconds".to_string(),
                message: format!(
                    "Must be at least dialogue.staleness_seconds ({}), got {}",
                    dialogue.staleness_seconds, dialogue.session_idle_ttl_seconds
                ),
            });
        }

        if dialogue.default_user_id.trim().is_empty() {
            return Err(ConfigError::MissingField("dialogue.default_user_id".to_string()));
        }

        Ok(())
    }

    fn validate_resolver(&self) -> Result<(), ConfigError> {
        let resolver = &self.resolver;

        if !(0.0..=1.0).contains(&resolver.min_match_ratio) || resolver.min_match_ratio == 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "resolver.min_match_ratio".to_string(),
                message: format!(
                    "Must be in (0.0, 1.0], got {}",
                    resolver.min_match_ratio
                ),
            });
        }

        if resolver.max_diseases == 0 {
            return Err(ConfigError::InvalidValue {
                field: "resolver.max_diseases".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if resolver.policy == ResolverPolicy::Dataset && resolver.dataset_path.trim().is_empty() {
            return Err(ConfigError::MissingField("resolver.dataset_path".to_string()));
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5001
}
fn default_request_timeout() -> u64 {
    timeouts::HTTP_REQUEST_SECS
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Hosted Gemini generateContent API
    #[default]
    Gemini,
    /// Local Ollama server
    Ollama,
}

/// Language model settings
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub provider: LlmProvider,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API endpoint; provider default when unset
    #[serde(default)]
    pub endpoint: Option<String>,

    /// API key (set via GEMINI_API_KEY or MEDIBOT__LLM__API_KEY)
    #[serde(default = "default_llm_api_key")]
    pub api_key: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,

    /// Retries for transient transport failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff, doubled on each retry
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Extra attempts when the model answers with blank text
    #[serde(default = "default_empty_completion_retries")]
    pub empty_completion_retries: u32,
}

fn default_llm_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_llm_api_key() -> Option<String> {
    std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty())
}
fn default_max_tokens() -> usize {
    1024
}
fn default_temperature() -> f32 {
    0.4
}
fn default_top_p() -> f32 {
    0.95
}
fn default_llm_timeout() -> u64 {
    timeouts::LLM_REQUEST_SECS
}
fn default_max_retries() -> u32 {
    2
}
fn default_initial_backoff_ms() -> u64 {
    200
}
fn default_empty_completion_retries() -> u32 {
    1
}

impl LlmSettings {
    /// Endpoint to call, falling back to the provider default
    pub fn resolved_endpoint(&self) -> String {
        match (&self.endpoint, self.provider) {
            (Some(endpoint), _) => endpoint.trim_end_matches('/').to_string(),
            (None, LlmProvider::Gemini) => endpoints::GEMINI_DEFAULT.to_string(),
            (None, LlmProvider::Ollama) => endpoints::OLLAMA_DEFAULT.to_string(),
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: default_llm_model(),
            endpoint: None,
            api_key: default_llm_api_key(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            timeout_seconds: default_llm_timeout(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            empty_completion_retries: default_empty_completion_retries(),
        }
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &redact(&self.api_key))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_retries", &self.max_retries)
            .field("initial_backoff_ms", &self.initial_backoff_ms)
            .field("empty_completion_retries", &self.empty_completion_retries)
            .finish()
    }
}

/// Places directory settings
#[derive(Clone, Serialize, Deserialize)]
pub struct PlacesSettings {
    #[serde(default = "default_places_endpoint")]
    pub endpoint: String,

    /// API key (set via PLACES_API_KEY or MEDIBOT__PLACES__API_KEY)
    #[serde(default = "default_places_api_key")]
    pub api_key: Option<String>,

    /// Location appended as `in <location>` when the user names none
    #[serde(default)]
    pub default_location: Option<String>,

    /// Coordinates used to bias ranking
    #[serde(default)]
    pub bias_location: Option<Coordinates>,

    /// Search radius around `bias_location`
    #[serde(default)]
    pub radius_meters: Option<u32>,

    #[serde(default = "default_places_timeout")]
    pub timeout_seconds: u64,
}

fn default_places_endpoint() -> String {
    endpoints::PLACES_TEXT_SEARCH.to_string()
}
fn default_places_api_key() -> Option<String> {
    std::env::var("PLACES_API_KEY").ok().filter(|k| !k.is_empty())
}
fn default_places_timeout() -> u64 {
    timeouts::PLACES_REQUEST_SECS
}

impl Default for PlacesSettings {
    fn default() -> Self {
        Self {
            endpoint: default_places_endpoint(),
            api_key: default_places_api_key(),
            default_location: None,
            bias_location: None,
            radius_meters: None,
            timeout_seconds: default_places_timeout(),
        }
    }
}

impl fmt::Debug for PlacesSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlacesSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &redact(&self.api_key))
            .field("default_location", &self.default_location)
            .field("bias_location", &self.bias_location)
            .field("radius_meters", &self.radius_meters)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

fn redact(secret: &Option<String>) -> &'static str {
    match secret {
        Some(_) => "<redacted>",
        None => "<unset>",
    }
}

/// Conversation state configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// Prior symptom context older than this is ignored
    #[serde(default = "default_staleness")]
    pub staleness_seconds: u64,

    /// Idle sessions are evicted after this long
    #[serde(default = "default_idle_ttl")]
    pub session_idle_ttl_seconds: u64,

    /// Upper bound on tracked users
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Interval of the background eviction sweep
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,

    /// User identifier when a request carries none
    #[serde(default = "default_user_id")]
    pub default_user_id: String,
}

fn default_staleness() -> u64 {
    sessions::STALENESS_SECS
}
fn default_idle_ttl() -> u64 {
    sessions::IDLE_TTL_SECS
}
fn default_max_sessions() -> usize {
    sessions::MAX_SESSIONS
}
fn default_cleanup_interval() -> u64 {
    sessions::CLEANUP_INTERVAL_SECS
}
fn default_user_id() -> String {
    sessions::DEFAULT_USER_ID.to_string()
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            staleness_seconds: default_staleness(),
            session_idle_ttl_seconds: default_idle_ttl(),
            max_sessions: default_max_sessions(),
            cleanup_interval_seconds: default_cleanup_interval(),
            default_user_id: default_user_id(),
        }
    }
}

/// Specialist resolution policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResolverPolicy {
    /// Fixed keyword to specialist table
    #[default]
    Keyword,
    /// Weighted matching against the symptom/disease dataset
    Dataset,
}

/// Specialist resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub policy: ResolverPolicy,

    /// JSON dataset of disease rows, required for the dataset policy
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,

    #[serde(default = "default_min_match_ratio")]
    pub min_match_ratio: f64,

    #[serde(default = "default_max_diseases")]
    pub max_diseases: usize,
}

fn default_dataset_path() -> String {
    resolver::DATASET_PATH.to_string()
}
fn default_min_match_ratio() -> f64 {
    resolver::MIN_MATCH_RATIO
}
fn default_max_diseases() -> usize {
    resolver::MAX_DISEASES
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            policy: ResolverPolicy::default(),
            dataset_path: default_dataset_path(),
            min_match_ratio: default_min_match_ratio(),
            max_diseases: default_max_diseases(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (MEDIBOT prefix, `__` separator)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Load settings using `config_dir` as the directory holding the YAML files
pub fn load_settings_from(config_dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(
        File::with_name(&config_dir.join("default").to_string_lossy()).required(false),
    );

    if let Some(env_name) = env {
        builder = builder
            .add_source(File::with_name(&config_dir.join(env_name).to_string_lossy()).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("MEDIBOT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
