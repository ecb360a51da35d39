//! Configuration management for the medical assistant
//!
//! Supports loading configuration from:
//! - YAML files under `config/` (`default.yaml`, then `{env}.yaml`)
//! - Environment variables (MEDIBOT prefix, `__` separator)
//! - `GEMINI_API_KEY` / `PLACES_API_KEY` for the upstream credentials

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, load_settings_from, DialogueConfig, LlmProvider, LlmSettings,
    ObservabilityConfig, PlacesSettings, ResolverConfig, ResolverPolicy, RuntimeEnvironment,
    ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for medibot_core::Error {
    fn from(err: ConfigError) -> Self {
        medibot_core::Error::Configuration(err.to_string())
    }
}
