//! Centralized constants for the medical assistant
//!
//! Single source of truth for endpoints, thresholds and default values used
//! across the crates. Settings defaults are built from these.

/// Service endpoints
pub mod endpoints {
    /// Gemini generative language API (v1beta)
    pub const GEMINI_DEFAULT: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// Ollama LLM endpoint for local development
    pub const OLLAMA_DEFAULT: &str = "http://localhost:11434";

    /// Google Places Text Search
    pub const PLACES_TEXT_SEARCH: &str =
        "https://maps.googleapis.com/maps/api/place/textsearch/json";
}

/// Timeouts (seconds)
pub mod timeouts {
    /// Hosted LLM request timeout
    pub const LLM_REQUEST_SECS: u64 = 30;

    /// Places directory request timeout
    pub const PLACES_REQUEST_SECS: u64 = 10;

    /// Whole HTTP request timeout, must exceed the LLM timeout plus retries
    pub const HTTP_REQUEST_SECS: u64 = 60;

    /// Readiness probe against the LLM backend
    pub const READINESS_PROBE_SECS: u64 = 2;
}

/// Conversation session defaults
pub mod sessions {
    /// Prior symptom context older than this is treated as a new episode
    pub const STALENESS_SECS: u64 = 3600;

    /// Idle sessions are evicted after this long
    pub const IDLE_TTL_SECS: u64 = 7200;

    /// Upper bound on tracked users
    pub const MAX_SESSIONS: usize = 10_000;

    /// Interval of the background eviction sweep
    pub const CLEANUP_INTERVAL_SECS: u64 = 300;

    /// User identifier when the request carries none
    pub const DEFAULT_USER_ID: &str = "default";
}

/// Specialist resolution defaults
pub mod resolver {
    /// Minimum fraction of a disease's symptom slots that must match
    pub const MIN_MATCH_RATIO: f64 = 0.3;

    /// Number of top-ranked diseases whose specialists are returned
    pub const MAX_DISEASES: usize = 3;

    /// Maximum symptom slots per dataset row
    pub const MAX_SYMPTOM_SLOTS: usize = 17;

    /// Default dataset location, relative to the working directory
    pub const DATASET_PATH: &str = "data/symptom_specialists.json";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_timeout_covers_llm() {
        assert!(timeouts::HTTP_REQUEST_SECS > timeouts::LLM_REQUEST_SECS);
    }

    #[test]
    fn test_idle_ttl_outlives_staleness() {
        assert!(sessions::IDLE_TTL_SECS >= sessions::STALENESS_SECS);
    }

    #[test]
    fn test_match_ratio_valid() {
        assert!(resolver::MIN_MATCH_RATIO > 0.0 && resolver::MIN_MATCH_RATIO <= 1.0);
    }
}
