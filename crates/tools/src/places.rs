//! Places directory clients
//!
//! [`GooglePlacesClient`] calls the Places Text Search endpoint;
//! [`StubPlacesSearch`] is used when no API key is configured.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use medibot_config::PlacesSettings;
use medibot_core::{Coordinates, PlaceResult, PlacesSearch, Result};

use crate::ToolsError;

/// Google Places Text Search client
#[derive(Clone)]
pub struct GooglePlacesClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GooglePlacesClient {
    /// Create a client; fails without an API key
    pub fn new(settings: &PlacesSettings) -> std::result::Result<Self, ToolsError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ToolsError::Configuration("Places API key is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| ToolsError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            api_key,
        })
    }

    fn query_params(
        &self,
        query: &str,
        bias_location: Option<Coordinates>,
        radius_meters: Option<u32>,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query", query.to_string()),
            ("key", self.api_key.clone()),
            ("type", "doctor".to_string()),
        ];
        if let Some(location) = bias_location {
            params.push(("location", format!("{},{}", location.lat, location.lng)));
            if let Some(radius) = radius_meters {
                params.push(("radius", radius.to_string()));
            }
        }
        params
    }

    async fn execute_search(
        &self,
        query: &str,
        bias_location: Option<Coordinates>,
        radius_meters: Option<u32>,
    ) -> std::result::Result<Vec<PlaceResult>, ToolsError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query_params(query, bias_location, radius_meters))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ToolsError::PlacesStatus {
                status: status.to_string(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: TextSearchResponse = response
            .json()
            .await
            .map_err(|e| ToolsError::PlacesTransport(format!("Invalid response: {}", e)))?;

        body.into_results()
    }
}

#[async_trait]
impl PlacesSearch for GooglePlacesClient {
    async fn search(
        &self,
        query: &str,
        bias_location: Option<Coordinates>,
        radius_meters: Option<u32>,
    ) -> Result<Vec<PlaceResult>> {
        let results = self
            .execute_search(query, bias_location, radius_meters)
            .await?;
        tracing::debug!(query = %query, results = results.len(), "Places search completed");
        Ok(results)
    }

    fn name(&self) -> &str {
        "google_places"
    }
}

// Places API types
#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<TextSearchResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextSearchResult {
    #[serde(default)]
    name: String,
    #[serde(default)]
    formatted_address: String,
    #[serde(default)]
    place_id: String,
}

impl TextSearchResponse {
    fn into_results(self) -> std::result::Result<Vec<PlaceResult>, ToolsError> {
        match self.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(self
                .results
                .into_iter()
                .filter(|r| !r.name.is_empty())
                .map(|r| PlaceResult {
                    name: r.name,
                    formatted_address: r.formatted_address,
                    external_id: r.place_id,
                })
                .collect()),
            _ => Err(ToolsError::PlacesStatus {
                status: self.status,
                message: self.error_message.unwrap_or_default(),
            }),
        }
    }
}

/// Stub places directory for development without an API key
#[derive(Debug, Default, Clone, Copy)]
pub struct StubPlacesSearch;

impl StubPlacesSearch {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PlacesSearch for StubPlacesSearch {
    async fn search(
        &self,
        query: &str,
        _bias_location: Option<Coordinates>,
        _radius_meters: Option<u32>,
    ) -> Result<Vec<PlaceResult>> {
        tracing::info!(query = %query, "Stub Places: search (no results)");
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PlacesSettings {
        PlacesSettings {
            api_key: Some("places-key".to_string()),
            ..PlacesSettings::default()
        }
    }

    #[test]
    fn test_requires_api_key() {
        let result = GooglePlacesClient::new(&PlacesSettings {
            api_key: None,
            ..PlacesSettings::default()
        });
        assert!(matches!(result, Err(ToolsError::Configuration(_))));
    }

    #[test]
    fn test_query_params() {
        let client = GooglePlacesClient::new(&settings()).unwrap();

        let params = client.query_params("cardiologist doctor near Boston", None, Some(5000));
        assert!(params.contains(&("query", "cardiologist doctor near Boston".to_string())));
        assert!(params.contains(&("type", "doctor".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "radius"));

        let params = client.query_params(
            "dentist doctor",
            Some(Coordinates { lat: 42.36, lng: -71.06 }),
            Some(5000),
        );
        assert!(params.contains(&("location", "42.36,-71.06".to_string())));
        assert!(params.contains(&("radius", "5000".to_string())));
    }

    #[test]
    fn test_parse_ok_response() {
        let body = r#"{
            "status": "OK",
            "results": [
                {"name": "Heart Clinic", "formatted_address": "1 Main St", "place_id": "abc"},
                {"name": "Second", "formatted_address": "2 Main St", "place_id": "def"}
            ]
        }"#;
        let response: TextSearchResponse = serde_json::from_str(body).unwrap();
        let results = response.into_results().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "Heart Clinic");
        assert_eq!(results[0].external_id, "abc");
    }

    #[test]
    fn test_zero_results_is_empty() {
        let response: TextSearchResponse =
            serde_json::from_str(r#"{"status": "ZERO_RESULTS", "results": []}"#).unwrap();
        assert!(response.into_results().unwrap().is_empty());
    }

    #[test]
    fn test_error_status() {
        let response: TextSearchResponse = serde_json::from_str(
            r#"{"status": "REQUEST_DENIED", "error_message": "The provided API key is invalid."}"#,
        )
        .unwrap();
        assert!(matches!(
            response.into_results(),
            Err(ToolsError::PlacesStatus { status, .. }) if status == "REQUEST_DENIED"
        ));
    }

    #[tokio::test]
    async fn test_stub_returns_nothing() {
        let stub = StubPlacesSearch::new();
        assert!(stub.search("dentist doctor", None, None).await.unwrap().is_empty());
        assert_eq!(stub.name(), "stub");
    }
}
