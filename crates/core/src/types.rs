//! Domain records exchanged between the dialogue engine and its collaborators

use serde::{Deserialize, Serialize};

/// Human-readable label for a class of medical practitioner
///
/// Deliberately a plain string: the language model may emit labels that are
/// not in any fixed table.
pub type SpecialistCategory = String;

/// Category used whenever nothing more specific can be resolved
pub const GENERAL_PHYSICIAN: &str = "general physician";

/// A medical provider returned by the places directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub name: String,
    pub address: String,
    pub external_id: String,
}

/// Calendar directive consumed by the frontend calendar
///
/// `time` stays `None` when the source text had no `Time:` field; defaults are
/// applied by the caller, never by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDirective {
    pub title: String,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    pub time: Option<String>,
}

impl ScheduleDirective {
    /// Fill in the time if the directive did not carry one
    pub fn with_default_time(mut self, default: &str) -> Self {
        if self.time.is_none() {
            self.time = Some(default.to_string());
        }
        self
    }
}

/// Output contract of the dialogue engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub text: String,
    #[serde(rename = "eventDetails")]
    pub event_details: Option<ScheduleDirective>,
}

impl ResponseEnvelope {
    /// Plain conversational reply
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            event_details: None,
        }
    }

    /// Reply carrying a calendar directive
    pub fn with_event(text: impl Into<String>, event: ScheduleDirective) -> Self {
        Self {
            text: text.into(),
            event_details: Some(event),
        }
    }
}

/// Geographic point used to bias places searches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// One ranked entry from the places directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceResult {
    pub name: String,
    pub formatted_address: String,
    pub external_id: String,
}

impl From<PlaceResult> for ProviderRecord {
    fn from(place: PlaceResult) -> Self {
        Self {
            name: place.name,
            address: place.formatted_address,
            external_id: place.external_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_serializes_event_details_camel_case() {
        let envelope = ResponseEnvelope::with_event(
            "Booked",
            ScheduleDirective {
                title: "Checkup".to_string(),
                date: "2025-03-08".to_string(),
                time: Some("2:30 PM".to_string()),
            },
        );
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["text"], "Booked");
        assert_eq!(json["eventDetails"]["date"], "2025-03-08");
        assert_eq!(json["eventDetails"]["time"], "2:30 PM");
    }

    #[test]
    fn test_plain_envelope_has_null_event() {
        let json = serde_json::to_value(ResponseEnvelope::text("hi")).unwrap();
        assert!(json["eventDetails"].is_null());
    }

    #[test]
    fn test_default_time_only_fills_absent() {
        let directive = ScheduleDirective {
            title: "Checkup".to_string(),
            date: "2025-03-08".to_string(),
            time: None,
        };
        assert_eq!(
            directive.clone().with_default_time("9:00 AM").time.as_deref(),
            Some("9:00 AM")
        );

        let timed = ScheduleDirective {
            time: Some("4:15 PM".to_string()),
            ..directive
        };
        assert_eq!(timed.with_default_time("9:00 AM").time.as_deref(), Some("4:15 PM"));
    }

    #[test]
    fn test_place_into_provider() {
        let provider: ProviderRecord = PlaceResult {
            name: "Heart Clinic".to_string(),
            formatted_address: "1 Main St".to_string(),
            external_id: "abc".to_string(),
        }
        .into();
        assert_eq!(provider.address, "1 Main St");
        assert_eq!(provider.external_id, "abc");
    }
}
