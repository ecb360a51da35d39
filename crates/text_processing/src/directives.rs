//! Marker-line directive extraction
//!
//! Language model output embeds machine-readable instructions as marker
//! lines inside otherwise free text:
//!
//! ```text
//! FIND_SPECIALIST: cardiologist
//! Symptoms: chest pain, nausea
//! Severity: 7
//! SCHEDULE_EVENT:
//! Title: Appointment with Dr. Smith
//! Date: 2025-03-08
//! Time: 2:30 PM
//! ```
//!
//! Every extractor is tolerant: a malformed or partial marker yields an
//! absent result, never an error. The three extractions are independent and
//! may all fire on the same text.

use medibot_core::{ScheduleDirective, SpecialistCategory};

/// Schedule block marker; everything after it belongs to the event
pub const SCHEDULE_MARKER: &str = "SCHEDULE_EVENT:";
/// Specialist request marker line
pub const SPECIALIST_MARKER: &str = "FIND_SPECIALIST:";
/// Symptom list marker line (comma separated)
pub const SYMPTOMS_MARKER: &str = "Symptoms:";
/// Severity marker line
pub const SEVERITY_MARKER: &str = "Severity:";

const TITLE_FIELD: &str = "Title:";
const DATE_FIELD: &str = "Date:";
const TIME_FIELD: &str = "Time:";

/// Symptoms and severity declared in a block of text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymptomDeclaration {
    /// Symptoms in the order they were declared
    pub symptoms: Vec<String>,
    /// First declared severity
    pub severity: Option<String>,
}

impl SymptomDeclaration {
    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty() && self.severity.is_none()
    }
}

/// Extract a calendar directive from a `SCHEDULE_EVENT:` block
///
/// The first `Title:`, `Date:` and `Time:` values after the marker win.
/// Returns `None` unless both title and date are present. A missing time
/// stays `None`; callers decide the default.
pub fn extract_schedule_directive(text: &str) -> Option<ScheduleDirective> {
    let start = text.find(SCHEDULE_MARKER)?;
    let block = &text[start + SCHEDULE_MARKER.len()..];

    let mut title = None;
    let mut date = None;
    let mut time = None;

    for line in block.lines() {
        let line = line.trim();
        if let Some(value) = field_value(line, TITLE_FIELD) {
            title.get_or_insert(value);
        } else if let Some(value) = field_value(line, DATE_FIELD) {
            date.get_or_insert(value);
        } else if let Some(value) = field_value(line, TIME_FIELD) {
            time.get_or_insert(value);
        }
    }

    match (title, date) {
        (Some(title), Some(date)) => Some(ScheduleDirective { title, date, time }),
        _ => {
            tracing::debug!("Ignoring schedule block without title or date");
            None
        }
    }
}

/// Return the specialist named on the first `FIND_SPECIALIST:` line
pub fn extract_specialist_mention(text: &str) -> Option<SpecialistCategory> {
    text.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(SPECIALIST_MARKER))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Collect `Symptoms:` and `Severity:` lines
///
/// Multiple `Symptoms:` lines accumulate in order; the first `Severity:`
/// line wins.
pub fn extract_symptom_declaration(text: &str) -> SymptomDeclaration {
    let mut declaration = SymptomDeclaration::default();

    for line in text.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix(SYMPTOMS_MARKER) {
            declaration.symptoms.extend(
                rest.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            );
        } else if let Some(rest) = line.strip_prefix(SEVERITY_MARKER) {
            let rest = rest.trim();
            if declaration.severity.is_none() && !rest.is_empty() {
                declaration.severity = Some(rest.to_string());
            }
        }
    }

    declaration
}

/// Remove the schedule block (marker to end of text) from visible text
pub fn strip_schedule_block(text: &str) -> String {
    match text.find(SCHEDULE_MARKER) {
        Some(start) => text[..start].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Remove `FIND_SPECIALIST:`, `Symptoms:` and `Severity:` lines from visible text
pub fn strip_marker_lines(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let line = line.trim_start();
            ![SPECIALIST_MARKER, SYMPTOMS_MARKER, SEVERITY_MARKER]
                .iter()
                .any(|marker| line.starts_with(marker))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Render a schedule block in the marker grammar
pub fn format_schedule_block(title: &str, date: &str, time: &str) -> String {
    format!(
        "{SCHEDULE_MARKER}\n{TITLE_FIELD} {title}\n{DATE_FIELD} {date}\n{TIME_FIELD} {time}"
    )
}

fn field_value(line: &str, field: &str) -> Option<String> {
    let value = line.strip_prefix(field)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}
