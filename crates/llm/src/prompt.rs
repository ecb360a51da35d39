//! Prompt Building
//!
//! Constructs the single-turn prompt sent to the model: base instructions,
//! the marker-line output grammar the directive parser understands, optional
//! prior symptom context, then the user's message.

use chrono::NaiveDate;

/// Base behavior of the assistant
const BASE_INSTRUCTIONS: &str = "\
You are an AI-powered medical assistant that helps users understand their symptoms and \
suggests possible medical concerns. Keep responses concise, direct and professional. \
You do not provide official diagnoses or medical advice; you guide users towards a \
relevant medical specialist or general physician.

If the user describes symptoms, always ask them to rate the severity on a scale of 1-10.

When the user provides a severity rating:
- Below 6, recommend a general physician first unless the symptoms clearly need a specialist
- 6 and above, recommend the appropriate specialist for the symptoms
- For common mild symptoms such as headaches or a runny nose, recommend a general physician or urgent care

Always remind users to call emergency services (911) for severe or life-threatening symptoms.";

/// Marker grammar parsed out of the model's reply
const OUTPUT_GRAMMAR: &str = "\
Output format rules (each marker on its own line):
- When you recommend a specialist, add a line \"FIND_SPECIALIST: <specialist type>\", for example \"FIND_SPECIALIST: cardiologist\".
- When the user describes symptoms, add a line \"Symptoms: <symptom>, <symptom>\" and, if they gave a rating, a line \"Severity: <1-10>\".
- When the user asks to schedule an appointment, end your reply with:
SCHEDULE_EVENT:
Title: <short title>
Date: <YYYY-MM-DD>
Time: <H:MM AM/PM>";

/// Single-turn prompt builder
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    today: Option<NaiveDate>,
    prior_symptoms: Vec<String>,
    prior_severity: Option<String>,
    message: String,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Current date, so relative dates resolve to `YYYY-MM-DD`
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Previously reported symptoms and severity
    pub fn with_prior_context(mut self, symptoms: &[String], severity: Option<&str>) -> Self {
        self.prior_symptoms = symptoms.to_vec();
        self.prior_severity = severity.map(str::to_string);
        self
    }

    /// Set the user's message
    pub fn user_message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    /// Whether prior context will be included
    pub fn has_prior_context(&self) -> bool {
        !self.prior_symptoms.is_empty() || self.prior_severity.is_some()
    }

    /// Build the prompt text
    pub fn build(self) -> String {
        let mut prompt = String::with_capacity(
            BASE_INSTRUCTIONS.len() + OUTPUT_GRAMMAR.len() + self.message.len() + 256,
        );

        prompt.push_str(BASE_INSTRUCTIONS);
        prompt.push_str("\n\n");
        prompt.push_str(OUTPUT_GRAMMAR);
        prompt.push_str("\n\n");

        if let Some(today) = self.today {
            prompt.push_str(&format!("Today's date: {}\n\n", today.format("%Y-%m-%d")));
        }

        if !self.prior_symptoms.is_empty() {
            prompt.push_str(&format!(
                "Previously reported symptoms: {}\n",
                self.prior_symptoms.join(", ")
            ));
        }
        if let Some(severity) = &self.prior_severity {
            prompt.push_str(&format!("Previously reported severity: {}\n", severity));
        }
        if !self.prior_symptoms.is_empty() || self.prior_severity.is_some() {
            prompt.push('\n');
        }

        prompt.push_str("User's message: ");
        prompt.push_str(&self.message);
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_prompt() {
        let prompt = PromptBuilder::new().user_message("I feel dizzy").build();
        assert!(prompt.contains("medical assistant"));
        assert!(prompt.contains("FIND_SPECIALIST:"));
        assert!(prompt.contains("SCHEDULE_EVENT:"));
        assert!(prompt.ends_with("User's message: I feel dizzy"));
        assert!(!prompt.contains("Previously reported"));
    }

    #[test]
    fn test_prior_context_included() {
        let builder = PromptBuilder::new()
            .with_prior_context(&["headache".to_string(), "nausea".to_string()], Some("7"))
            .user_message("it got worse");
        assert!(builder.has_prior_context());

        let prompt = builder.build();
        assert!(prompt.contains("Previously reported symptoms: headache, nausea"));
        assert!(prompt.contains("Previously reported severity: 7"));
        let context_at = prompt.find("Previously reported symptoms").unwrap();
        let message_at = prompt.find("User's message").unwrap();
        assert!(context_at < message_at);
    }

    #[test]
    fn test_today_included() {
        let prompt = PromptBuilder::new()
            .with_today(NaiveDate::from_ymd_opt(2025, 3, 8).unwrap())
            .user_message("book for tomorrow")
            .build();
        assert!(prompt.contains("Today's date: 2025-03-08"));
    }
}
