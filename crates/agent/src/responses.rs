//! Fixed reply texts and formatting helpers

use medibot_core::{ProviderRecord, ScheduleDirective, GENERAL_PHYSICIAN};

pub const GREETING: &str = "Hello! How can I help you today?";

pub const THANKS: &str =
    "You're welcome! Let me know if there's anything else I can help you with.";

pub const GOODBYE: &str = "Goodbye! Take care, and don't hesitate to come back if you need help.";

pub const HELP_TEXT: &str = "\
Here's how I can help:
- Describe your symptoms and I'll suggest what kind of specialist to see.
- Ask for a specialist directly, e.g. \"find a cardiologist near Boston\".
- After I recommend a provider, say \"schedule an appointment with them on 3/8/25 at 2pm\".
- For severe or life-threatening symptoms, call emergency services (911) immediately.";

pub const MORE_SYMPTOMS_PROMPT: &str =
    "Thank you for sharing. Are you experiencing any other symptoms? If not, just say \"no\".";

pub const SYMPTOMS_NOTED: &str =
    "Got it, I've noted that. Any other symptoms? If not, just say \"no\".";

pub const NO_PROVIDER_ON_RECORD: &str =
    "I don't have a provider on record for you yet. Ask me to find a specialist first, then I can schedule an appointment with them.";

pub const EMPTY_REPLY_FALLBACK: &str =
    "I'm sorry, I couldn't come up with a helpful answer. Could you describe that differently?";

/// Provider details appended to a model reply
pub fn recommendation_block(specialist: &str, provider: &ProviderRecord) -> String {
    format!(
        "\n\nRecommended {}:\nName: {}\nAddress: {}",
        specialist, provider.name, provider.address
    )
}

/// Appended when the model named a specialist but the directory had nobody
pub fn lookup_failed_note(specialist: &str) -> String {
    format!(
        "\n\nI couldn't find {} {} nearby right now.",
        article(specialist),
        specialist
    )
}

/// Recommendation after symptom collection finishes
pub fn stop_recommendation(specialist: &str, provider: &ProviderRecord) -> String {
    format!(
        "Based on your symptoms, I recommend seeing {} {}. {} at {} may be able to help. Would you like me to schedule an appointment with them?",
        article(specialist),
        specialist,
        provider.name,
        provider.address
    )
}

pub fn stop_fallback() -> String {
    format!(
        "Based on your symptoms, I recommend seeing {} {} for an initial evaluation. They can refer you to a specialist if needed.",
        article(GENERAL_PHYSICIAN),
        GENERAL_PHYSICIAN
    )
}

pub fn direct_found(specialist: &str, provider: &ProviderRecord) -> String {
    format!(
        "I found {} {} for you: {} at {}. Would you like me to schedule an appointment with them?",
        article(specialist),
        specialist,
        provider.name,
        provider.address
    )
}

pub fn direct_not_found(specialist: &str) -> String {
    format!(
        "I'm sorry, I couldn't find {} {} right now. Please try again later or try a different location.",
        article(specialist),
        specialist
    )
}

pub fn schedule_confirmation(provider: &ProviderRecord, date: &str, time: &str) -> String {
    format!(
        "I've scheduled your appointment with {} on {} at {}. It has been added to your calendar.",
        provider.name, date, time
    )
}

/// Used when the model replied with nothing but a schedule block
pub fn event_added(directive: &ScheduleDirective) -> String {
    match &directive.time {
        Some(time) => format!(
            "I've added \"{}\" on {} at {} to your calendar.",
            directive.title, directive.date, time
        ),
        None => format!(
            "I've added \"{}\" on {} to your calendar.",
            directive.title, directive.date
        ),
    }
}

/// Indefinite article for a category label
fn article(word: &str) -> &'static str {
    let first = word.trim_start().chars().next().map(|c| c.to_ascii_lowercase());
    match first {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}
