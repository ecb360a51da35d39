//! Intent Token Matching
//!
//! Cheap deterministic signals used to route a message before any language
//! model call. All matchers expect the normalized (lowercased, trimmed)
//! message except [`extract_location`], which needs the original casing.
//!
//! Tokens are matched on word boundaries so that `no` does not fire on
//! `nose` and `bye` does not fire on `maybe`. Scheduling verbs are the
//! exception: they match anywhere, so `reschedule` counts.

use once_cell::sync::Lazy;
use regex::Regex;

use medibot_core::{SpecialistCategory, GENERAL_PHYSICIAN};

// =============================================================================
// STATIC REGEX PATTERNS - Compiled once at program start
// =============================================================================

static GREETING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:hi|hello|hey|greetings|good\s+(?:morning|afternoon|evening))\b").unwrap()
});

static THANKS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:thanks?|thank\s+you|thx|appreciate\s+it)\b").unwrap());

static GOODBYE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:bye|goodbye|see\s+you|farewell)\b").unwrap());

static NEGATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:no|nope|nah|none|no\s+more|nothing\s+else|that'?s\s+all|that\s+is\s+all)\b")
        .unwrap()
});

static SCHEDULING_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:schedule|appointment|book)").unwrap());

static THEM_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bthem\b").unwrap());

static LOCATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:near|in)\s+([A-Z][A-Za-z]+(?:\s+[A-Z][A-Za-z]+)*)").unwrap()
});

/// Capitalized words after `in` that name a time, not a place
const CALENDAR_WORDS: &[&str] = &[
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December", "Jan", "Feb", "Mar", "Apr", "Jun", "Jul", "Aug", "Sep",
    "Sept", "Oct", "Nov", "Dec", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday",
    "Saturday", "Sunday",
];

/// Specialist keywords, most specific first. Each entry maps the matched
/// word prefix to the category used for the provider lookup.
static SPECIALIST_KEYWORDS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\bgeneral\s+(?:physician|practitioner)", GENERAL_PHYSICIAN),
        (r"\bfamily\s+doctor", "family doctor"),
        (r"\bprimary\s+care", GENERAL_PHYSICIAN),
        (r"\bcardiologist", "cardiologist"),
        (r"\bdermatologist", "dermatologist"),
        (r"\bneurologist", "neurologist"),
        (r"\bgastroenterologist", "gastroenterologist"),
        (r"\borthop(?:a)?edi(?:st|c)", "orthopedist"),
        (r"\bpediatrician", "pediatrician"),
        (r"\bpsychiatrist", "psychiatrist"),
        (r"\bpsychologist", "psychologist"),
        (r"\bophthalmologist", "ophthalmologist"),
        (r"\b(?:ent|ent\s+specialist|otolaryngologist)\b", "ENT specialist"),
        (r"\bgyn(?:a)?ecologist", "gynecologist"),
        (r"\burologist", "urologist"),
        (r"\bendocrinologist", "endocrinologist"),
        (r"\bpulmonologist", "pulmonologist"),
        (r"\boncologist", "oncologist"),
        (r"\brheumatologist", "rheumatologist"),
        (r"\bdentist", "dentist"),
        (r"\b(?:doctor|physician)s?\b", GENERAL_PHYSICIAN),
    ]
    .into_iter()
    .map(|(pattern, category)| (Regex::new(pattern).unwrap(), category))
    .collect()
});

/// Lowercase and trim a raw message for matching
///
/// Typographic apostrophes from mobile keyboards fold to `'`.
pub fn normalize(message: &str) -> String {
    message
        .trim()
        .to_lowercase()
        .replace(['\u{2019}', '\u{2018}'], "'")
}

pub fn starts_with_greeting(normalized: &str) -> bool {
    GREETING_PATTERN.is_match(normalized)
}

pub fn contains_thanks(normalized: &str) -> bool {
    THANKS_PATTERN.is_match(normalized)
}

pub fn contains_goodbye(normalized: &str) -> bool {
    GOODBYE_PATTERN.is_match(normalized)
}

pub fn is_help_request(normalized: &str) -> bool {
    normalized == "help"
}

/// "no", "nope", "that's all" and friends
pub fn contains_negation(normalized: &str) -> bool {
    NEGATION_PATTERN.is_match(normalized)
}

pub fn contains_scheduling_verb(normalized: &str) -> bool {
    SCHEDULING_PATTERN.is_match(normalized)
}

pub fn mentions_them(normalized: &str) -> bool {
    THEM_PATTERN.is_match(normalized)
}

/// Specialist category named in the message
///
/// A generic `doctor`/`physician` resolves to the general physician
/// category.
pub fn find_specialist_keyword(normalized: &str) -> Option<SpecialistCategory> {
    SPECIALIST_KEYWORDS
        .iter()
        .find(|(pattern, _)| pattern.is_match(normalized))
        .map(|(_, category)| (*category).to_string())
}

/// Capitalized place name following `near` or `in`
///
/// Month and weekday names are skipped, so "in January near Boston"
/// yields `Boston`.
pub fn extract_location(message: &str) -> Option<String> {
    LOCATION_PATTERN
        .captures_iter(message)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|place| {
            let first = place.split_whitespace().next().unwrap_or_default();
            !CALENDAR_WORDS.contains(&first)
        })
        .map(str::to_string)
}
