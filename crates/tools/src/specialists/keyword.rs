//! Keyword-table specialist resolution
//!
//! Each symptom is lowercased and matched against a fixed table of keyword
//! patterns. Specialists are ranked by how many symptoms pointed at them,
//! ties broken by first appearance.

use once_cell::sync::Lazy;
use regex::Regex;

use medibot_core::{SpecialistCategory, SpecialistResolver, GENERAL_PHYSICIAN};

/// Keyword patterns and the specialists they point at
static KEYWORD_TABLE: Lazy<Vec<(Regex, &'static [&'static str])>> = Lazy::new(|| {
    let table: &[(&str, &'static [&'static str])] = &[
        (r"chest\s+pain|\bheart\b|palpitation|irregular\s+heartbeat", &["cardiologist"]),
        (r"shortness\s+of\s+breath|breathless", &["pulmonologist", "cardiologist"]),
        (r"\bcough|wheez|asthma", &["pulmonologist"]),
        (r"headache|migraine|dizz|numb|seizure|tingling|memory\s+loss", &["neurologist"]),
        (r"\brash|itch|\bskin|acne|hives|eczema", &["dermatologist"]),
        (
            r"nausea|vomit|stomach|abdominal|diarrh|constipation|heartburn|bloat",
            &["gastroenterologist"],
        ),
        (r"\bjoints?\b|back\s+pain|fracture|\bknee|sprain|\bbone", &["orthopedist"]),
        (r"anxiety|depress|insomnia|panic", &["psychiatrist"]),
        (r"\beyes?\b|vision|blurr", &["ophthalmologist"]),
        (r"\bears?\b|earache|throat|sinus|hearing|tinnitus", &["ENT specialist"]),
        (r"urin|kidney|bladder", &["urologist"]),
        (r"thirst|diabet|thyroid", &["endocrinologist"]),
        (r"toothache|\bgums?\b|\bteeth|\btooth", &["dentist"]),
        (r"fever|\bcold\b|runny\s+nose|fatigue|\bflu\b", &[GENERAL_PHYSICIAN]),
    ];

    table
        .iter()
        .filter_map(|(pattern, specialists)| match Regex::new(pattern) {
            Ok(regex) => Some((regex, *specialists)),
            Err(e) => {
                tracing::error!(pattern, error = %e, "Invalid specialist keyword pattern");
                None
            }
        })
        .collect()
});

/// Fixed keyword to specialist table
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordResolver;

impl KeywordResolver {
    pub fn new() -> Self {
        Self
    }
}

impl SpecialistResolver for KeywordResolver {
    fn resolve(&self, symptoms: &[String]) -> Vec<SpecialistCategory> {
        // (specialist, hits) in order of first appearance
        let mut ranked: Vec<(&'static str, usize)> = Vec::new();

        for symptom in symptoms {
            let symptom = symptom.trim().to_lowercase();
            for (pattern, specialists) in KEYWORD_TABLE.iter() {
                if !pattern.is_match(&symptom) {
                    continue;
                }
                for specialist in specialists.iter() {
                    match ranked.iter_mut().find(|(s, _)| s == specialist) {
                        Some((_, hits)) => *hits += 1,
                        None => ranked.push((*specialist, 1)),
                    }
                }
            }
        }

        if ranked.is_empty() {
            return vec![GENERAL_PHYSICIAN.to_string()];
        }

        // stable: equal counts keep first-appearance order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.into_iter().map(|(s, _)| s.to_string()).collect()
    }

    fn policy(&self) -> &'static str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(symptoms: &[&str]) -> Vec<String> {
        let symptoms: Vec<String> = symptoms.iter().map(|s| s.to_string()).collect();
        KeywordResolver::new().resolve(&symptoms)
    }

    #[test]
    fn test_chest_pain_is_cardiology() {
        assert!(resolve(&["chest pain"]).contains(&"cardiologist".to_string()));
    }

    #[test]
    fn test_unknown_defaults_to_general_physician() {
        assert_eq!(resolve(&["unknown symptom xyz"]), vec![GENERAL_PHYSICIAN]);
        assert_eq!(resolve(&[]), vec![GENERAL_PHYSICIAN]);
    }

    #[test]
    fn test_first_appearance_breaks_ties() {
        assert_eq!(
            resolve(&["chest pain", "nausea"]),
            vec!["cardiologist", "gastroenterologist"]
        );
    }

    #[test]
    fn test_hit_count_ranks_first() {
        let ranked = resolve(&["rash", "shortness of breath", "cough"]);
        assert_eq!(ranked[0], "pulmonologist");
        assert!(ranked.contains(&"dermatologist".to_string()));
        assert!(ranked.contains(&"cardiologist".to_string()));
    }

    #[test]
    fn test_case_insensitive_and_deduplicated() {
        let ranked = resolve(&["Chest Pain", "PALPITATIONS"]);
        assert_eq!(ranked, vec!["cardiologist"]);
    }

    #[test]
    fn test_heartburn_is_not_cardiology() {
        assert_eq!(resolve(&["heartburn"]), vec!["gastroenterologist"]);
    }
}
