//! Symptom/disease reference dataset
//!
//! JSON array of rows:
//!
//! ```json
//! [{"disease": "Migraine", "specialist": "neurologist",
//!   "symptoms": ["headache", "nausea", "blurred_and_distorted_vision"]}]
//! ```
//!
//! Symptom tokens are normalized at load (trim, lowercase, `_` to space).
//! The dataset is read once at startup and shared read-only.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub use medibot_config::constants::resolver::MAX_SYMPTOM_SLOTS;
use medibot_core::{SpecialistCategory, SpecialistResolver};

use crate::ToolsError;

/// One disease row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseRecord {
    pub disease: String,
    pub specialist: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
}

/// Loaded, normalized dataset
#[derive(Debug, Clone, Default)]
pub struct SymptomDataset {
    records: Vec<DiseaseRecord>,
}

/// A disease that cleared the match threshold
#[derive(Debug, Clone, PartialEq)]
pub struct RankedDisease {
    pub disease: String,
    pub specialist: String,
    pub match_ratio: f64,
}

/// Normalize a symptom token for matching
pub fn normalize_symptom(symptom: &str) -> String {
    symptom
        .trim()
        .to_lowercase()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Load and validate the dataset from a JSON file
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<SymptomDataset, ToolsError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ToolsError::DatasetIo {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let records: Vec<DiseaseRecord> =
        serde_json::from_str(&content).map_err(|e| ToolsError::DatasetParse(e.to_string()))?;

    let dataset = SymptomDataset::from_records(records)?;
    tracing::info!(
        rows = dataset.len(),
        path = %path.display(),
        "Loaded symptom reference dataset"
    );
    Ok(dataset)
}

impl SymptomDataset {
    /// Validate and normalize rows
    pub fn from_records(records: Vec<DiseaseRecord>) -> Result<Self, ToolsError> {
        if records.is_empty() {
            return Err(ToolsError::DatasetInvalid("dataset has no rows".to_string()));
        }

        let mut normalized = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let disease = record.disease.trim().to_string();
            let specialist = record.specialist.trim().to_string();

            if disease.is_empty() || specialist.is_empty() {
                return Err(ToolsError::DatasetInvalid(format!(
                    "row {} is missing a disease or specialist label",
                    index
                )));
            }
            if record.symptoms.len() > MAX_SYMPTOM_SLOTS {
                return Err(ToolsError::DatasetInvalid(format!(
                    "row {} ({}) has {} symptom slots, at most {} allowed",
                    index,
                    disease,
                    record.symptoms.len(),
                    MAX_SYMPTOM_SLOTS
                )));
            }

            let mut symptoms: Vec<String> = Vec::new();
            for symptom in record.symptoms.iter().map(|s| normalize_symptom(s)) {
                if !symptom.is_empty() && !symptoms.contains(&symptom) {
                    symptoms.push(symptom);
                }
            }

            if symptoms.is_empty() {
                tracing::warn!(row = index, disease = %disease, "Skipping dataset row without symptoms");
                continue;
            }

            normalized.push(DiseaseRecord {
                disease,
                specialist,
                symptoms,
            });
        }

        if normalized.is_empty() {
            return Err(ToolsError::DatasetInvalid(
                "no row has any symptom slot".to_string(),
            ));
        }

        Ok(Self {
            records: normalized,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DiseaseRecord] {
        &self.records
    }

    /// Diseases whose match ratio reaches `min_ratio`, best first
    pub fn rank(&self, symptoms: &[String], min_ratio: f64, limit: usize) -> Vec<RankedDisease> {
        let user: HashSet<String> = symptoms.iter().map(|s| normalize_symptom(s)).collect();
        if user.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<RankedDisease> = self
            .records
            .iter()
            .filter_map(|record| {
                let matches = record.symptoms.iter().filter(|s| user.contains(*s)).count();
                let ratio = matches as f64 / record.symptoms.len() as f64;
                (matches > 0 && ratio >= min_ratio).then(|| RankedDisease {
                    disease: record.disease.clone(),
                    specialist: record.specialist.clone(),
                    match_ratio: ratio,
                })
            })
            .collect();

        ranked.sort_by(|a, b| b.match_ratio.total_cmp(&a.match_ratio));
        ranked.truncate(limit);
        ranked
    }
}

/// Weighted matching against the reference dataset
#[derive(Debug, Clone)]
pub struct DatasetResolver {
    dataset: SymptomDataset,
    min_match_ratio: f64,
    max_diseases: usize,
}

impl DatasetResolver {
    pub fn new(dataset: SymptomDataset, min_match_ratio: f64, max_diseases: usize) -> Self {
        Self {
            dataset,
            min_match_ratio,
            max_diseases,
        }
    }

    pub fn dataset(&self) -> &SymptomDataset {
        &self.dataset
    }
}

impl SpecialistResolver for DatasetResolver {
    /// Specialists of the top diseases, deduplicated in rank order
    ///
    /// Empty when nothing clears the threshold; the caller falls back.
    fn resolve(&self, symptoms: &[String]) -> Vec<SpecialistCategory> {
        let ranked = self
            .dataset
            .rank(symptoms, self.min_match_ratio, self.max_diseases);

        for disease in &ranked {
            tracing::debug!(
                disease = %disease.disease,
                specialist = %disease.specialist,
                ratio = disease.match_ratio,
                "Dataset match"
            );
        }

        let mut specialists: Vec<SpecialistCategory> = Vec::new();
        for disease in ranked {
            if !specialists.iter().any(|s| s.eq_ignore_ascii_case(&disease.specialist)) {
                specialists.push(disease.specialist);
            }
        }
        specialists
    }

    fn policy(&self) -> &'static str {
        "dataset"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn row(disease: &str, specialist: &str, symptoms: &[&str]) -> DiseaseRecord {
        DiseaseRecord {
            disease: disease.to_string(),
            specialist: specialist.to_string(),
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn dataset() -> SymptomDataset {
        SymptomDataset::from_records(vec![
            row("Heart attack", "cardiologist", &["chest_pain", "sweating", "vomiting"]),
            row("GERD", "gastroenterologist", &["chest_pain", "acidity", "ulcers_on_tongue", "vomiting", "cough", "stomach_pain"]),
            row("Migraine", "neurologist", &["headache", "nausea", "blurred_and_distorted_vision", "acidity"]),
            row("Gastroenteritis", "gastroenterologist", &["vomiting", "diarrhoea", "dehydration"]),
            row("Common cold", "general physician", &["cough", "runny_nose", "chills", "fatigue", "headache", "sneezing", "congestion", "fever", "malaise", "sinus_pressure"]),
        ])
        .unwrap()
    }

    fn symptoms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_symptom() {
        assert_eq!(normalize_symptom(" Chest_Pain "), "chest pain");
        assert_eq!(normalize_symptom("blurred_and_distorted__vision"), "blurred and distorted vision");
    }

    #[test]
    fn test_rank_by_ratio() {
        let ranked = dataset().rank(&symptoms(&["Chest Pain", "vomiting"]), 0.3, 3);
        assert_eq!(ranked[0].disease, "Heart attack");
        assert!((ranked[0].match_ratio - 2.0 / 3.0).abs() < 1e-9);
        // GERD 2/6 and Gastroenteritis 1/3 tie; dataset order is kept
        assert_eq!(ranked[1].disease, "GERD");
        assert_eq!(ranked[2].disease, "Gastroenteritis");
    }

    #[test]
    fn test_threshold_filters_weak_matches() {
        let ranked = dataset().rank(&symptoms(&["headache"]), 0.3, 3);
        // Migraine 1/4 = 0.25, Common cold 1/10
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_resolver_dedupes_specialists_in_rank_order() {
        let resolver = DatasetResolver::new(dataset(), 0.3, 3);
        let specialists = resolver.resolve(&symptoms(&["vomiting", "diarrhoea", "chest pain"]));
        // Heart attack 2/3, Gastroenteritis 2/3, GERD 2/6
        assert_eq!(specialists, vec!["cardiologist", "gastroenterologist"]);
        assert_eq!(resolver.policy(), "dataset");
    }

    #[test]
    fn test_resolver_empty_when_nothing_matches() {
        let resolver = DatasetResolver::new(dataset(), 0.3, 3);
        assert!(resolver.resolve(&symptoms(&["glowing toenails"])).is_empty());
        assert!(resolver.resolve(&[]).is_empty());
    }

    #[test]
    fn test_rejects_too_many_slots() {
        let slots: Vec<String> = (0..18).map(|i| format!("symptom_{i}")).collect();
        let record = DiseaseRecord {
            disease: "Everything".to_string(),
            specialist: "general physician".to_string(),
            symptoms: slots,
        };
        assert!(matches!(
            SymptomDataset::from_records(vec![record]),
            Err(ToolsError::DatasetInvalid(_))
        ));
    }

    #[test]
    fn test_rejects_missing_labels() {
        assert!(SymptomDataset::from_records(vec![row("", "neurologist", &["headache"])]).is_err());
        assert!(SymptomDataset::from_records(vec![]).is_err());
    }

    #[test]
    fn test_load_dataset_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"disease": "Migraine", "specialist": "neurologist", "symptoms": ["headache", "nausea", " ", "Headache"]}}]"#
        )
        .unwrap();

        let dataset = load_dataset(file.path()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].symptoms, vec!["headache", "nausea"]);
    }

    #[test]
    fn test_load_dataset_errors() {
        assert!(matches!(
            load_dataset("/nonexistent/symptoms.json"),
            Err(ToolsError::DatasetIo { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            load_dataset(file.path()),
            Err(ToolsError::DatasetParse(_))
        ));
    }
}
