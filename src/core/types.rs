// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A trimmed symptom name, case as given.
pub type SymptomToken = String;

/// A numeric class label as emitted by a classifier.
pub type LabelId = i64;

/// Fixed-order binary encoding of a symptom set.
/// Built fresh per request and never mutated once handed to a classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVector(Vec<u8>);

impl FeatureVector {
    pub(crate) fn from_bits(bits: Vec<u8>) -> Self {
        Self(bits)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Value at `index` as a float, 0.0 when out of range.
    pub fn value(&self, index: usize) -> f64 {
        self.0.get(index).map(|&b| f64::from(b)).unwrap_or(0.0)
    }

    /// Positions set to 1, ascending.
    pub fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b != 0)
            .map(|(i, _)| i)
    }
}

/// Non-fatal: an input token was not in the vocabulary and was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownSymptomWarning {
    pub token: String,
}

/// The diagnosis returned for a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub disease: String,
    pub probability: f64,
    pub matching_symptoms: BTreeSet<SymptomToken>,
    pub missing_symptoms: BTreeSet<SymptomToken>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<UnknownSymptomWarning>,
}

/// Normalizes raw request tokens: trims whitespace and drops empties.
pub fn normalize_tokens<S: AsRef<str>>(symptoms: &[S]) -> BTreeSet<SymptomToken> {
    symptoms
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_drops_empty() {
        let tokens = normalize_tokens(&[" fever ", "", "cough", "  ", "fever"]);
        let expected: BTreeSet<String> = ["cough", "fever"].iter().map(|s| s.to_string()).collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn active_indices_lists_set_positions() {
        let v = FeatureVector::from_bits(vec![0, 1, 0, 1]);
        assert_eq!(v.active_indices().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(v.value(1), 1.0);
        assert_eq!(v.value(10), 0.0);
    }

    #[test]
    fn result_json_omits_empty_optionals() {
        let result = PredictionResult {
            disease: "Flu".into(),
            probability: 0.5,
            matching_symptoms: BTreeSet::new(),
            missing_symptoms: BTreeSet::new(),
            description: "d".into(),
            algorithm: None,
            model_accuracy: None,
            warnings: vec![],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("algorithm"));
        assert!(!json.contains("warnings"));
    }
}
