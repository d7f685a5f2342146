// File: src/core/vocabulary.rs
use crate::core::types::{FeatureVector, SymptomToken, UnknownSymptomWarning};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Bidirectional mapping between symptom tokens and feature vector positions.
/// Index order is the token order the vocabulary was built with, and must match
/// the feature order a trained model expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<SymptomToken>", into = "Vec<SymptomToken>")]
pub struct FeatureVocabulary {
    tokens: Vec<SymptomToken>,
    index: HashMap<SymptomToken, usize>,
}

/// Output of [`FeatureVocabulary::vectorize`]: the vector plus every token dropped on the way.
#[derive(Debug, Clone)]
pub struct Vectorized {
    pub vector: FeatureVector,
    pub warnings: Vec<UnknownSymptomWarning>,
}

impl FeatureVocabulary {
    /// Sorted, de-duplicated vocabulary from raw tokens. Blank tokens are discarded.
    pub fn from_observed<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sorted: BTreeSet<SymptomToken> = tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        Self::from_ordered(sorted.into_iter().collect())
    }

    /// Vocabulary taken verbatim from a model's declared feature order.
    pub fn from_ordered(tokens: Vec<SymptomToken>) -> Self {
        let mut index = HashMap::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            // Keep the first position if a feature list repeats a name.
            index.entry(token.clone()).or_insert(i);
        }
        Self { tokens, index }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[SymptomToken] {
        &self.tokens
    }

    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    pub fn token_at(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// True when a name appears twice, which would make the index ambiguous.
    pub fn has_duplicates(&self) -> bool {
        self.index.len() != self.tokens.len()
    }

    /// Encodes symptoms as a 0/1 vector. Unknown tokens are skipped, logged,
    /// and returned as warnings; they never fail the request.
    pub fn vectorize<S: AsRef<str>>(&self, symptoms: &[S]) -> Vectorized {
        let mut bits = vec![0u8; self.tokens.len()];
        let mut warnings = Vec::new();
        for raw in symptoms {
            let token = raw.as_ref().trim();
            if token.is_empty() {
                continue;
            }
            match self.index_of(token) {
                Some(i) => bits[i] = 1,
                None => {
                    log::warn!("Unknown symptom '{}' dropped from feature vector", token);
                    warnings.push(UnknownSymptomWarning {
                        token: token.to_string(),
                    });
                }
            }
        }
        Vectorized {
            vector: FeatureVector::from_bits(bits),
            warnings,
        }
    }

    /// Every token mapped to an empty annotation, reserved for per-symptom metadata.
    pub fn list(&self) -> BTreeMap<SymptomToken, String> {
        self.tokens
            .iter()
            .map(|t| (t.clone(), String::new()))
            .collect()
    }
}

impl From<Vec<SymptomToken>> for FeatureVocabulary {
    fn from(tokens: Vec<SymptomToken>) -> Self {
        Self::from_ordered(tokens)
    }
}

impl From<FeatureVocabulary> for Vec<SymptomToken> {
    fn from(vocab: FeatureVocabulary) -> Self {
        vocab.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observed_tokens_are_sorted_trimmed_and_unique() {
        let vocab = FeatureVocabulary::from_observed([" fever", "cough", "", "fever ", "chills"]);
        assert_eq!(vocab.tokens(), &["chills", "cough", "fever"]);
        assert_eq!(vocab.index_of("fever"), Some(2));
        assert_eq!(vocab.token_at(0), Some("chills"));
    }

    #[test]
    fn unknown_token_is_dropped_with_warning() {
        let vocab = FeatureVocabulary::from_observed(["fever", "cough"]);
        let out = vocab.vectorize(&["fever", "xyz"]);
        // sorted order is [cough, fever]
        assert_eq!(out.vector.as_slice(), &[0, 1]);
        assert_eq!(
            out.warnings,
            vec![UnknownSymptomWarning {
                token: "xyz".into()
            }]
        );
    }

    #[test]
    fn ordered_vocabulary_keeps_model_order() {
        let vocab = FeatureVocabulary::from_ordered(vec!["fever".into(), "cough".into()]);
        let out = vocab.vectorize(&["fever", "xyz"]);
        assert_eq!(out.vector.as_slice(), &[1, 0]);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn list_maps_every_token_to_empty_annotation() {
        let vocab = FeatureVocabulary::from_observed(["b", "a"]);
        let listed = vocab.list();
        assert_eq!(listed.len(), 2);
        assert!(listed.values().all(String::is_empty));
    }

    #[test]
    fn duplicate_feature_names_are_detected() {
        let vocab = FeatureVocabulary::from_ordered(vec!["a".into(), "a".into()]);
        assert!(vocab.has_duplicates());
    }
}
