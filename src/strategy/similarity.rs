// File: src/strategy/similarity.rs
use crate::core::types::{normalize_tokens, PredictionResult, SymptomToken};
use crate::error::{DiagnosisError, DiagnosisResult};
use crate::strategy::{assemble, Knowledge, Verdict};
use std::collections::BTreeSet;

pub const ALGORITHM: &str = "jaccard";

/// |a ∩ b| / |a ∪ b|, or 0 when both sets are empty.
pub fn jaccard(a: &BTreeSet<SymptomToken>, b: &BTreeSet<SymptomToken>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Index and score of the best-matching entry. The earliest entry wins ties.
pub fn best_match(
    knowledge: Knowledge<'_>,
    input: &BTreeSet<SymptomToken>,
) -> DiagnosisResult<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, entry) in knowledge.catalog.entries().iter().enumerate() {
        let score = jaccard(input, &entry.symptoms);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.ok_or(DiagnosisError::EmptyMatch)
}

/// Picks the catalog entry whose symptom set is most similar to the input.
pub fn predict<S: AsRef<str>>(
    knowledge: Knowledge<'_>,
    symptoms: &[S],
) -> DiagnosisResult<PredictionResult> {
    let input = normalize_tokens(symptoms);
    let warnings = knowledge.vocabulary.vectorize(symptoms).warnings;
    let (idx, score) = best_match(knowledge, &input)?;
    let entry = &knowledge.catalog.entries()[idx];
    log::debug!("Jaccard match '{}' at {:.3}", entry.name, score);
    Ok(assemble(
        entry,
        &input,
        Verdict {
            probability: score,
            algorithm: Some(ALGORITHM.to_string()),
            model_accuracy: None,
            warnings,
        },
    ))
}
