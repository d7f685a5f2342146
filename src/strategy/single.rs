// File: src/strategy/single.rs
use crate::core::types::{normalize_tokens, PredictionResult};
use crate::error::DiagnosisResult;
use crate::model::{label_probability, Classifier};
use crate::strategy::{assemble, Knowledge, Verdict};

/// Classifies the vectorized input with one model and reports the
/// probability at the predicted label's own class position.
pub fn predict<S: AsRef<str>>(
    knowledge: Knowledge<'_>,
    model: &dyn Classifier,
    name: &str,
    accuracy: Option<f64>,
    symptoms: &[S],
) -> DiagnosisResult<PredictionResult> {
    let vectorized = knowledge.vocabulary.vectorize(symptoms);
    let (label, probability) = label_probability(model, &vectorized.vector)?;
    let disease = knowledge.labels.resolve(label)?;
    let entry = knowledge.catalog.find(disease)?;
    log::debug!("{} predicted label {} ('{}') at {:.3}", name, label, disease, probability);
    let input = normalize_tokens(symptoms);
    Ok(assemble(
        entry,
        &input,
        Verdict {
            probability,
            algorithm: Some(name.to_string()),
            model_accuracy: accuracy,
            warnings: vectorized.warnings,
        },
    ))
}
