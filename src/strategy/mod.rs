// File: src/strategy/mod.rs
//! The three ways a symptom list becomes a diagnosis, behind one `predict`.

pub mod ensemble;
pub mod similarity;
pub mod single;

use crate::core::catalog::{DiseaseCatalog, DiseaseEntry};
use crate::core::labels::LabelMap;
use crate::core::types::{PredictionResult, SymptomToken, UnknownSymptomWarning};
use crate::core::vocabulary::FeatureVocabulary;
use crate::error::{DiagnosisError, DiagnosisResult};
use crate::model::TrainedModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub use ensemble::{arbitrate, Choice, EnsembleMember, Vote};

/// Borrowed view of the read-only lookup tables every strategy consults.
#[derive(Clone, Copy)]
pub struct Knowledge<'a> {
    pub vocabulary: &'a FeatureVocabulary,
    pub catalog: &'a DiseaseCatalog,
    pub labels: &'a LabelMap,
}

/// Strategy chosen once at context construction from the artifacts available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InferenceStrategy {
    Similarity,
    SingleModel(TrainedModel),
    Ensemble {
        primary: TrainedModel,
        secondary: TrainedModel,
    },
}

impl InferenceStrategy {
    /// Zero models: similarity. One: single model. Two: ensemble.
    pub fn select(mut models: Vec<TrainedModel>) -> DiagnosisResult<Self> {
        match models.len() {
            0 => Ok(InferenceStrategy::Similarity),
            1 => Ok(InferenceStrategy::SingleModel(models.remove(0))),
            2 => {
                let secondary = models.remove(1);
                let primary = models.remove(0);
                for m in [&primary, &secondary] {
                    if m.accuracy.is_none() {
                        return Err(DiagnosisError::init(format!(
                            "ensemble model '{}' has no held-out accuracy",
                            m.name
                        )));
                    }
                }
                Ok(InferenceStrategy::Ensemble { primary, secondary })
            }
            n => Err(DiagnosisError::init(format!(
                "{n} models configured; at most two are supported"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InferenceStrategy::Similarity => "similarity",
            InferenceStrategy::SingleModel(_) => "single_model",
            InferenceStrategy::Ensemble { .. } => "ensemble",
        }
    }

    pub fn models(&self) -> Vec<&TrainedModel> {
        match self {
            InferenceStrategy::Similarity => vec![],
            InferenceStrategy::SingleModel(m) => vec![m],
            InferenceStrategy::Ensemble { primary, secondary } => vec![primary, secondary],
        }
    }

    pub fn predict<S: AsRef<str>>(
        &self,
        knowledge: Knowledge<'_>,
        symptoms: &[S],
    ) -> DiagnosisResult<PredictionResult> {
        match self {
            InferenceStrategy::Similarity => similarity::predict(knowledge, symptoms),
            InferenceStrategy::SingleModel(m) => single::predict(
                knowledge,
                &m.artifact,
                &m.name,
                m.accuracy,
                symptoms,
            ),
            InferenceStrategy::Ensemble { primary, secondary } => {
                let a = member(primary)?;
                let b = member(secondary)?;
                ensemble::predict(knowledge, a, b, symptoms)
            }
        }
    }
}

fn member(model: &TrainedModel) -> DiagnosisResult<EnsembleMember<'_>> {
    let accuracy = model.accuracy.ok_or_else(|| {
        DiagnosisError::init(format!("ensemble model '{}' has no accuracy", model.name))
    })?;
    Ok(EnsembleMember {
        model: &model.artifact,
        name: &model.name,
        accuracy,
    })
}

/// Symptoms shared with the entry, and entry symptoms the input lacks.
pub fn evidence(
    input: &BTreeSet<SymptomToken>,
    entry: &DiseaseEntry,
) -> (BTreeSet<SymptomToken>, BTreeSet<SymptomToken>) {
    let matching = input.intersection(&entry.symptoms).cloned().collect();
    let missing = entry.symptoms.difference(input).cloned().collect();
    (matching, missing)
}

pub(crate) struct Verdict {
    pub probability: f64,
    pub algorithm: Option<String>,
    pub model_accuracy: Option<f64>,
    pub warnings: Vec<UnknownSymptomWarning>,
}

pub(crate) fn assemble(
    entry: &DiseaseEntry,
    input: &BTreeSet<SymptomToken>,
    verdict: Verdict,
) -> PredictionResult {
    let (matching_symptoms, missing_symptoms) = evidence(input, entry);
    PredictionResult {
        disease: entry.name.clone(),
        probability: verdict.probability.clamp(0.0, 1.0),
        matching_symptoms,
        missing_symptoms,
        description: entry.description.clone(),
        algorithm: verdict.algorithm,
        model_accuracy: verdict.model_accuracy,
        warnings: verdict.warnings,
    }
}
