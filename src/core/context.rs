// File: src/core/context.rs
use crate::core::catalog::DiseaseCatalog;
use crate::core::labels::LabelMap;
use crate::core::types::{PredictionResult, SymptomToken};
use crate::core::vocabulary::FeatureVocabulary;
use crate::error::{DiagnosisError, DiagnosisResult};
use crate::model::{Classifier, TrainedModel};
use crate::strategy::{InferenceStrategy, Knowledge};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything inference reads, assembled once at load and immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    vocabulary: FeatureVocabulary,
    catalog: DiseaseCatalog,
    labels: LabelMap,
    strategy: InferenceStrategy,
}

impl Context {
    /// Bundles the parts and checks the invariants inference depends on.
    pub fn new(
        vocabulary: FeatureVocabulary,
        catalog: DiseaseCatalog,
        labels: LabelMap,
        strategy: InferenceStrategy,
    ) -> DiagnosisResult<Self> {
        let context = Self {
            vocabulary,
            catalog,
            labels,
            strategy,
        };
        context.validate()?;
        Ok(context)
    }

    /// Load-time checks: artifact shapes, vocabulary order against every
    /// model's declared features, and label coverage for every emittable class.
    pub fn validate(&self) -> DiagnosisResult<()> {
        if self.vocabulary.has_duplicates() {
            return Err(DiagnosisError::init("feature vocabulary repeats a symptom name"));
        }
        for model in self.strategy.models() {
            self.validate_model(model)?;
        }
        Ok(())
    }

    fn validate_model(&self, model: &TrainedModel) -> DiagnosisResult<()> {
        model.artifact.validate().map_err(|e| {
            DiagnosisError::init(format!("model '{}': {}", model.name, e))
        })?;
        if let Some(acc) = model.accuracy {
            if !(0.0..=1.0).contains(&acc) {
                return Err(DiagnosisError::init(format!(
                    "model '{}' accuracy {acc} is outside [0, 1]",
                    model.name
                )));
            }
        }
        let features = model.artifact.feature_names();
        if features != self.vocabulary.tokens() {
            let first_mismatch = features
                .iter()
                .zip(self.vocabulary.tokens())
                .position(|(a, b)| a != b);
            return Err(DiagnosisError::init(format!(
                "model '{}' expects {} features, vocabulary has {} (first difference at {:?})",
                model.name,
                features.len(),
                self.vocabulary.len(),
                first_mismatch
            )));
        }
        for &class in model.artifact.classes() {
            let name = self.labels.resolve(class).map_err(|_| {
                DiagnosisError::init(format!(
                    "model '{}' can emit label {class}, which the label map does not cover",
                    model.name
                ))
            })?;
            if !self.catalog.contains(name) {
                log::warn!(
                    "Label {} of model '{}' resolves to '{}', which has no catalog entry",
                    class,
                    model.name,
                    name
                );
            }
        }
        Ok(())
    }

    pub fn knowledge(&self) -> Knowledge<'_> {
        Knowledge {
            vocabulary: &self.vocabulary,
            catalog: &self.catalog,
            labels: &self.labels,
        }
    }

    pub fn predict<S: AsRef<str>>(&self, symptoms: &[S]) -> DiagnosisResult<PredictionResult> {
        self.strategy.predict(self.knowledge(), symptoms)
    }

    /// Every known symptom mapped to an empty annotation.
    pub fn list_vocabulary(&self) -> BTreeMap<SymptomToken, String> {
        self.vocabulary.list()
    }

    pub fn vocabulary(&self) -> &FeatureVocabulary {
        &self.vocabulary
    }

    pub fn catalog(&self) -> &DiseaseCatalog {
        &self.catalog
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn strategy(&self) -> &InferenceStrategy {
        &self.strategy
    }
}
