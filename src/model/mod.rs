// File: src/model/mod.rs
//! Classifier contract and the serialized artifact kinds the loader understands.

pub mod forest;
pub mod linear;

use crate::core::types::{FeatureVector, LabelId};
use crate::error::{DiagnosisError, DiagnosisResult};
use serde::{Deserialize, Serialize};

pub use forest::{DecisionTree, ForestModel, TreeNode};
pub use linear::LinearModel;

/// What the engine needs from a trained classifier.
///
/// `predict_proba` returns one probability per entry of `classes()`, in that
/// order. Nothing assumes the class at position `i` has label value `i`.
pub trait Classifier: Send + Sync {
    fn classes(&self) -> &[LabelId];

    /// Feature names in the exact order the model was trained on.
    fn feature_names(&self) -> &[String];

    fn predict_proba(&self, features: &FeatureVector) -> DiagnosisResult<Vec<f64>>;

    /// Class at the highest probability; the lowest position wins ties.
    fn predict(&self, features: &FeatureVector) -> DiagnosisResult<LabelId> {
        let proba = self.predict_proba(features)?;
        let pos = argmax(&proba)
            .ok_or_else(|| DiagnosisError::model("classifier returned no probabilities"))?;
        self.classes()
            .get(pos)
            .copied()
            .ok_or_else(|| DiagnosisError::model(format!("no class at position {pos}")))
    }
}

/// Predicted label and the probability stored at that label's class position.
pub fn label_probability(
    model: &dyn Classifier,
    features: &FeatureVector,
) -> DiagnosisResult<(LabelId, f64)> {
    let label = model.predict(features)?;
    let proba = model.predict_proba(features)?;
    let pos = model
        .classes()
        .iter()
        .position(|&c| c == label)
        .ok_or_else(|| DiagnosisError::model(format!("predicted label {label} is not a declared class")))?;
    let p = proba
        .get(pos)
        .copied()
        .ok_or_else(|| DiagnosisError::model(format!("no probability for class position {pos}")))?;
    Ok((label, p))
}

/// Predicted label and the model's maximum class probability for this query.
pub fn max_confidence(
    model: &dyn Classifier,
    features: &FeatureVector,
) -> DiagnosisResult<(LabelId, f64)> {
    let label = model.predict(features)?;
    let proba = model.predict_proba(features)?;
    let confidence = proba.iter().copied().fold(0.0_f64, f64::max);
    Ok((label, confidence))
}

/// Index of the first maximum. `None` for an empty slice.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

pub(crate) fn check_width(model: &dyn Classifier, features: &FeatureVector) -> DiagnosisResult<()> {
    let expected = model.feature_names().len();
    if features.len() != expected {
        return Err(DiagnosisError::model(format!(
            "feature vector has {} positions, model expects {}",
            features.len(),
            expected
        )));
    }
    Ok(())
}

/// A serialized classifier as produced by the training side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    Forest(ForestModel),
}

impl ModelArtifact {
    /// Checks every shape invariant evaluation relies on.
    pub fn validate(&self) -> DiagnosisResult<()> {
        match self {
            ModelArtifact::Linear(m) => m.validate(),
            ModelArtifact::Forest(m) => m.validate(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::Linear(_) => "linear",
            ModelArtifact::Forest(_) => "forest",
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            ModelArtifact::Linear(m) => m,
            ModelArtifact::Forest(m) => m,
        }
    }
}

impl Classifier for ModelArtifact {
    fn classes(&self) -> &[LabelId] {
        self.inner().classes()
    }

    fn feature_names(&self) -> &[String] {
        self.inner().feature_names()
    }

    fn predict_proba(&self, features: &FeatureVector) -> DiagnosisResult<Vec<f64>> {
        self.inner().predict_proba(features)
    }
}

/// A loaded classifier with the name it is reported under and its held-out accuracy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub name: String,
    pub accuracy: Option<f64>,
    pub artifact: ModelArtifact,
}

pub(crate) fn validate_classes(classes: &[LabelId]) -> DiagnosisResult<()> {
    if classes.is_empty() {
        return Err(DiagnosisError::init("model declares no classes"));
    }
    let mut seen = std::collections::HashSet::new();
    if let Some(dup) = classes.iter().find(|c| !seen.insert(**c)) {
        return Err(DiagnosisError::init(format!("class {dup} declared twice")));
    }
    Ok(())
}
