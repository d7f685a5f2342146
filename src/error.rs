// File: src/error.rs
use std::path::Path;

/// Fatal conditions raised by the inference core.
///
/// Advisory conditions (unknown symptom tokens) are not errors; they travel
/// as [`crate::core::types::UnknownSymptomWarning`] values on the result.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosisError {
    /// The engine is not `Ready`, or load-time construction failed.
    #[error("initialization failed: {reason}")]
    Initialization { reason: String },

    /// A classifier emitted a label id the label map does not know.
    #[error("label {label} has no disease mapping")]
    LabelNotFound { label: i64 },

    /// A resolved disease name has no catalog entry.
    #[error("disease '{name}' not found in catalog")]
    DiseaseNotFound { name: String },

    #[error("cannot match against an empty disease catalog")]
    EmptyMatch,

    /// A classifier could not evaluate the given feature vector.
    #[error("model evaluation failed: {reason}")]
    Model { reason: String },
}

/// Result alias used throughout the crate.
pub type DiagnosisResult<T> = Result<T, DiagnosisError>;

impl DiagnosisError {
    pub fn init(reason: impl Into<String>) -> Self {
        Self::Initialization {
            reason: reason.into(),
        }
    }

    /// Wraps a load-time failure with the artifact path that caused it.
    pub fn artifact(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::init(format!("{}: {}", path.display(), err))
    }

    pub fn model(reason: impl Into<String>) -> Self {
        Self::Model {
            reason: reason.into(),
        }
    }

    /// Stable short code for the boundary layer.
    pub fn kind(&self) -> &'static str {
        match self {
            DiagnosisError::Initialization { .. } => "initialization",
            DiagnosisError::LabelNotFound { .. } => "label_not_found",
            DiagnosisError::DiseaseNotFound { .. } => "disease_not_found",
            DiagnosisError::EmptyMatch => "empty_match",
            DiagnosisError::Model { .. } => "model",
        }
    }
}
