// File: src/config.rs
use crate::core::catalog::DEFAULT_DESCRIPTION;
use crate::error::{DiagnosisError, DiagnosisResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the load phase finds its artifacts.
///
/// ```toml
/// accuracy_table = "model_accuracies.json"
///
/// [data]
/// disease_table = "DiseaseAndSymptoms.csv"
/// descriptions = "Symptom_Description.csv"
/// training_table = "cleaned_data.csv"
///
/// [[models]]
/// name = "logreg"
/// artifact = "logreg_model.json"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub accuracy_table: Option<PathBuf>,
    /// Zero, one, or two models; the first is the ensemble's primary.
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub disease_table: PathBuf,
    #[serde(default)]
    pub descriptions: Option<PathBuf>,
    /// Explicit id -> disease table. Takes precedence over positional inference.
    #[serde(default)]
    pub label_map: Option<PathBuf>,
    /// Encoded training rows: feature columns plus the label column.
    #[serde(default)]
    pub training_table: Option<PathBuf>,
    #[serde(default = "default_label_column")]
    pub label_column: String,
    #[serde(default = "default_placeholder")]
    pub description_placeholder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    pub artifact: PathBuf,
    /// Overrides the accuracy table entry for this model.
    #[serde(default)]
    pub accuracy: Option<f64>,
}

fn default_label_column() -> String {
    "disease".to_string()
}

fn default_placeholder() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

impl EngineConfig {
    /// A similarity-only setup over the two CSV tables.
    pub fn similarity(disease_table: impl Into<PathBuf>, descriptions: Option<PathBuf>) -> Self {
        Self {
            data: DataConfig {
                disease_table: disease_table.into(),
                descriptions,
                label_map: None,
                training_table: None,
                label_column: default_label_column(),
                description_placeholder: default_placeholder(),
            },
            accuracy_table: None,
            models: Vec::new(),
        }
    }

    /// Reads a TOML file; relative paths inside resolve against its directory.
    pub fn from_file(path: &Path) -> DiagnosisResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| DiagnosisError::artifact(path, e))?;
        let config: EngineConfig =
            toml::from_str(&text).map_err(|e| DiagnosisError::artifact(path, e))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.resolved_against(base))
    }

    pub fn resolved_against(mut self, base: &Path) -> Self {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.data.disease_table);
        for p in [
            &mut self.data.descriptions,
            &mut self.data.label_map,
            &mut self.data.training_table,
            &mut self.accuracy_table,
        ]
        .into_iter()
        .flatten()
        {
            join(p);
        }
        for m in &mut self.models {
            join(&mut m.artifact);
        }
        self
    }
}
