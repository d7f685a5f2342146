// File: src/core/catalog.rs
use crate::core::types::SymptomToken;
use crate::error::{DiagnosisError, DiagnosisResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub const DEFAULT_DESCRIPTION: &str = "No description available.";

/// One source row: a disease name, the symptoms recorded for it, and its description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseEntry {
    pub name: String,
    pub symptoms: BTreeSet<SymptomToken>,
    pub description: String,
}

/// Ordered disease entries. Not de-duplicated by name: two rows for the same
/// disease stay two entries, and lookups by name return the first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiseaseCatalog {
    entries: Vec<DiseaseEntry>,
}

impl DiseaseCatalog {
    pub fn new(entries: Vec<DiseaseEntry>) -> Self {
        Self { entries }
    }

    /// Builds entries from `(disease, symptom cells)` rows, attaching descriptions
    /// by name. Each cell may hold several comma-separated tokens.
    pub fn from_rows<I>(rows: I, descriptions: &HashMap<String, String>, placeholder: &str) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let entries = rows
            .into_iter()
            .map(|(name, cells)| {
                let symptoms = cells.iter().flat_map(|c| split_cell(c)).collect();
                let description = descriptions
                    .get(&name)
                    .cloned()
                    .unwrap_or_else(|| placeholder.to_string());
                DiseaseEntry {
                    name,
                    symptoms,
                    description,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[DiseaseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose name equals `name`.
    pub fn find(&self, name: &str) -> DiagnosisResult<&DiseaseEntry> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| DiagnosisError::DiseaseNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Every symptom token across all entries.
    pub fn all_symptoms(&self) -> impl Iterator<Item = &SymptomToken> + '_ {
        self.entries.iter().flat_map(|e| e.symptoms.iter())
    }

    /// Distinct disease names in first-seen row order.
    pub fn unique_names(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.entries
            .iter()
            .filter(|e| seen.insert(e.name.as_str()))
            .map(|e| e.name.as_str())
            .collect()
    }
}

/// Splits a raw table cell into trimmed, non-empty symptom tokens.
pub fn split_cell(cell: &str) -> impl Iterator<Item = SymptomToken> + '_ {
    cell.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
