// File: src/core/labels.rs
use crate::core::types::LabelId;
use crate::error::{DiagnosisError, DiagnosisResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Numeric classifier label to disease name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelMap {
    names: BTreeMap<LabelId, String>,
}

impl LabelMap {
    /// From an explicit mapping table. Exact repeats are tolerated; an id
    /// bound to two different names is rejected.
    pub fn try_from_pairs<I>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = (LabelId, String)>,
    {
        let mut names: BTreeMap<LabelId, String> = BTreeMap::new();
        for (id, name) in pairs {
            match names.get(&id) {
                Some(existing) if *existing != name => {
                    return Err(format!("id {id} maps to both '{existing}' and '{name}'"));
                }
                Some(_) => {}
                None => {
                    names.insert(id, name);
                }
            }
        }
        Ok(Self { names })
    }

    /// From pairs whose ids are already unique. A repeated id keeps its first name.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (LabelId, String)>,
    {
        let mut names = BTreeMap::new();
        for (id, name) in pairs {
            names.entry(id).or_insert(name);
        }
        Self { names }
    }

    /// Pairs unique labels with unique names, each in first-seen order.
    ///
    /// Fails when there are more distinct labels than distinct names, since
    /// some label would then have no name to pair with.
    pub fn infer_positional<S: AsRef<str>>(
        labels: &[LabelId],
        disease_names: &[S],
    ) -> DiagnosisResult<Self> {
        let unique_labels = first_seen(labels.iter().copied());
        let unique_names = first_seen(disease_names.iter().map(|s| s.as_ref().to_string()));
        if unique_labels.len() > unique_names.len() {
            return Err(DiagnosisError::init(format!(
                "{} distinct labels but only {} distinct disease names; label map is ambiguous",
                unique_labels.len(),
                unique_names.len()
            )));
        }
        log::debug!(
            "Inferred label map positionally from {} labels and {} names",
            unique_labels.len(),
            unique_names.len()
        );
        Ok(Self::from_pairs(unique_labels.into_iter().zip(unique_names)))
    }

    pub fn resolve(&self, label: LabelId) -> DiagnosisResult<&str> {
        self.names
            .get(&label)
            .map(String::as_str)
            .ok_or(DiagnosisError::LabelNotFound { label })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = LabelId> + '_ {
        self.names.keys().copied()
    }
}

fn first_seen<T, I>(items: I) -> Vec<T>
where
    T: Eq + std::hash::Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
