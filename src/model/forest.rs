// File: src/model/forest.rs
use crate::core::types::{FeatureVector, LabelId};
use crate::error::{DiagnosisError, DiagnosisResult};
use crate::model::{check_width, validate_classes, Classifier};
use serde::{Deserialize, Serialize};

/// Bagged decision trees; the class distribution is the mean of the leaf
/// distributions each tree reaches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModel {
    pub feature_names: Vec<String>,
    pub classes: Vec<LabelId>,
    pub trees: Vec<DecisionTree>,
}

/// Flat node array rooted at index 0. Validation requires children to sit
/// after their parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    /// Goes `left` when `x[feature] <= threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class weights (sample counts or fractions), in `classes` order.
    Leaf { distribution: Vec<f64> },
}

impl DecisionTree {
    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {i} splits on feature {feature} of {n_features}"));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(format!("node {i} has invalid child {child}"));
                        }
                    }
                }
                TreeNode::Leaf { distribution } => {
                    if distribution.len() != n_classes {
                        return Err(format!(
                            "leaf {i} has {} weights for {n_classes} classes",
                            distribution.len()
                        ));
                    }
                    if distribution.iter().any(|w| *w < 0.0 || !w.is_finite()) {
                        return Err(format!("leaf {i} has a negative or non-finite weight"));
                    }
                }
            }
        }
        Ok(())
    }

    /// A well-formed tree reaches a leaf in fewer steps than it has nodes.
    fn leaf_for(&self, features: &FeatureVector) -> Result<&[f64], String> {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    idx = if features.value(*feature) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Some(TreeNode::Leaf { distribution }) => return Ok(distribution.as_slice()),
                None => return Err(format!("node {idx} does not exist")),
            }
        }
        Err(format!("no leaf reached within {} steps", self.nodes.len()))
    }
}

impl ForestModel {
    pub fn validate(&self) -> DiagnosisResult<()> {
        validate_classes(&self.classes)?;
        if self.trees.is_empty() {
            return Err(DiagnosisError::init("forest has no trees"));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_names.len(), self.classes.len())
                .map_err(|e| DiagnosisError::init(format!("tree {t}: {e}")))?;
        }
        Ok(())
    }
}

impl Classifier for ForestModel {
    fn classes(&self) -> &[LabelId] {
        &self.classes
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, features: &FeatureVector) -> DiagnosisResult<Vec<f64>> {
        check_width(self, features)?;
        let mut acc = vec![0.0; self.classes.len()];
        if self.trees.is_empty() {
            return Err(DiagnosisError::model("forest has no trees"));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            let leaf = tree
                .leaf_for(features)
                .map_err(|e| DiagnosisError::model(format!("tree {t}: {e}")))?;
            if leaf.len() != acc.len() {
                return Err(DiagnosisError::model(format!(
                    "tree {t}: leaf has {} weights for {} classes",
                    leaf.len(),
                    acc.len()
                )));
            }
            let total: f64 = leaf.iter().sum();
            if total <= 0.0 {
                continue;
            }
            for (slot, w) in acc.iter_mut().zip(leaf) {
                *slot += w / total;
            }
        }
        let n = self.trees.len() as f64;
        Ok(acc.into_iter().map(|p| p / n).collect())
    }
}
