// File: src/model/linear.rs
use crate::core::types::{FeatureVector, LabelId};
use crate::error::{DiagnosisError, DiagnosisResult};
use crate::model::{check_width, validate_classes, Classifier};
use serde::{Deserialize, Serialize};

/// Logistic-regression style classifier.
///
/// Multiclass: one coefficient row per class, probabilities by softmax.
/// Binary: a single row scoring `classes[1]`, probabilities by sigmoid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub feature_names: Vec<String>,
    pub classes: Vec<LabelId>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LinearModel {
    fn is_binary(&self) -> bool {
        self.classes.len() == 2 && self.coefficients.len() == 1
    }

    pub fn validate(&self) -> DiagnosisResult<()> {
        validate_classes(&self.classes)?;
        let rows = if self.is_binary() { 1 } else { self.classes.len() };
        if self.coefficients.len() != rows {
            return Err(DiagnosisError::init(format!(
                "linear model has {} coefficient rows for {} classes",
                self.coefficients.len(),
                self.classes.len()
            )));
        }
        if self.intercepts.len() != rows {
            return Err(DiagnosisError::init(format!(
                "linear model has {} intercepts, expected {}",
                self.intercepts.len(),
                rows
            )));
        }
        let width = self.feature_names.len();
        if let Some(i) = self.coefficients.iter().position(|r| r.len() != width) {
            return Err(DiagnosisError::init(format!(
                "coefficient row {i} has {} weights, expected {width}",
                self.coefficients[i].len()
            )));
        }
        Ok(())
    }

    fn score(&self, row: usize, features: &FeatureVector) -> DiagnosisResult<f64> {
        let (weights, intercept) = self
            .coefficients
            .get(row)
            .zip(self.intercepts.get(row))
            .ok_or_else(|| DiagnosisError::model(format!("linear model has no row {row}")))?;
        // Inputs are binary, so only active positions contribute.
        let mut total = *intercept;
        for i in features.active_indices() {
            total += weights.get(i).ok_or_else(|| {
                DiagnosisError::model(format!(
                    "coefficient row {row} has {} weights, feature {i} is active",
                    weights.len()
                ))
            })?;
        }
        Ok(total)
    }
}

impl Classifier for LinearModel {
    fn classes(&self) -> &[LabelId] {
        &self.classes
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, features: &FeatureVector) -> DiagnosisResult<Vec<f64>> {
        check_width(self, features)?;
        if self.is_binary() {
            let p = sigmoid(self.score(0, features)?);
            return Ok(vec![1.0 - p, p]);
        }
        if self.coefficients.len() != self.classes.len() {
            return Err(DiagnosisError::model(format!(
                "linear model has {} coefficient rows for {} classes",
                self.coefficients.len(),
                self.classes.len()
            )));
        }
        let scores = (0..self.classes.len())
            .map(|row| self.score(row, features))
            .collect::<DiagnosisResult<Vec<f64>>>()?;
        Ok(softmax(&scores))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    fn three_class() -> LinearModel {
        LinearModel {
            feature_names: names(&["cough", "fever"]),
            classes: vec![10, 20, 30],
            coefficients: vec![vec![2.0, 0.0], vec![0.0, 2.0], vec![0.0, 0.0]],
            intercepts: vec![0.0, 0.0, 0.5],
        }
    }

    #[test]
    fn softmax_probabilities_sum_to_one() {
        let model = three_class();
        model.validate().unwrap();
        let v = FeatureVector::from_bits(vec![0, 1]);
        let p = model.predict_proba(&v).unwrap();
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(model.predict(&v).unwrap(), 20);
    }

    #[test]
    fn empty_vector_falls_back_to_intercepts() {
        let model = three_class();
        let v = FeatureVector::from_bits(vec![0, 0]);
        assert_eq!(model.predict(&v).unwrap(), 30);
    }

    #[test]
    fn binary_model_scores_second_class() {
        let model = LinearModel {
            feature_names: names(&["fever"]),
            classes: vec![0, 1],
            coefficients: vec![vec![4.0]],
            intercepts: vec![-1.0],
        };
        model.validate().unwrap();
        let p = model.predict_proba(&FeatureVector::from_bits(vec![1])).unwrap();
        assert!(p[1] > 0.9);
        assert_eq!(model.predict(&FeatureVector::from_bits(vec![1])).unwrap(), 1);
        assert_eq!(model.predict(&FeatureVector::from_bits(vec![0])).unwrap(), 0);
    }

    #[test]
    fn ragged_coefficients_fail_validation() {
        let mut model = three_class();
        model.coefficients[1].pop();
        assert!(model.validate().is_err());
    }

    #[test]
    fn unvalidated_ragged_model_errors_instead_of_panicking() {
        let model = LinearModel {
            feature_names: names(&["cough", "fever"]),
            classes: vec![1, 2, 3],
            coefficients: vec![vec![1.0], vec![0.0, 1.0], vec![0.0, 0.0]],
            intercepts: vec![0.0, 0.0, 0.0],
        };
        let err = model
            .predict_proba(&FeatureVector::from_bits(vec![0, 1]))
            .unwrap_err();
        assert_eq!(err.kind(), "model");

        let short = LinearModel {
            intercepts: vec![0.0],
            ..three_class()
        };
        let err = short
            .predict_proba(&FeatureVector::from_bits(vec![1, 0]))
            .unwrap_err();
        assert_eq!(err.kind(), "model");
    }

    #[test]
    fn wrong_width_vector_is_a_model_error() {
        let model = three_class();
        let err = model
            .predict_proba(&FeatureVector::from_bits(vec![1, 0, 1]))
            .unwrap_err();
        assert_eq!(err.kind(), "model");
    }
}
