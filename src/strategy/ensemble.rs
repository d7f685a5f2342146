// File: src/strategy/ensemble.rs
use crate::core::types::{normalize_tokens, FeatureVector, LabelId, PredictionResult};
use crate::error::DiagnosisResult;
use crate::model::{max_confidence, Classifier};
use crate::strategy::{assemble, Knowledge, Verdict};

/// One side of the ensemble.
#[derive(Clone, Copy)]
pub struct EnsembleMember<'a> {
    pub model: &'a dyn Classifier,
    pub name: &'a str,
    /// Held-out accuracy, fixed at load.
    pub accuracy: f64,
}

/// A model's answer for one query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vote {
    pub label: LabelId,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Primary,
    Secondary,
}

/// On agreement the more confident model wins; on disagreement the more
/// accurate one does, whatever its confidence. Exact ties keep the primary.
pub fn arbitrate(
    primary: Vote,
    primary_accuracy: f64,
    secondary: Vote,
    secondary_accuracy: f64,
) -> Choice {
    if primary.label == secondary.label {
        if secondary.confidence > primary.confidence {
            Choice::Secondary
        } else {
            Choice::Primary
        }
    } else if secondary_accuracy > primary_accuracy {
        Choice::Secondary
    } else {
        Choice::Primary
    }
}

fn vote(member: &EnsembleMember<'_>, features: &FeatureVector) -> DiagnosisResult<Vote> {
    let (label, confidence) = max_confidence(member.model, features)?;
    Ok(Vote { label, confidence })
}

/// Runs both models on one shared vector and reports the arbitrated winner.
pub fn predict<S: AsRef<str>>(
    knowledge: Knowledge<'_>,
    primary: EnsembleMember<'_>,
    secondary: EnsembleMember<'_>,
    symptoms: &[S],
) -> DiagnosisResult<PredictionResult> {
    let vectorized = knowledge.vocabulary.vectorize(symptoms);
    let a = vote(&primary, &vectorized.vector)?;
    let b = vote(&secondary, &vectorized.vector)?;
    let choice = arbitrate(a, primary.accuracy, b, secondary.accuracy);
    let (winner, won) = match choice {
        Choice::Primary => (primary, a),
        Choice::Secondary => (secondary, b),
    };
    log::debug!(
        "Ensemble {}: {}={} ({:.3}) vs {}={} ({:.3}) -> {}",
        if a.label == b.label { "agreement" } else { "disagreement" },
        primary.name,
        a.label,
        a.confidence,
        secondary.name,
        b.label,
        b.confidence,
        winner.name
    );
    let disease = knowledge.labels.resolve(won.label)?;
    let entry = knowledge.catalog.find(disease)?;
    let input = normalize_tokens(symptoms);
    Ok(assemble(
        entry,
        &input,
        Verdict {
            probability: won.confidence,
            algorithm: Some(winner.name.to_string()),
            model_accuracy: Some(winner.accuracy),
            warnings: vectorized.warnings,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{DiseaseCatalog, DiseaseEntry};
    use crate::core::labels::LabelMap;
    use crate::core::vocabulary::FeatureVocabulary;

    struct Stub {
        classes: Vec<LabelId>,
        names: Vec<String>,
        proba: Vec<f64>,
    }

    impl Classifier for Stub {
        fn classes(&self) -> &[LabelId] {
            &self.classes
        }
        fn feature_names(&self) -> &[String] {
            &self.names
        }
        fn predict_proba(&self, _: &FeatureVector) -> DiagnosisResult<Vec<f64>> {
            Ok(self.proba.clone())
        }
    }

    fn stub(classes: Vec<LabelId>, proba: Vec<f64>) -> Stub {
        Stub {
            classes,
            names: vec!["fever".into(), "cough".into()],
            proba,
        }
    }

    fn vote(label: LabelId, confidence: f64) -> Vote {
        Vote { label, confidence }
    }

    #[test]
    fn agreement_picks_higher_confidence() {
        let choice = arbitrate(vote(3, 0.81), 0.5, vote(3, 0.74), 0.99);
        assert_eq!(choice, Choice::Primary);
        let choice = arbitrate(vote(3, 0.60), 0.99, vote(3, 0.74), 0.5);
        assert_eq!(choice, Choice::Secondary);
    }

    #[test]
    fn disagreement_picks_higher_accuracy() {
        let choice = arbitrate(vote(3, 0.99), 0.70, vote(5, 0.40), 0.85);
        assert_eq!(choice, Choice::Secondary);
    }

    #[test]
    fn exact_ties_keep_primary() {
        assert_eq!(arbitrate(vote(3, 0.5), 0.7, vote(3, 0.5), 0.9), Choice::Primary);
        assert_eq!(arbitrate(vote(3, 0.9), 0.8, vote(4, 0.1), 0.8), Choice::Primary);
    }

    fn fixtures() -> (FeatureVocabulary, DiseaseCatalog, LabelMap) {
        let vocab = FeatureVocabulary::from_ordered(vec!["fever".into(), "cough".into()]);
        let catalog = DiseaseCatalog::new(vec![
            DiseaseEntry {
                name: "Flu".into(),
                symptoms: ["fever", "cough"].iter().map(|s| s.to_string()).collect(),
                description: "Influenza".into(),
            },
            DiseaseEntry {
                name: "Cold".into(),
                symptoms: ["cough", "sneezing"].iter().map(|s| s.to_string()).collect(),
                description: "Common cold".into(),
            },
        ]);
        let labels = LabelMap::from_pairs([(3, "Flu".to_string()), (5, "Cold".to_string())]);
        (vocab, catalog, labels)
    }

    #[test]
    fn agreement_reports_the_more_confident_model() {
        let (vocab, catalog, labels) = fixtures();
        let knowledge = Knowledge {
            vocabulary: &vocab,
            catalog: &catalog,
            labels: &labels,
        };
        let a = stub(vec![3, 5], vec![0.81, 0.19]);
        let b = stub(vec![5, 3], vec![0.26, 0.74]);
        let result = predict(
            knowledge,
            EnsembleMember { model: &a, name: "logreg", accuracy: 0.70 },
            EnsembleMember { model: &b, name: "rf", accuracy: 0.85 },
            &["fever"],
        )
        .unwrap();
        assert_eq!(result.disease, "Flu");
        assert!((result.probability - 0.81).abs() < 1e-12);
        assert_eq!(result.algorithm.as_deref(), Some("logreg"));
        assert_eq!(result.model_accuracy, Some(0.70));
    }

    #[test]
    fn disagreement_reports_the_more_accurate_model() {
        let (vocab, catalog, labels) = fixtures();
        let knowledge = Knowledge {
            vocabulary: &vocab,
            catalog: &catalog,
            labels: &labels,
        };
        let a = stub(vec![3, 5], vec![0.9, 0.1]);
        let b = stub(vec![3, 5], vec![0.4, 0.6]);
        let result = predict(
            knowledge,
            EnsembleMember { model: &a, name: "logreg", accuracy: 0.70 },
            EnsembleMember { model: &b, name: "rf", accuracy: 0.85 },
            &["cough"],
        )
        .unwrap();
        assert_eq!(result.disease, "Cold");
        assert!((result.probability - 0.6).abs() < 1e-12);
        assert_eq!(result.algorithm.as_deref(), Some("rf"));
        assert_eq!(result.model_accuracy, Some(0.85));
        assert_eq!(result.missing_symptoms.len(), 1);
    }

    #[test]
    fn unmapped_winning_label_is_an_error() {
        let (vocab, catalog, _) = fixtures();
        let labels = LabelMap::from_pairs([(1, "Flu".to_string())]);
        let knowledge = Knowledge {
            vocabulary: &vocab,
            catalog: &catalog,
            labels: &labels,
        };
        let a = stub(vec![9], vec![1.0]);
        let b = stub(vec![9], vec![1.0]);
        let err = predict(
            knowledge,
            EnsembleMember { model: &a, name: "a", accuracy: 0.5 },
            EnsembleMember { model: &b, name: "b", accuracy: 0.5 },
            &["fever"],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "label_not_found");
    }
}
