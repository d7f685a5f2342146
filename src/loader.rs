// File: src/loader.rs
//! Reads the externally produced artifacts and assembles a [`Context`].

use crate::config::EngineConfig;
use crate::core::catalog::DiseaseCatalog;
use crate::core::context::Context;
use crate::core::labels::LabelMap;
use crate::core::types::LabelId;
use crate::core::vocabulary::FeatureVocabulary;
use crate::error::{DiagnosisError, DiagnosisResult};
use crate::model::{Classifier, ModelArtifact, TrainedModel};
use crate::strategy::InferenceStrategy;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A raw disease table row: the disease name and its symptom cells.
pub type DiseaseRow = (String, Vec<String>);

/// Header and labels of the encoded training table.
#[derive(Debug, Clone)]
pub struct TrainingTable {
    pub features: Vec<String>,
    pub labels: Vec<LabelId>,
}

fn open_csv(path: &Path) -> DiagnosisResult<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| DiagnosisError::artifact(path, e))
}

fn column(headers: &csv::StringRecord, name: &str, path: &Path) -> DiagnosisResult<usize> {
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(name))
        .ok_or_else(|| DiagnosisError::artifact(path, format!("missing '{name}' column")))
}

/// Disease/symptom table: a `Disease` column plus any number of `Symptom*` columns.
pub fn read_disease_table(path: &Path) -> DiagnosisResult<Vec<DiseaseRow>> {
    let mut reader = open_csv(path)?;
    let headers = reader
        .headers()
        .map_err(|e| DiagnosisError::artifact(path, e))?
        .clone();
    let disease_col = column(&headers, "Disease", path)?;
    let symptom_cols: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.starts_with("Symptom"))
        .map(|(i, _)| i)
        .collect();
    if symptom_cols.is_empty() {
        return Err(DiagnosisError::artifact(path, "no Symptom columns"));
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| DiagnosisError::artifact(path, e))?;
        let name = record.get(disease_col).unwrap_or("").to_string();
        if name.is_empty() {
            log::warn!("{}: row {} has no disease name, skipped", path.display(), line + 1);
            continue;
        }
        let cells = symptom_cols
            .iter()
            .filter_map(|&i| record.get(i))
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        rows.push((name, cells));
    }
    log::debug!("Read {} disease rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// `Disease`, `Description` pairs. A repeated disease keeps its last description.
pub fn read_descriptions(path: &Path) -> DiagnosisResult<HashMap<String, String>> {
    let mut reader = open_csv(path)?;
    let headers = reader
        .headers()
        .map_err(|e| DiagnosisError::artifact(path, e))?
        .clone();
    let disease_col = column(&headers, "Disease", path)?;
    let desc_col = column(&headers, "Description", path)?;
    let mut descriptions = HashMap::new();
    for record in reader.records() {
        let record = record.map_err(|e| DiagnosisError::artifact(path, e))?;
        if let (Some(name), Some(desc)) = (record.get(disease_col), record.get(desc_col)) {
            if !name.is_empty() && !desc.is_empty() {
                descriptions.insert(name.to_string(), desc.to_string());
            }
        }
    }
    log::debug!("Loaded {} disease descriptions", descriptions.len());
    Ok(descriptions)
}

/// Explicit label map: first column the numeric id, second the disease name.
pub fn read_label_map(path: &Path) -> DiagnosisResult<LabelMap> {
    let mut reader = open_csv(path)?;
    let mut pairs = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DiagnosisError::artifact(path, e))?;
        let id = record
            .get(0)
            .ok_or_else(|| DiagnosisError::artifact(path, "row without id"))?;
        let name = record
            .get(1)
            .ok_or_else(|| DiagnosisError::artifact(path, format!("id {id} has no disease")))?;
        pairs.push((parse_label(id, path)?, name.to_string()));
    }
    let map = LabelMap::try_from_pairs(pairs).map_err(|e| DiagnosisError::artifact(path, e))?;
    log::debug!("Loaded explicit label map with {} ids", map.len());
    Ok(map)
}

/// Training table: every column but `label_column` is a feature, in header order.
pub fn read_training_table(path: &Path, label_column: &str) -> DiagnosisResult<TrainingTable> {
    let mut reader = open_csv(path)?;
    let headers = reader
        .headers()
        .map_err(|e| DiagnosisError::artifact(path, e))?
        .clone();
    let label_col = column(&headers, label_column, path)?;
    let features = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != label_col)
        .map(|(_, h)| h.to_string())
        .collect();
    let mut labels = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DiagnosisError::artifact(path, e))?;
        let raw = record
            .get(label_col)
            .ok_or_else(|| DiagnosisError::artifact(path, "row without label"))?;
        labels.push(parse_label(raw, path)?);
    }
    Ok(TrainingTable { features, labels })
}

/// 2^63, the first float past `LabelId::MAX`.
const LABEL_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Accepts `7` and the `7.0` that float-typed exports produce.
fn parse_label(raw: &str, path: &Path) -> DiagnosisResult<LabelId> {
    if let Ok(id) = raw.parse::<LabelId>() {
        return Ok(id);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && (-LABEL_LIMIT..LABEL_LIMIT).contains(&f) => Ok(f as LabelId),
        _ => Err(DiagnosisError::artifact(
            path,
            format!("'{raw}' is not an integer label"),
        )),
    }
}

/// JSON when the extension is `.json`, bincode otherwise.
pub fn read_model(path: &Path) -> DiagnosisResult<ModelArtifact> {
    let file = File::open(path).map_err(|e| DiagnosisError::artifact(path, e))?;
    let reader = BufReader::new(file);
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let artifact: ModelArtifact = if is_json {
        serde_json::from_reader(reader).map_err(|e| DiagnosisError::artifact(path, e))?
    } else {
        bincode::deserialize_from(reader).map_err(|e| DiagnosisError::artifact(path, e))?
    };
    log::debug!(
        "Loaded {} model from {} ({} classes, {} features)",
        artifact.kind(),
        path.display(),
        artifact.classes().len(),
        artifact.feature_names().len()
    );
    Ok(artifact)
}

/// JSON object mapping model name to held-out accuracy.
pub fn read_accuracies(path: &Path) -> DiagnosisResult<HashMap<String, f64>> {
    let file = File::open(path).map_err(|e| DiagnosisError::artifact(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| DiagnosisError::artifact(path, e))
}

/// The whole load phase: tables, models, vocabulary, label map, validation.
pub fn build_context(config: &EngineConfig) -> DiagnosisResult<Context> {
    let data = &config.data;
    let rows = read_disease_table(&data.disease_table)?;
    let descriptions = match &data.descriptions {
        Some(path) => read_descriptions(path)?,
        None => HashMap::new(),
    };
    let catalog = DiseaseCatalog::from_rows(rows, &descriptions, &data.description_placeholder);

    let accuracies = match &config.accuracy_table {
        Some(path) => read_accuracies(path)?,
        None => HashMap::new(),
    };
    let mut models = Vec::with_capacity(config.models.len());
    for m in &config.models {
        let artifact = read_model(&m.artifact)?;
        let accuracy = m.accuracy.or_else(|| accuracies.get(&m.name).copied());
        models.push(TrainedModel {
            name: m.name.clone(),
            accuracy,
            artifact,
        });
    }
    let strategy = InferenceStrategy::select(models)?;

    let vocabulary = match strategy.models().first() {
        Some(primary) => FeatureVocabulary::from_ordered(primary.artifact.feature_names().to_vec()),
        None => FeatureVocabulary::from_observed(catalog.all_symptoms()),
    };

    let training = match &data.training_table {
        Some(path) => Some(read_training_table(path, &data.label_column)?),
        None => None,
    };
    if let (Some(table), false) = (&training, strategy.models().is_empty()) {
        if table.features != vocabulary.tokens() {
            return Err(DiagnosisError::init(format!(
                "training table features ({}) do not match the model's feature order ({})",
                table.features.len(),
                vocabulary.len()
            )));
        }
    }

    let labels = match (&data.label_map, &training) {
        (Some(path), _) => read_label_map(path)?,
        (None, Some(table)) => LabelMap::infer_positional(&table.labels, &catalog.unique_names())?,
        (None, None) if strategy.models().is_empty() => LabelMap::default(),
        (None, None) => {
            return Err(DiagnosisError::init(
                "a model-backed strategy needs a label_map or a training_table",
            ))
        }
    };

    let context = Context::new(vocabulary, catalog, labels, strategy)?;
    log::info!(
        "Context ready: {} strategy, {} symptoms, {} catalog entries, {} labels",
        context.strategy().name(),
        context.vocabulary().len(),
        context.catalog().len(),
        context.labels().len()
    );
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn disease_table_splits_and_skips_blank_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.csv");
        fs::write(
            &path,
            "Disease,Symptom_1,Symptom_2,Symptom_3\nFlu, fever,\"cough, fatigue\",\nCold,sneezing,,\n",
        )
        .unwrap();
        let rows = read_disease_table(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "Flu");
        assert_eq!(rows[0].1, vec!["fever".to_string(), "cough, fatigue".to_string()]);
        assert_eq!(rows[1].1, vec!["sneezing".to_string()]);
    }

    #[test]
    fn missing_disease_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.csv");
        fs::write(&path, "Name,Symptom_1\nFlu,fever\n").unwrap();
        let err = read_disease_table(&path).unwrap_err();
        assert!(err.to_string().contains("Disease"));
    }

    #[test]
    fn labels_accept_float_formatting() {
        let p = Path::new("t.csv");
        assert_eq!(parse_label("7", p).unwrap(), 7);
        assert_eq!(parse_label("7.0", p).unwrap(), 7);
        assert!(parse_label("7.5", p).is_err());
        assert!(parse_label("flu", p).is_err());
    }

    #[test]
    fn out_of_range_float_labels_are_rejected() {
        let p = Path::new("t.csv");
        assert!(parse_label("1e300", p).is_err());
        assert!(parse_label("-1e300", p).is_err());
        assert!(parse_label("9223372036854775808.0", p).is_err());
        assert!(parse_label("inf", p).is_err());
        assert_eq!(parse_label("-3.0", p).unwrap(), -3);
    }

    #[test]
    fn conflicting_label_map_is_an_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        fs::write(&path, "id,disease\n1,Flu\n1,Cold\n2,Cold\n").unwrap();
        let err = read_label_map(&path).unwrap_err();
        assert_eq!(err.kind(), "initialization");
        assert!(err.to_string().contains("id 1 maps to both 'Flu' and 'Cold'"));
        assert!(err.to_string().contains("labels.csv"));

        fs::write(&path, "id,disease\n1,Flu\n1,Flu\n2,Cold\n").unwrap();
        assert_eq!(read_label_map(&path).unwrap().len(), 2);
    }

    #[test]
    fn training_table_header_excludes_label_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.csv");
        fs::write(&path, "fever,cough,disease\n1,0,4\n0,1,2\n").unwrap();
        let table = read_training_table(&path, "disease").unwrap();
        assert_eq!(table.features, vec!["fever".to_string(), "cough".to_string()]);
        assert_eq!(table.labels, vec![4, 2]);
    }

    #[test]
    fn model_format_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ModelArtifact::Linear(crate::model::LinearModel {
            feature_names: vec!["fever".into()],
            classes: vec![0, 1],
            coefficients: vec![vec![1.0]],
            intercepts: vec![0.0],
        });
        let json_path = dir.path().join("m.json");
        fs::write(&json_path, serde_json::to_string(&artifact).unwrap()).unwrap();
        let bin_path = dir.path().join("m.bin");
        fs::write(&bin_path, bincode::serialize(&artifact).unwrap()).unwrap();
        assert_eq!(read_model(&json_path).unwrap().kind(), "linear");
        assert_eq!(read_model(&bin_path).unwrap().classes(), &[0, 1]);
    }
}
