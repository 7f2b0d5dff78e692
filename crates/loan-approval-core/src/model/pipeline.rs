use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::decision::classifier::{Classifier, FeatureRow};
use crate::error::LoanError;
use crate::model::preprocess::Preprocessor;
use crate::model::tree::{DecisionTreeClassifier, TreeParams};
use crate::LoanResult;

/// Bumped whenever the on-disk layout changes incompatibly.
pub const ARTIFACT_FORMAT: u32 = 1;

/// Provenance recorded alongside a fitted pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub format: u32,
    pub crate_version: String,
    pub trained_at: DateTime<Utc>,
    /// Seed of the synthetic data / split that produced the model, if any.
    pub seed: Option<u64>,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Preprocessing plus decision tree: the classifier artifact the cascade loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPipeline {
    pub metadata: ModelMetadata,
    pub preprocessor: Preprocessor,
    pub tree: DecisionTreeClassifier,
}

impl ModelPipeline {
    /// Fit the preprocessor and the tree on labelled rows.
    pub fn fit(rows: &[FeatureRow], labels: &[u8], params: TreeParams) -> LoanResult<Self> {
        let preprocessor = Preprocessor::fit(rows)?;
        let x = preprocessor.transform_all(rows);
        let tree = DecisionTreeClassifier::fit(&x, labels, params)?;
        Ok(ModelPipeline {
            metadata: ModelMetadata {
                format: ARTIFACT_FORMAT,
                crate_version: env!("CARGO_PKG_VERSION").to_string(),
                trained_at: Utc::now(),
                seed: None,
                train_rows: rows.len(),
                test_rows: 0,
            },
            preprocessor,
            tree,
        })
    }

    pub fn predict_many(&self, rows: &[FeatureRow]) -> LoanResult<Vec<u8>> {
        rows.iter().map(|r| self.predict(r)).collect()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> LoanResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| io_error(path, e))?;
        info!(path = %path.display(), nodes = self.tree.nodes.len(), "saved model artifact");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> LoanResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        Self::from_json(&contents)
    }

    /// Load the artifact if it exists. A missing file is `Ok(None)`; a file
    /// that exists but cannot be read or parsed is an error.
    pub fn load_optional(path: impl AsRef<Path>) -> LoanResult<Option<Self>> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => {
                let pipeline = Self::from_json(&contents)?;
                info!(
                    path = %path.display(),
                    trained_at = %pipeline.metadata.trained_at,
                    "loaded model artifact"
                );
                Ok(Some(pipeline))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no model artifact found");
                Ok(None)
            }
            Err(e) => Err(io_error(path, e)),
        }
    }

    pub fn from_json(contents: &str) -> LoanResult<Self> {
        let pipeline: ModelPipeline = serde_json::from_str(contents)?;
        if pipeline.metadata.format != ARTIFACT_FORMAT {
            return Err(LoanError::SerializationError(format!(
                "unsupported artifact format {} (expected {ARTIFACT_FORMAT})",
                pipeline.metadata.format
            )));
        }
        if pipeline.tree.n_features != pipeline.preprocessor.width() {
            return Err(LoanError::SerializationError(format!(
                "tree expects {} features, preprocessor produces {}",
                pipeline.tree.n_features,
                pipeline.preprocessor.width()
            )));
        }
        pipeline.tree.validate()?;
        Ok(pipeline)
    }
}

impl Classifier for ModelPipeline {
    fn predict(&self, row: &FeatureRow) -> LoanResult<u8> {
        self.tree.predict(&self.preprocessor.transform(row))
    }

    fn predict_proba(&self, row: &FeatureRow) -> LoanResult<Option<Vec<f64>>> {
        self.tree
            .predict_proba(&self.preprocessor.transform(row))
            .map(Some)
    }
}

fn io_error(path: &Path, e: std::io::Error) -> LoanError {
    LoanError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}
