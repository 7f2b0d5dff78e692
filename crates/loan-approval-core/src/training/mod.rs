//! Offline training of the fallback classifier.
//!
//! Generates seeded synthetic applications, splits them, fits the
//! preprocessing + decision tree pipeline, and evaluates it on the held-out
//! rows. The only artifact consumed downstream is the fitted `ModelPipeline`.

pub mod report;
pub mod split;
pub mod synthetic;

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::decision::classifier::FeatureRow;
use crate::error::LoanError;
use crate::model::pipeline::ModelPipeline;
use crate::model::tree::TreeParams;
use crate::types::{with_metadata, ComputationOutput};
use crate::LoanResult;

use report::{classification_report, ClassificationReport};
use synthetic::{LabeledRow, SyntheticConfig};

/// Synthetic rows above this ratio are reported as extreme.
pub const EXTREME_RATIO: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingInput {
    /// Rows to generate before the extreme-ratio drop.
    #[serde(default = "default_rows")]
    pub rows: usize,
    /// Seeds both the generator and the train/test split.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_rows() -> usize {
    2000
}

fn default_seed() -> u64 {
    42
}

fn default_test_size() -> f64 {
    0.2
}

fn default_max_depth() -> usize {
    6
}

impl Default for TrainingInput {
    fn default() -> Self {
        TrainingInput {
            rows: default_rows(),
            seed: default_seed(),
            test_size: default_test_size(),
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Rows kept after dropping absurd ratios.
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Share of kept rows labelled approved.
    pub approval_rate: f64,
    /// Kept rows whose ratio still exceeds `EXTREME_RATIO`.
    pub extreme_rows: usize,
    pub tree_depth: usize,
    pub leaf_count: usize,
    /// Metrics on the held-out test rows.
    pub evaluation: ClassificationReport,
}

/// A fitted pipeline and the report describing how it was produced.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub pipeline: ModelPipeline,
    pub report: ComputationOutput<TrainingReport>,
}

pub fn train_model(input: &TrainingInput) -> LoanResult<TrainedModel> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.max_depth == 0 {
        return Err(LoanError::InvalidInput {
            field: "max_depth".into(),
            reason: "Must be at least 1".into(),
        });
    }

    let rows = synthetic::generate(&SyntheticConfig {
        rows: input.rows,
        seed: input.seed,
    })?;

    let extreme_rows = rows.iter().filter(|r| r.ratio() > EXTREME_RATIO).count();
    if extreme_rows > 0 {
        let msg = format!(
            "{extreme_rows} extreme loan-to-income cases (ratio > {EXTREME_RATIO}) remain in synthetic data."
        );
        warn!("{msg}");
        warnings.push(msg);
    }

    let (train, test) = split::train_test_split(&rows, input.test_size, input.seed)?;
    let (train_x, train_y) = unzip(&train);
    let (test_x, test_y) = unzip(&test);

    let params = TreeParams {
        max_depth: input.max_depth,
        ..TreeParams::default()
    };
    let mut pipeline = ModelPipeline::fit(&train_x, &train_y, params)?;
    pipeline.metadata.seed = Some(input.seed);
    pipeline.metadata.test_rows = test.len();

    let predicted = pipeline.predict_many(&test_x)?;
    let evaluation = classification_report(&test_y, &predicted)?;

    let approved = rows.iter().filter(|r| r.approved == 1).count();
    let report = TrainingReport {
        rows: rows.len(),
        train_rows: train.len(),
        test_rows: test.len(),
        approval_rate: approved as f64 / rows.len() as f64,
        extreme_rows,
        tree_depth: pipeline.tree.depth(),
        leaf_count: pipeline.tree.leaf_count(),
        evaluation,
    };
    info!(
        rows = report.rows,
        accuracy = report.evaluation.accuracy,
        depth = report.tree_depth,
        "trained loan approval model"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(TrainedModel {
        pipeline,
        report: with_metadata(
            "Synthetic rule-labelled data; standard scaling + one-hot encoding; CART decision tree (Gini)",
            &serde_json::json!({
                "rows": input.rows,
                "seed": input.seed,
                "test_size": input.test_size,
                "max_depth": input.max_depth,
            }),
            warnings,
            elapsed,
            report,
        ),
    })
}

fn unzip(rows: &[LabeledRow]) -> (Vec<FeatureRow>, Vec<u8>) {
    rows.iter()
        .map(|r| (r.features.clone(), r.approved))
        .unzip()
}
