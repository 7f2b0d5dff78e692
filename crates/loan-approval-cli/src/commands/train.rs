use clap::Args;
use serde_json::Value;

use loan_approval_core::training::{self, TrainingInput};

use crate::input;

/// Arguments for offline model training
#[derive(Args)]
pub struct TrainArgs {
    /// Path to JSON training parameters (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Synthetic rows to generate
    #[arg(long)]
    pub rows: Option<usize>,

    /// Seed for data generation and the train/test split
    #[arg(long)]
    pub seed: Option<u64>,

    /// Share of rows held out for evaluation
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Maximum decision tree depth
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Where to write the model artifact
    #[arg(long, env = "LOAN_MODEL_PATH", default_value = "model.json")]
    pub out: String,
}

pub fn run_train(args: TrainArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let params: TrainingInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else {
        let defaults = TrainingInput::default();
        TrainingInput {
            rows: args.rows.unwrap_or(defaults.rows),
            seed: args.seed.unwrap_or(defaults.seed),
            test_size: args.test_size.unwrap_or(defaults.test_size),
            max_depth: args.max_depth.unwrap_or(defaults.max_depth),
        }
    };

    let trained = training::train_model(&params)?;
    trained.pipeline.save(&args.out)?;

    let mut value = serde_json::to_value(&trained.report)?;
    if let Value::Object(ref mut map) = value {
        map.insert("artifact".into(), Value::String(args.out.clone()));
    }
    Ok(value)
}
