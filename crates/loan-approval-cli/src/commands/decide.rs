use std::sync::Arc;

use clap::Args;
use serde_json::{Map, Value};
use tracing::warn;

use loan_approval_core::decision::{Classifier, DecisionCascade, DecisionResponse};
use loan_approval_core::model::ModelPipeline;

use crate::input;

/// Arguments for a loan decision
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DecideArgs {
    /// Path to JSON input file: one application object or an array of them
    #[arg(long)]
    pub input: Option<String>,

    /// Applicant income
    #[arg(long, alias = "income")]
    pub applicant_income: Option<String>,

    /// Requested loan amount
    #[arg(long, alias = "loan")]
    pub loan_amount: Option<String>,

    /// Credit history ("good" or "bad")
    #[arg(long, alias = "credit")]
    pub credit_history: Option<String>,

    /// Employment type ("salaried", "self-employed" or "unemployed")
    #[arg(long, alias = "employment")]
    pub employment_type: Option<String>,

    /// Trained model artifact
    #[arg(long, env = "LOAN_MODEL_PATH", default_value = "model.json")]
    pub model: String,
}

pub fn run_decide(args: DecideArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payload = if let Some(ref path) = args.input {
        Some(input::file::read_json_value(path)?)
    } else if let Some(data) = input::stdin::read_stdin()? {
        Some(data)
    } else {
        flags_payload(&args)
    };

    let cascade = load_cascade(&args.model)?;

    match payload {
        Some(Value::Array(items)) => {
            let rows = items
                .iter()
                .enumerate()
                .map(|(i, item)| batch_row(i, &cascade.respond(Some(item))))
                .collect();
            Ok(Value::Array(rows))
        }
        other => Ok(flatten(&cascade.respond(other.as_ref()))),
    }
}

/// Load the artifact once; a missing file leaves the cascade without a model.
fn load_cascade(path: &str) -> Result<DecisionCascade, Box<dyn std::error::Error>> {
    let model = ModelPipeline::load_optional(path)?;
    if model.is_none() {
        warn!(path, "no model artifact; applications reaching the model will fail");
    }
    Ok(DecisionCascade::new(
        model.map(|m| Arc::new(m) as Arc<dyn Classifier>),
    ))
}

/// Build a payload from individual flags. Values stay raw strings so the
/// cascade applies the same coercion as for JSON input.
fn flags_payload(args: &DecideArgs) -> Option<Value> {
    let fields = [
        ("applicant_income", &args.applicant_income),
        ("loan_amount", &args.loan_amount),
        ("credit_history", &args.credit_history),
        ("employment_type", &args.employment_type),
    ];
    let map: Map<String, Value> = fields
        .iter()
        .filter_map(|(key, val)| {
            val.as_ref()
                .map(|v| (key.to_string(), Value::String(v.clone())))
        })
        .collect();
    if map.is_empty() {
        None
    } else {
        Some(Value::Object(map))
    }
}

fn flatten(resp: &DecisionResponse) -> Value {
    let mut map = Map::new();
    map.insert("http_status".into(), Value::from(resp.http_status));
    if let Value::Object(body) = &resp.body {
        map.extend(body.clone());
    }
    Value::Object(map)
}

/// Fixed column set so table and CSV output line up across mixed outcomes.
fn batch_row(index: usize, resp: &DecisionResponse) -> Value {
    let field = |key: &str| resp.body.get(key).cloned().unwrap_or(Value::Null);
    let mut map = Map::new();
    map.insert("index".into(), Value::from(index));
    map.insert("http_status".into(), Value::from(resp.http_status));
    for key in ["status", "reason", "confidence", "error"] {
        map.insert(key.into(), field(key));
    }
    Value::Object(map)
}
