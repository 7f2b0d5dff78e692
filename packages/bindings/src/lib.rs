use std::sync::Arc;

use napi::Result as NapiResult;
use napi_derive::napi;

use loan_approval_core::decision::{Classifier, DecisionCascade};
use loan_approval_core::diagnostics::sanity;
use loan_approval_core::model::ModelPipeline;
use loan_approval_core::training::{self, TrainingInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Decision cascade with its model loaded once at construction.
#[napi]
pub struct LoanDecider {
    cascade: DecisionCascade,
}

#[napi]
impl LoanDecider {
    /// Load the artifact at `model_path` if it exists. Without one, requests
    /// that reach the model answer 500 "Model not found".
    #[napi(constructor)]
    pub fn new(model_path: Option<String>) -> napi::Result<Self> {
        let model = match model_path {
            Some(path) => ModelPipeline::load_optional(&path).map_err(to_napi_error)?,
            None => None,
        };
        Ok(LoanDecider {
            cascade: DecisionCascade::new(model.map(|m| Arc::new(m) as Arc<dyn Classifier>)),
        })
    }

    #[napi(getter)]
    pub fn has_model(&self) -> bool {
        self.cascade.has_classifier()
    }

    /// Decide one JSON payload. Returns `{"httpStatus": .., "body": {..}}`.
    /// Malformed JSON is answered like a missing payload, never thrown.
    #[napi]
    pub fn decide(&self, payload_json: String) -> NapiResult<String> {
        let payload: Option<serde_json::Value> = serde_json::from_str(&payload_json).ok();
        let resp = self.cascade.respond(payload.as_ref());
        serde_json::to_string(&serde_json::json!({
            "httpStatus": resp.http_status,
            "body": resp.body,
        }))
        .map_err(to_napi_error)
    }
}

// ---------------------------------------------------------------------------
// Training & diagnostics
// ---------------------------------------------------------------------------

#[napi]
pub fn train_model(input_json: String, out_path: String) -> NapiResult<String> {
    let input: TrainingInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let trained = training::train_model(&input).map_err(to_napi_error)?;
    trained.pipeline.save(&out_path).map_err(to_napi_error)?;
    serde_json::to_string(&trained.report).map_err(to_napi_error)
}

#[napi]
pub fn sanity_check(applicant_income: f64, loan_amount: f64) -> NapiResult<String> {
    let output = sanity::sanity_check_input(applicant_income, loan_amount);
    serde_json::to_string(&output).map_err(to_napi_error)
}
