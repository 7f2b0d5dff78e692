use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::types::{Probability, Ratio};
use crate::LoanResult;

/// Outcome status reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionStatus {
    Approved,
    Rejected,
    #[serde(rename = "High Risk")]
    HighRisk,
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionStatus::Approved => write!(f, "Approved"),
            DecisionStatus::Rejected => write!(f, "Rejected"),
            DecisionStatus::HighRisk => write!(f, "High Risk"),
        }
    }
}

/// The cascade step that resolved a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStage {
    PositivityFilter,
    RatioFilter,
    Model,
}

/// A resolved loan decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub status: DecisionStatus,
    pub stage: DecisionStage,
    /// Present whenever the classifier was not consulted.
    pub reason: Option<String>,
    /// Max class probability, rounded to 4 dp. Model decisions only.
    pub confidence: Option<Probability>,
    /// Loan-to-income ratio, once it has been computed.
    pub ratio: Option<Ratio>,
}

impl Decision {
    pub(crate) fn filtered(
        status: DecisionStatus,
        stage: DecisionStage,
        reason: String,
        ratio: Option<Ratio>,
    ) -> Self {
        Decision {
            status,
            stage,
            reason: Some(reason),
            confidence: None,
            ratio,
        }
    }

    /// True when a deterministic filter rejected the application outright.
    pub fn is_policy_rejection(&self) -> bool {
        self.status == DecisionStatus::Rejected && self.stage != DecisionStage::Model
    }

    /// Policy rejections are client errors; every other decision succeeds.
    pub fn http_status(&self) -> u16 {
        if self.is_policy_rejection() {
            400
        } else {
            200
        }
    }

    /// Wire body: `status`, plus `reason` and/or `confidence` when present.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("status".into(), Value::String(self.status.to_string()));
        if let Some(reason) = &self.reason {
            body.insert("reason".into(), Value::String(reason.clone()));
        }
        if let Some(confidence) = self.confidence.and_then(|c| c.to_f64()) {
            body.insert("confidence".into(), json!(confidence));
        }
        Value::Object(body)
    }
}

/// Status code plus JSON body, ready for any request/response boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub http_status: u16,
    pub body: Value,
}

impl DecisionResponse {
    /// Convert any cascade outcome, errors included, into a response.
    pub fn from_outcome(outcome: &LoanResult<Decision>) -> Self {
        match outcome {
            Ok(decision) => DecisionResponse {
                http_status: decision.http_status(),
                body: decision.to_body(),
            },
            Err(err) => DecisionResponse {
                http_status: err.http_status(),
                body: json!({ "error": err.to_string() }),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.http_status)
    }
}
