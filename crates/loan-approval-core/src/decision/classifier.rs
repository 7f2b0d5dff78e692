use serde::{Deserialize, Serialize};

use crate::LoanResult;

/// Label emitted by a classifier for an approved application.
pub const LABEL_APPROVED: u8 = 1;
/// Label emitted by a classifier for a rejected application.
pub const LABEL_REJECTED: u8 = 0;

/// Single feature row handed to a classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub applicant_income: f64,
    pub loan_amount: f64,
    pub credit_history: String,
    pub employment_type: String,
}

/// A pre-trained binary classifier the cascade falls back to.
///
/// Implementations are shared across requests behind an `Arc`, so every
/// method takes `&self` and must be safe for concurrent read-only use.
pub trait Classifier: Send + Sync {
    /// Predict the binary label (0 = reject, 1 = approve) for one row.
    fn predict(&self, row: &FeatureRow) -> LoanResult<u8>;

    /// Per-class probabilities for one row, indexed by label.
    ///
    /// Providers that cannot score confidence keep the default `Ok(None)`.
    fn predict_proba(&self, _row: &FeatureRow) -> LoanResult<Option<Vec<f64>>> {
        Ok(None)
    }
}
