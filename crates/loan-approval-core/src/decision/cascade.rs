use std::sync::Arc;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use tracing::debug;

use crate::decision::classifier::{Classifier, LABEL_APPROVED, LABEL_REJECTED};
use crate::decision::request::LoanRequest;
use crate::decision::response::{Decision, DecisionResponse, DecisionStage, DecisionStatus};
use crate::error::LoanError;
use crate::types::{Probability, Ratio};
use crate::LoanResult;

/// Ratios strictly above this are rejected without consulting the model.
pub const AUTO_REJECT_RATIO: Ratio = 50.0;
/// Ratios strictly above this (and not above the auto-reject bound) go to manual review.
pub const HIGH_RISK_RATIO: Ratio = 15.0;

pub const NON_POSITIVE_REASON: &str = "Applicant income and loan amount must be positive values.";
pub const MODEL_UNAVAILABLE_MESSAGE: &str =
    "Model not found. Run `loan train` to create the model artifact.";

/// Deterministic filters followed by a classifier fallback.
///
/// The classifier is injected once and shared read-only; cloning the cascade
/// only clones the `Arc`.
#[derive(Clone, Default)]
pub struct DecisionCascade {
    classifier: Option<Arc<dyn Classifier>>,
}

impl std::fmt::Debug for DecisionCascade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionCascade")
            .field("has_classifier", &self.has_classifier())
            .finish()
    }
}

impl DecisionCascade {
    pub fn new(classifier: Option<Arc<dyn Classifier>>) -> Self {
        DecisionCascade { classifier }
    }

    pub fn with_classifier(classifier: Arc<dyn Classifier>) -> Self {
        DecisionCascade {
            classifier: Some(classifier),
        }
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Validate an untyped payload and run it through the cascade.
    pub fn evaluate(&self, payload: Option<&Value>) -> LoanResult<Decision> {
        let request = LoanRequest::from_payload(payload)?;
        self.decide(&request)
    }

    /// Run an already-validated request through the filters and the model.
    pub fn decide(&self, request: &LoanRequest) -> LoanResult<Decision> {
        if let Some(decision) = apply_filters(request) {
            return Ok(decision);
        }
        self.invoke_classifier(request)
    }

    /// `evaluate`, with every outcome mapped onto the response contract.
    pub fn respond(&self, payload: Option<&Value>) -> DecisionResponse {
        DecisionResponse::from_outcome(&self.evaluate(payload))
    }

    fn invoke_classifier(&self, request: &LoanRequest) -> LoanResult<Decision> {
        let ratio = loan_to_income(request);
        let classifier = self
            .classifier
            .as_ref()
            .ok_or_else(|| LoanError::ModelUnavailable(MODEL_UNAVAILABLE_MESSAGE.into()))?;

        let row = request.to_feature_row();
        let label = classifier.predict(&row).map_err(into_inference)?;
        let status = match label {
            LABEL_APPROVED => DecisionStatus::Approved,
            LABEL_REJECTED => DecisionStatus::Rejected,
            other => {
                return Err(LoanError::Inference(format!(
                    "classifier returned unknown label {other}"
                )))
            }
        };

        let confidence = match classifier.predict_proba(&row).map_err(into_inference)? {
            Some(probabilities) => Some(max_probability(&probabilities)?),
            None => None,
        };

        debug!(
            stage = "model",
            %ratio,
            %status,
            confidence = ?confidence,
            "classifier resolved application"
        );
        Ok(Decision {
            status,
            stage: DecisionStage::Model,
            reason: None,
            confidence,
            ratio: Some(ratio),
        })
    }
}

/// Positivity and ratio filters. `None` means the model must decide.
pub fn apply_filters(request: &LoanRequest) -> Option<Decision> {
    if request.applicant_income <= 0.0 || request.loan_amount <= 0.0 {
        debug!(stage = "positivity", "rejected non-positive income or loan amount");
        return Some(Decision::filtered(
            DecisionStatus::Rejected,
            DecisionStage::PositivityFilter,
            NON_POSITIVE_REASON.into(),
            None,
        ));
    }

    let ratio = loan_to_income(request);
    if ratio > AUTO_REJECT_RATIO {
        debug!(stage = "ratio", %ratio, "auto-rejected unrealistic ratio");
        return Some(Decision::filtered(
            DecisionStatus::Rejected,
            DecisionStage::RatioFilter,
            format!(
                "Unrealistic loan-to-income ratio ({}). Auto-rejected.",
                format_ratio(ratio)
            ),
            Some(ratio),
        ));
    }
    if ratio > HIGH_RISK_RATIO {
        debug!(stage = "ratio", %ratio, "flagged high ratio for review");
        return Some(Decision::filtered(
            DecisionStatus::HighRisk,
            DecisionStage::RatioFilter,
            format!(
                "High loan-to-income ratio ({}). Application flagged for review.",
                format_ratio(ratio)
            ),
            Some(ratio),
        ));
    }
    None
}

/// Loan amount over income. Callers guarantee a positive income, so the
/// result is positive and overflows to `+inf` rather than failing.
fn loan_to_income(request: &LoanRequest) -> Ratio {
    request.loan_amount / request.applicant_income
}

/// Two decimals, half away from zero, always padded: 60 -> "60.00".
///
/// Ratios too large for `Decimal` (or infinite) use the float formatter.
pub fn format_ratio(ratio: Ratio) -> String {
    match Decimal::from_f64(ratio) {
        Some(exact) => {
            let mut rounded =
                exact.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(2);
            rounded.to_string()
        }
        None => format!("{ratio:.2}"),
    }
}

fn max_probability(probabilities: &[f64]) -> LoanResult<Probability> {
    let mut max: Option<f64> = None;
    for &p in probabilities {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(LoanError::Inference(format!(
                "classifier returned invalid probability {p}"
            )));
        }
        max = Some(max.map_or(p, |m: f64| m.max(p)));
    }
    let max = max.ok_or_else(|| {
        LoanError::Inference("classifier returned an empty probability vector".into())
    })?;
    let confidence = Decimal::try_from(max).map_err(|e| LoanError::Inference(e.to_string()))?;
    Ok(confidence.round_dp_with_strategy(4, RoundingStrategy::MidpointNearestEven))
}

fn into_inference(err: LoanError) -> LoanError {
    match err {
        LoanError::Inference(msg) => LoanError::Inference(msg),
        other => LoanError::Inference(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::classifier::FeatureRow;
    use rust_decimal_macros::dec;

    struct Fixed(u8);

    impl Classifier for Fixed {
        fn predict(&self, _row: &FeatureRow) -> LoanResult<u8> {
            Ok(self.0)
        }
    }

    fn request(income: f64, loan: f64) -> LoanRequest {
        LoanRequest {
            applicant_income: income,
            loan_amount: loan,
            credit_history: "good".into(),
            employment_type: "salaried".into(),
        }
    }

    #[test]
    fn test_format_ratio_pads_and_rounds() {
        assert_eq!(format_ratio(60.0), "60.00");
        assert_eq!(format_ratio(20.125), "20.13");
        assert_eq!(format_ratio(50000.0 / 3000.0), "16.67");
    }

    #[test]
    fn test_format_ratio_beyond_decimal_range() {
        assert_eq!(format_ratio(f64::INFINITY), "inf");
        assert_eq!(format_ratio(1e30), format!("{:.2}", 1e30));
    }

    #[test]
    fn test_overflowing_ratio_is_auto_rejected() {
        let d = apply_filters(&request(1e-300, 1e300)).unwrap();
        assert_eq!(d.status, DecisionStatus::Rejected);
        assert_eq!(d.stage, DecisionStage::RatioFilter);
        assert_eq!(d.ratio, Some(f64::INFINITY));
        assert_eq!(
            d.reason.as_deref(),
            Some("Unrealistic loan-to-income ratio (inf). Auto-rejected.")
        );
    }

    #[test]
    fn test_negative_loan_rejected_before_ratio() {
        let d = apply_filters(&request(1000.0, -5.0)).unwrap();
        assert_eq!(d.stage, DecisionStage::PositivityFilter);
        assert_eq!(d.ratio, None);
    }

    #[test]
    fn test_ratio_boundaries_are_strict() {
        let at_fifty = apply_filters(&request(1000.0, 50000.0)).unwrap();
        assert_eq!(at_fifty.status, DecisionStatus::HighRisk);

        let above_fifty = apply_filters(&request(1000.0, 50000.01)).unwrap();
        assert_eq!(above_fifty.status, DecisionStatus::Rejected);

        assert!(apply_filters(&request(1000.0, 15000.0)).is_none());
        let above_fifteen = apply_filters(&request(1000.0, 15000.01)).unwrap();
        assert_eq!(above_fifteen.status, DecisionStatus::HighRisk);
    }

    #[test]
    fn test_unknown_label_is_inference_error() {
        let cascade = DecisionCascade::with_classifier(Arc::new(Fixed(7)));
        let err = cascade.decide(&request(1000.0, 500.0)).unwrap_err();
        assert!(matches!(err, LoanError::Inference(_)));
    }

    #[test]
    fn test_max_probability_validation() {
        assert_eq!(max_probability(&[0.25, 0.75]).unwrap(), dec!(0.75));
        assert!(max_probability(&[]).is_err());
        assert!(max_probability(&[f64::NAN]).is_err());
        assert!(max_probability(&[1.5]).is_err());
    }
}
