use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use loan_approval_core::decision::{
    Classifier, Decision, DecisionCascade, DecisionStage, DecisionStatus, FeatureRow,
};
use loan_approval_core::{LoanError, LoanResult};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

// ===========================================================================
// Stub classifiers
// ===========================================================================

/// Returns a fixed label and optional probabilities, counting every call.
struct StubClassifier {
    label: u8,
    proba: Option<Vec<f64>>,
    predict_calls: AtomicUsize,
    last_row: std::sync::Mutex<Option<FeatureRow>>,
}

impl StubClassifier {
    fn new(label: u8, proba: Option<Vec<f64>>) -> Arc<Self> {
        Arc::new(StubClassifier {
            label,
            proba,
            predict_calls: AtomicUsize::new(0),
            last_row: std::sync::Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.predict_calls.load(Ordering::SeqCst)
    }
}

impl Classifier for StubClassifier {
    fn predict(&self, row: &FeatureRow) -> LoanResult<u8> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_row.lock().unwrap() = Some(row.clone());
        Ok(self.label)
    }

    fn predict_proba(&self, _row: &FeatureRow) -> LoanResult<Option<Vec<f64>>> {
        Ok(self.proba.clone())
    }
}

struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn predict(&self, _row: &FeatureRow) -> LoanResult<u8> {
        Err(LoanError::InvalidInput {
            field: "row".into(),
            reason: "feature mismatch".into(),
        })
    }
}

fn payload(income: Value, loan: Value) -> Value {
    json!({
        "applicant_income": income,
        "loan_amount": loan,
        "credit_history": "good",
        "employment_type": "salaried"
    })
}

fn cascade_with(stub: &Arc<StubClassifier>) -> DecisionCascade {
    DecisionCascade::with_classifier(stub.clone())
}

fn decide(cascade: &DecisionCascade, body: &Value) -> Decision {
    cascade.evaluate(Some(body)).unwrap()
}

// ===========================================================================
// Validation
// ===========================================================================

#[test]
fn test_missing_fields_never_reach_filters_or_model() {
    let stub = StubClassifier::new(1, None);
    let cascade = cascade_with(&stub);
    for field in [
        "applicant_income",
        "loan_amount",
        "credit_history",
        "employment_type",
    ] {
        let mut body = payload(json!(50000), json!(40000));
        body.as_object_mut().unwrap().remove(field);
        match cascade.evaluate(Some(&body)) {
            Err(LoanError::Validation(msg)) => assert_eq!(msg, format!("Missing field: {field}")),
            other => panic!("expected validation error for {field}, got {other:?}"),
        }
    }
    assert_eq!(stub.calls(), 0);
}

#[test]
fn test_missing_employment_type_response() {
    let cascade = DecisionCascade::default();
    let body = json!({
        "applicant_income": 50000,
        "loan_amount": 40000,
        "credit_history": "good"
    });
    let resp = cascade.respond(Some(&body));
    assert_eq!(resp.http_status, 400);
    assert_eq!(resp.body, json!({ "error": "Missing field: employment_type" }));
}

#[test]
fn test_no_payload_response() {
    let resp = DecisionCascade::default().respond(None);
    assert_eq!(resp.http_status, 400);
    assert_eq!(resp.body, json!({ "error": "No JSON payload provided" }));
}

// ===========================================================================
// Positivity filter
// ===========================================================================

#[test]
fn test_zero_income_rejected() {
    let stub = StubClassifier::new(1, None);
    let cascade = cascade_with(&stub);
    let resp = cascade.respond(Some(&payload(json!(0), json!(1000))));
    assert_eq!(resp.http_status, 400);
    assert_eq!(
        resp.body,
        json!({
            "status": "Rejected",
            "reason": "Applicant income and loan amount must be positive values."
        })
    );
    assert_eq!(stub.calls(), 0);
}

#[test]
fn test_non_positive_values_rejected_regardless_of_other_fields() {
    let cascade = DecisionCascade::default();
    for (income, loan) in [(0, 0), (-5, 1000), (1000, 0), (1000, -1), (-1, -1)] {
        let mut body = payload(json!(income), json!(loan));
        body["credit_history"] = json!("anything");
        let d = decide(&cascade, &body);
        assert_eq!(d.status, DecisionStatus::Rejected);
        assert_eq!(d.stage, DecisionStage::PositivityFilter);
    }
}

// ===========================================================================
// Ratio filter
// ===========================================================================

#[test]
fn test_unrealistic_ratio_auto_rejected() {
    let stub = StubClassifier::new(1, None);
    let cascade = cascade_with(&stub);
    let resp = cascade.respond(Some(&payload(json!(10000), json!(600000))));
    assert_eq!(resp.http_status, 400);
    assert_eq!(
        resp.body,
        json!({
            "status": "Rejected",
            "reason": "Unrealistic loan-to-income ratio (60.00). Auto-rejected."
        })
    );
    assert_eq!(stub.calls(), 0);
}

#[test]
fn test_high_ratio_flagged_without_model() {
    let stub = StubClassifier::new(1, Some(vec![0.1, 0.9]));
    let cascade = cascade_with(&stub);
    let resp = cascade.respond(Some(&payload(json!(10000), json!(200000))));
    assert_eq!(resp.http_status, 200);
    assert_eq!(
        resp.body,
        json!({
            "status": "High Risk",
            "reason": "High loan-to-income ratio (20.00). Application flagged for review."
        })
    );
    assert_eq!(stub.calls(), 0);
}

#[test]
fn test_high_risk_band_never_invokes_classifier() {
    let stub = StubClassifier::new(1, None);
    let cascade = cascade_with(&stub);
    for loan in [150_001, 160_000, 333_333, 499_999, 500_000] {
        let d = decide(&cascade, &payload(json!(10000), json!(loan)));
        assert_eq!(d.status, DecisionStatus::HighRisk, "loan {loan}");
    }
    assert_eq!(stub.calls(), 0);
}

#[test]
fn test_ratio_exactly_fifty_is_high_risk() {
    let cascade = DecisionCascade::default();
    let d = decide(&cascade, &payload(json!(10000), json!(500000)));
    assert_eq!(d.status, DecisionStatus::HighRisk);
    assert_eq!(d.ratio, Some(50.0));
    assert_eq!(
        d.reason.as_deref(),
        Some("High loan-to-income ratio (50.00). Application flagged for review.")
    );
}

#[test]
fn test_ratio_exactly_fifteen_goes_to_model() {
    let stub = StubClassifier::new(0, None);
    let cascade = cascade_with(&stub);
    let d = decide(&cascade, &payload(json!(10000), json!(150000)));
    assert_eq!(d.stage, DecisionStage::Model);
    assert_eq!(d.status, DecisionStatus::Rejected);
    assert_eq!(stub.calls(), 1);
}

#[test]
fn test_ratio_reason_rounds_to_two_decimals() {
    let cascade = DecisionCascade::default();
    let d = decide(&cascade, &payload(json!(3000), json!(200000)));
    assert_eq!(
        d.reason.as_deref(),
        Some("Unrealistic loan-to-income ratio (66.67). Auto-rejected.")
    );
}

#[test]
fn test_ratio_beyond_decimal_range_is_auto_rejected() {
    let stub = StubClassifier::new(1, None);
    let cascade = cascade_with(&stub);
    let resp = cascade.respond(Some(&payload(
        json!("0.0000000000000000000000000001"),
        json!("79228162514264337593543950335"),
    )));
    assert_eq!(resp.http_status, 400);
    assert_eq!(resp.body["status"], "Rejected");
    let reason = resp.body["reason"].as_str().unwrap();
    assert!(reason.starts_with("Unrealistic loan-to-income ratio ("), "{reason}");
    assert!(reason.ends_with("). Auto-rejected."), "{reason}");
    assert_eq!(stub.calls(), 0);
}

#[test]
fn test_overflowing_ratio_is_auto_rejected() {
    let cascade = DecisionCascade::default();
    let resp = cascade.respond(Some(&payload(json!(1e-300), json!(1e300))));
    assert_eq!(resp.http_status, 400);
    assert_eq!(
        resp.body,
        json!({
            "status": "Rejected",
            "reason": "Unrealistic loan-to-income ratio (inf). Auto-rejected."
        })
    );
}

#[test]
fn test_tiny_positive_income_is_not_a_positivity_rejection() {
    let cascade = DecisionCascade::default();
    let d = decide(&cascade, &payload(json!(1e-30), json!(1000)));
    assert_eq!(d.status, DecisionStatus::Rejected);
    assert_eq!(d.stage, DecisionStage::RatioFilter);
    let reason = d.reason.unwrap();
    assert!(reason.starts_with("Unrealistic loan-to-income ratio ("), "{reason}");
}

#[test]
fn test_huge_balanced_amounts_reach_model() {
    let stub = StubClassifier::new(1, None);
    let cascade = cascade_with(&stub);
    let d = decide(&cascade, &payload(json!(1e30), json!(1e30)));
    assert_eq!(d.stage, DecisionStage::Model);
    assert_eq!(d.status, DecisionStatus::Approved);
    assert_eq!(d.ratio, Some(1.0));
    assert_eq!(stub.calls(), 1);
}

// ===========================================================================
// Model path
// ===========================================================================

#[test]
fn test_low_ratio_invokes_model_with_coerced_row() {
    let stub = StubClassifier::new(1, None);
    let cascade = cascade_with(&stub);
    let d = decide(&cascade, &payload(json!(50000), json!("40000")));
    assert_eq!(d.status, DecisionStatus::Approved);
    assert_eq!(d.ratio, Some(0.8));
    assert_eq!(stub.calls(), 1);
    assert_eq!(
        stub.last_row.lock().unwrap().clone(),
        Some(FeatureRow {
            applicant_income: 50000.0,
            loan_amount: 40000.0,
            credit_history: "good".into(),
            employment_type: "salaried".into(),
        })
    );
}

#[test]
fn test_label_determines_status() {
    for (label, status) in [(1, "Approved"), (0, "Rejected")] {
        let stub = StubClassifier::new(label, None);
        let resp = cascade_with(&stub).respond(Some(&payload(json!(50000), json!(40000))));
        assert_eq!(resp.http_status, 200);
        assert_eq!(resp.body, json!({ "status": status }));
    }
}

#[test]
fn test_confidence_is_rounded_max_probability() {
    let stub = StubClassifier::new(1, Some(vec![0.123456, 0.876544]));
    let cascade = cascade_with(&stub);
    let d = decide(&cascade, &payload(json!(50000), json!(40000)));
    assert_eq!(d.confidence, Some(dec!(0.8765)));

    let resp = cascade.respond(Some(&payload(json!(50000), json!(40000))));
    assert_eq!(resp.body, json!({ "status": "Approved", "confidence": 0.8765 }));
}

#[test]
fn test_confidence_within_unit_interval() {
    for proba in [vec![1.0, 0.0], vec![0.5, 0.5], vec![0.3333333, 0.6666667]] {
        let stub = StubClassifier::new(0, Some(proba));
        let d = decide(&cascade_with(&stub), &payload(json!(50000), json!(40000)));
        let c = d.confidence.unwrap();
        assert!(c >= dec!(0) && c <= dec!(1));
    }
}

#[test]
fn test_missing_model_is_unavailable_not_crash() {
    let cascade = DecisionCascade::new(None);
    let result = cascade.evaluate(Some(&payload(json!(50000), json!(40000))));
    assert!(matches!(result, Err(LoanError::ModelUnavailable(_))));

    let resp = cascade.respond(Some(&payload(json!(50000), json!(40000))));
    assert_eq!(resp.http_status, 500);
    assert!(resp.body["error"].as_str().unwrap().starts_with("Model not found"));
}

#[test]
fn test_missing_model_does_not_block_filters() {
    let cascade = DecisionCascade::new(None);
    let d = decide(&cascade, &payload(json!(10000), json!(600000)));
    assert_eq!(d.status, DecisionStatus::Rejected);
}

#[test]
fn test_provider_failure_surfaces_as_inference_error() {
    let cascade = DecisionCascade::with_classifier(Arc::new(FailingClassifier));
    let result = cascade.evaluate(Some(&payload(json!(50000), json!(40000))));
    match result {
        Err(LoanError::Inference(msg)) => assert!(msg.contains("feature mismatch"), "{msg}"),
        other => panic!("expected inference error, got {other:?}"),
    }
    let resp = cascade.respond(Some(&payload(json!(50000), json!(40000))));
    assert_eq!(resp.http_status, 500);
}

#[test]
fn test_cascade_shared_across_threads() {
    let stub = StubClassifier::new(1, Some(vec![0.2, 0.8]));
    let cascade = cascade_with(&stub);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cascade = cascade.clone();
            std::thread::spawn(move || {
                cascade
                    .evaluate(Some(&payload(json!(50000), json!(40000))))
                    .unwrap()
                    .status
            })
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), DecisionStatus::Approved);
    }
    assert_eq!(stub.calls(), 4);
}
