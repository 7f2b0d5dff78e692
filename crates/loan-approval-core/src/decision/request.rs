use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::decision::classifier::FeatureRow;
use crate::error::LoanError;
use crate::types::Money;
use crate::LoanResult;

/// Required payload keys, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 4] = [
    "applicant_income",
    "loan_amount",
    "credit_history",
    "employment_type",
];

/// A validated loan application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    /// Applicant income in monetary units.
    pub applicant_income: Money,
    /// Requested loan amount in monetary units.
    pub loan_amount: Money,
    /// Expected "good" or "bad"; not checked against that domain.
    pub credit_history: String,
    /// Expected "salaried", "self-employed" or "unemployed"; not checked either.
    pub employment_type: String,
}

impl LoanRequest {
    /// Validate presence and coerce types from an untyped JSON payload.
    ///
    /// Empty payloads (`null`, `false`, `0`, `""`, `[]`, `{}`) count as missing.
    /// Money fields accept finite JSON numbers or numeric strings. Categorical
    /// fields accept strings, numbers or booleans, which are stringified.
    pub fn from_payload(payload: Option<&Value>) -> LoanResult<Self> {
        let map = match payload {
            None => return Err(missing_payload()),
            Some(value) if is_empty_payload(value) => return Err(missing_payload()),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(LoanError::Validation(
                    "JSON payload must be an object".into(),
                ))
            }
        };

        for field in REQUIRED_FIELDS {
            if !map.contains_key(field) {
                return Err(LoanError::Validation(format!("Missing field: {field}")));
            }
        }

        Ok(LoanRequest {
            applicant_income: coerce_money(map, "applicant_income")?,
            loan_amount: coerce_money(map, "loan_amount")?,
            credit_history: coerce_category(map, "credit_history")?,
            employment_type: coerce_category(map, "employment_type")?,
        })
    }

    /// Convert into the row shape classifiers consume.
    pub fn to_feature_row(&self) -> FeatureRow {
        FeatureRow {
            applicant_income: self.applicant_income,
            loan_amount: self.loan_amount,
            credit_history: self.credit_history.clone(),
            employment_type: self.employment_type.clone(),
        }
    }
}

fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn missing_payload() -> LoanError {
    LoanError::Validation("No JSON payload provided".into())
}

fn invalid_type(field: &str, detail: impl std::fmt::Display) -> LoanError {
    LoanError::Validation(format!("Invalid input types: {field}: {detail}"))
}

fn coerce_money(map: &Map<String, Value>, field: &str) -> LoanResult<Money> {
    let value = match &map[field] {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| invalid_type(field, "not a finite number"))?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            invalid_type(field, format!("could not convert string to number: '{s}'"))
        })?,
        other => {
            return Err(invalid_type(
                field,
                format!("expected a number, got {}", json_kind(other)),
            ))
        }
    };
    if !value.is_finite() {
        return Err(invalid_type(field, "not a finite number"));
    }
    Ok(value)
}

fn coerce_category(map: &Map<String, Value>, field: &str) -> LoanResult<String> {
    match &map[field] {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(invalid_type(
            field,
            format!("expected a string, got {}", json_kind(other)),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
