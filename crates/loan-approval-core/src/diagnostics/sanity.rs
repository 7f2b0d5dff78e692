//! Operator-facing sanity check for raw income / loan figures.
//!
//! Uses wider thresholds (20x and 100x) than the live cascade and is never
//! consulted by it.

use serde::{Deserialize, Serialize};

pub const UNREALISTIC_RATIO: f64 = 100.0;
pub const SUSPICIOUS_RATIO: f64 = 20.0;
const RATIO_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SanityLevel {
    Ok,
    Suspicious,
    Unrealistic,
}

impl std::fmt::Display for SanityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SanityLevel::Ok => write!(f, "ok"),
            SanityLevel::Suspicious => write!(f, "suspicious"),
            SanityLevel::Unrealistic => write!(f, "unrealistic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanityCheck {
    pub level: SanityLevel,
    pub ratio: f64,
    pub message: String,
}

pub fn sanity_check_input(applicant_income: f64, loan_amount: f64) -> SanityCheck {
    let ratio = loan_amount / (applicant_income + RATIO_EPSILON);
    let (level, message) = if ratio > UNREALISTIC_RATIO {
        (
            SanityLevel::Unrealistic,
            format!("⚠️ Unrealistic input: loan is {ratio:.1}× income — auto-reject likely."),
        )
    } else if ratio > SUSPICIOUS_RATIO {
        (
            SanityLevel::Suspicious,
            format!("⚠️ Suspicious input: loan is {ratio:.1}× income — model may be unreliable."),
        )
    } else {
        (
            SanityLevel::Ok,
            format!("✅ Input looks reasonable (Loan-to-income ratio = {ratio:.2})."),
        )
    };
    SanityCheck {
        level,
        ratio,
        message,
    }
}
