//! Binary classification report: per-class precision, recall, F1 and support,
//! overall accuracy, and macro / support-weighted averages.
//!
//! Any metric with a zero denominator is reported as 0.

use serde::{Deserialize, Serialize};

use crate::error::LoanError;
use crate::LoanResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    /// `[[tn, fp], [fn, tp]]`, rows = actual, columns = predicted.
    pub confusion_matrix: [[u64; 2]; 2],
    pub support: u64,
}

pub fn classification_report(actual: &[u8], predicted: &[u8]) -> LoanResult<ClassificationReport> {
    if actual.len() != predicted.len() {
        return Err(LoanError::InvalidInput {
            field: "predicted".into(),
            reason: format!(
                "{} predictions for {} observations",
                predicted.len(),
                actual.len()
            ),
        });
    }
    if actual.is_empty() {
        return Err(LoanError::InsufficientData(
            "At least one observation is required.".into(),
        ));
    }

    let mut cm = [[0u64; 2]; 2];
    for (&a, &p) in actual.iter().zip(predicted) {
        if a > 1 || p > 1 {
            return Err(LoanError::InvalidInput {
                field: "label".into(),
                reason: "Labels must be 0 or 1.".into(),
            });
        }
        cm[a as usize][p as usize] += 1;
    }

    let total = actual.len() as u64;
    let classes: Vec<ClassMetrics> = (0..2usize)
        .map(|c| {
            let tp = cm[c][c];
            let predicted_c = cm[0][c] + cm[1][c];
            let support = cm[c][0] + cm[c][1];
            let precision = ratio(tp, predicted_c);
            let recall = ratio(tp, support);
            let f1_score = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                label: c as u8,
                precision,
                recall,
                f1_score,
                support,
            }
        })
        .collect();

    let macro_avg = AverageMetrics {
        precision: classes.iter().map(|c| c.precision).sum::<f64>() / 2.0,
        recall: classes.iter().map(|c| c.recall).sum::<f64>() / 2.0,
        f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / 2.0,
    };
    let weight = |f: fn(&ClassMetrics) -> f64| {
        classes
            .iter()
            .map(|c| f(c) * c.support as f64)
            .sum::<f64>()
            / total as f64
    };
    let weighted_avg = AverageMetrics {
        precision: weight(|c| c.precision),
        recall: weight(|c| c.recall),
        f1_score: weight(|c| c.f1_score),
    };

    Ok(ClassificationReport {
        accuracy: ratio(cm[0][0] + cm[1][1], total),
        classes,
        macro_avg,
        weighted_avg,
        confusion_matrix: cm,
        support: total,
    })
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
