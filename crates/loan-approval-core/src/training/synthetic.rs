//! Rule-labelled synthetic loan applications.
//!
//! Columns are sampled independently, then each row is labelled by a fixed
//! rule list. Ambiguous rows get a seeded coin flip so the rules are not
//! perfectly learnable.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use statrs::distribution::Uniform;

use crate::decision::classifier::FeatureRow;
use crate::error::LoanError;
use crate::LoanResult;

pub const INCOME_RANGE: (f64, f64) = (5_000.0, 150_000.0);
pub const LOAN_RANGE: (f64, f64) = (10_000.0, 500_000.0);
pub const CREDIT_HISTORIES: [(&str, f64); 2] = [("good", 0.7), ("bad", 0.3)];
pub const EMPLOYMENT_TYPES: [(&str, f64); 3] =
    [("salaried", 0.6), ("self-employed", 0.3), ("unemployed", 0.1)];

/// Rows at or above this ratio are dropped after labelling.
pub const DROP_RATIO: f64 = 100.0;
/// Guards the ratio against a zero income.
pub const RATIO_EPSILON: f64 = 1e-9;
/// Ambiguous rows are approved when a uniform draw exceeds this.
pub const AMBIGUOUS_APPROVAL_CUTOFF: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    #[serde(default = "default_rows")]
    pub rows: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_rows() -> usize {
    2000
}

fn default_seed() -> u64 {
    42
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        SyntheticConfig {
            rows: default_rows(),
            seed: default_seed(),
        }
    }
}

/// A feature row with its rule-assigned label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRow {
    pub features: FeatureRow,
    pub approved: u8,
}

impl LabeledRow {
    pub fn ratio(&self) -> f64 {
        self.features.loan_amount / (self.features.applicant_income + RATIO_EPSILON)
    }
}

/// Generate `config.rows` applications, label them, and drop absurd ratios.
pub fn generate(config: &SyntheticConfig) -> LoanResult<Vec<LabeledRow>> {
    if config.rows == 0 {
        return Err(LoanError::InvalidInput {
            field: "rows".into(),
            reason: "Must be at least 1".into(),
        });
    }
    let mut rng = StdRng::seed_from_u64(config.seed);
    let n = config.rows;

    let incomes = sample_uniform(&mut rng, INCOME_RANGE, n)?;
    let loans = sample_uniform(&mut rng, LOAN_RANGE, n)?;
    let credits = sample_choice(&mut rng, &CREDIT_HISTORIES, n)?;
    let employment = sample_choice(&mut rng, &EMPLOYMENT_TYPES, n)?;

    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        let features = FeatureRow {
            applicant_income: incomes[i],
            loan_amount: loans[i],
            credit_history: credits[i].to_string(),
            employment_type: employment[i].to_string(),
        };
        let approved = label(&features, &mut rng);
        rows.push(LabeledRow { features, approved });
    }

    rows.retain(|r| r.ratio() < DROP_RATIO);
    Ok(rows)
}

/// Apply the approval rules to one row. Draws from `rng` only for ambiguous rows.
pub fn label(row: &FeatureRow, rng: &mut impl Rng) -> u8 {
    let ratio = row.loan_amount / (row.applicant_income + RATIO_EPSILON);
    let good = row.credit_history == "good";

    if ratio > 50.0 {
        0
    } else if row.employment_type == "unemployed" {
        0
    } else if !good && ratio > 2.0 {
        0
    } else if ratio < 3.0 && good {
        1
    } else if ratio < 1.5 {
        1
    } else if rng.gen::<f64>() > AMBIGUOUS_APPROVAL_CUTOFF {
        1
    } else {
        0
    }
}

fn sample_uniform(rng: &mut StdRng, (min, max): (f64, f64), n: usize) -> LoanResult<Vec<f64>> {
    let dist = Uniform::new(min, max).map_err(|e| LoanError::InvalidInput {
        field: "distribution".into(),
        reason: format!("Invalid Uniform parameters: {e}"),
    })?;
    Ok((0..n).map(|_| dist.sample(rng)).collect())
}

fn sample_choice(
    rng: &mut StdRng,
    choices: &[(&'static str, f64)],
    n: usize,
) -> LoanResult<Vec<&'static str>> {
    let dist = WeightedIndex::new(choices.iter().map(|(_, w)| *w)).map_err(|e| {
        LoanError::InvalidInput {
            field: "weights".into(),
            reason: e.to_string(),
        }
    })?;
    Ok((0..n).map(|_| choices[dist.sample(rng)].0).collect())
}
