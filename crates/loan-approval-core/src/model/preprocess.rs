use serde::{Deserialize, Serialize};

use crate::decision::classifier::FeatureRow;
use crate::error::LoanError;
use crate::LoanResult;

/// Mean/scale for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: f64,
    pub scale: f64,
}

impl StandardScaler {
    /// Population mean and standard deviation. A constant column gets scale 1.
    pub fn fit(values: &[f64]) -> LoanResult<Self> {
        if values.is_empty() {
            return Err(LoanError::InsufficientData(
                "Cannot fit a scaler on an empty column.".into(),
            ));
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        Ok(StandardScaler {
            mean,
            scale: if std > 0.0 { std } else { 1.0 },
        })
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

/// Category vocabulary for one column. Unknown categories encode as all zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut categories: Vec<String> = values.into_iter().map(str::to_string).collect();
        categories.sort();
        categories.dedup();
        OneHotEncoder { categories }
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    fn encode_into(&self, value: &str, out: &mut Vec<f64>) {
        out.extend(
            self.categories
                .iter()
                .map(|c| if c == value { 1.0 } else { 0.0 }),
        );
    }
}

/// Column transformer over a `FeatureRow`:
/// `[income_z, loan_z, credit one-hot.., employment one-hot..]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub applicant_income: StandardScaler,
    pub loan_amount: StandardScaler,
    pub credit_history: OneHotEncoder,
    pub employment_type: OneHotEncoder,
}

impl Preprocessor {
    pub fn fit(rows: &[FeatureRow]) -> LoanResult<Self> {
        if rows.is_empty() {
            return Err(LoanError::InsufficientData(
                "At least one row is required to fit the preprocessor.".into(),
            ));
        }
        let incomes: Vec<f64> = rows.iter().map(|r| r.applicant_income).collect();
        let loans: Vec<f64> = rows.iter().map(|r| r.loan_amount).collect();
        Ok(Preprocessor {
            applicant_income: StandardScaler::fit(&incomes)?,
            loan_amount: StandardScaler::fit(&loans)?,
            credit_history: OneHotEncoder::fit(rows.iter().map(|r| r.credit_history.as_str())),
            employment_type: OneHotEncoder::fit(rows.iter().map(|r| r.employment_type.as_str())),
        })
    }

    /// Number of columns produced by `transform`.
    pub fn width(&self) -> usize {
        2 + self.credit_history.width() + self.employment_type.width()
    }

    pub fn transform(&self, row: &FeatureRow) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.width());
        out.push(self.applicant_income.transform(row.applicant_income));
        out.push(self.loan_amount.transform(row.loan_amount));
        self.credit_history.encode_into(&row.credit_history, &mut out);
        self.employment_type.encode_into(&row.employment_type, &mut out);
        out
    }

    pub fn transform_all(&self, rows: &[FeatureRow]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(income: f64, loan: f64, credit: &str, emp: &str) -> FeatureRow {
        FeatureRow {
            applicant_income: income,
            loan_amount: loan,
            credit_history: credit.into(),
            employment_type: emp.into(),
        }
    }

    #[test]
    fn test_scaler_centres_and_scales() {
        let s = StandardScaler::fit(&[1.0, 3.0]).unwrap();
        assert_eq!(s.mean, 2.0);
        assert_eq!(s.scale, 1.0);
        assert_eq!(s.transform(3.0), 1.0);
    }

    #[test]
    fn test_constant_column_keeps_unit_scale() {
        let s = StandardScaler::fit(&[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(s.scale, 1.0);
        assert_eq!(s.transform(5.0), 0.0);
    }

    #[test]
    fn test_one_hot_vocabulary_sorted() {
        let enc = OneHotEncoder::fit(["salaried", "unemployed", "salaried", "self-employed"]);
        assert_eq!(enc.categories, vec!["salaried", "self-employed", "unemployed"]);
    }

    #[test]
    fn test_transform_layout_and_unknown_category() {
        let rows = vec![
            row(10.0, 100.0, "good", "salaried"),
            row(30.0, 300.0, "bad", "unemployed"),
        ];
        let pre = Preprocessor::fit(&rows).unwrap();
        assert_eq!(pre.width(), 6);

        let x = pre.transform(&rows[0]);
        assert_eq!(x, vec![-1.0, -1.0, 0.0, 1.0, 1.0, 0.0]);

        let unknown = pre.transform(&row(20.0, 200.0, "excellent", "retired"));
        assert_eq!(unknown, vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fit_rejects_empty() {
        assert!(Preprocessor::fit(&[]).is_err());
    }
}
