//! Loan decision cascade.
//!
//! A request passes through, in order:
//! 1. **Presence & type validation** -- four required fields, coerced.
//! 2. **Positivity filter** -- income and loan amount must be > 0.
//! 3. **Ratio filter** -- loan-to-income above 50 is auto-rejected, above 15 is high risk.
//! 4. **Classifier delegation** -- everything else is labelled by the model.

pub mod cascade;
pub mod classifier;
pub mod request;
pub mod response;

pub use cascade::DecisionCascade;
pub use classifier::{Classifier, FeatureRow};
pub use request::LoanRequest;
pub use response::{Decision, DecisionResponse, DecisionStage, DecisionStatus};
