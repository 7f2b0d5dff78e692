use clap::Args;
use serde_json::Value;

use loan_approval_core::diagnostics::sanity;

/// Arguments for the diagnostic sanity check
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SanityCheckArgs {
    /// Applicant income
    #[arg(long, alias = "income")]
    pub applicant_income: f64,

    /// Requested loan amount
    #[arg(long, alias = "loan")]
    pub loan_amount: f64,
}

pub fn run_sanity_check(args: SanityCheckArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let result = sanity::sanity_check_input(args.applicant_income, args.loan_amount);
    Ok(serde_json::to_value(result)?)
}
