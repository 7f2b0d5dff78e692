pub mod error;
pub mod types;

#[cfg(feature = "cascade")]
pub mod decision;

#[cfg(feature = "model")]
pub mod model;

#[cfg(feature = "training")]
pub mod training;

#[cfg(feature = "diagnostics")]
pub mod diagnostics;

pub use error::LoanError;
pub use types::*;

/// Standard result type for all loan-approval operations
pub type LoanResult<T> = Result<T, LoanError>;
