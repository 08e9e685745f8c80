//! Error types for input validation and data loading

use thiserror::Error;

/// A loan or repayment request that breaks one of the input constraints.
///
/// The engine itself never re-validates; callers are expected to run
/// [`LoanParams::validate`](crate::loan::LoanParams::validate) (or use
/// [`AmortizationEngine::calculate`](crate::amortization::AmortizationEngine::calculate))
/// before generating a schedule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("principal must be positive, got {0}")]
    NonPositivePrincipal(f64),

    #[error("{field} must be a decimal fraction in [0, 1], got {value}")]
    RateOutOfRange { field: &'static str, value: f64 },

    #[error("term must be between 1 and {max} months, got {value}")]
    TermOutOfRange { value: u32, max: u32 },

    #[error("mixed rate requires {0}")]
    MissingMixedField(&'static str),

    #[error("fixed period of {fixed_period_months} months must be shorter than the {term_months}-month term")]
    FixedPeriodTooLong {
        fixed_period_months: u32,
        term_months: u32,
    },

    #[error("{field} must not be negative, got {value}")]
    NegativeAmount { field: &'static str, value: f64 },

    #[error("repayment of {repayment} exceeds the outstanding balance of {balance}")]
    RepaymentExceedsBalance { repayment: f64, balance: f64 },
}

/// Failure while reading loan books or assumption tables from disk.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },

    #[error("unknown assumption key: {0}")]
    UnknownKey(String),
}
