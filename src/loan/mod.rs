//! Loan parameter structures and loan-book loading

mod data;
pub mod loader;

pub use data::{LoanParams, MixedSwitch, RateRegime, RateType};
pub use loader::{load_loans, load_loans_from_reader, LoanRecord};
