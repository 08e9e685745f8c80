//! Portuguese mortgage engine - French amortization schedules for housing loans
//!
//! This library provides:
//! - Monthly schedules for variable, fixed and mixed-rate loans, with stamp
//!   duty (Imposto do Selo) and life insurance
//! - Early repayment fees and reduce-installment / reduce-term recalculation
//! - Rate revision impact estimates against current Euribor
//! - Batch runs over loan books

pub mod amortization;
pub mod assumptions;
pub mod early_repayment;
pub mod error;
pub mod loan;
pub mod revision;
pub mod scenario;

// Re-export commonly used types
pub use amortization::{generate_table, AmortizationEngine, AmortizationRow, CalculationResult, Summary};
pub use assumptions::{EarlyRepaymentFees, RegulatoryAssumptions};
pub use early_repayment::{
    apply_early_repayment, EarlyRepaymentCalculator, EarlyRepaymentParams, EarlyRepaymentResult, RepaymentStrategy,
};
pub use error::{LoaderError, ValidationError};
pub use loan::{LoanParams, RateRegime, RateType};
pub use revision::{estimate_revision_impact, MarketRates, RevisionImpact, SimulationSnapshot};
pub use scenario::ScenarioRunner;
