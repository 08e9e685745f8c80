//! Amortization schedules under the French (constant installment) system

mod engine;
mod irr;
mod rounding;
mod schedule;
mod state;

pub use engine::{generate_table, installment, monthly_rate, AmortizationEngine};
pub use irr::effective_annual_rate;
pub use rounding::{round_cents, round_to};
pub use schedule::{AmortizationRow, CalculationResult, Summary};
pub use state::AmortizationState;
