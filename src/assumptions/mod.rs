//! Regulatory assumptions: fee ceilings, stamp duty and numeric tolerances

mod fees;
pub mod loader;

pub use fees::EarlyRepaymentFees;
pub use loader::LoadedAssumptions;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LoaderError;

/// Container for every constant the calculators depend on.
///
/// Built once and handed to the engines by value; nothing reads these
/// figures from global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryAssumptions {
    pub fees: EarlyRepaymentFees,

    /// Imposto do Selo on the interest portion of each installment
    pub default_stamp_duty_rate: f64,

    /// Residual balance treated as fully repaid
    pub balance_tolerance: f64,

    /// Longest term accepted and the iteration cap of the reduce-term simulation
    pub max_term_months: u32,
}

impl RegulatoryAssumptions {
    /// Portuguese market defaults
    pub fn portugal() -> Self {
        Self {
            fees: EarlyRepaymentFees::portugal(),
            default_stamp_duty_rate: 0.04,
            balance_tolerance: 0.01,
            max_term_months: 600,
        }
    }

    /// Load assumptions from CSV in the default location (data/assumptions/)
    pub fn from_csv() -> Result<Self, LoaderError> {
        Self::from_csv_path(Path::new(loader::DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load assumptions from a specific directory; keys absent from the
    /// table keep their Portuguese default
    pub fn from_csv_path(path: &Path) -> Result<Self, LoaderError> {
        let loaded = LoadedAssumptions::load_from(path)?;
        Ok(Self::from_loaded(&loaded))
    }

    pub fn from_loaded(loaded: &LoadedAssumptions) -> Self {
        let base = Self::portugal();
        Self {
            fees: EarlyRepaymentFees {
                variable_rate: loaded
                    .get("early_repayment_fee_variable")
                    .unwrap_or(base.fees.variable_rate),
                fixed_rate: loaded
                    .get("early_repayment_fee_fixed")
                    .unwrap_or(base.fees.fixed_rate),
                stamp_duty_on_fee: loaded
                    .get("stamp_duty_on_fee")
                    .unwrap_or(base.fees.stamp_duty_on_fee),
            },
            default_stamp_duty_rate: loaded
                .get("stamp_duty_on_interest")
                .unwrap_or(base.default_stamp_duty_rate),
            balance_tolerance: loaded
                .get("balance_tolerance")
                .unwrap_or(base.balance_tolerance),
            max_term_months: loaded
                .get("max_term_months")
                .map(|m| m as u32)
                .unwrap_or(base.max_term_months),
        }
    }
}

impl Default for RegulatoryAssumptions {
    fn default() -> Self {
        Self::portugal()
    }
}
