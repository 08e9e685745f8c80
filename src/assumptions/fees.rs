//! Early repayment fee schedule (Decreto-Lei 74-A/2017)

use serde::{Deserialize, Serialize};

use crate::loan::RateType;

/// Maximum early repayment commission by rate type, plus the stamp duty
/// levied on that commission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarlyRepaymentFees {
    /// Fee on capital repaid under a variable rate
    pub variable_rate: f64,

    /// Fee on capital repaid under a fixed rate
    pub fixed_rate: f64,

    /// Imposto do Selo charged on the fee itself
    pub stamp_duty_on_fee: f64,
}

impl EarlyRepaymentFees {
    /// Ceilings currently in force in Portugal: 0.5% / 2% and 4% stamp duty
    pub fn portugal() -> Self {
        Self {
            variable_rate: 0.005,
            fixed_rate: 0.02,
            stamp_duty_on_fee: 0.04,
        }
    }

    /// Fee rate applicable to the capital repaid
    pub fn rate_for(&self, rate_type: RateType) -> f64 {
        match rate_type {
            RateType::Variable => self.variable_rate,
            RateType::Fixed => self.fixed_rate,
        }
    }
}

impl Default for EarlyRepaymentFees {
    fn default() -> Self {
        Self::portugal()
    }
}
