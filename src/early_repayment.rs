//! Early repayment (amortização antecipada) under Portuguese rules
//!
//! The bank may charge at most 0.5% of the capital repaid on a variable
//! rate and 2% on a fixed rate, plus 4% stamp duty on that commission.
//! After the repayment the borrower either keeps the term and pays a lower
//! installment, or keeps the installment and finishes earlier.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::amortization::{installment, monthly_rate, round_cents, round_to};
use crate::assumptions::RegulatoryAssumptions;
use crate::error::ValidationError;
use crate::loan::RateType;

/// Iteration limit of the reduce-term simulation, independent of the
/// longest term a new loan may be written for
pub const MAX_SIMULATED_MONTHS: u32 = 600;

/// Fee charged on an early repayment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub base_fee: f64,
    pub stamp_duty: f64,
    pub total_fee: f64,
    /// Effective rate including stamp duty, in percent (0.52 or 2.08)
    pub fee_percentage: f64,
}

/// What to do with the loan after the repayment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RepaymentStrategy {
    /// Keep the remaining term, recompute a lower installment
    ReduceInstallment { remaining_months: u32, tan: f64 },
    /// Keep the installment, count how many months are left
    ReduceTerm {
        current_installment: f64,
        tan: f64,
        /// Remaining term of the current schedule, used to estimate interest saved
        #[serde(default)]
        remaining_months: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarlyRepaymentParams {
    pub current_balance: f64,
    pub repayment_amount: f64,
    pub rate_type: RateType,
    /// Regulatory exemption window: no fee at all
    #[serde(default)]
    pub fee_exemption: bool,
    #[serde(default)]
    pub strategy: Option<RepaymentStrategy>,
}

impl EarlyRepaymentParams {
    pub fn new(current_balance: f64, repayment_amount: f64, rate_type: RateType) -> Self {
        Self {
            current_balance,
            repayment_amount,
            rate_type,
            fee_exemption: false,
            strategy: None,
        }
    }

    pub fn exempted(mut self) -> Self {
        self.fee_exemption = true;
        self
    }

    pub fn with_strategy(mut self, strategy: RepaymentStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Preconditions the calculator does not check on its own
    pub fn validate(&self, assumptions: &RegulatoryAssumptions) -> Result<(), ValidationError> {
        for (field, value) in [
            ("currentBalance", self.current_balance),
            ("repaymentAmount", self.repayment_amount),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::NegativeAmount { field, value });
            }
        }
        if self.repayment_amount > self.current_balance {
            return Err(ValidationError::RepaymentExceedsBalance {
                repayment: self.repayment_amount,
                balance: self.current_balance,
            });
        }

        match self.strategy {
            Some(RepaymentStrategy::ReduceInstallment { remaining_months, .. })
                if remaining_months < 1 || remaining_months > assumptions.max_term_months =>
            {
                Err(ValidationError::TermOutOfRange {
                    value: remaining_months,
                    max: assumptions.max_term_months,
                })
            }
            Some(RepaymentStrategy::ReduceInstallment { tan, .. })
            | Some(RepaymentStrategy::ReduceTerm { tan, .. })
                if !(0.0..=1.0).contains(&tan) =>
            {
                Err(ValidationError::RateOutOfRange { field: "tan", value: tan })
            }
            Some(RepaymentStrategy::ReduceTerm { current_installment, .. })
                if !current_installment.is_finite() || current_installment < 0.0 =>
            {
                Err(ValidationError::NegativeAmount {
                    field: "currentInstallment",
                    value: current_installment,
                })
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarlyRepaymentResult {
    pub fee: FeeBreakdown,
    pub new_balance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_installment: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_term_months: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_saved: Option<f64>,
    /// The installment stopped covering interest; `new_term_months` is
    /// the count reached before giving up, not a full amortization
    #[serde(default)]
    pub negative_amortization: bool,
}

/// Outcome of running a fixed installment against a balance
#[derive(Debug, Clone, Copy, PartialEq)]
struct TermSimulation {
    months: u32,
    interest_paid: f64,
    paid_off: bool,
    negative_amortization: bool,
}

/// Early repayment calculator bound to a fee schedule
#[derive(Debug, Clone, Default)]
pub struct EarlyRepaymentCalculator {
    assumptions: RegulatoryAssumptions,
}

impl EarlyRepaymentCalculator {
    pub fn new(assumptions: RegulatoryAssumptions) -> Self {
        Self { assumptions }
    }

    pub fn assumptions(&self) -> &RegulatoryAssumptions {
        &self.assumptions
    }

    /// Regulatory fee on `amount` of capital repaid
    pub fn fee(&self, rate_type: RateType, amount: f64, exempted: bool) -> FeeBreakdown {
        let fees = &self.assumptions.fees;
        let fee_rate = if exempted { 0.0 } else { fees.rate_for(rate_type) };

        let base_fee = amount * fee_rate;
        let stamp_duty = base_fee * fees.stamp_duty_on_fee;
        let fee_percentage = fee_rate * (1.0 + fees.stamp_duty_on_fee) * 100.0;

        FeeBreakdown {
            base_fee: round_cents(base_fee),
            stamp_duty: round_cents(stamp_duty),
            total_fee: round_cents(base_fee + stamp_duty),
            fee_percentage: round_to(fee_percentage, 3),
        }
    }

    /// Apply a repayment and, if a strategy is given, recompute the loan.
    ///
    /// Assumes `repayment_amount <= current_balance`; see
    /// [`EarlyRepaymentParams::validate`].
    pub fn apply(&self, params: &EarlyRepaymentParams) -> EarlyRepaymentResult {
        let fee = self.fee(params.rate_type, params.repayment_amount, params.fee_exemption);
        let new_balance = params.current_balance - params.repayment_amount;

        let mut result = EarlyRepaymentResult {
            fee,
            new_balance: round_cents(new_balance),
            new_installment: None,
            new_term_months: None,
            interest_saved: None,
            negative_amortization: false,
        };

        match params.strategy {
            None => {}
            Some(RepaymentStrategy::ReduceInstallment { remaining_months, tan }) => {
                let new_installment = installment(new_balance, tan, remaining_months);
                let old_installment = installment(params.current_balance, tan, remaining_months);

                let n = remaining_months as f64;
                let old_interest = old_installment * n - params.current_balance;
                let new_interest = new_installment * n - new_balance;

                result.new_installment = Some(round_cents(new_installment));
                result.new_term_months = Some(remaining_months);
                result.interest_saved = Some(round_cents(old_interest - new_interest));
            }
            Some(RepaymentStrategy::ReduceTerm { current_installment, tan, remaining_months }) => {
                let sim = self.simulate_term(new_balance, current_installment, tan);

                result.new_installment = Some(round_cents(current_installment));
                result.new_term_months = Some(sim.months);
                result.negative_amortization = sim.negative_amortization;

                if sim.paid_off {
                    result.interest_saved = remaining_months.map(|n| {
                        let old_interest = current_installment * n as f64 - params.current_balance;
                        round_cents(old_interest - sim.interest_paid)
                    });
                }
            }
        }

        result
    }

    /// Count months until `balance` is repaid at a constant installment.
    ///
    /// Stops early if the installment no longer covers interest, and never
    /// runs beyond [`MAX_SIMULATED_MONTHS`].
    fn simulate_term(&self, mut balance: f64, installment: f64, tan: f64) -> TermSimulation {
        let rate = monthly_rate(tan);
        let tolerance = self.assumptions.balance_tolerance;
        let cap = MAX_SIMULATED_MONTHS;

        let mut months = 0;
        let mut interest_paid = 0.0;
        let mut negative_amortization = false;

        while balance > tolerance && months < cap {
            let interest = balance * rate;
            let principal = installment - interest;

            if principal <= 0.0 {
                warn!(
                    "Installment {:.2} does not cover interest {:.2} after {} months; stopping",
                    installment, interest, months
                );
                negative_amortization = true;
                break;
            }

            balance -= principal;
            interest_paid += interest;
            months += 1;
        }

        let paid_off = balance <= tolerance;
        if !paid_off && !negative_amortization {
            warn!("Balance {:.2} still outstanding after {} months", balance, cap);
        }

        TermSimulation {
            months,
            interest_paid,
            paid_off,
            negative_amortization,
        }
    }
}

/// Fee with the Portuguese defaults
pub fn fee(rate_type: RateType, amount: f64, exempted: bool) -> FeeBreakdown {
    EarlyRepaymentCalculator::default().fee(rate_type, amount, exempted)
}

/// Early repayment with the Portuguese defaults
pub fn apply_early_repayment(params: &EarlyRepaymentParams) -> EarlyRepaymentResult {
    EarlyRepaymentCalculator::default().apply(params)
}

/// Months of savings needed to recover the cost of switching banks.
///
/// `None` when the new payment is not lower, i.e. the switch never pays off.
pub fn break_even_months(switching_costs: f64, current_payment: f64, new_payment: f64) -> Option<u32> {
    let monthly_savings = current_payment - new_payment;
    if monthly_savings <= 0.0 {
        return None;
    }
    Some((switching_costs / monthly_savings).ceil().max(0.0) as u32)
}
