//! French-system amortization engine
//!
//! PMT = PV × [i(1+i)^n] / [(1+i)^n − 1] with i = TAN / 12.
//! Each month: interest = balance × i, principal = PMT − interest,
//! balance −= principal, stamp duty = interest × rate,
//! insurance = opening balance × rate.

use log::debug;

use super::irr::effective_annual_rate;
use super::rounding::{round_cents, round_to};
use super::schedule::{AmortizationRow, CalculationResult, Summary};
use super::state::AmortizationState;
use crate::assumptions::RegulatoryAssumptions;
use crate::error::ValidationError;
use crate::loan::LoanParams;

/// Monthly rate from TAN.
///
/// Portuguese banks divide linearly; this is deliberately not the
/// compound-equivalent rate.
pub fn monthly_rate(tan: f64) -> f64 {
    tan / 12.0
}

/// Constant installment that amortizes `principal` over `term_months` at `tan`.
/// A zero rate degenerates to straight-line repayment.
pub fn installment(principal: f64, tan: f64, term_months: u32) -> f64 {
    if tan == 0.0 {
        return principal / term_months as f64;
    }

    let i = monthly_rate(tan);
    let compound_factor = (1.0 + i).powi(term_months as i32);

    principal * (i * compound_factor) / (compound_factor - 1.0)
}

/// Generate a schedule with the Portuguese defaults, without validation
pub fn generate_table(params: &LoanParams) -> CalculationResult {
    AmortizationEngine::default().generate_table(params)
}

/// Main amortization engine
#[derive(Debug, Clone, Default)]
pub struct AmortizationEngine {
    assumptions: RegulatoryAssumptions,
}

impl AmortizationEngine {
    pub fn new(assumptions: RegulatoryAssumptions) -> Self {
        Self { assumptions }
    }

    pub fn assumptions(&self) -> &RegulatoryAssumptions {
        &self.assumptions
    }

    /// Validate the parameters, then generate the schedule
    pub fn calculate(&self, params: &LoanParams) -> Result<CalculationResult, ValidationError> {
        params.validate(&self.assumptions)?;
        Ok(self.generate_table(params))
    }

    /// Generate the full monthly schedule and its summary.
    ///
    /// Assumes validated input: a zero term or non-positive principal yields
    /// a meaningless table rather than an error.
    pub fn generate_table(&self, params: &LoanParams) -> CalculationResult {
        let switch = params.mixed_switch();
        let opening_rate = switch.map_or(params.tan, |s| s.fixed_rate);

        let mut state = AmortizationState::new(
            params.principal,
            opening_rate,
            installment(params.principal, opening_rate, params.term_months),
        );
        let mut rows = Vec::with_capacity(params.term_months as usize);

        for _month in 1..=params.term_months {
            state.advance_month();

            if let Some(switch) = switch {
                if state.month == switch.fixed_period_months + 1 {
                    // Full re-amortization of what is left, not a rate patch
                    let remaining_term = params.term_months - switch.fixed_period_months;
                    let new_installment =
                        installment(state.balance, switch.variable_rate, remaining_term);
                    debug!(
                        "Month {}: switching to variable rate {:.4}, installment {:.2} -> {:.2}",
                        state.month, switch.variable_rate, state.installment, new_installment
                    );
                    state.switch_rate(switch.variable_rate, new_installment);
                }
            }

            rows.push(self.calculate_month(params, &mut state));
        }

        let table: Vec<AmortizationRow> = rows.iter().map(AmortizationRow::rounded).collect();
        let summary = self.summarise(params, &state, &table);

        debug!(
            "Generated {} rows: payment {:.2}, total interest {:.2}",
            table.len(),
            summary.monthly_payment,
            summary.total_interest
        );

        CalculationResult { table, summary }
    }

    /// Calculate one month at full precision
    fn calculate_month(&self, params: &LoanParams, state: &mut AmortizationState) -> AmortizationRow {
        let opening_balance = state.balance;

        let interest = opening_balance * monthly_rate(state.current_rate);
        let principal = state.installment - interest;
        let mut remaining_balance = opening_balance - principal;

        // Absorb floating residue on the last payment; never end negative
        if state.month == params.term_months && remaining_balance < self.assumptions.balance_tolerance {
            remaining_balance = 0.0;
        }

        let stamp_duty = interest * params.stamp_duty_rate;
        let insurance = opening_balance * params.insurance_rate;
        let total_payment = state.installment + stamp_duty + insurance;

        state.balance = remaining_balance;
        state.accumulate(interest, stamp_duty, insurance);

        AmortizationRow {
            payment_number: state.month,
            installment: state.installment,
            interest,
            principal,
            stamp_duty,
            insurance,
            total_payment,
            remaining_balance,
        }
    }

    fn summarise(&self, params: &LoanParams, state: &AmortizationState, table: &[AmortizationRow]) -> Summary {
        let total_payment: f64 = table.iter().map(|r| r.total_payment).sum();
        let outflows: Vec<f64> = table.iter().map(|r| r.total_payment).collect();

        let interest_to_principal_ratio = if params.principal > 0.0 {
            round_cents(state.total_interest / params.principal * 100.0)
        } else {
            0.0
        };

        let mut summary = Summary {
            monthly_payment: round_cents(state.initial_installment),
            total_payment: round_cents(total_payment),
            total_interest: round_cents(state.total_interest),
            total_stamp_duty: round_cents(state.total_stamp_duty),
            total_insurance: round_cents(state.total_insurance),
            interest_to_principal_ratio,
            effective_rate: effective_annual_rate(params.principal, &outflows)
                .map(|r| round_cents(r * 100.0)),
            monthly_payment_after_fixed_period: None,
            fixed_period_months: None,
            payment_increase: None,
            payment_increase_percent: None,
        };

        if let (Some(switch), Some(after)) = (params.mixed_switch(), state.installment_after_switch) {
            let increase = after - state.initial_installment;
            summary.monthly_payment_after_fixed_period = Some(round_cents(after));
            summary.fixed_period_months = Some(switch.fixed_period_months);
            summary.payment_increase = Some(round_cents(increase));
            summary.payment_increase_percent =
                Some(round_to(increase / state.initial_installment * 100.0, 2));
        }

        summary
    }
}
