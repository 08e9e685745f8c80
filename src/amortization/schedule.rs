//! Amortization table and summary structures

use serde::{Deserialize, Serialize};

use super::rounding::round_cents;

/// One monthly payment of the schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationRow {
    /// 1-indexed month
    pub payment_number: u32,

    /// Base installment (PMT) without stamp duty or insurance
    pub installment: f64,

    pub interest: f64,

    /// Capital repaid this month
    pub principal: f64,

    /// Imposto do Selo on this month's interest
    pub stamp_duty: f64,

    pub insurance: f64,

    /// installment + stamp duty + insurance
    pub total_payment: f64,

    /// Outstanding capital after this payment
    pub remaining_balance: f64,
}

impl AmortizationRow {
    /// Copy of the row with every monetary field rounded to the cent
    pub fn rounded(&self) -> Self {
        Self {
            payment_number: self.payment_number,
            installment: round_cents(self.installment),
            interest: round_cents(self.interest),
            principal: round_cents(self.principal),
            stamp_duty: round_cents(self.stamp_duty),
            insurance: round_cents(self.insurance),
            total_payment: round_cents(self.total_payment),
            remaining_balance: round_cents(self.remaining_balance),
        }
    }
}

/// Aggregate figures of a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// First installment, before any mixed-rate switch
    pub monthly_payment: f64,

    /// Sum of the rounded row totals
    pub total_payment: f64,

    pub total_interest: f64,
    pub total_stamp_duty: f64,
    pub total_insurance: f64,

    /// Lifetime interest as a percentage of the principal
    pub interest_to_principal_ratio: f64,

    /// Annualised IRR of the borrower's cashflows, in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_rate: Option<f64>,

    // Mixed rate only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_payment_after_fixed_period: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_period_months: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_increase: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_increase_percent: Option<f64>,
}

/// Complete output of the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub table: Vec<AmortizationRow>,
    pub summary: Summary,
}

impl CalculationResult {
    /// Row for a 1-indexed payment number
    pub fn row(&self, payment_number: u32) -> Option<&AmortizationRow> {
        if payment_number == 0 {
            return None;
        }
        self.table.get(payment_number as usize - 1)
    }

    /// Remaining balance after the last payment
    pub fn final_balance(&self) -> f64 {
        self.table.last().map(|r| r.remaining_balance).unwrap_or(0.0)
    }
}
