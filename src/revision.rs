//! Periodic rate revision of variable loans
//!
//! A variable loan is re-priced every 3, 6 or 12 months at Euribor plus the
//! contract spread. Given a stored schedule and today's market rates this
//! estimates what the next installment would be and how it compares with the
//! one currently scheduled.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::amortization::{installment, monthly_rate, round_cents, round_to, AmortizationRow, CalculationResult};
use crate::loan::{LoanParams, RateRegime};

/// Current layout of [`SimulationSnapshot`]
pub const SNAPSHOT_VERSION: u32 = 1;

/// Euribor reference tenor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EuriborTenor {
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "12m")]
    TwelveMonths,
}

impl EuriborTenor {
    /// Months between revisions
    pub fn months(&self) -> u32 {
        match self {
            EuriborTenor::ThreeMonths => 3,
            EuriborTenor::SixMonths => 6,
            EuriborTenor::TwelveMonths => 12,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "3m" => Some(EuriborTenor::ThreeMonths),
            "6m" => Some(EuriborTenor::SixMonths),
            "12m" => Some(EuriborTenor::TwelveMonths),
            _ => None,
        }
    }
}

/// Published Euribor rates, in percent (3.5 means 3.5%)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRates {
    #[serde(default)]
    pub rate_3m: Option<f64>,
    #[serde(default)]
    pub rate_6m: Option<f64>,
    #[serde(default)]
    pub rate_12m: Option<f64>,
}

impl MarketRates {
    pub fn rate_for(&self, tenor: EuriborTenor) -> Option<f64> {
        match tenor {
            EuriborTenor::ThreeMonths => self.rate_3m,
            EuriborTenor::SixMonths => self.rate_6m,
            EuriborTenor::TwelveMonths => self.rate_12m,
        }
    }
}

/// Stored simulation the revision estimator works from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSnapshot {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default, rename = "rateType")]
    pub rate_regime: RateRegime,
    pub term_months: u32,
    #[serde(default)]
    pub euribor_tenor: Option<EuriborTenor>,
    /// Spread over Euribor, in percent
    #[serde(default)]
    pub spread: Option<f64>,
    #[serde(default = "default_stamp_duty_rate")]
    pub stamp_duty_rate: f64,
    #[serde(default)]
    pub fixed_period_months: Option<u32>,
    pub contract_start: NaiveDate,
    pub table: Vec<AmortizationRow>,
}

fn current_version() -> u32 {
    SNAPSHOT_VERSION
}

fn default_stamp_duty_rate() -> f64 {
    0.04
}

impl SimulationSnapshot {
    pub fn from_result(params: &LoanParams, result: &CalculationResult, contract_start: NaiveDate) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            rate_regime: params.rate_regime,
            term_months: params.term_months,
            euribor_tenor: None,
            spread: None,
            stamp_duty_rate: params.stamp_duty_rate,
            fixed_period_months: params.mixed_switch().map(|s| s.fixed_period_months),
            contract_start,
            table: result.table.clone(),
        }
    }

    pub fn with_euribor(mut self, tenor: EuriborTenor, spread_pct: f64) -> Self {
        self.euribor_tenor = Some(tenor);
        self.spread = Some(spread_pct);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactKind {
    RiskOfIncrease,
    Opportunity,
}

impl fmt::Display for ImpactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpactKind::RiskOfIncrease => write!(f, "risk of increase"),
            ImpactKind::Opportunity => write!(f, "opportunity"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactEstimate {
    /// New payment minus scheduled payment
    pub impact: f64,
    pub new_payment: f64,
    pub old_payment: f64,
    pub kind: ImpactKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RevisionImpact {
    /// No market data, no tenor, or no schedule row to anchor on
    NotApplicable,
    /// Rate does not move at revision
    FixedRate,
    PaidOff,
    Estimate(ImpactEstimate),
}

impl fmt::Display for RevisionImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevisionImpact::NotApplicable => write!(f, "not applicable"),
            RevisionImpact::FixedRate => write!(f, "fixed rate: no impact"),
            RevisionImpact::PaidOff => write!(f, "paid off"),
            RevisionImpact::Estimate(e) => write!(f, "{} ({:+.2})", e.kind, e.impact),
        }
    }
}

/// Calendar months between two dates, ignoring the day of month
fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to.year() as i64 - from.year() as i64) * 12 + (to.month() as i64 - from.month() as i64)
}

/// Installment plus first-month stamp duty at a new TAN
fn repriced_payment(balance: f64, tan: f64, remaining_months: u32, stamp_duty_rate: f64) -> f64 {
    let interest = balance * monthly_rate(tan);
    installment(balance, tan, remaining_months) + interest * stamp_duty_rate
}

/// Estimate the payment change at the next revision.
///
/// The schedule row for the current month anchors the estimate: its
/// remaining balance is re-amortized over the rest of the term at
/// `market + spread`, and its insurance premium is carried over unchanged.
pub fn estimate_revision_impact(
    snapshot: &SimulationSnapshot,
    market: Option<&MarketRates>,
    as_of: NaiveDate,
) -> RevisionImpact {
    if snapshot.version != SNAPSHOT_VERSION {
        warn!(
            "Snapshot version {} (expected {}); reading it as the current layout",
            snapshot.version, SNAPSHOT_VERSION
        );
    }

    if snapshot.rate_regime == RateRegime::Fixed {
        return RevisionImpact::FixedRate;
    }

    let Some(market) = market else {
        return RevisionImpact::NotApplicable;
    };
    let Some(tenor) = snapshot.euribor_tenor else {
        return RevisionImpact::NotApplicable;
    };
    let Some(euribor) = market.rate_for(tenor) else {
        warn!("No market rate published for the {} month tenor", tenor.months());
        return RevisionImpact::NotApplicable;
    };

    if snapshot.term_months == 0 {
        return RevisionImpact::NotApplicable;
    }
    let last_index = snapshot.term_months as i64 - 1;
    let index = months_between(snapshot.contract_start, as_of).clamp(0, last_index) as u32;

    let Some(row) = snapshot.table.get(index as usize) else {
        return RevisionImpact::NotApplicable;
    };

    if snapshot.rate_regime == RateRegime::Mixed {
        if let Some(fixed_period) = snapshot.fixed_period_months {
            if row.payment_number <= fixed_period {
                return RevisionImpact::FixedRate;
            }
        }
    }

    let remaining_months = snapshot.term_months - index;
    if row.remaining_balance <= 0.0 {
        return RevisionImpact::PaidOff;
    }

    let tan = (euribor + snapshot.spread.unwrap_or(0.0)) / 100.0;
    let new_payment =
        repriced_payment(row.remaining_balance, tan, remaining_months, snapshot.stamp_duty_rate) + row.insurance;
    let difference = new_payment - row.total_payment;

    RevisionImpact::Estimate(ImpactEstimate {
        impact: round_cents(difference),
        new_payment: round_cents(new_payment),
        old_payment: round_cents(row.total_payment),
        kind: if difference > 0.0 {
            ImpactKind::RiskOfIncrease
        } else {
            ImpactKind::Opportunity
        },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPaymentEstimate {
    pub monthly_payment: f64,
    /// Decimal TAN, 4 places
    pub tan: f64,
}

/// Installment plus stamp duty after a revision to `euribor_pct + spread_pct`
pub fn estimate_new_payment(
    balance: f64,
    euribor_pct: f64,
    spread_pct: f64,
    remaining_months: u32,
    stamp_duty_rate: f64,
) -> NewPaymentEstimate {
    let tan = (euribor_pct + spread_pct) / 100.0;

    NewPaymentEstimate {
        monthly_payment: round_cents(repriced_payment(balance, tan, remaining_months, stamp_duty_rate)),
        tan: round_to(tan, 4),
    }
}

/// First revision date strictly after `as_of`.
///
/// Revisions fall on `contract_start + k × tenor` for k ≥ 1; month-end
/// starts clamp to the last day of shorter months.
pub fn next_revision_date(contract_start: NaiveDate, tenor: EuriborTenor, as_of: NaiveDate) -> Option<NaiveDate> {
    let step = tenor.months();
    let elapsed = months_between(contract_start, as_of).max(0) as u32;
    let mut k = (elapsed / step).max(1);

    loop {
        let date = contract_start.checked_add_months(Months::new(k.checked_mul(step)?))?;
        if date > as_of {
            return Some(date);
        }
        k += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::generate_table;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn variable_snapshot() -> SimulationSnapshot {
        let params = LoanParams::new(150_000.0, 0.035, 360).with_insurance_rate(0.0002);
        let result = generate_table(&params);
        SimulationSnapshot::from_result(&params, &result, date(2024, 1, 15))
            .with_euribor(EuriborTenor::TwelveMonths, 1.0)
    }

    fn rates(rate_12m: f64) -> MarketRates {
        MarketRates {
            rate_12m: Some(rate_12m),
            ..Default::default()
        }
    }

    #[test]
    fn test_higher_euribor_is_a_risk() {
        let snapshot = variable_snapshot();
        let impact = estimate_revision_impact(&snapshot, Some(&rates(3.5)), date(2026, 1, 20));

        let RevisionImpact::Estimate(estimate) = impact else {
            panic!("expected an estimate, got {impact:?}");
        };
        assert_eq!(estimate.kind, ImpactKind::RiskOfIncrease);
        assert!(estimate.impact > 0.0);
        // 24 months elapsed: anchored on payment 25
        assert_eq!(estimate.old_payment, snapshot.table[24].total_payment);
    }

    #[test]
    fn test_lower_euribor_is_an_opportunity() {
        let impact = estimate_revision_impact(&variable_snapshot(), Some(&rates(1.5)), date(2026, 1, 20));

        let RevisionImpact::Estimate(estimate) = impact else {
            panic!("expected an estimate, got {impact:?}");
        };
        assert_eq!(estimate.kind, ImpactKind::Opportunity);
        assert!(estimate.impact < 0.0);
        assert_eq!(impact.to_string(), format!("opportunity ({:+.2})", estimate.impact));
    }

    #[test]
    fn test_unchanged_rate_is_roughly_neutral() {
        // 2.5 + 1.0 is the contract TAN; the anchor balance is spread over
        // one more month than the schedule has left, so the estimate dips a little
        let impact = estimate_revision_impact(&variable_snapshot(), Some(&rates(2.5)), date(2026, 1, 20));

        let RevisionImpact::Estimate(estimate) = impact else {
            panic!("expected an estimate, got {impact:?}");
        };
        assert!(estimate.impact < 0.0 && estimate.impact > -2.0);
    }

    #[test]
    fn test_fixed_loan_has_no_impact() {
        let mut snapshot = variable_snapshot();
        snapshot.rate_regime = RateRegime::Fixed;

        let impact = estimate_revision_impact(&snapshot, Some(&rates(3.5)), date(2026, 1, 20));
        assert_eq!(impact, RevisionImpact::FixedRate);
        assert_eq!(impact.to_string(), "fixed rate: no impact");
    }

    #[test]
    fn test_missing_market_data_is_not_applicable() {
        let snapshot = variable_snapshot();
        let as_of = date(2026, 1, 20);

        assert_eq!(estimate_revision_impact(&snapshot, None, as_of), RevisionImpact::NotApplicable);

        let only_6m = MarketRates {
            rate_6m: Some(3.0),
            ..Default::default()
        };
        assert_eq!(
            estimate_revision_impact(&snapshot, Some(&only_6m), as_of),
            RevisionImpact::NotApplicable
        );

        let mut no_tenor = snapshot.clone();
        no_tenor.euribor_tenor = None;
        assert_eq!(
            estimate_revision_impact(&no_tenor, Some(&rates(3.5)), as_of),
            RevisionImpact::NotApplicable
        );

        let mut no_table = snapshot;
        no_table.table.clear();
        assert_eq!(
            estimate_revision_impact(&no_table, Some(&rates(3.5)), as_of),
            RevisionImpact::NotApplicable
        );
    }

    #[test]
    fn test_elapsed_months_are_clamped() {
        let snapshot = variable_snapshot();

        // Before the contract started: first row
        let early = estimate_revision_impact(&snapshot, Some(&rates(3.5)), date(2023, 6, 1));
        let RevisionImpact::Estimate(estimate) = early else {
            panic!("expected an estimate, got {early:?}");
        };
        assert_eq!(estimate.old_payment, snapshot.table[0].total_payment);

        // Past the end: last row, fully repaid
        let late = estimate_revision_impact(&snapshot, Some(&rates(3.5)), date(2060, 1, 1));
        assert_eq!(late, RevisionImpact::PaidOff);
    }

    #[test]
    fn test_mixed_loan_inside_fixed_period() {
        let params = LoanParams::new(200_000.0, 0.035, 360).with_mixed(60, 0.025, 0.04);
        let result = generate_table(&params);
        let snapshot = SimulationSnapshot::from_result(&params, &result, date(2024, 1, 1))
            .with_euribor(EuriborTenor::SixMonths, 1.0);
        let market = MarketRates {
            rate_6m: Some(3.0),
            ..Default::default()
        };

        assert_eq!(snapshot.fixed_period_months, Some(60));
        assert_eq!(
            estimate_revision_impact(&snapshot, Some(&market), date(2026, 1, 1)),
            RevisionImpact::FixedRate
        );
        assert!(matches!(
            estimate_revision_impact(&snapshot, Some(&market), date(2030, 6, 1)),
            RevisionImpact::Estimate(_)
        ));
    }

    #[test]
    fn test_snapshot_from_json() {
        let snapshot: SimulationSnapshot = serde_json::from_str(
            r#"{
                "rateType": "variable",
                "termMonths": 2,
                "euriborTenor": "6m",
                "spread": 0.9,
                "stampDutyRate": 0.04,
                "contractStart": "2025-03-01",
                "table": [
                    {"paymentNumber": 1, "installment": 502.5, "interest": 5.0, "principal": 497.5,
                     "stampDuty": 0.2, "insurance": 0.0, "totalPayment": 502.7, "remainingBalance": 502.5},
                    {"paymentNumber": 2, "installment": 502.5, "interest": 2.5, "principal": 500.0,
                     "stampDuty": 0.1, "insurance": 0.0, "totalPayment": 502.6, "remainingBalance": 0.0}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.euribor_tenor, Some(EuriborTenor::SixMonths));
        assert_eq!(snapshot.contract_start, date(2025, 3, 1));
        assert_eq!(snapshot.table.len(), 2);
    }

    #[test]
    fn test_snapshot_without_stamp_duty_uses_default() {
        let snapshot: SimulationSnapshot = serde_json::from_str(
            r#"{"termMonths": 1, "contractStart": "2025-03-01", "table": []}"#,
        )
        .unwrap();

        assert_eq!(snapshot.stamp_duty_rate, 0.04);
        assert_eq!(snapshot.rate_regime, RateRegime::Variable);
    }

    #[test]
    fn test_new_payment_estimate() {
        // 3% on 100k over 30 years: 421.60 installment + 250 × 4% stamp duty
        let estimate = estimate_new_payment(100_000.0, 2.0, 1.0, 360, 0.04);
        assert_eq!(estimate.monthly_payment, 431.6);
        assert_eq!(estimate.tan, 0.03);

        let zero = estimate_new_payment(24_000.0, 0.0, 0.0, 48, 0.04);
        assert_eq!(zero.monthly_payment, 500.0);
        assert_eq!(zero.tan, 0.0);
    }

    #[test]
    fn test_next_revision_date() {
        let start = date(2024, 1, 15);

        assert_eq!(
            next_revision_date(start, EuriborTenor::SixMonths, date(2025, 3, 1)),
            Some(date(2025, 7, 15))
        );
        // Strictly after: a revision day rolls to the following one
        assert_eq!(
            next_revision_date(start, EuriborTenor::SixMonths, date(2025, 7, 15)),
            Some(date(2026, 1, 15))
        );
        assert_eq!(
            next_revision_date(start, EuriborTenor::TwelveMonths, date(2023, 12, 1)),
            Some(date(2025, 1, 15))
        );
        assert_eq!(
            next_revision_date(date(2024, 8, 31), EuriborTenor::ThreeMonths, date(2024, 10, 1)),
            Some(date(2024, 11, 30))
        );
    }

    #[test]
    fn test_tenor_parsing() {
        assert_eq!(EuriborTenor::parse("12M"), Some(EuriborTenor::TwelveMonths));
        assert_eq!(EuriborTenor::parse("1m"), None);
        assert_eq!(EuriborTenor::SixMonths.months(), 6);
    }
}
