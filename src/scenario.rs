//! Scenario runner for batch schedules
//!
//! Loads the regulatory assumptions once, then runs many loans or what-if
//! variants of one loan against them.

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::amortization::{round_cents, AmortizationEngine, CalculationResult};
use crate::assumptions::RegulatoryAssumptions;
use crate::error::{LoaderError, ValidationError};
use crate::loan::LoanParams;

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_csv()?;
///
/// let base = LoanParams::new(150_000.0, 0.035, 360);
/// let scenarios: Vec<_> = [0.03, 0.035, 0.04]
///     .iter()
///     .map(|&tan| LoanParams { tan, ..base.clone() })
///     .collect();
/// let deltas = runner.compare(&scenarios)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    engine: AmortizationEngine,
}

/// One scenario measured against the first (baseline) scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioComparison {
    pub index: usize,
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub monthly_payment_delta: f64,
    pub total_payment_delta: f64,
    pub total_interest_delta: f64,
}

impl ScenarioRunner {
    /// Runner with the Portuguese defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner with assumptions loaded from the default CSV location
    pub fn from_csv() -> Result<Self, LoaderError> {
        Ok(Self::with_assumptions(RegulatoryAssumptions::from_csv()?))
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, LoaderError> {
        Ok(Self::with_assumptions(RegulatoryAssumptions::from_csv_path(path)?))
    }

    pub fn with_assumptions(assumptions: RegulatoryAssumptions) -> Self {
        Self {
            engine: AmortizationEngine::new(assumptions),
        }
    }

    pub fn assumptions(&self) -> &RegulatoryAssumptions {
        self.engine.assumptions()
    }

    pub fn run(&self, params: &LoanParams) -> Result<CalculationResult, ValidationError> {
        self.engine.calculate(params)
    }

    /// Run every loan in parallel; results keep the input order
    pub fn run_batch(&self, loans: &[LoanParams]) -> Vec<Result<CalculationResult, ValidationError>> {
        loans.par_iter().map(|params| self.engine.calculate(params)).collect()
    }

    /// Run every scenario and report each one's deltas against the first.
    ///
    /// Fails on the first scenario that does not validate.
    pub fn compare(&self, scenarios: &[LoanParams]) -> Result<Vec<ScenarioComparison>, ValidationError> {
        let results = self
            .run_batch(scenarios)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        let Some(baseline) = results.first().map(|r| r.summary.clone()) else {
            return Ok(Vec::new());
        };

        Ok(results
            .iter()
            .enumerate()
            .map(|(index, result)| {
                let summary = &result.summary;
                ScenarioComparison {
                    index,
                    monthly_payment: summary.monthly_payment,
                    total_payment: summary.total_payment,
                    total_interest: summary.total_interest,
                    monthly_payment_delta: round_cents(summary.monthly_payment - baseline.monthly_payment),
                    total_payment_delta: round_cents(summary.total_payment - baseline.total_payment),
                    total_interest_delta: round_cents(summary.total_interest - baseline.total_interest),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate_scenarios() -> Vec<LoanParams> {
        let base = LoanParams::new(150_000.0, 0.035, 360);
        [0.035, 0.03, 0.04]
            .iter()
            .map(|&tan| LoanParams { tan, ..base.clone() })
            .collect()
    }

    #[test]
    fn test_batch_keeps_order_and_reports_invalid_loans() {
        let runner = ScenarioRunner::new();
        let loans = vec![
            LoanParams::new(100_000.0, 0.03, 360),
            LoanParams::new(-1.0, 0.03, 360),
            LoanParams::new(24_000.0, 0.0, 48),
        ];

        let results = runner.run_batch(&loans);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().table.len(), 360);
        assert_eq!(results[1], Err(ValidationError::NonPositivePrincipal(-1.0)));
        assert_eq!(results[2].as_ref().unwrap().summary.monthly_payment, 500.0);
    }

    #[test]
    fn test_compare_against_baseline() {
        let runner = ScenarioRunner::new();
        let comparisons = runner.compare(&rate_scenarios()).unwrap();

        assert_eq!(comparisons.len(), 3);
        assert_eq!(comparisons[0].monthly_payment_delta, 0.0);
        assert_eq!(comparisons[0].total_interest_delta, 0.0);

        // Lower rate is cheaper, higher rate dearer
        assert!(comparisons[1].monthly_payment_delta < 0.0);
        assert!(comparisons[1].total_interest_delta < 0.0);
        assert!(comparisons[2].monthly_payment_delta > 0.0);
        assert!(comparisons[2].total_payment_delta > 0.0);
    }

    #[test]
    fn test_compare_fails_on_invalid_scenario() {
        let runner = ScenarioRunner::new();
        let mut scenarios = rate_scenarios();
        scenarios[2].term_months = 0;

        assert!(runner.compare(&scenarios).is_err());
        assert!(runner.compare(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_custom_term_cap() {
        let mut assumptions = RegulatoryAssumptions::portugal();
        assumptions.max_term_months = 480;
        let runner = ScenarioRunner::with_assumptions(assumptions);

        assert!(runner.run(&LoanParams::new(100_000.0, 0.03, 480)).is_ok());
        assert_eq!(
            runner.run(&LoanParams::new(100_000.0, 0.03, 540)).unwrap_err(),
            ValidationError::TermOutOfRange { value: 540, max: 480 }
        );
    }
}
