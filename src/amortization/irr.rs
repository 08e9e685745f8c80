//! Effective annual rate (TAEG-style) of a loan
//!
//! Finds the monthly rate at which the full monthly outflows (installment,
//! stamp duty, insurance) discount back to the principal received, then
//! compounds it to a year. The borrower's cashflow has exactly one sign
//! change, so the present value is monotone in the rate and a safeguarded
//! Newton iteration inside a fixed bracket always converges.

const TOLERANCE: f64 = 1e-12;
const MAX_ITERATIONS: usize = 200;

/// Monthly rates searched, far wider than any mortgage can carry
const LOWEST_MONTHLY_RATE: f64 = -0.5;
const HIGHEST_MONTHLY_RATE: f64 = 1.0;

/// Effective annual rate as a decimal.
///
/// `None` for a non-positive principal, no outflows, or outflows whose
/// implied monthly rate falls outside the searched bracket.
pub fn effective_annual_rate(principal: f64, monthly_outflows: &[f64]) -> Option<f64> {
    implied_monthly_rate(principal, monthly_outflows).map(|r| (1.0 + r).powi(12) - 1.0)
}

/// Principal minus the present value of the outflows at `rate`, and its
/// derivative with respect to `rate`. Both rise with the rate.
fn shortfall_and_slope(principal: f64, outflows: &[f64], rate: f64) -> (f64, f64) {
    let discount = 1.0 / (1.0 + rate);
    let mut factor = 1.0;
    let mut present_value = 0.0;
    let mut slope = 0.0;

    for (t, &payment) in outflows.iter().enumerate() {
        factor *= discount;
        present_value += payment * factor;
        slope += (t + 1) as f64 * payment * factor * discount;
    }

    (principal - present_value, slope)
}

/// Monthly rate that makes the outflows repay `principal` exactly
fn implied_monthly_rate(principal: f64, outflows: &[f64]) -> Option<f64> {
    if !principal.is_finite() || principal <= 0.0 || outflows.is_empty() {
        return None;
    }

    let mut low = LOWEST_MONTHLY_RATE;
    let mut high = HIGHEST_MONTHLY_RATE;
    if shortfall_and_slope(principal, outflows, low).0 > 0.0
        || shortfall_and_slope(principal, outflows, high).0 < 0.0
    {
        return None;
    }

    // A zero-rate loan is solved on the first step
    let mut rate = 0.0;

    for _ in 0..MAX_ITERATIONS {
        let (shortfall, slope) = shortfall_and_slope(principal, outflows, rate);

        if shortfall.abs() <= TOLERANCE * principal {
            return Some(rate);
        }
        if shortfall < 0.0 {
            low = rate;
        } else {
            high = rate;
        }
        if high - low < TOLERANCE {
            return Some(rate);
        }

        let newton = rate - shortfall / slope;
        rate = if newton.is_finite() && newton > low && newton < high {
            newton
        } else {
            (low + high) / 2.0
        };
    }

    Some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_level_payments_recover_nominal_rate() {
        // 100k at 3% TAN over 30 years: PMT 421.6046
        let payments = vec![421.604_6; 360];
        let annual = effective_annual_rate(100_000.0, &payments).unwrap();

        // Monthly rate is 0.25%, compounded to (1.0025)^12 - 1
        assert_abs_diff_eq!(annual, 1.0025_f64.powi(12) - 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_interest_loan() {
        let payments = vec![500.0; 48];
        let annual = effective_annual_rate(24_000.0, &payments).unwrap();
        assert_abs_diff_eq!(annual, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_charges_raise_the_rate() {
        let bare = effective_annual_rate(100_000.0, &[421.604_6; 360]).unwrap();
        // Stamp duty and insurance on top of the installment
        let loaded = effective_annual_rate(100_000.0, &[451.6; 360]).unwrap();
        assert!(loaded > bare);
    }

    #[test]
    fn test_payments_below_principal_give_negative_rate() {
        let annual = effective_annual_rate(12_000.0, &[990.0; 12]).unwrap();
        assert!(annual < 0.0);
    }

    #[test]
    fn test_unsolvable_inputs() {
        assert!(effective_annual_rate(100_000.0, &[]).is_none());
        assert!(effective_annual_rate(0.0, &[500.0; 12]).is_none());
        // Repaying triple the principal after one month is beyond the bracket
        assert!(effective_annual_rate(1_000.0, &[3_000.0]).is_none());
    }
}
