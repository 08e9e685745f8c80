//! Presentation rounding

/// Round half away from zero to `decimals` places.
///
/// Ties are decided on the binary value, not the decimal literal: 1.005 is
/// stored just below the midpoint and rounds to 1.0.
///
/// Only applied when a figure leaves the engine (row, summary field);
/// the month-to-month recurrence always runs at full precision.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    // Normalise -0.0 so serialized output never shows "-0.0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Round to the cent
pub fn round_cents(value: f64) -> f64 {
    round_to(value, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_away_from_zero() {
        assert_eq!(round_cents(0.125), 0.13);
        assert_eq!(round_cents(-0.125), -0.13);
        assert_eq!(round_cents(421.6046), 421.6);
        assert_eq!(round_to(2.0799999, 3), 2.08);
    }

    #[test]
    fn test_ties_follow_binary_value() {
        assert_eq!(round_cents(1.005), 1.0);
        assert_eq!(round_cents(0.285), 0.28);
        // 0.375 is an exact binary midpoint
        assert_eq!(round_cents(0.375), 0.38);
    }

    #[test]
    fn test_negative_zero_normalised() {
        let r = round_cents(-0.0001);
        assert_eq!(r, 0.0);
        assert!(r.is_sign_positive());
    }
}
