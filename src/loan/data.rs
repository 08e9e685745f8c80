//! Loan parameters as supplied by the calculator front-end

use serde::{Deserialize, Serialize};

use crate::assumptions::RegulatoryAssumptions;
use crate::error::ValidationError;

fn default_stamp_duty_rate() -> f64 {
    0.04
}

/// Interest rate regime of the contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateRegime {
    /// Euribor + spread, revised periodically
    #[default]
    Variable,
    /// Single rate for the whole term
    Fixed,
    /// Fixed for an initial period, variable afterwards
    Mixed,
}

impl RateRegime {
    /// Which side of the fee schedule applies to an early repayment made now.
    /// A mixed loan pays the fixed-rate fee while still in its fixed period.
    pub fn fee_rate_type(&self, is_in_fixed_period: bool) -> RateType {
        match self {
            RateRegime::Variable => RateType::Variable,
            RateRegime::Fixed => RateType::Fixed,
            RateRegime::Mixed if is_in_fixed_period => RateType::Fixed,
            RateRegime::Mixed => RateType::Variable,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "variable" => Some(RateRegime::Variable),
            "fixed" => Some(RateRegime::Fixed),
            "mixed" => Some(RateRegime::Mixed),
            _ => None,
        }
    }
}

/// Rate side used for early repayment fees (a mixed loan has already
/// resolved to one of these)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    Variable,
    Fixed,
}

/// Resolved fixed-to-variable switch of a mixed-rate loan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixedSwitch {
    pub fixed_period_months: u32,
    pub fixed_rate: f64,
    pub variable_rate: f64,
}

/// Input to the amortization engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanParams {
    /// Amount borrowed
    pub principal: f64,

    /// Taxa Anual Nominal as a decimal (0.035 = 3.5%)
    pub tan: f64,

    pub term_months: u32,

    /// Imposto do Selo on interest
    #[serde(default = "default_stamp_duty_rate")]
    pub stamp_duty_rate: f64,

    /// Monthly insurance premium as a fraction of the outstanding balance
    #[serde(default)]
    pub insurance_rate: f64,

    #[serde(default, rename = "rateType")]
    pub rate_regime: RateRegime,

    /// Mixed only: length of the initial fixed period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_period_months: Option<u32>,

    /// Mixed only: rate during the fixed period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_rate: Option<f64>,

    /// Mixed only: rate after the fixed period (Euribor + spread)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_rate: Option<f64>,
}

impl LoanParams {
    /// Variable-rate loan with the default 4% stamp duty and no insurance
    pub fn new(principal: f64, tan: f64, term_months: u32) -> Self {
        Self {
            principal,
            tan,
            term_months,
            stamp_duty_rate: default_stamp_duty_rate(),
            insurance_rate: 0.0,
            rate_regime: RateRegime::Variable,
            fixed_period_months: None,
            fixed_rate: None,
            variable_rate: None,
        }
    }

    pub fn with_stamp_duty_rate(mut self, rate: f64) -> Self {
        self.stamp_duty_rate = rate;
        self
    }

    pub fn with_insurance_rate(mut self, rate: f64) -> Self {
        self.insurance_rate = rate;
        self
    }

    pub fn with_regime(mut self, regime: RateRegime) -> Self {
        self.rate_regime = regime;
        self
    }

    /// Turn the loan into a mixed-rate loan
    pub fn with_mixed(mut self, fixed_period_months: u32, fixed_rate: f64, variable_rate: f64) -> Self {
        self.rate_regime = RateRegime::Mixed;
        self.fixed_period_months = Some(fixed_period_months);
        self.fixed_rate = Some(fixed_rate);
        self.variable_rate = Some(variable_rate);
        self
    }

    /// The rate switch, if this loan is eligible for mixed treatment.
    ///
    /// Requires the mixed regime, a fixed period inside (0, term) and both
    /// sub-rates. Anything short of that amortizes as a flat loan at `tan`.
    pub fn mixed_switch(&self) -> Option<MixedSwitch> {
        if self.rate_regime != RateRegime::Mixed {
            return None;
        }
        let fixed_period_months = self.fixed_period_months?;
        if fixed_period_months == 0 || fixed_period_months >= self.term_months {
            return None;
        }
        Some(MixedSwitch {
            fixed_period_months,
            fixed_rate: self.fixed_rate?,
            variable_rate: self.variable_rate?,
        })
    }

    /// Check the input constraints the engine relies on
    pub fn validate(&self, assumptions: &RegulatoryAssumptions) -> Result<(), ValidationError> {
        if !self.principal.is_finite() || self.principal <= 0.0 {
            return Err(ValidationError::NonPositivePrincipal(self.principal));
        }
        check_fraction("tan", self.tan)?;
        check_fraction("stampDutyRate", self.stamp_duty_rate)?;
        check_fraction("insuranceRate", self.insurance_rate)?;

        if self.term_months < 1 || self.term_months > assumptions.max_term_months {
            return Err(ValidationError::TermOutOfRange {
                value: self.term_months,
                max: assumptions.max_term_months,
            });
        }

        if self.rate_regime == RateRegime::Mixed {
            let fixed_period_months = self
                .fixed_period_months
                .ok_or(ValidationError::MissingMixedField("fixedPeriodMonths"))?;
            let fixed_rate = self
                .fixed_rate
                .ok_or(ValidationError::MissingMixedField("fixedRate"))?;
            let variable_rate = self
                .variable_rate
                .ok_or(ValidationError::MissingMixedField("variableRate"))?;

            check_fraction("fixedRate", fixed_rate)?;
            check_fraction("variableRate", variable_rate)?;

            if fixed_period_months >= self.term_months {
                return Err(ValidationError::FixedPeriodTooLong {
                    fixed_period_months,
                    term_months: self.term_months,
                });
            }
        }

        Ok(())
    }
}

fn check_fraction(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::RateOutOfRange { field, value })
    }
}
