//! Load loan books from CSV

use std::io::Read;
use std::path::Path;

use csv::Reader;

use super::{LoanParams, RateRegime};
use crate::error::LoaderError;

/// Raw CSV row; empty mixed-rate columns deserialize as `None`
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(default)]
    name: Option<String>,
    principal: f64,
    tan: f64,
    term_months: u32,
    #[serde(default)]
    stamp_duty_rate: Option<f64>,
    #[serde(default)]
    insurance_rate: Option<f64>,
    #[serde(default)]
    rate_regime: Option<String>,
    #[serde(default)]
    fixed_period_months: Option<u32>,
    #[serde(default)]
    fixed_rate: Option<f64>,
    #[serde(default)]
    variable_rate: Option<f64>,
}

/// A named set of loan parameters from a loan book
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRecord {
    pub name: String,
    pub params: LoanParams,
}

impl CsvRow {
    fn into_record(self, row: usize) -> Result<LoanRecord, LoaderError> {
        let rate_regime = match self.rate_regime.as_deref() {
            None | Some("") => RateRegime::Variable,
            Some(raw) => RateRegime::parse(raw).ok_or_else(|| LoaderError::InvalidRow {
                row,
                message: format!("unknown rate regime: {}", raw),
            })?,
        };

        let mut params = LoanParams::new(self.principal, self.tan, self.term_months)
            .with_regime(rate_regime);
        if let Some(rate) = self.stamp_duty_rate {
            params = params.with_stamp_duty_rate(rate);
        }
        if let Some(rate) = self.insurance_rate {
            params = params.with_insurance_rate(rate);
        }
        params.fixed_period_months = self.fixed_period_months;
        params.fixed_rate = self.fixed_rate;
        params.variable_rate = self.variable_rate;

        Ok(LoanRecord {
            name: self
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("loan_{}", row)),
            params,
        })
    }
}

/// Load all loans from a CSV file
pub fn load_loans<P: AsRef<Path>>(path: P) -> Result<Vec<LoanRecord>, LoaderError> {
    let reader = Reader::from_path(path)?;
    collect_records(reader)
}

/// Load loans from any reader (e.g., string buffer, request body)
pub fn load_loans_from_reader<R: Read>(reader: R) -> Result<Vec<LoanRecord>, LoaderError> {
    collect_records(Reader::from_reader(reader))
}

fn collect_records<R: Read>(mut reader: Reader<R>) -> Result<Vec<LoanRecord>, LoaderError> {
    let mut loans = Vec::new();

    for (idx, result) in reader.deserialize().enumerate() {
        let row: CsvRow = result?;
        loans.push(row.into_record(idx + 1)?);
    }

    Ok(loans)
}
