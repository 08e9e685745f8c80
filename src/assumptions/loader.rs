//! CSV-based assumption loader
//!
//! Reads `key,value` pairs from data/assumptions/regulatory.csv

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::LoaderError;

/// Default path to assumptions directory
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions";

/// File name of the regulatory table inside the assumptions directory
pub const REGULATORY_FILE: &str = "regulatory.csv";

/// Keys accepted in the regulatory table
pub const KNOWN_KEYS: [&str; 6] = [
    "early_repayment_fee_variable",
    "early_repayment_fee_fixed",
    "stamp_duty_on_fee",
    "stamp_duty_on_interest",
    "balance_tolerance",
    "max_term_months",
];

/// Raw values read from the regulatory table, keyed by name
#[derive(Debug, Clone, Default)]
pub struct LoadedAssumptions {
    values: HashMap<String, f64>,
}

impl LoadedAssumptions {
    /// Load the regulatory table from an assumptions directory
    pub fn load_from(path: &Path) -> Result<Self, LoaderError> {
        let file = File::open(path.join(REGULATORY_FILE))?;
        Self::from_reader(file)
    }

    /// Load the regulatory table from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoaderError> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut values = HashMap::new();

        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            // Header is line 1
            let row = idx + 2;

            let key = record
                .get(0)
                .map(str::trim)
                .ok_or_else(|| LoaderError::InvalidRow { row, message: "missing key".into() })?;
            if !KNOWN_KEYS.contains(&key) {
                return Err(LoaderError::UnknownKey(key.to_string()));
            }

            let raw = record
                .get(1)
                .map(str::trim)
                .ok_or_else(|| LoaderError::InvalidRow { row, message: format!("missing value for {}", key) })?;
            let value: f64 = raw.parse().map_err(|_| LoaderError::InvalidRow {
                row,
                message: format!("invalid number '{}' for {}", raw, key),
            })?;

            values.insert(key.to_string(), value);
        }

        Ok(Self { values })
    }

    /// Value for a key, if the table provided one
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table() {
        let csv = "key,value\nearly_repayment_fee_fixed,0.015\nmax_term_months,480\n";
        let loaded = LoadedAssumptions::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(loaded.get("early_repayment_fee_fixed"), Some(0.015));
        assert_eq!(loaded.get("max_term_months"), Some(480.0));
        assert_eq!(loaded.get("stamp_duty_on_fee"), None);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let csv = "key,value\nmortality_improvement,0.015\n";
        let err = LoadedAssumptions::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoaderError::UnknownKey(ref k) if k == "mortality_improvement"));
    }

    #[test]
    fn test_bad_number_reports_row() {
        let csv = "key,value\nbalance_tolerance,0.01\nstamp_duty_on_fee,four\n";
        let err = LoadedAssumptions::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoaderError::InvalidRow { row: 3, .. }));
    }

    #[test]
    fn test_load_default_table() {
        let loaded = LoadedAssumptions::load_from(Path::new(DEFAULT_ASSUMPTIONS_PATH))
            .expect("Failed to load regulatory table");
        assert_eq!(loaded.get("early_repayment_fee_variable"), Some(0.005));
    }
}
