//! Quote value type and rate-table document parsing
//!
//! A rate-table document is a list of `CODE;UNITS;RATE` records where `RATE`
//! uses a fixed decimal-comma format (optionally thousands-separated) no
//! matter the runtime locale. Parsing that format here is a conscious
//! contract, not an oversight.

use crate::error::{ReportError, Result};
use hashbrown::HashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rates in effect on a given day, keyed by uppercase currency code
pub type RateTable = HashMap<String, Quote>;

/// "N units of `currency` cost `rate` in reference currency"
///
/// Immutable once parsed; enrichment copies the two scalar fields out of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    currency: String,
    base_units: u32,
    rate: Decimal,
}

impl Quote {
    /// Create a quote, validating the base-unit count and rate
    pub fn new(currency: &str, base_units: u32, rate: Decimal) -> Result<Self> {
        if base_units < 1 {
            return Err(ReportError::ParseError(format!(
                "quote for {} has zero base units",
                currency
            )));
        }
        if rate <= Decimal::ZERO {
            return Err(ReportError::ParseError(format!(
                "quote for {} has non-positive rate {}",
                currency, rate
            )));
        }
        Ok(Self {
            currency: currency.trim().to_uppercase(),
            base_units,
            rate,
        })
    }

    /// Parse a quote out of one raw rate-document record
    pub fn from_record(record: &RateRecord) -> Result<Self> {
        let base_units = record.base_units.trim().parse::<u32>().map_err(|e| {
            ReportError::ParseError(format!(
                "invalid base-unit count '{}' for {}: {}",
                record.base_units, record.currency, e
            ))
        })?;
        let rate = parse_rate_value(&record.rate)?;
        Self::new(&record.currency, base_units, rate)
    }

    /// Uppercase ISO-like currency code
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Number of currency units the rate is quoted for (≥ 1)
    pub fn base_units(&self) -> u32 {
        self.base_units
    }

    /// Price of `base_units` units in reference currency
    pub fn rate(&self) -> Decimal {
        self.rate
    }
}

/// One raw record of a rate-table document, fields still unparsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRecord {
    pub currency: String,
    pub base_units: String,
    pub rate: String,
}

impl RateRecord {
    pub fn new(currency: &str, base_units: &str, rate: &str) -> Self {
        Self {
            currency: currency.to_string(),
            base_units: base_units.to_string(),
            rate: rate.to_string(),
        }
    }

    /// Parse one `CODE;UNITS;RATE` document line
    pub fn parse_line(line: &str) -> Result<Self> {
        let mut fields = line.split(';');
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(currency), Some(base_units), Some(rate), None) => {
                Ok(Self::new(currency, base_units, rate))
            }
            _ => Err(ReportError::ParseError(format!(
                "malformed rate record '{}': expected CODE;UNITS;RATE",
                line
            ))),
        }
    }
}

/// Parse a decimal-comma rate value, e.g. `4,4252` or `1 234,56`
///
/// Spaces (including non-breaking) are thousands separators; the comma is the
/// decimal point.
pub fn parse_rate_value(text: &str) -> Result<Decimal> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != ' ' && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    Decimal::from_str(&cleaned)
        .map_err(|e| ReportError::ParseError(format!("invalid rate value '{}': {}", text, e)))
}
