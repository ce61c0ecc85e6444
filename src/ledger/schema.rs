//! Declarative CSV row schema and pure field parsers
//!
//! Each feed declares its column→field mapping as a list of `ColumnSpec`
//! constants; the generic `Row` decoder turns positional access into named,
//! typed access with explicit failure messages. Numeric columns use US
//! decimal formatting (optional thousands commas); date columns use the
//! feed's fixed `MMM d, yyyy` pattern.

use crate::error::{ReportError, Result};
use chrono::NaiveDate;
use csv::StringRecord;
use rust_decimal::Decimal;
use std::str::FromStr;

/// One column of a feed schema
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub index: usize,
    pub name: &'static str,
    pub required: bool,
}

impl ColumnSpec {
    pub const fn required(index: usize, name: &'static str) -> Self {
        Self {
            index,
            name,
            required: true,
        }
    }

    pub const fn optional(index: usize, name: &'static str) -> Self {
        Self {
            index,
            name,
            required: false,
        }
    }
}

/// One CSV record plus its source line number, decoded through column specs
#[derive(Debug)]
pub struct Row<'a> {
    record: &'a StringRecord,
    line: u64,
}

impl<'a> Row<'a> {
    pub fn new(record: &'a StringRecord, line: u64) -> Self {
        Self { record, line }
    }

    /// Source line number, for error messages
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Raw text of a column; `None` when absent or blank
    ///
    /// A required column that is absent or blank is a parse error.
    pub fn text(&self, spec: &ColumnSpec) -> Result<Option<&'a str>> {
        let value = self.record.get(spec.index).map(str::trim).filter(|v| !v.is_empty());
        if spec.required && value.is_none() {
            return Err(ReportError::ParseError(format!(
                "row {}: missing required column '{}'",
                self.line, spec.name
            )));
        }
        Ok(value)
    }

    pub fn string(&self, spec: &ColumnSpec) -> Result<Option<String>> {
        Ok(self.text(spec)?.map(str::to_string))
    }

    pub fn decimal(&self, spec: &ColumnSpec) -> Result<Option<Decimal>> {
        self.text(spec)?
            .map(|value| {
                parse_us_decimal(value).map_err(|e| self.field_error(spec, &e.to_string()))
            })
            .transpose()
    }

    pub fn date(&self, spec: &ColumnSpec) -> Result<Option<NaiveDate>> {
        self.text(spec)?
            .map(|value| {
                parse_feed_date(value).map_err(|e| self.field_error(spec, &e.to_string()))
            })
            .transpose()
    }

    /// Required-column shortcuts; the `text` check guarantees the value
    pub fn require_string(&self, spec: &ColumnSpec) -> Result<String> {
        self.string(spec)?.ok_or_else(|| self.missing(spec))
    }

    pub fn require_decimal(&self, spec: &ColumnSpec) -> Result<Decimal> {
        self.decimal(spec)?.ok_or_else(|| self.missing(spec))
    }

    pub fn require_date(&self, spec: &ColumnSpec) -> Result<NaiveDate> {
        self.date(spec)?.ok_or_else(|| self.missing(spec))
    }

    fn missing(&self, spec: &ColumnSpec) -> ReportError {
        ReportError::ParseError(format!(
            "row {}: missing required column '{}'",
            self.line, spec.name
        ))
    }

    fn field_error(&self, spec: &ColumnSpec, detail: &str) -> ReportError {
        ReportError::ParseError(format!(
            "row {}: column '{}': {}",
            self.line, spec.name, detail
        ))
    }
}

/// Parse a US-formatted decimal, e.g. `9.99` or `1,234.56`
pub fn parse_us_decimal(text: &str) -> Result<Decimal> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&cleaned)
        .map_err(|e| ReportError::ParseError(format!("invalid amount '{}': {}", text, e)))
}

/// Parse a feed date in the fixed `MMM d, yyyy` pattern, e.g. `Jan 5, 2024`
pub fn parse_feed_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%b %d, %Y")
        .map_err(|e| ReportError::ParseError(format!("invalid date '{}': {}", text, e)))
}
