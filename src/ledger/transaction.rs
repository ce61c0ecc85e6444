//! Ledger transaction record
//!
//! One earnings-feed row, later enriched with sales-feed VAT data and a
//! historical FX rate. The earnings feed carries 19 columns; the specs below
//! map the ones the ledger uses, everything else is carried in the file but
//! ignored.

use crate::error::{ReportError, Result};
use crate::ledger::schema::{ColumnSpec, Row};
use crate::rates::Quote;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Earnings-feed column map (0-based)
pub mod columns {
    use super::ColumnSpec;

    pub const ID: ColumnSpec = ColumnSpec::optional(0, "transaction id");
    pub const DATE: ColumnSpec = ColumnSpec::required(1, "transaction date");
    pub const CATEGORY: ColumnSpec = ColumnSpec::optional(4, "transaction type");
    pub const PRODUCT_NAME: ColumnSpec = ColumnSpec::optional(6, "product name");
    pub const SKU_ID: ColumnSpec = ColumnSpec::optional(9, "sku id");
    pub const BUYER_COUNTRY: ColumnSpec = ColumnSpec::optional(11, "buyer country");
    pub const BUYER_CURRENCY: ColumnSpec = ColumnSpec::required(14, "buyer currency");
    pub const AMOUNT: ColumnSpec = ColumnSpec::required(15, "amount");
    pub const CONVERSION_RATE: ColumnSpec = ColumnSpec::optional(16, "conversion rate");
    pub const MERCHANT_CURRENCY: ColumnSpec = ColumnSpec::required(17, "merchant currency");
    pub const PAYOUT: ColumnSpec = ColumnSpec::required(18, "payout");
}

/// Transaction category, keyed by the feed's label column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Charge,
    Fee,
    Refund,
    FeeRefund,
    Tax,
}

impl Category {
    /// Parse a feed label; unknown labels are not a category
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Charge" => Some(Category::Charge),
            "Google fee" => Some(Category::Fee),
            "Charge refund" => Some(Category::Refund),
            "Google fee refund" => Some(Category::FeeRefund),
            "Tax" => Some(Category::Tax),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Charge => "Charge",
            Category::Fee => "Google fee",
            Category::Refund => "Charge refund",
            Category::FeeRefund => "Google fee refund",
            Category::Tax => "Tax",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One ledger entry
///
/// `tax_amount` is set by reconciliation, never at parse time.
/// `conversion_rate`/`conversion_rate_base_units` default to the feed's own
/// rate column (0 with base units 1 when absent) and are overwritten from the
/// rate timeline for cross-currency rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Present on every row except tax deductions
    pub id: Option<String>,
    pub date: NaiveDate,
    pub category: Category,
    pub product_name: Option<String>,
    pub sku_id: Option<String>,
    pub buyer_country: Option<String>,
    pub buyer_currency: String,
    pub merchant_currency: String,
    /// Amount in buyer currency
    pub amount: Decimal,
    /// Actual payout in merchant currency
    pub payout: Decimal,
    pub conversion_rate: Decimal,
    pub conversion_rate_base_units: u32,
    /// VAT collected, from the matching sales row
    pub tax_amount: Option<Decimal>,
}

impl Transaction {
    /// Parse one earnings-feed row
    ///
    /// Returns `Ok(None)` for the one tolerated anomaly: a category-less row
    /// with zero payout, a known benign artifact of tax-deduction exports.
    /// A category-less row with nonzero payout is a hard error, as is a
    /// non-tax row without an id.
    pub fn from_row(row: &Row<'_>) -> Result<Option<Self>> {
        let payout = row.require_decimal(&columns::PAYOUT)?;
        let category = match row.text(&columns::CATEGORY)? {
            Some(label) => Category::from_label(label).ok_or_else(|| {
                ReportError::ParseError(format!(
                    "row {}: unknown transaction type '{}'",
                    row.line(),
                    label
                ))
            })?,
            None => {
                if payout == Decimal::ZERO {
                    return Ok(None);
                }
                return Err(ReportError::ParseError(format!(
                    "row {}: transaction without type has nonzero payout {}",
                    row.line(),
                    payout
                )));
            }
        };
        let id = row.string(&columns::ID)?;
        if id.is_none() && category != Category::Tax {
            return Err(ReportError::ParseError(format!(
                "row {}: non-tax transaction without id",
                row.line()
            )));
        }
        Ok(Some(Self {
            id,
            date: row.require_date(&columns::DATE)?,
            category,
            product_name: row.string(&columns::PRODUCT_NAME)?,
            sku_id: row.string(&columns::SKU_ID)?,
            buyer_country: row.string(&columns::BUYER_COUNTRY)?,
            buyer_currency: row.require_string(&columns::BUYER_CURRENCY)?,
            merchant_currency: row.require_string(&columns::MERCHANT_CURRENCY)?,
            amount: row.require_decimal(&columns::AMOUNT)?,
            payout,
            conversion_rate: row.decimal(&columns::CONVERSION_RATE)?.unwrap_or_default(),
            conversion_rate_base_units: 1,
            tax_amount: None,
        }))
    }

    /// True when buyer and merchant currencies differ
    pub fn is_cross_currency(&self) -> bool {
        self.buyer_currency != self.merchant_currency
    }

    /// Overwrite the conversion rate from a resolved daily quote
    pub fn apply_quote(&mut self, quote: &Quote) {
        self.conversion_rate = quote.rate();
        self.conversion_rate_base_units = quote.base_units();
    }

    /// Amount expressed in merchant currency
    ///
    /// Same-currency rows never consult the rate; the parse-time default is
    /// inert for them.
    pub fn amount_converted(&self) -> Decimal {
        if !self.is_cross_currency() {
            return self.amount;
        }
        self.amount * self.conversion_rate / Decimal::from(self.conversion_rate_base_units)
    }

    /// Realized FX gain/loss: payout minus converted amount
    pub fn spread(&self) -> Decimal {
        if !self.is_cross_currency() {
            return Decimal::ZERO;
        }
        self.payout - self.amount_converted()
    }

    /// Collected VAT expressed in merchant currency, when a sales row claimed
    /// this transaction
    pub fn tax_amount_converted(&self) -> Option<Decimal> {
        let tax = self.tax_amount?;
        if !self.is_cross_currency() {
            return Some(tax);
        }
        Some(tax * self.conversion_rate / Decimal::from(self.conversion_rate_base_units))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::StringRecord;
    use rust_decimal_macros::dec;

    fn earnings_record(fields: [&str; 19]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    fn charge_row() -> StringRecord {
        earnings_record([
            "T1",
            "Jan 5, 2024",
            "1:02:03 PM",
            "",
            "Charge",
            "",
            "Premium Upgrade",
            "com.example.app",
            "0",
            "premium",
            "phone",
            "DE",
            "",
            "",
            "EUR",
            "9.99",
            "4.10",
            "USD",
            "9.00",
        ])
    }

    #[test]
    fn test_parse_charge_row() {
        let record = charge_row();
        let t = Transaction::from_row(&Row::new(&record, 2)).unwrap().unwrap();
        assert_eq!(t.id.as_deref(), Some("T1"));
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(t.category, Category::Charge);
        assert_eq!(t.product_name.as_deref(), Some("Premium Upgrade"));
        assert_eq!(t.sku_id.as_deref(), Some("premium"));
        assert_eq!(t.buyer_country.as_deref(), Some("DE"));
        assert_eq!(t.amount, dec!(9.99));
        assert_eq!(t.payout, dec!(9.00));
        assert_eq!(t.conversion_rate, dec!(4.10));
        assert_eq!(t.conversion_rate_base_units, 1);
        assert!(t.tax_amount.is_none());
    }

    #[test]
    fn test_conversion_and_spread() {
        let record = charge_row();
        let t = Transaction::from_row(&Row::new(&record, 2)).unwrap().unwrap();
        assert_eq!(t.amount_converted(), dec!(40.959));
        assert_eq!(t.spread(), dec!(-31.959));
    }

    #[test]
    fn test_same_currency_conversion_is_identity() {
        let record = charge_row();
        let mut t = Transaction::from_row(&Row::new(&record, 2)).unwrap().unwrap();
        t.merchant_currency = "EUR".to_string();
        assert_eq!(t.amount_converted(), t.amount);
        assert_eq!(t.spread(), Decimal::ZERO);
    }

    #[test]
    fn test_apply_quote() {
        let record = charge_row();
        let mut t = Transaction::from_row(&Row::new(&record, 2)).unwrap().unwrap();
        let quote = Quote::new("EUR", 1, dec!(4.35)).unwrap();
        t.apply_quote(&quote);
        assert_eq!(t.conversion_rate, dec!(4.35));
        assert_eq!(t.amount_converted(), dec!(9.99) * dec!(4.35));
    }

    #[test]
    fn test_zero_payout_orphan_dropped() {
        let record = earnings_record([
            "", "Jan 5, 2024", "", "", "", "", "", "", "", "", "", "", "", "", "EUR", "0",
            "", "USD", "0",
        ]);
        assert!(Transaction::from_row(&Row::new(&record, 3)).unwrap().is_none());
    }

    #[test]
    fn test_categoryless_with_payout_is_error() {
        let record = earnings_record([
            "", "Jan 5, 2024", "", "", "", "", "", "", "", "", "", "", "", "", "EUR", "0",
            "", "USD", "-1.20",
        ]);
        let err = Transaction::from_row(&Row::new(&record, 3)).unwrap_err();
        assert!(matches!(err, ReportError::ParseError(_)));
    }

    #[test]
    fn test_idless_must_be_tax() {
        let record = earnings_record([
            "", "Jan 5, 2024", "", "", "Charge", "", "", "", "", "", "", "", "", "", "EUR",
            "9.99", "", "USD", "9.00",
        ]);
        assert!(Transaction::from_row(&Row::new(&record, 4)).is_err());

        let record = earnings_record([
            "", "Jan 5, 2024", "", "", "Tax", "", "", "", "", "", "", "", "", "", "EUR",
            "0", "", "USD", "-0.30",
        ]);
        let t = Transaction::from_row(&Row::new(&record, 5)).unwrap().unwrap();
        assert_eq!(t.category, Category::Tax);
        assert!(t.id.is_none());
    }

    #[test]
    fn test_tax_amount_converted() {
        let record = charge_row();
        let mut t = Transaction::from_row(&Row::new(&record, 2)).unwrap().unwrap();
        assert!(t.tax_amount_converted().is_none());
        t.tax_amount = Some(dec!(2.00));
        assert_eq!(t.tax_amount_converted(), Some(dec!(2.00) * dec!(4.10)));
    }
}
