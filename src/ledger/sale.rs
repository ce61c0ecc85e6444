//! Sales-feed record
//!
//! The sales feed carries 17 columns; only the five below matter to
//! reconciliation. Each record is consumed exactly once and then discarded.

use crate::error::Result;
use crate::ledger::schema::{ColumnSpec, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sales-feed column map (0-based)
pub mod columns {
    use super::ColumnSpec;

    pub const ID: ColumnSpec = ColumnSpec::required(0, "order id");
    pub const BUYER_CURRENCY: ColumnSpec = ColumnSpec::required(9, "buyer currency");
    pub const PRICE: ColumnSpec = ColumnSpec::required(10, "item price");
    pub const TAX_COLLECTED: ColumnSpec = ColumnSpec::required(11, "tax collected");
    pub const CHARGED_AMOUNT: ColumnSpec = ColumnSpec::required(12, "charged amount");
    pub const BUYER_COUNTRY: ColumnSpec = ColumnSpec::optional(16, "buyer country");
}

/// One sales-feed row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: String,
    pub buyer_currency: String,
    /// Net price, matched against the earnings amount
    pub price: Decimal,
    pub tax_collected: Decimal,
    /// Gross price (net plus tax)
    pub charged_amount: Decimal,
    pub buyer_country: Option<String>,
}

impl SaleRecord {
    /// Parse one sales-feed row
    pub fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            id: row.require_string(&columns::ID)?,
            buyer_currency: row.require_string(&columns::BUYER_CURRENCY)?,
            price: row.require_decimal(&columns::PRICE)?,
            tax_collected: row.require_decimal(&columns::TAX_COLLECTED)?,
            charged_amount: row.require_decimal(&columns::CHARGED_AMOUNT)?,
            buyer_country: row.string(&columns::BUYER_COUNTRY)?,
        })
    }
}
