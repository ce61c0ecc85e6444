//! Ledger post-passes
//!
//! Pure functions of the finalized ledger: the monthly digest the summary
//! page carries, the per-currency VAT rollup, and the display-precision
//! policy the presentation layer threads through explicitly instead of
//! keeping global formatting state.

use crate::ledger::reconcile::Ledger;
use crate::ledger::transaction::Category;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default EU currency set used by the digest and VAT rollup
pub const EU_CURRENCIES: [&str; 10] = [
    "EUR", "GBP", "HUF", "HRK", "DKK", "SEK", "BGN", "CZK", "RON", "PLN",
];

/// Monthly roll-up over the finalized ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerDigest {
    /// Sum of payout over every row
    pub total_payout: Decimal,
    /// Sum of payout over id-less tax-deduction rows
    pub tax_deduction: Decimal,
    /// Payout from transactions in EU currencies
    pub eu_payout: Decimal,
    /// Collected VAT converted to merchant currency (EU-currency charges)
    pub vat_converted: Decimal,
    /// Sum of converted amount over id-bearing rows
    pub total_converted: Decimal,
    /// Total converted minus total payout
    pub fx_difference: Decimal,
}

impl LedgerDigest {
    /// Compute the digest; `process_vat = false` leaves `vat_converted` zero
    pub fn compute(ledger: &Ledger, eu_currencies: &[String], process_vat: bool) -> Self {
        let mut digest = Self {
            total_payout: Decimal::ZERO,
            tax_deduction: Decimal::ZERO,
            eu_payout: Decimal::ZERO,
            vat_converted: Decimal::ZERO,
            total_converted: Decimal::ZERO,
            fx_difference: Decimal::ZERO,
        };
        for transaction in ledger.transactions() {
            digest.total_payout += transaction.payout;
            if transaction.id.is_none() {
                digest.tax_deduction += transaction.payout;
                continue;
            }
            if eu_currencies.contains(&transaction.buyer_currency) {
                digest.eu_payout += transaction.payout;
                if process_vat && transaction.category == Category::Charge {
                    digest.vat_converted +=
                        transaction.tax_amount_converted().unwrap_or_default();
                }
            }
            digest.total_converted += transaction.amount_converted();
        }
        digest.fx_difference = digest.total_converted - digest.total_payout;
        digest
    }

    /// International taxes as the report prints them (deduction negated)
    pub fn international_taxes(&self) -> Decimal {
        -self.tax_deduction
    }
}

/// Collected VAT per EU currency, plus its merchant-currency conversion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatEntry {
    pub collected: Decimal,
    pub converted: Decimal,
}

/// Per-currency VAT pairs over EU-currency charges, sorted by code
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VatRollup {
    entries: BTreeMap<String, VatEntry>,
}

impl VatRollup {
    pub fn compute(ledger: &Ledger, eu_currencies: &[String]) -> Self {
        let mut entries: BTreeMap<String, VatEntry> = BTreeMap::new();
        for transaction in ledger.transactions() {
            if transaction.category != Category::Charge
                || !eu_currencies.contains(&transaction.buyer_currency)
            {
                continue;
            }
            let entry = entries.entry(transaction.buyer_currency.clone()).or_default();
            entry.collected += transaction.tax_amount.unwrap_or_default();
            entry.converted += transaction.tax_amount_converted().unwrap_or_default();
        }
        Self { entries }
    }

    pub fn entries(&self) -> &BTreeMap<String, VatEntry> {
        &self.entries
    }

    /// Grand total of converted VAT
    pub fn total_converted(&self) -> Decimal {
        self.entries.values().map(|e| e.converted).sum()
    }
}

/// How a currency's amounts should be displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmountPrecision {
    /// No transaction of this currency carried a fractional amount
    Whole,
    Fractional,
}

/// Per-currency display precision, a pure function of the finalized ledger
///
/// A currency defaults to whole-unit display; any amount with a nonzero
/// fractional part upgrades it.
pub fn precision_by_currency(ledger: &Ledger) -> BTreeMap<String, AmountPrecision> {
    let mut precision = BTreeMap::new();
    for transaction in ledger.transactions() {
        let entry = precision
            .entry(transaction.buyer_currency.clone())
            .or_insert(AmountPrecision::Whole);
        if transaction.amount.fract() != Decimal::ZERO {
            *entry = AmountPrecision::Fractional;
        }
    }
    precision
}
