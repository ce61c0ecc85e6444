//! Day × currency pivot aggregation
//!
//! Accumulates a finalized, single-month ledger into per-day, per-currency,
//! per-(day,currency) and grand-total summaries. Every slot of the month is
//! allocated up front, so zero-transaction days still answer lookups.
//! All arithmetic is exact decimal; the totals carry no binary rounding.

use crate::error::{ReportError, Result};
use crate::ledger::transaction::Transaction;
use chrono::{Datelike, NaiveDate};
use hashbrown::HashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Three running totals for one aggregation bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Sum of amounts in buyer currency
    pub total: Decimal,
    /// Sum of actual payouts in merchant currency
    pub total_payout: Decimal,
    /// Sum of converted amounts in merchant currency
    pub total_converted: Decimal,
}

impl Summary {
    fn add(&mut self, transaction: &Transaction) {
        self.total += transaction.amount;
        self.total_payout += transaction.payout;
        self.total_converted += transaction.amount_converted();
    }

    /// Aggregate FX gain/loss: payout minus converted
    pub fn spread(&self) -> Decimal {
        self.total_payout - self.total_converted
    }
}

/// Day × currency pivot over one calendar month
#[derive(Debug, Clone)]
pub struct MonthlyPivot {
    year: i32,
    month: u32,
    currencies: Vec<String>,
    currency_index: HashMap<String, usize>,
    per_day: Vec<Summary>,
    per_currency: Vec<Summary>,
    per_day_currency: Vec<Vec<Summary>>,
    grand: Summary,
}

impl MonthlyPivot {
    /// Aggregate a finalized ledger
    ///
    /// Every transaction must fall inside the month of the earliest one;
    /// an empty ledger or a multi-month ledger is an `InvalidRange` error.
    pub fn new(transactions: &[Transaction]) -> Result<Self> {
        let first = transactions.first().ok_or_else(|| {
            ReportError::InvalidRange("cannot pivot an empty ledger".to_string())
        })?;
        let year = first.date.year();
        let month = first.date.month();
        let mut currency_set = BTreeSet::new();
        for transaction in transactions {
            if transaction.date.year() != year || transaction.date.month() != month {
                return Err(ReportError::InvalidRange(format!(
                    "transactions from more than one month: {} and {}",
                    first.date, transaction.date
                )));
            }
            currency_set.insert(transaction.buyer_currency.clone());
        }
        let currencies: Vec<String> = currency_set.into_iter().collect();
        let currency_index: HashMap<String, usize> = currencies
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        let day_count = days_in_month(year, month) as usize;
        log::debug!(
            "pivoting {} transactions over {}-{:02}: {} days, {} currencies",
            transactions.len(),
            year,
            month,
            day_count,
            currencies.len()
        );

        let mut pivot = Self {
            year,
            month,
            per_day: vec![Summary::default(); day_count],
            per_currency: vec![Summary::default(); currencies.len()],
            per_day_currency: vec![vec![Summary::default(); currencies.len()]; day_count],
            grand: Summary::default(),
            currencies,
            currency_index,
        };
        for transaction in transactions {
            let day = transaction.date.day0() as usize;
            let currency = pivot.currency_index[&transaction.buyer_currency];
            pivot.per_day[day].add(transaction);
            pivot.per_currency[currency].add(transaction);
            pivot.per_day_currency[day][currency].add(transaction);
            pivot.grand.add(transaction);
        }
        Ok(pivot)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Every calendar day of the pivot month, in order
    pub fn days(&self) -> Vec<NaiveDate> {
        (0..self.per_day.len())
            .filter_map(|i| NaiveDate::from_ymd_opt(self.year, self.month, i as u32 + 1))
            .collect()
    }

    /// Observed buyer currencies, sorted by code
    pub fn currencies(&self) -> &[String] {
        &self.currencies
    }

    /// Totals for one day across all currencies
    pub fn day_summary(&self, date: NaiveDate) -> Result<&Summary> {
        Ok(&self.per_day[self.day_slot(date)?])
    }

    /// Totals for one currency across the whole month
    pub fn currency_summary(&self, currency: &str) -> Result<&Summary> {
        Ok(&self.per_currency[self.currency_slot(currency)?])
    }

    /// Totals for one (day, currency) cell
    pub fn day_currency_summary(&self, date: NaiveDate, currency: &str) -> Result<&Summary> {
        let day = self.day_slot(date)?;
        let currency = self.currency_slot(currency)?;
        Ok(&self.per_day_currency[day][currency])
    }

    /// Grand total over the whole ledger
    pub fn grand_summary(&self) -> &Summary {
        &self.grand
    }

    fn day_slot(&self, date: NaiveDate) -> Result<usize> {
        if date.year() != self.year || date.month() != self.month {
            return Err(ReportError::NotFound(format!(
                "date {} outside pivot month {}-{:02}",
                date, self.year, self.month
            )));
        }
        Ok(date.day0() as usize)
    }

    fn currency_slot(&self, currency: &str) -> Result<usize> {
        self.currency_index.get(currency).copied().ok_or_else(|| {
            ReportError::NotFound(format!("currency {} not present in pivot", currency))
        })
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}
